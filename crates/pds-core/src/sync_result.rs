use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ports::RowChange;

/// Upper bound on error messages kept in a run summary.
pub const MAX_RECORDED_ERRORS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::NotStarted => "not_started",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid run transition from {from} to {to}")]
pub struct RunStateError {
    pub from: RunStatus,
    pub to: RunStatus,
}

/// Summary of one sync run. Not persisted; logged and returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SyncRunResult {
    pub domain: String,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub failed: u64,
    pub pages: u64,
    pub errors: Vec<String>,
    /// Messages not kept because `errors` was already full.
    pub dropped_errors: u64,
    pub abort_reason: Option<String>,
}

impl SyncRunResult {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            status: RunStatus::NotStarted,
            started_at: None,
            finished_at: None,
            created: 0,
            updated: 0,
            unchanged: 0,
            failed: 0,
            pages: 0,
            errors: Vec::new(),
            dropped_errors: 0,
            abort_reason: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`RunStateError`] unless the run has not started yet.
    pub fn start(&mut self) -> Result<(), RunStateError> {
        self.transition(RunStatus::NotStarted, RunStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RunStateError`] unless the run is running.
    pub fn complete(&mut self) -> Result<(), RunStateError> {
        self.transition(RunStatus::Running, RunStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RunStateError`] unless the run is running.
    pub fn abort(&mut self, reason: impl Into<String>) -> Result<(), RunStateError> {
        self.transition(RunStatus::Running, RunStatus::Aborted)?;
        let reason = reason.into();
        self.push_error(reason.clone());
        self.abort_reason = Some(reason);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, from: RunStatus, to: RunStatus) -> Result<(), RunStateError> {
        if self.status != from {
            return Err(RunStateError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn record_change(&mut self, change: RowChange) {
        match change {
            RowChange::Created => self.created += 1,
            RowChange::Updated => self.updated += 1,
            RowChange::Unchanged => self.unchanged += 1,
        }
    }

    /// Count a per-record failure and keep its message if there is room.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.push_error(message.into());
    }

    /// Keep a page-level error message without counting a record failure.
    pub fn record_page_error(&mut self, message: impl Into<String>) {
        self.push_error(message.into());
    }

    fn push_error(&mut self, message: String) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push(message);
        } else {
            self.dropped_errors += 1;
        }
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }

    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

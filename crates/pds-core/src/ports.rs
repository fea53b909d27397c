//! Seams between the sync service and its collaborators.
//!
//! A sync run pulls pages from a [`PageSource`], converts each raw record
//! with a [`Mapper`], and writes the result through a [`Repository`].

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Network failure, timeout, or a retriable status that outlived retries.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// Malformed payload, auth failure, or an unexpected status.
    #[error("source response invalid: {0}")]
    ResponseInvalid(String),
}

/// One page of raw records. `next == None` marks the end of the sequence.
#[derive(Debug, Clone)]
pub struct Page<R, C> {
    pub records: Vec<R>,
    pub next: Option<C>,
}

/// A failed page fetch. `resume_from` is set when the source can still tell
/// where the following page starts.
#[derive(Debug, Clone)]
pub struct PageFailure<C> {
    pub error: SourceError,
    pub resume_from: Option<C>,
}

impl<C> From<SourceError> for PageFailure<C> {
    fn from(error: SourceError) -> Self {
        Self {
            error,
            resume_from: None,
        }
    }
}

#[async_trait]
pub trait PageSource: Send {
    type Record: Send;
    type Cursor: Clone + Send + Sync + Debug;

    /// Fetch the page starting at `cursor`; `None` requests the first page.
    async fn fetch_page(
        &mut self,
        cursor: Option<Self::Cursor>,
    ) -> Result<Page<Self::Record, Self::Cursor>, PageFailure<Self::Cursor>>;
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot map record {record}: {reason}")]
pub struct MappingError {
    /// Best-effort identifier of the offending record.
    pub record: String,
    pub reason: String,
}

impl MappingError {
    pub fn new(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

pub trait Mapper {
    type Raw;
    type Dto;

    /// Pure conversion of one external record into the internal shape.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when a required field is missing or a value
    /// cannot be coerced.
    fn to_dto(&self, raw: Self::Raw) -> Result<Self::Dto, MappingError>;
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    Created,
    Updated,
    /// Stored content already matched; nothing was written.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<K> {
    pub key: K,
    pub change: RowChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("storage unreachable: {0}")]
    Connectivity(String),
}

impl PersistenceError {
    /// Connectivity failures end the run; everything else is per record.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, PersistenceError::Connectivity(_))
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Key: Send + Sync + Display;
    type Filter: Send + Sync;

    /// Insert or update by natural key.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Constraint`] for rejected rows and
    /// [`PersistenceError::Connectivity`] when the store cannot be reached.
    async fn upsert(&self, entity: &Self::Entity) -> Result<Upserted<Self::Key>, PersistenceError>;

    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] when no row has `key`.
    async fn find_by_key(&self, key: &Self::Key) -> Result<Self::Entity, PersistenceError>;

    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the query fails.
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Entity>, PersistenceError>;
}

use pds_core::{Mapper, PageSource, Repository, RunStateError, SourceError, SyncRunResult};

/// Hard stop for sources whose cursor never runs out.
pub const MAX_PAGES: u64 = 10_000;

/// One sync run for one domain: pull pages from `source`, map each record,
/// upsert it through `repository`.
///
/// Records are handled strictly in order, one at a time. Each upsert commits
/// on its own, so an aborted run keeps everything written before the abort.
pub struct SyncService<S, M, R> {
    domain: String,
    source: S,
    mapper: M,
    repository: R,
    max_pages: u64,
}

impl<S, M, R> SyncService<S, M, R>
where
    S: PageSource,
    M: Mapper<Raw = S::Record>,
    R: Repository<Entity = M::Dto>,
{
    #[must_use]
    pub fn new(domain: impl Into<String>, source: S, mapper: M, repository: R) -> Self {
        Self {
            domain: domain.into(),
            source,
            mapper,
            repository,
            max_pages: MAX_PAGES,
        }
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Run until the source is exhausted or a run-level failure occurs.
    ///
    /// Per-record mapping and constraint failures are counted and the run
    /// carries on. An unavailable source, an invalid page with no resume
    /// point, lost storage connectivity, or the page limit abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`RunStateError`] only if the run's state machine is driven
    /// out of order, which indicates a bug rather than a sync failure.
    pub async fn run(&mut self) -> Result<SyncRunResult, RunStateError> {
        let mut run = SyncRunResult::new(self.domain.clone());
        run.start()?;
        tracing::info!(domain = %self.domain, "sync run started");

        let mut cursor: Option<S::Cursor> = None;
        let mut requested: u64 = 0;

        loop {
            if requested >= self.max_pages {
                let reason = format!("page limit of {} reached", self.max_pages);
                tracing::error!(domain = %self.domain, max_pages = self.max_pages, "{reason}");
                run.abort(reason)?;
                return Ok(run);
            }
            requested += 1;

            let page = match self.source.fetch_page(cursor.clone()).await {
                Ok(page) => page,
                Err(failure) => match (failure.error, failure.resume_from) {
                    (SourceError::ResponseInvalid(reason), Some(resume)) => {
                        tracing::warn!(
                            domain = %self.domain,
                            page = requested,
                            resume_from = ?resume,
                            error = %reason,
                            "invalid page, skipping"
                        );
                        run.record_page_error(format!("page {requested}: {reason}"));
                        cursor = Some(resume);
                        continue;
                    }
                    (error, _) => {
                        tracing::error!(
                            domain = %self.domain,
                            page = requested,
                            error = %error,
                            "source failed, aborting run"
                        );
                        run.abort(error.to_string())?;
                        return Ok(run);
                    }
                },
            };

            run.pages += 1;
            let record_count = page.records.len();

            for raw in page.records {
                let dto = match self.mapper.to_dto(raw) {
                    Ok(dto) => dto,
                    Err(err) => {
                        tracing::warn!(
                            domain = %self.domain,
                            record = %err.record,
                            reason = %err.reason,
                            "skipping unmappable record"
                        );
                        run.record_failure(err.to_string());
                        continue;
                    }
                };

                match self.repository.upsert(&dto).await {
                    Ok(upserted) => {
                        tracing::debug!(
                            domain = %self.domain,
                            key = %upserted.key,
                            change = ?upserted.change,
                            "upserted"
                        );
                        run.record_change(upserted.change);
                    }
                    Err(err) if err.is_connectivity() => {
                        tracing::error!(
                            domain = %self.domain,
                            error = %err,
                            "storage unreachable, aborting run"
                        );
                        run.abort(err.to_string())?;
                        return Ok(run);
                    }
                    Err(err) => {
                        tracing::warn!(domain = %self.domain, error = %err, "upsert rejected");
                        run.record_failure(err.to_string());
                    }
                }
            }

            tracing::info!(
                domain = %self.domain,
                page = run.pages,
                records = record_count,
                created = run.created,
                updated = run.updated,
                unchanged = run.unchanged,
                failed = run.failed,
                "page processed"
            );

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        run.complete()?;
        tracing::info!(
            domain = %self.domain,
            pages = run.pages,
            created = run.created,
            updated = run.updated,
            unchanged = run.unchanged,
            failed = run.failed,
            dropped_errors = run.dropped_errors,
            "sync run completed"
        );
        Ok(run)
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

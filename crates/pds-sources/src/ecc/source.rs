//! [`PageSource`] over ECC article lookups.

use async_trait::async_trait;
use pds_core::{Page, PageFailure, PageSource, SourceError};

use crate::ecc::client::EccClient;
use crate::ecc::types::EccArticleRecord;
use crate::pacing::Pacer;

/// One `(supplier_gln, ean)` pair to look up in ECC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLookup {
    pub supplier_gln: String,
    pub ean: String,
}

/// Pages through a fixed list of lookups, `batch_size` lookups per page.
///
/// The cursor is the offset of the first lookup of the page.
pub struct EccArticleSource {
    client: EccClient,
    lookups: Vec<ArticleLookup>,
    batch_size: usize,
    pacer: Pacer,
}

impl EccArticleSource {
    #[must_use]
    pub fn new(
        client: EccClient,
        lookups: Vec<ArticleLookup>,
        batch_size: usize,
        inter_request_delay_ms: u64,
    ) -> Self {
        Self {
            client,
            lookups,
            batch_size: batch_size.max(1),
            pacer: Pacer::new(inter_request_delay_ms),
        }
    }

    #[must_use]
    pub fn lookup_count(&self) -> usize {
        self.lookups.len()
    }
}

#[async_trait]
impl PageSource for EccArticleSource {
    type Record = EccArticleRecord;
    type Cursor = usize;

    async fn fetch_page(
        &mut self,
        cursor: Option<usize>,
    ) -> Result<Page<EccArticleRecord, usize>, PageFailure<usize>> {
        let start = cursor.unwrap_or(0);
        let total = self.lookups.len();
        if start >= total {
            return Ok(Page {
                records: Vec::new(),
                next: None,
            });
        }
        let end = start.saturating_add(self.batch_size).min(total);

        let mut records = Vec::new();
        for index in start..end {
            self.pacer.wait().await;
            let lookup = &self.lookups[index];

            match self
                .client
                .fetch_articles(&lookup.ean, &lookup.supplier_gln)
                .await
            {
                Ok(articles) => {
                    if articles.is_empty() {
                        tracing::debug!(
                            ean = %lookup.ean,
                            supplier_gln = %lookup.supplier_gln,
                            "no ECC articles for lookup"
                        );
                    }
                    records.extend(articles.into_iter().map(|body| EccArticleRecord {
                        supplier_gln: lookup.supplier_gln.clone(),
                        ean: lookup.ean.clone(),
                        body,
                    }));
                }
                Err(err) => {
                    let reason = match SourceError::from(err) {
                        SourceError::ResponseInvalid(reason) => reason,
                        unavailable @ SourceError::Unavailable(_) => {
                            return Err(PageFailure::from(unavailable));
                        }
                    };
                    // Hand over what this page already holds; the next call
                    // starts at the failing lookup and reports it alone.
                    if index > start {
                        return Ok(Page {
                            records,
                            next: Some(index),
                        });
                    }
                    return Err(PageFailure {
                        error: SourceError::ResponseInvalid(format!(
                            "ean={} suGln={}: {reason}",
                            lookup.ean, lookup.supplier_gln
                        )),
                        resume_from: Some(index + 1),
                    });
                }
            }
        }

        Ok(Page {
            records,
            next: (end < total).then_some(end),
        })
    }
}

//! [`PageSource`] over one supplier's GlobalStock availabilities.

use async_trait::async_trait;
use pds_core::{Page, PageFailure, PageSource, SourceError};

use crate::global_stock::client::GlobalStockClient;
use crate::global_stock::types::StockRecord;
use crate::pacing::Pacer;

/// Lists the supplier's GTINs on the first call, then pages through them
/// `batch_size` GTINs at a time. The cursor is the GTIN offset.
pub struct StockAvailabilitySource {
    client: GlobalStockClient,
    supplier_gln: String,
    gtins: Vec<String>,
    listed: bool,
    batch_size: usize,
    pacer: Pacer,
}

impl StockAvailabilitySource {
    #[must_use]
    pub fn new(
        client: GlobalStockClient,
        supplier_gln: &str,
        batch_size: usize,
        inter_request_delay_ms: u64,
    ) -> Self {
        Self {
            client,
            supplier_gln: supplier_gln.to_owned(),
            gtins: Vec::new(),
            listed: false,
            batch_size: batch_size.max(1),
            pacer: Pacer::new(inter_request_delay_ms),
        }
    }

    async fn ensure_listed(&mut self) -> Result<(), PageFailure<usize>> {
        if self.listed {
            return Ok(());
        }
        self.pacer.wait().await;
        let gtins = self
            .client
            .gtins_with_stock(&self.supplier_gln)
            .await
            .map_err(|e| PageFailure::from(SourceError::from(e)))?;
        tracing::info!(
            supplier_gln = %self.supplier_gln,
            gtin_count = gtins.len(),
            "listed GTINs with stock"
        );
        self.gtins = gtins;
        self.listed = true;
        Ok(())
    }
}

#[async_trait]
impl PageSource for StockAvailabilitySource {
    type Record = StockRecord;
    type Cursor = usize;

    async fn fetch_page(
        &mut self,
        cursor: Option<usize>,
    ) -> Result<Page<StockRecord, usize>, PageFailure<usize>> {
        self.ensure_listed().await?;

        let start = cursor.unwrap_or(0);
        let total = self.gtins.len();
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
            let gtin = &self.gtins[index];

            match self.client.availabilities(gtin, &self.supplier_gln).await {
                Ok(entries) => {
                    records.extend(entries.into_iter().map(|body| StockRecord {
                        requested_gtin: gtin.clone(),
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
                    if index > start {
                        return Ok(Page {
                            records,
                            next: Some(index),
                        });
                    }
                    return Err(PageFailure {
                        error: SourceError::ResponseInvalid(format!("gtin={gtin}: {reason}")),
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

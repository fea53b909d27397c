//! Wiring for sync runs: builds sources, mappers and repositories from the
//! config and drives them through [`SyncService`].
//!
//! Availability runs go first, one per configured supplier, because the
//! article run looks up exactly the `(supplier_gln, ean)` pairs they stored.

use std::fmt::Write as _;
use std::process::ExitCode;

use anyhow::Context;
use clap::ValueEnum;
use pds_core::{AppConfig, SyncRunResult};
use pds_db::{PgArticleRepository, PgGtinStockRepository};
use pds_sources::{
    ArticleLookup, EccArticleMapper, EccArticleSource, EccClient, GlobalStockClient,
    StockAvailabilitySource, StockMapper,
};
use pds_sync::SyncService;
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Domain {
    Availability,
    Articles,
    All,
}

impl Domain {
    fn includes_availability(self) -> bool {
        matches!(self, Domain::Availability | Domain::All)
    }

    fn includes_articles(self) -> bool {
        matches!(self, Domain::Articles | Domain::All)
    }
}

/// Migrate, sync, print one summary per run.
///
/// Exits non-zero if any run aborted; per-record failures alone do not
/// change the exit code.
///
/// # Errors
///
/// Returns an error if migrations fail, the suppliers file cannot be loaded,
/// or a client cannot be built.
pub(crate) async fn run_sync_command(
    pool: &PgPool,
    config: &AppConfig,
    domain: Domain,
) -> anyhow::Result<ExitCode> {
    let applied = pds_db::run_migrations(pool)
        .await
        .context("failed to run migrations")?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let results = run_sync(pool, config, domain).await?;
    for result in &results {
        println!("{}", format_summary(result));
    }

    Ok(exit_code(&results))
}

/// Failure if any run aborted. Per-record failures alone still succeed.
pub(crate) fn exit_code(results: &[SyncRunResult]) -> ExitCode {
    if results.iter().any(SyncRunResult::is_aborted) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Run the selected domains and collect every run's result.
///
/// An aborted run does not stop later runs; each supplier and the article
/// pass are independent.
///
/// # Errors
///
/// Returns an error for setup failures only. Sync failures are reported in
/// the returned results.
pub(crate) async fn run_sync(
    pool: &PgPool,
    config: &AppConfig,
    domain: Domain,
) -> anyhow::Result<Vec<SyncRunResult>> {
    let mut results = Vec::new();

    if domain.includes_availability() {
        results.extend(run_availability(pool, config).await?);
    }
    if domain.includes_articles() {
        results.push(run_articles(pool, config).await?);
    }

    Ok(results)
}

async fn run_availability(
    pool: &PgPool,
    config: &AppConfig,
) -> anyhow::Result<Vec<SyncRunResult>> {
    let suppliers = pds_core::load_suppliers(&config.suppliers_path).with_context(|| {
        format!(
            "failed to load suppliers from {}",
            config.suppliers_path.display()
        )
    })?;
    let client =
        GlobalStockClient::from_app_config(config).context("failed to build GlobalStock client")?;

    let mut results = Vec::with_capacity(suppliers.len());
    for supplier in &suppliers {
        let source = StockAvailabilitySource::new(
            client.clone(),
            &supplier.supplier_gln,
            config.stock_batch_size,
            config.inter_request_delay_ms,
        );
        let info = supplier.supplier_info(&config.retailer_id, &config.retailer_gln);
        let mapper = StockMapper::new(info);
        let repository = PgGtinStockRepository::new(pool.clone());

        let mut service = SyncService::new(
            format!("availability:{}", supplier.supplier_gln),
            source,
            mapper,
            repository,
        );
        results.push(service.run().await?);
    }

    Ok(results)
}

async fn run_articles(pool: &PgPool, config: &AppConfig) -> anyhow::Result<SyncRunResult> {
    let lookups: Vec<ArticleLookup> = pds_db::list_supplier_ean_pairs(pool)
        .await
        .context("failed to load supplier/EAN pairs")?
        .into_iter()
        .map(|pair| ArticleLookup {
            supplier_gln: pair.supplier_gln,
            ean: pair.ean,
        })
        .collect();
    tracing::info!(lookups = lookups.len(), "loaded article lookups");

    let client = EccClient::from_app_config(config).context("failed to build ECC client")?;
    let mapper = EccArticleMapper::new(client.country_code());
    let source = EccArticleSource::new(
        client,
        lookups,
        config.article_batch_size,
        config.inter_request_delay_ms,
    );

    let mut service = SyncService::new(
        "articles",
        source,
        mapper,
        PgArticleRepository::new(pool.clone()),
    );
    Ok(service.run().await?)
}

/// One line of counts, then each kept error message indented on its own
/// line, then how many messages were dropped.
pub(crate) fn format_summary(result: &SyncRunResult) -> String {
    let mut line = format!(
        "{domain}: {status} pages={pages} created={created} updated={updated} \
         unchanged={unchanged} failed={failed}",
        domain = result.domain,
        status = result.status,
        pages = result.pages,
        created = result.created,
        updated = result.updated,
        unchanged = result.unchanged,
        failed = result.failed,
    );
    if let Some(ms) = result.duration_ms() {
        let _ = write!(line, " duration_ms={ms}");
    }
    if let Some(reason) = &result.abort_reason {
        let _ = write!(line, " reason=\"{reason}\"");
    }
    for error in &result.errors {
        let _ = write!(line, "\n    {error}");
    }
    if result.dropped_errors > 0 {
        let _ = write!(line, "\n    (+{} more)", result.dropped_errors);
    }
    line
}

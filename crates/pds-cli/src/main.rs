mod report;
mod schedule;
mod sync;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::sync::Domain;

#[derive(Debug, Parser)]
#[command(name = "pds-cli")]
#[command(about = "Syncs ECC article data and GlobalStock availability into Postgres")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one sync pass (the default when no command is given)
    Sync {
        /// Which domain to sync
        #[arg(long, value_enum, default_value_t = Domain::All)]
        domain: Domain,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Summarise stored availability rows
    Report {
        /// Only count and sample rows for this supplier GLN
        #[arg(long)]
        supplier_gln: Option<String>,
        /// Maximum number of sample rows to print
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Run the full sync on the configured cron schedule until interrupted
    Schedule,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check that the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let db_config = pds_core::load_db_config().context("failed to load database configuration")?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(db_config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = pds_db::PoolConfig::from_db_config(&db_config);
    let pool = pds_db::connect_pool(&db_config.database_url, pool_config)
        .await
        .context("failed to connect to database")?;

    // Only sync and schedule call the external APIs, so only they need the
    // full configuration with its tokens.
    let config = || pds_core::load_app_config().context("failed to load configuration");
    match cli.command {
        None => sync::run_sync_command(&pool, &config()?, Domain::All).await,
        Some(Commands::Sync { domain }) => sync::run_sync_command(&pool, &config()?, domain).await,
        Some(Commands::Db { command }) => run_db_command(&pool, command).await,
        Some(Commands::Report {
            supplier_gln,
            limit,
        }) => {
            report::run_report(&pool, supplier_gln.as_deref(), limit).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Schedule) => {
            schedule::run_schedule(pool, config()?).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_db_command(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<ExitCode> {
    match command {
        DbCommands::Migrate => {
            let applied = pds_db::run_migrations(pool).await?;
            println!("migrations applied: {applied}");
        }
        DbCommands::Ping => {
            pds_db::ping(pool).await?;
            println!("database ok");
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests;

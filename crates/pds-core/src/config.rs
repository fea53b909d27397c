use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, DbConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the database and logging settings, for commands that never
/// call the external APIs.
///
/// # Errors
///
/// Returns `ConfigError` if `DATABASE_URL` is missing or a pool setting is
/// invalid.
pub fn load_db_config() -> Result<DbConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_db_config(&|key: &str| std::env::var(key))
}

fn build_db_config<F>(lookup: &F) -> Result<DbConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;
    let log_level = or_default("PDS_LOG_LEVEL", "info");

    let max_connections = parse_number::<u32>(&or_default, "PDS_DB_MAX_CONNECTIONS", "10")?;
    let min_connections = parse_number::<u32>(&or_default, "PDS_DB_MIN_CONNECTIONS", "1")?;
    if min_connections > max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "PDS_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "{min_connections} exceeds PDS_DB_MAX_CONNECTIONS ({max_connections})"
            ),
        });
    }
    let acquire_timeout_secs =
        parse_number::<u64>(&or_default, "PDS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(DbConfig {
        database_url,
        log_level,
        max_connections,
        min_connections,
        acquire_timeout_secs,
    })
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a
/// `HashMap` lookup instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let db = build_db_config(&lookup)?;
    let ecc_api_base_url = require("ECC_API_BASE_URL")?;
    let ecc_api_token = require("ECC_API_TOKEN")?;
    let stock_api_base_url = require("EAN_AVAILABILITY_API_BASE_URL")?;
    let stock_api_token = require("EAN_AVAILABILITY_API_TOKEN")?;
    let retailer_id = require("RETAILER_ID")?;
    let retailer_gln = require("RETAILER_GLN")?;

    let ecc_country_code = or_default("ECC_COUNTRY_CODE", "de").trim().to_string();
    if ecc_country_code.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "ECC_COUNTRY_CODE".to_string(),
            reason: "must not be blank".to_string(),
        });
    }
    let suppliers_path = PathBuf::from(or_default(
        "PDS_SUPPLIERS_PATH",
        "./config/suppliers.json",
    ));

    let http_request_timeout_secs =
        parse_number::<u64>(&or_default, "PDS_HTTP_REQUEST_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("PDS_HTTP_USER_AGENT", "pds/0.1 (product-data-sync)");
    let http_max_retries = parse_number::<u32>(&or_default, "PDS_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_ms =
        parse_number::<u64>(&or_default, "PDS_HTTP_RETRY_BACKOFF_BASE_MS", "1000")?;
    let inter_request_delay_ms =
        parse_number::<u64>(&or_default, "PDS_INTER_REQUEST_DELAY_MS", "100")?;

    let article_batch_size = parse_batch_size(&or_default, "PDS_ARTICLE_BATCH_SIZE")?;
    let stock_batch_size = parse_batch_size(&or_default, "PDS_STOCK_BATCH_SIZE")?;

    let sync_cron = or_default("PDS_SYNC_CRON", "0 0 18 * * *");

    Ok(AppConfig {
        database_url: db.database_url,
        log_level: db.log_level,
        suppliers_path,
        retailer_id,
        retailer_gln,
        ecc_api_base_url,
        ecc_api_token,
        ecc_country_code,
        stock_api_base_url,
        stock_api_token,
        db_max_connections: db.max_connections,
        db_min_connections: db.min_connections,
        db_acquire_timeout_secs: db.acquire_timeout_secs,
        http_request_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_ms,
        inter_request_delay_ms,
        article_batch_size,
        stock_batch_size,
        sync_cron,
    })
}

fn parse_number<T>(
    or_default: &impl Fn(&str, &str) -> String,
    var: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Batch sizes default to 100 and must be at least 1.
fn parse_batch_size(
    or_default: &impl Fn(&str, &str) -> String,
    var: &str,
) -> Result<usize, ConfigError> {
    let size = parse_number::<usize>(or_default, var, "100")?;
    if size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "batch size must be greater than zero".to_string(),
        });
    }
    Ok(size)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

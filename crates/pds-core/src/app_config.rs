use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub suppliers_path: PathBuf,
    pub retailer_id: String,
    pub retailer_gln: String,
    pub ecc_api_base_url: String,
    pub ecc_api_token: String,
    /// Country segment of the ECC article lookup path, e.g. `"de"`.
    pub ecc_country_code: String,
    pub stock_api_base_url: String,
    pub stock_api_token: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_request_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
    pub article_batch_size: usize,
    pub stock_batch_size: usize,
    /// Six-field cron expression evaluated in `Europe/Berlin`.
    pub sync_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("suppliers_path", &self.suppliers_path)
            .field("retailer_id", &self.retailer_id)
            .field("retailer_gln", &self.retailer_gln)
            .field("ecc_api_base_url", &self.ecc_api_base_url)
            .field("ecc_api_token", &"[redacted]")
            .field("ecc_country_code", &self.ecc_country_code)
            .field("stock_api_base_url", &self.stock_api_base_url)
            .field("stock_api_token", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_request_timeout_secs", &self.http_request_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_ms",
                &self.http_retry_backoff_base_ms,
            )
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("article_batch_size", &self.article_batch_size)
            .field("stock_batch_size", &self.stock_batch_size)
            .field("sync_cron", &self.sync_cron)
            .finish()
    }
}

/// The subset of [`AppConfig`] needed to open the pool and set up logging.
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub log_level: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

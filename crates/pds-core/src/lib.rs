pub mod app_config;
pub mod article;
pub mod availability;
pub mod config;
pub mod ports;
pub mod suppliers;
pub mod sync_result;

use thiserror::Error;

pub use app_config::{AppConfig, DbConfig};
pub use article::{Article, ArticleFilter, Attribute, Image};
pub use availability::{
    AvailabilityFilter, EanAvailability, EanAvailabilityKey, ItemType, SupplierInfo,
};
pub use config::{load_app_config, load_app_config_from_env, load_db_config};
pub use ports::{
    Mapper, MappingError, Page, PageFailure, PageSource, PersistenceError, Repository, RowChange,
    SourceError, Upserted,
};
pub use suppliers::{load_suppliers, SupplierConfig};
pub use sync_result::{RunStateError, RunStatus, SyncRunResult, MAX_RECORDED_ERRORS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read suppliers file {path}: {source}")]
    SuppliersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suppliers file: {0}")]
    SuppliersFileParse(#[source] serde_yaml::Error),

    #[error("suppliers validation error: {0}")]
    Validation(String),
}

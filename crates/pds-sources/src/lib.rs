//! HTTP source adapters for the ECC article API and the GlobalStock
//! availability API, plus the mappers turning their payloads into domain rows.

pub mod ecc;
pub mod error;
pub mod global_stock;
mod http;
mod pacing;
pub(crate) mod retry;

pub use ecc::{ArticleLookup, EccArticleMapper, EccArticleRecord, EccArticleSource, EccClient};
pub use error::SourceClientError;
pub use global_stock::{GlobalStockClient, StockAvailabilitySource, StockMapper, StockRecord};
pub use http::HttpSettings;

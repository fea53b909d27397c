pub mod client;
pub mod normalize;
pub mod source;
pub mod types;

pub use client::GlobalStockClient;
pub use normalize::StockMapper;
pub use source::StockAvailabilitySource;
pub use types::StockRecord;

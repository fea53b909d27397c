pub mod client;
pub mod normalize;
pub mod source;
pub mod types;

pub use client::EccClient;
pub use normalize::EccArticleMapper;
pub use source::{ArticleLookup, EccArticleSource};
pub use types::EccArticleRecord;

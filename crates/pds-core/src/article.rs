use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A catalogue article as stored in `pds_articles`.
///
/// `article_key` is the ECC article id rendered as text. Attributes and
/// images are owned by the article and replaced wholesale on every resync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub article_key: String,
    pub description: String,
    pub ean: Option<String>,
    pub supplier_gln: Option<String>,
    pub manufacturer_gln: Option<String>,
    pub supplier_article_number: Option<String>,
    pub manufacturer_article_number: Option<String>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub season_ecc_id: Option<i64>,
    pub season_name: Option<String>,
    pub currency: Option<String>,
    /// Prime cost (purchase price), two decimal places.
    pub price_pricat: Option<Decimal>,
    /// Recommended retail price, two decimal places.
    pub price_retail: Option<Decimal>,
    pub date_changed: Option<DateTime<Utc>>,
    pub attributes: Vec<Attribute>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub url: String,
    /// Zero-based order in the source payload.
    pub position: i32,
    pub image_type: Option<String>,
}

/// Read-side filter for listing stored articles.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub supplier_gln: Option<String>,
    pub brand: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

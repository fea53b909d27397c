//! ECC article API response types.
//!
//! Every field is optional: the mapper decides what is required, so a single
//! incomplete article becomes a per-record failure instead of a page failure.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Envelope of `articleData/byEanAndSuGln`: `{ "articles": [ ... ] }`.
#[derive(Debug, Deserialize)]
pub struct ArticlesResponse {
    pub articles: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EccArticle {
    pub ecc_id: Option<i64>,
    pub su_gln: Option<String>,
    pub mf_gln: Option<String>,
    pub su_article_number: Option<String>,
    pub mf_article_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub article_name: Option<String>,
    pub currency: Option<String>,
    pub season_txt: Option<String>,
    pub season: Option<EccSeason>,
    pub date_changed: Option<String>,
    /// Keyed by lower-case country code, e.g. `"de"`.
    #[serde(default)]
    pub assortment: HashMap<String, Vec<EccAssortmentItem>>,
    #[serde(default)]
    pub images: Vec<EccImageGroup>,
    #[serde(default)]
    pub attributes: Vec<EccAttribute>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EccSeason {
    pub id: Option<i64>,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EccAssortmentItem {
    pub ean: Option<String>,
    pub prime_cost: Option<Decimal>,
    pub retail_price: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EccImageGroup {
    #[serde(default)]
    pub media: Vec<EccMedia>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EccMedia {
    pub file: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EccAttribute {
    pub key: Option<String>,
    /// Strings, numbers and booleans all occur.
    pub value: Option<serde_json::Value>,
    pub unit: Option<String>,
}

/// One raw article as handed to the mapper, tagged with the lookup pair
/// that produced it.
#[derive(Debug, Clone)]
pub struct EccArticleRecord {
    pub supplier_gln: String,
    pub ean: String,
    pub body: serde_json::Value,
}

//! GlobalStock supplier stock API response types.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Envelope of `supplierStockData/availabilities/{gtin}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub stocks_query_result: Option<Vec<serde_json::Value>>,
}

/// One `stocksQueryResult` entry. All fields optional; the mapper enforces
/// what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub gtin: Option<String>,
    pub quantity: Option<i64>,
    /// Usually a colour name, occasionally a numeric code.
    pub stock_traffic_light: Option<serde_json::Value>,
    /// `1` = pair, anything else = set.
    #[serde(rename = "type")]
    pub stock_type: Option<i64>,
    pub timestamp: Option<String>,
    pub price: Option<Decimal>,
}

/// One raw stock entry as handed to the mapper, tagged with the GTIN that
/// was queried.
#[derive(Debug, Clone)]
pub struct StockRecord {
    pub requested_gtin: String,
    pub body: serde_json::Value,
}

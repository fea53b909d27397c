//! HTTP client for the GlobalStock supplier stock API.

use pds_core::AppConfig;

use crate::error::SourceClientError;
use crate::global_stock::types::AvailabilityResponse;
use crate::http::{ApiHttp, HttpSettings};

/// Stock type requested from the availabilities endpoint.
const STOCK_TYPE: &str = "1";

#[derive(Debug, Clone)]
pub struct GlobalStockClient {
    http: ApiHttp,
    retailer_gln: String,
}

impl GlobalStockClient {
    /// # Errors
    ///
    /// Returns [`SourceClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        settings: &HttpSettings,
        base_url: &str,
        token: &str,
        retailer_gln: &str,
    ) -> Result<Self, SourceClientError> {
        Ok(Self {
            http: ApiHttp::new(settings, base_url, token)?,
            retailer_gln: retailer_gln.to_owned(),
        })
    }

    /// # Errors
    ///
    /// See [`GlobalStockClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceClientError> {
        Self::new(
            &HttpSettings::from_app_config(config),
            &config.stock_api_base_url,
            &config.stock_api_token,
            &config.retailer_gln,
        )
    }

    /// Lists the GTINs a supplier currently reports stock for.
    ///
    /// A 404 means the supplier has nothing listed for this retailer.
    ///
    /// # Errors
    ///
    /// Returns [`SourceClientError`] on transport failure or if the body is
    /// not a JSON array of strings.
    pub async fn gtins_with_stock(
        &self,
        supplier_gln: &str,
    ) -> Result<Vec<String>, SourceClientError> {
        let url = self.http.build_url(
            &[
                "supplierStockData",
                "articlesWithStock",
                supplier_gln,
                &self.retailer_gln,
            ],
            &[],
        );

        let Some(body) = self.http.get_json(&url).await? else {
            return Ok(Vec::new());
        };

        serde_json::from_value::<Option<Vec<String>>>(body)
            .map(Option::unwrap_or_default)
            .map_err(|e| SourceClientError::Deserialize {
                context: format!("articlesWithStock(supplierGln={supplier_gln})"),
                source: e,
            })
    }

    /// Fetches the raw `stocksQueryResult` entries for one GTIN.
    ///
    /// A 404 or a response without `stocksQueryResult` yields an empty vec.
    ///
    /// # Errors
    ///
    /// Returns [`SourceClientError`] on transport failure or a malformed
    /// envelope.
    pub async fn availabilities(
        &self,
        gtin: &str,
        supplier_gln: &str,
    ) -> Result<Vec<serde_json::Value>, SourceClientError> {
        let url = self.http.build_url(
            &["supplierStockData", "availabilities", gtin],
            &[
                ("supplierGln", supplier_gln),
                ("retailerGln", &self.retailer_gln),
                ("stockType", STOCK_TYPE),
            ],
        );

        let Some(body) = self.http.get_json(&url).await? else {
            return Ok(Vec::new());
        };

        let envelope: AvailabilityResponse =
            serde_json::from_value(body).map_err(|e| SourceClientError::Deserialize {
                context: format!("availabilities(gtin={gtin})"),
                source: e,
            })?;

        Ok(envelope.stocks_query_result.unwrap_or_default())
    }
}

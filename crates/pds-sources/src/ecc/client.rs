//! HTTP client for the ECC content article API.

use pds_core::AppConfig;

use crate::ecc::types::ArticlesResponse;
use crate::error::SourceClientError;
use crate::http::{ApiHttp, HttpSettings};

/// Client for `GET {base}/articleData/byEanAndSuGln/{ean}/{su_gln}/{country}`.
#[derive(Debug, Clone)]
pub struct EccClient {
    http: ApiHttp,
    country_code: String,
}

impl EccClient {
    /// # Errors
    ///
    /// Returns [`SourceClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SourceClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        settings: &HttpSettings,
        base_url: &str,
        token: &str,
        country_code: &str,
    ) -> Result<Self, SourceClientError> {
        Ok(Self {
            http: ApiHttp::new(settings, base_url, token)?,
            country_code: country_code.to_lowercase(),
        })
    }

    /// # Errors
    ///
    /// See [`EccClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SourceClientError> {
        Self::new(
            &HttpSettings::from_app_config(config),
            &config.ecc_api_base_url,
            &config.ecc_api_token,
            &config.ecc_country_code,
        )
    }

    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Fetches the raw article objects for one `(ean, supplier_gln)` pair.
    ///
    /// A 404 and a missing or empty `articles` array both yield an empty vec.
    ///
    /// # Errors
    ///
    /// - [`SourceClientError::Http`] / [`SourceClientError::UnexpectedStatus`]
    ///   / [`SourceClientError::RateLimited`] once retries are exhausted.
    /// - [`SourceClientError::Deserialize`] if the envelope is malformed.
    pub async fn fetch_articles(
        &self,
        ean: &str,
        supplier_gln: &str,
    ) -> Result<Vec<serde_json::Value>, SourceClientError> {
        let url = self.http.build_url(
            &[
                "articleData",
                "byEanAndSuGln",
                ean,
                supplier_gln,
                &self.country_code,
            ],
            &[],
        );

        let Some(body) = self.http.get_json(&url).await? else {
            return Ok(Vec::new());
        };

        let envelope: ArticlesResponse =
            serde_json::from_value(body).map_err(|e| SourceClientError::Deserialize {
                context: format!("articleData(ean={ean}, suGln={supplier_gln})"),
                source: e,
            })?;

        Ok(envelope.articles.unwrap_or_default())
    }
}

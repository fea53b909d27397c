//! Shared `reqwest` plumbing for the ECC and GlobalStock clients.

use std::time::Duration;

use pds_core::AppConfig;
use reqwest::{Client, StatusCode, Url};

use crate::error::SourceClientError;
use crate::retry::retry_with_backoff;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.http_request_timeout_secs,
            user_agent: config.http_user_agent.clone(),
            max_retries: config.http_max_retries,
            retry_backoff_base_ms: config.http_retry_backoff_base_ms,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "pds/0.1 (product-data-sync)".to_string(),
            max_retries: 3,
            retry_backoff_base_ms: 1_000,
        }
    }
}

/// A `reqwest` client bound to one API base URL and token.
#[derive(Debug, Clone)]
pub(crate) struct ApiHttp {
    client: Client,
    base_url: Url,
    token: String,
    max_retries: u32,
    retry_backoff_base_ms: u64,
}

impl ApiHttp {
    pub(crate) fn new(
        settings: &HttpSettings,
        base_url: &str,
        token: &str,
    ) -> Result<Self, SourceClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SourceClientError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceClientError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token: token.to_owned(),
            max_retries: settings.max_retries,
            retry_backoff_base_ms: settings.retry_backoff_base_ms,
        })
    }

    /// Appends `segments` to the base path (each one percent-encoded), then
    /// the `extra` query pairs and the token.
    pub(crate) fn build_url(&self, segments: &[&str], extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("token", &self.token);
        }
        url
    }

    /// GET `url` with retries and parse the body as JSON.
    ///
    /// Returns `Ok(None)` for a 404, which both APIs use for "nothing known
    /// about this key".
    pub(crate) async fn get_json(
        &self,
        url: &Url,
    ) -> Result<Option<serde_json::Value>, SourceClientError> {
        retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.get_json_once(url)
        })
        .await
    }

    async fn get_json_once(
        &self,
        url: &Url,
    ) -> Result<Option<serde_json::Value>, SourceClientError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceClientError::Http(e.without_url()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceClientError::RateLimited {
                url: redacted(url),
            });
        }
        if !status.is_success() {
            return Err(SourceClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: redacted(url),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceClientError::Http(e.without_url()))?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SourceClientError::Deserialize {
                context: redacted(url),
                source: e,
            })
    }
}

/// The URL without its query string, so the API token never reaches logs.
fn redacted(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

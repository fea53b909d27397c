use pds_core::SourceError;
use thiserror::Error;

/// Errors returned by the ECC and GlobalStock HTTP clients.
#[derive(Debug, Error)]
pub enum SourceClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 429 Too Many Requests.
    #[error("rate limited by {url}")]
    RateLimited { url: String },

    /// The API returned a non-success status other than 404 or 429.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl SourceClientError {
    /// Transport-level failures: the remote side could not be reached or kept
    /// failing with a transient status.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            SourceClientError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            SourceClientError::RateLimited { .. } => true,
            SourceClientError::UnexpectedStatus { status, .. } => *status >= 500,
            SourceClientError::Deserialize { .. } | SourceClientError::InvalidBaseUrl(_) => false,
        }
    }
}

impl From<SourceClientError> for SourceError {
    fn from(err: SourceClientError) -> Self {
        if err.is_transport() {
            SourceError::Unavailable(err.to_string())
        } else {
            SourceError::ResponseInvalid(err.to_string())
        }
    }
}

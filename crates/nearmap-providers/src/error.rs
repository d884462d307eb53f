use nearmap_core::{CoordinateError, FailureCode};
use thiserror::Error;

/// Transport-level and decoding failures shared by every HTTP adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} API key is not configured")]
    MissingApiKey { provider: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ProviderError {
    #[must_use]
    pub fn failure_code(&self) -> FailureCode {
        match self {
            ProviderError::Http(e) if e.is_timeout() => FailureCode::Timeout,
            ProviderError::Http(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::UnexpectedStatus { .. } => FailureCode::Transport,
            ProviderError::Deserialize { .. } => FailureCode::InvalidResponse,
            ProviderError::MissingApiKey { .. } => FailureCode::ApiKeyMissing,
            ProviderError::InvalidBaseUrl { .. } => FailureCode::InvalidInput,
        }
    }
}

/// Failures from forward or reverse geocoding.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no geocoding results for '{query}'")]
    NoResults { query: String },

    /// The geocoding API answered with a non-OK status envelope.
    #[error("geocoding API status {status}: {message}")]
    Api { status: String, message: String },

    #[error("geocoding query is empty")]
    EmptyQuery,

    #[error("geocoding result has an invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
}

impl GeocodeError {
    #[must_use]
    pub fn failure_code(&self) -> FailureCode {
        match self {
            GeocodeError::Provider(e) => e.failure_code(),
            GeocodeError::NoResults { .. } => FailureCode::NoResults,
            GeocodeError::Api { .. } | GeocodeError::InvalidCoordinate(_) => {
                FailureCode::InvalidResponse
            }
            GeocodeError::EmptyQuery => FailureCode::InvalidInput,
        }
    }
}

//! Shared HTTP plumbing: client construction, base-URL normalisation and
//! the retried GET-JSON helper every adapter goes through.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};

use crate::error::ProviderError;
use crate::retry::retry_with_backoff;

/// Transport settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &nearmap_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "nearmap/0.1 (nearby-places)".to_string(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(settings.user_agent.as_str())
        .build()?)
}

/// Parse `base_url` and ensure it ends with exactly one slash so that
/// [`Url::join`] appends to the path instead of replacing its last segment.
pub(crate) fn normalise_base_url(base_url: &str) -> Result<Url, ProviderError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Sends the request built by `build`, retrying transient failures, and
/// parses the body as JSON.
///
/// `build` is called once per attempt because a `RequestBuilder` is
/// consumed on send.
pub(crate) async fn get_json<F>(
    settings: &HttpSettings,
    url: &Url,
    build: F,
) -> Result<serde_json::Value, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    retry_with_backoff(settings.max_retries, settings.backoff_base_ms, || {
        let request = build();
        async move {
            let response = request.send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(1);
                return Err(ProviderError::RateLimited {
                    url: redact_key(url),
                    retry_after_secs,
                });
            }

            if !status.is_success() {
                return Err(ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: redact_key(url),
                });
            }

            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
                context: redact_key(url),
                source: e,
            })
        }
    })
    .await
}

/// Renders a URL for logs and errors with any `key` query value masked.
pub(crate) fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "key" {
                "[redacted]".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    if pairs.is_empty() {
        return redacted.to_string();
    }
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalise_base_url_appends_single_slash() {
        let url = normalise_base_url("https://api.example.com/v3//").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v3/");
        let joined = url.join("places/search").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/v3/places/search");
    }

    #[test]
    fn normalise_base_url_rejects_garbage() {
        assert!(matches!(
            normalise_base_url("not a url"),
            Err(ProviderError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn redact_key_masks_only_the_key() {
        let url = Url::parse("https://maps.example.com/geocode/json?address=90210&key=secret")
            .unwrap();
        let rendered = redact_key(&url);
        assert!(!rendered.contains("secret"), "{rendered}");
        assert!(rendered.contains("address=90210"), "{rendered}");
    }
}

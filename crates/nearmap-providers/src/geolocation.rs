//! Device-position sources.
//!
//! [`PositionSource`] is the async stand-in for a platform geolocation
//! capability, with a three-way outcome: a coordinate, a typed failure,
//! or [`GeolocationError::NotSupported`].

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use nearmap_core::{Coordinate, FailureCode};

use crate::error::ProviderError;
use crate::http::{build_client, get_json, HttpSettings};

const DEFAULT_IP_GEOLOCATION_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("permission to read the device position was denied")]
    PermissionDenied,
    #[error("device position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("timed out waiting for the device position")]
    Timeout,
    #[error("geolocation failed: {0}")]
    Unknown(String),
    #[error("geolocation is not supported on this platform")]
    NotSupported,
}

impl GeolocationError {
    #[must_use]
    pub fn failure_code(&self) -> FailureCode {
        match self {
            GeolocationError::PermissionDenied => FailureCode::PermissionDenied,
            GeolocationError::PositionUnavailable(_) => FailureCode::PositionUnavailable,
            GeolocationError::Timeout => FailureCode::Timeout,
            GeolocationError::Unknown(_) => FailureCode::Unknown,
            GeolocationError::NotSupported => FailureCode::NotSupported,
        }
    }
}

impl From<ProviderError> for GeolocationError {
    fn from(err: ProviderError) -> Self {
        match err.failure_code() {
            FailureCode::Timeout => GeolocationError::Timeout,
            FailureCode::Transport => GeolocationError::PositionUnavailable(err.to_string()),
            _ => GeolocationError::Unknown(err.to_string()),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// A position fixed at construction, e.g. from a `--at` flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.0)
    }
}

/// A platform without any position capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl PositionSource for NoGeolocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Err(GeolocationError::NotSupported)
    }
}

/// Approximate position from an IP geolocation service returning
/// `{status, lat, lon, message?}`.
pub struct IpGeolocator {
    client: Client,
    url: Url,
    settings: HttpSettings,
}

#[derive(Debug, Deserialize)]
struct IpLookup {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: HttpSettings) -> Result<Self, ProviderError> {
        Self::with_url(settings, DEFAULT_IP_GEOLOCATION_URL)
    }

    /// # Errors
    ///
    /// As [`IpGeolocator::new`], plus [`ProviderError::InvalidBaseUrl`].
    pub fn with_url(settings: HttpSettings, url: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(url).map_err(|e| ProviderError::InvalidBaseUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: build_client(&settings)?,
            url,
            settings,
        })
    }
}

#[async_trait]
impl PositionSource for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        let body = get_json(&self.settings, &self.url, || self.client.get(self.url.clone())).await?;
        let lookup: IpLookup = serde_json::from_value(body)
            .map_err(|e| GeolocationError::Unknown(format!("undecodable IP lookup: {e}")))?;

        if lookup.status != "success" {
            return Err(GeolocationError::PositionUnavailable(
                lookup
                    .message
                    .unwrap_or_else(|| format!("lookup status {}", lookup.status)),
            ));
        }

        match (lookup.lat, lookup.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
                .map_err(|e| GeolocationError::PositionUnavailable(e.to_string())),
            _ => Err(GeolocationError::PositionUnavailable(
                "lookup returned no coordinates".to_string(),
            )),
        }
    }
}

//! Forward and reverse geocoding.
//!
//! [`GeocodingClient`] speaks the Google-style `geocode/json` API: a
//! `status` envelope around `results[]`, each with `formatted_address`,
//! `address_components[]` and `geometry.location`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use nearmap_core::Coordinate;

use crate::error::{GeocodeError, ProviderError};
use crate::http::{build_client, get_json, normalise_base_url, HttpSettings};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

/// One piece of a structured address, e.g. `{long_name: "90210", types: ["postal_code"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Result of geocoding free text.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardGeocode {
    pub coordinate: Coordinate,
    pub formatted_address: String,
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub formatted_address: Option<String>,
    pub address_components: Vec<AddressComponent>,
}

/// Result of reverse geocoding a coordinate, most specific match first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReverseGeocode {
    pub results: Vec<GeocodedAddress>,
}

impl ReverseGeocode {
    /// First postal code found scanning results in order, and within each
    /// result its components in order.
    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        self.results
            .iter()
            .find_map(|r| postal_code_from_components(&r.address_components))
    }
}

/// The first component tagged `postal_code`, if any.
#[must_use]
pub fn postal_code_from_components(components: &[AddressComponent]) -> Option<&str> {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == "postal_code"))
        .map(|c| c.long_name.as_str())
        .filter(|s| !s.trim().is_empty())
}

/// Geocoding capability the location resolver depends on.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn forward(&self, address: &str) -> Result<ForwardGeocode, GeocodeError>;

    async fn reverse(&self, coord: Coordinate) -> Result<ReverseGeocode, GeocodeError>;
}

/// Client for the geocoding REST API.
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: HttpSettings,
}

impl GeocodingClient {
    /// Creates a client pointed at the production geocoding API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingApiKey`] for a blank key and
    /// [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, settings: HttpSettings) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`GeocodingClient::new`], plus [`ProviderError::InvalidBaseUrl`].
    pub fn with_base_url(
        api_key: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey {
                provider: "geocoding".to_string(),
            });
        }
        Ok(Self {
            client: build_client(&settings)?,
            api_key: api_key.to_owned(),
            base_url: normalise_base_url(base_url)?,
            settings,
        })
    }

    /// Builds the request URL with percent-encoded query parameters.
    fn build_url(&self, extra: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url =
            self.base_url
                .join("geocode/json")
                .map_err(|e| ProviderError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    async fn request(&self, url: &Url, context: &str) -> Result<Vec<WireResult>, GeocodeError> {
        let body = get_json(&self.settings, url, || self.client.get(url.clone())).await?;
        let envelope: GeocodeEnvelope =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: context.to_string(),
                source: e,
            })?;

        let status = envelope.status;
        match status.as_str() {
            "OK" => Ok(envelope.results),
            "ZERO_RESULTS" => Err(GeocodeError::NoResults {
                query: context.to_string(),
            }),
            _ => Err(GeocodeError::Api {
                message: envelope
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
                status: status.clone(),
            }),
        }
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn forward(&self, address: &str) -> Result<ForwardGeocode, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }
        let url = self.build_url(&[("address", query)])?;
        let results = self.request(&url, query).await?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults {
                query: query.to_string(),
            })?;
        let geometry = first.geometry.ok_or_else(|| GeocodeError::NoResults {
            query: query.to_string(),
        })?;
        let coordinate = Coordinate::new(geometry.location.lat, geometry.location.lng)?;

        Ok(ForwardGeocode {
            coordinate,
            formatted_address: first
                .formatted_address
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| query.to_string()),
            address_components: first.address_components,
        })
    }

    async fn reverse(&self, coord: Coordinate) -> Result<ReverseGeocode, GeocodeError> {
        let latlng = format!("{},{}", coord.lat(), coord.lng());
        let url = self.build_url(&[("latlng", latlng.as_str())])?;
        let results = self.request(&url, &latlng).await?;

        Ok(ReverseGeocode {
            results: results
                .into_iter()
                .map(|r| GeocodedAddress {
                    formatted_address: r.formatted_address,
                    address_components: r.address_components,
                })
                .collect(),
        })
    }
}

/// Stand-in used when no geocoding key is configured. Every call fails with
/// [`ProviderError::MissingApiKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGeocoder;

impl UnconfiguredGeocoder {
    fn missing_key() -> GeocodeError {
        GeocodeError::Provider(ProviderError::MissingApiKey {
            provider: "geocoding".to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for UnconfiguredGeocoder {
    async fn forward(&self, _address: &str) -> Result<ForwardGeocode, GeocodeError> {
        Err(Self::missing_key())
    }

    async fn reverse(&self, _coord: Coordinate) -> Result<ReverseGeocode, GeocodeError> {
        Err(Self::missing_key())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeocodeEnvelope {
    status: String,
    #[serde(default)]
    results: Vec<WireResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    formatted_address: Option<String>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: WireLatLng,
}

#[derive(Debug, Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: name.to_string(),
            short_name: name.to_string(),
            types: types.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[test]
    fn postal_code_prefers_first_result_then_first_component() {
        let reverse = ReverseGeocode {
            results: vec![
                GeocodedAddress {
                    formatted_address: Some("Larimer Square".to_string()),
                    address_components: vec![component("Denver", &["locality", "political"])],
                },
                GeocodedAddress {
                    formatted_address: None,
                    address_components: vec![
                        component("80202", &["postal_code"]),
                        component("80203", &["postal_code"]),
                    ],
                },
                GeocodedAddress {
                    formatted_address: None,
                    address_components: vec![component("80204", &["postal_code"])],
                },
            ],
        };
        assert_eq!(reverse.postal_code(), Some("80202"));
    }

    #[test]
    fn postal_code_absent_when_no_component_matches() {
        let reverse = ReverseGeocode {
            results: vec![GeocodedAddress {
                formatted_address: None,
                address_components: vec![component("US", &["country"])],
            }],
        };
        assert_eq!(reverse.postal_code(), None);
        assert_eq!(ReverseGeocode::default().postal_code(), None);
    }

    #[test]
    fn postal_code_suffix_is_not_a_postal_code() {
        let components = vec![component("1234", &["postal_code_suffix"])];
        assert_eq!(postal_code_from_components(&components), None);
    }

    #[tokio::test]
    async fn unconfigured_geocoder_reports_missing_key() {
        let err = UnconfiguredGeocoder.forward("90210").await.unwrap_err();
        assert_eq!(err.failure_code(), nearmap_core::FailureCode::ApiKeyMissing);
    }

    #[test]
    fn build_url_appends_key_last() {
        let client = GeocodingClient::with_base_url(
            "test-key",
            HttpSettings::default(),
            "https://maps.example.com/maps/api",
        )
        .unwrap();
        let url = client.build_url(&[("address", "90210")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.example.com/maps/api/geocode/json?address=90210&key=test-key"
        );
    }
}

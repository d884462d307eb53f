//! Nearby place search.
//!
//! [`PlaceProvider`] is the adapter contract the client core depends on;
//! [`PlacesClient`] implements it against a Foursquare-style
//! `places/search` endpoint.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use nearmap_core::{Business, BusinessLocation, Category, Coordinate, Hours, Photo};

use crate::error::ProviderError;
use crate::http::{build_client, get_json, normalise_base_url, HttpSettings};

const DEFAULT_BASE_URL: &str = "https://api.foursquare.com/v3/";

/// A backend that can list points of interest around a coordinate.
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Up to `limit` businesses near `coord`, nearest first.
    async fn nearby(&self, coord: Coordinate, limit: usize)
        -> Result<Vec<Business>, ProviderError>;
}

/// Client for the places search API.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: HttpSettings,
}

impl PlacesClient {
    /// Creates a client pointed at the production places API.
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
    /// As [`PlacesClient::new`], plus [`ProviderError::InvalidBaseUrl`].
    pub fn with_base_url(
        api_key: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey {
                provider: "places".to_string(),
            });
        }
        Ok(Self {
            client: build_client(&settings)?,
            api_key: api_key.to_owned(),
            base_url: normalise_base_url(base_url)?,
            settings,
        })
    }

    fn search_url(&self, coord: Coordinate, limit: usize) -> Result<Url, ProviderError> {
        let mut url =
            self.base_url
                .join("places/search")
                .map_err(|e| ProviderError::InvalidBaseUrl {
                    url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut()
            .append_pair("ll", &format!("{},{}", coord.lat(), coord.lng()))
            .append_pair("limit", &limit.to_string())
            .append_pair("sort", "DISTANCE");
        Ok(url)
    }
}

#[async_trait]
impl PlaceProvider for PlacesClient {
    fn name(&self) -> &str {
        "places"
    }

    async fn nearby(
        &self,
        coord: Coordinate,
        limit: usize,
    ) -> Result<Vec<Business>, ProviderError> {
        let url = self.search_url(coord, limit)?;
        tracing::debug!(lat = coord.lat(), lng = coord.lng(), limit, "places search");

        let body = get_json(&self.settings, &url, || {
            self.client
                .get(url.clone())
                .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
                .header(reqwest::header::ACCEPT, "application/json")
        })
        .await?;

        let envelope: SearchEnvelope =
            serde_json::from_value(body).map_err(|e| ProviderError::Deserialize {
                context: format!("places/search(ll={coord})"),
                source: e,
            })?;

        let businesses: Vec<Business> = envelope
            .results
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<PlaceRecord>(raw) {
                Ok(record) => normalize_place(record),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable place record");
                    None
                }
            })
            .take(limit)
            .collect();

        Ok(businesses)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PlaceRecord {
    fsq_id: String,
    name: String,
    #[serde(default)]
    geocodes: Option<Geocodes>,
    #[serde(default)]
    location: PlaceLocation,
    #[serde(default)]
    categories: Vec<PlaceCategory>,
    distance: Option<u32>,
    website: Option<String>,
    tel: Option<String>,
    rating: Option<f64>,
    hours: Option<PlaceHours>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
}

#[derive(Debug, Deserialize)]
struct Geocodes {
    main: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceLocation {
    address: Option<String>,
    locality: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    formatted_address: Option<String>,
}

/// Category ids arrive as numbers from some API versions and strings from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct PlaceCategory {
    id: CategoryId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlaceHours {
    display: Option<String>,
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PlacePhoto {
    prefix: String,
    suffix: String,
}

/// Map a decoded place record to a [`Business`]. Records without a valid
/// coordinate cannot be placed on the map and are dropped.
fn normalize_place(record: PlaceRecord) -> Option<Business> {
    let main = record.geocodes.and_then(|g| g.main)?;
    let Ok(coordinate) = Coordinate::new(main.latitude, main.longitude) else {
        tracing::debug!(id = %record.fsq_id, "skipping place with invalid coordinate");
        return None;
    };

    let formatted_address = address_lines(&record.location);
    let location = BusinessLocation {
        address: non_empty(record.location.address),
        locality: non_empty(record.location.locality),
        region: non_empty(record.location.region),
        postcode: non_empty(record.location.postcode),
        country: non_empty(record.location.country),
        coordinate,
        formatted_address,
    };

    Some(Business {
        id: record.fsq_id,
        name: record.name,
        location,
        categories: record
            .categories
            .into_iter()
            .map(|c| Category {
                id: match c.id {
                    CategoryId::Number(n) => n.to_string(),
                    CategoryId::Text(s) => s,
                },
                name: c.name,
            })
            .collect(),
        website: non_empty(record.website),
        phone: non_empty(record.tel),
        rating: record.rating,
        distance: record.distance,
        hours: record.hours.map(|h| Hours {
            display: non_empty(h.display),
            open_now: h.open_now,
        }),
        photos: record
            .photos
            .into_iter()
            .map(|p| Photo {
                prefix: p.prefix,
                suffix: p.suffix,
            })
            .collect(),
    })
}

/// Display lines: street, then `"City, ST 12345"`. Falls back to the
/// provider's single formatted string when no components are present.
fn address_lines(location: &PlaceLocation) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(street) = location.address.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(street.trim().to_string());
    }

    let city_region = [location.locality.as_deref(), location.region.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let postcode = location.postcode.as_deref().map_or("", str::trim);
    let second = format!("{city_region} {postcode}").trim().to_string();
    if !second.is_empty() {
        lines.push(second);
    }

    if lines.is_empty() {
        if let Some(formatted) = location
            .formatted_address
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            lines.push(formatted.trim().to_string());
        }
    }
    lines
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> PlaceRecord {
        serde_json::from_value(json).expect("fixture should decode")
    }

    #[test]
    fn normalizes_full_record() {
        let business = normalize_place(record(serde_json::json!({
            "fsq_id": "4b5a",
            "name": "Union Station Coffee",
            "geocodes": {"main": {"latitude": 39.7527, "longitude": -105.0000}},
            "location": {
                "address": "1701 Wynkoop St",
                "locality": "Denver",
                "region": "CO",
                "postcode": "80202",
                "country": "US",
                "formatted_address": "1701 Wynkoop St, Denver, CO 80202"
            },
            "categories": [{"id": 13035, "name": "Coffee Shop"}],
            "distance": 1700,
            "website": "https://example.com",
            "rating": 8.7,
            "hours": {"display": "Mon-Sun 7:00 AM-6:00 PM", "open_now": true},
            "photos": [{"prefix": "https://img/", "suffix": "/x.jpg"}]
        })))
        .expect("record has coordinates");

        assert_eq!(business.id, "4b5a");
        assert_eq!(business.categories[0].id, "13035");
        assert_eq!(business.location.postcode.as_deref(), Some("80202"));
        assert_eq!(
            business.location.formatted_address,
            vec!["1701 Wynkoop St".to_string(), "Denver, CO 80202".to_string()]
        );
        assert_eq!(business.website.as_deref(), Some("https://example.com"));
        assert_eq!(business.hours.unwrap().open_now, Some(true));
        assert_eq!(business.photos.len(), 1);
    }

    #[test]
    fn drops_record_without_geocodes() {
        let place = record(serde_json::json!({"fsq_id": "x", "name": "Nowhere"}));
        assert!(normalize_place(place).is_none());
    }

    #[test]
    fn drops_record_with_out_of_range_coordinate() {
        let place = record(serde_json::json!({
            "fsq_id": "x",
            "name": "Bad",
            "geocodes": {"main": {"latitude": 123.0, "longitude": 0.0}}
        }));
        assert!(normalize_place(place).is_none());
    }

    #[test]
    fn blank_website_becomes_none() {
        let place = record(serde_json::json!({
            "fsq_id": "x",
            "name": "Shop",
            "website": "  ",
            "geocodes": {"main": {"latitude": 1.0, "longitude": 1.0}}
        }));
        assert_eq!(normalize_place(place).unwrap().website, None);
    }

    #[test]
    fn address_lines_fall_back_to_formatted_string() {
        let location = PlaceLocation {
            formatted_address: Some("Somewhere, Earth".to_string()),
            ..PlaceLocation::default()
        };
        assert_eq!(address_lines(&location), vec!["Somewhere, Earth".to_string()]);
    }

    #[test]
    fn search_url_carries_ll_limit_and_sort() {
        let client =
            PlacesClient::with_base_url("k", HttpSettings::default(), "https://api.example.com/v3")
                .unwrap();
        let url = client
            .search_url(Coordinate::new(39.7392, -104.9903).unwrap(), 4)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v3/places/search?ll=39.7392%2C-104.9903&limit=4&sort=DISTANCE"
        );
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            PlacesClient::new(" ", HttpSettings::default()),
            Err(ProviderError::MissingApiKey { .. })
        ));
    }
}

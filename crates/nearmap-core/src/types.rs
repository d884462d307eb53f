//! Domain records shared by the provider adapters and the client core.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Provenance tags attached to a resolved [`Location`].
pub struct LocationSource;

impl LocationSource {
    pub const GEOLOCATION: &'static str = "Geolocation API";
    pub const GEOCODING: &'static str = "Geocoding API";
    pub const AUTOCOMPLETE: &'static str = "Autocomplete";
    pub const DEFAULT: &'static str = "Default";
}

/// A resolved user location. A new resolution always yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    pub name: Option<String>,
    /// Free-text provenance, one of the [`LocationSource`] constants.
    pub source: String,
    pub formatted_address: Option<String>,
    pub postal_code: Option<String>,
}

impl Location {
    #[must_use]
    pub fn new(coordinate: Coordinate, source: &str) -> Self {
        Self {
            coordinate,
            name: None,
            source: source.to_string(),
            formatted_address: None,
            postal_code: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_formatted_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Best human-readable label: name, then formatted address, then the
    /// raw coordinate.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.formatted_address.clone())
            .unwrap_or_else(|| self.coordinate.to_string())
    }
}

/// A nearby point of interest, normalised from a provider payload.
///
/// `id` is the provider-assigned identifier and the join key between a
/// marker, its list row, and any overlay record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub location: BusinessLocation,
    pub categories: Vec<Category>,
    pub website: Option<String>,
    pub phone: Option<String>,
    /// Provider score on a 0-10 scale.
    pub rating: Option<f64>,
    /// Distance from the search origin in meters.
    pub distance: Option<u32>,
    pub hours: Option<Hours>,
    pub photos: Vec<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessLocation {
    pub address: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub coordinate: Coordinate,
    /// Address split into display lines.
    pub formatted_address: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hours {
    pub display: Option<String>,
    pub open_now: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub prefix: String,
    pub suffix: String,
}

impl Photo {
    /// Photo URL at the given `WIDTHxHEIGHT` size token (e.g. `"300x300"`).
    #[must_use]
    pub fn url(&self, size: &str) -> String {
        format!("{}{size}{}", self.prefix, self.suffix)
    }
}

/// Visual description of a map marker. Front ends translate it into their
/// own symbol type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub fill_color: String,
    pub stroke_color: String,
    pub scale: f64,
    pub z_index: i32,
}

impl MarkerIcon {
    /// The single user-location marker.
    #[must_use]
    pub fn user() -> Self {
        Self {
            fill_color: "#4285F4".to_string(),
            stroke_color: "#FFFFFF".to_string(),
            scale: 10.0,
            z_index: 1000,
        }
    }
}

impl Business {
    /// Primary category name, if the provider supplied any.
    #[must_use]
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(|c| c.name.as_str())
    }

    /// Distance formatted in miles with one decimal, e.g. `"0.4 mi"`.
    #[must_use]
    pub fn distance_label(&self) -> Option<String> {
        self.distance
            .map(|meters| format!("{:.1} mi", f64::from(meters) / 1609.344))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denver() -> Coordinate {
        Coordinate::new(39.7392, -104.9903).unwrap()
    }

    #[test]
    fn display_name_prefers_name_then_address_then_coordinate() {
        let bare = Location::new(denver(), LocationSource::GEOLOCATION);
        assert_eq!(bare.display_name(), "39.7392,-104.9903");

        let addressed = bare.clone().with_formatted_address("Denver, CO, USA");
        assert_eq!(addressed.display_name(), "Denver, CO, USA");

        let named = addressed.with_name("Home");
        assert_eq!(named.display_name(), "Home");
    }

    #[test]
    fn builder_methods_leave_the_original_untouched() {
        let original = Location::new(denver(), LocationSource::DEFAULT);
        let annotated = original.clone().with_postal_code("80202");
        assert_eq!(original.postal_code, None);
        assert_eq!(annotated.postal_code.as_deref(), Some("80202"));
        assert_eq!(annotated.source, "Default");
    }

    #[test]
    fn distance_label_converts_meters_to_miles() {
        let business = Business {
            id: "abc".to_string(),
            name: "Corner Cafe".to_string(),
            location: BusinessLocation {
                address: None,
                locality: None,
                region: None,
                postcode: None,
                country: None,
                coordinate: denver(),
                formatted_address: vec![],
            },
            categories: vec![Category {
                id: "13035".to_string(),
                name: "Coffee Shop".to_string(),
            }],
            website: None,
            phone: None,
            rating: None,
            distance: Some(1609),
            hours: None,
            photos: vec![],
        };
        assert_eq!(business.distance_label().as_deref(), Some("1.0 mi"));
        assert_eq!(business.primary_category(), Some("Coffee Shop"));
    }

    #[test]
    fn photo_url_joins_prefix_size_and_suffix() {
        let photo = Photo {
            prefix: "https://img.example.com/p/".to_string(),
            suffix: "/a.jpg".to_string(),
        };
        assert_eq!(photo.url("300x300"), "https://img.example.com/p/300x300/a.jpg");
    }
}

//! Coordinate and bounding-box value types.
//!
//! A [`Coordinate`] can only be built through [`Coordinate::new`] (or its
//! serde `try_from` hook), so every coordinate that reaches the map or a
//! provider has finite, in-range latitude and longitude.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is not a finite number in [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is not a finite number in [-180, 180]")]
    Longitude(f64),
}

/// A validated WGS84 latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Downtown Denver, CO. Used when no valid default location is configured.
    pub const FALLBACK: Coordinate = Coordinate {
        lat: 39.7392,
        lng: -104.9903,
    };

    /// Builds a coordinate after checking both components.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when either component is NaN, infinite,
    /// or outside its valid range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lng)
    }
}

/// An axis-aligned lat/lng box. Built from zero positions it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    corners: Option<(Coordinate, Coordinate)>,
}

impl Bounds {
    #[must_use]
    pub fn empty() -> Self {
        Self { corners: None }
    }

    #[must_use]
    pub fn from_coordinates<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        let mut bounds = Self::empty();
        for coord in coords {
            bounds.extend(*coord);
        }
        bounds
    }

    /// Grows the box so it contains `coord`.
    pub fn extend(&mut self, coord: Coordinate) {
        self.corners = Some(match self.corners {
            None => (coord, coord),
            Some((sw, ne)) => (
                Coordinate {
                    lat: sw.lat.min(coord.lat),
                    lng: sw.lng.min(coord.lng),
                },
                Coordinate {
                    lat: ne.lat.max(coord.lat),
                    lng: ne.lng.max(coord.lng),
                },
            ),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_none()
    }

    #[must_use]
    pub fn south_west(&self) -> Option<Coordinate> {
        self.corners.map(|(sw, _)| sw)
    }

    #[must_use]
    pub fn north_east(&self) -> Option<Coordinate> {
        self.corners.map(|(_, ne)| ne)
    }

    #[must_use]
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.corners.is_some_and(|(sw, ne)| {
            (sw.lat..=ne.lat).contains(&coord.lat) && (sw.lng..=ne.lng).contains(&coord.lng)
        })
    }

    #[must_use]
    pub fn center(&self) -> Option<Coordinate> {
        self.corners.map(|(sw, ne)| Coordinate {
            lat: (sw.lat + ne.lat) / 2.0,
            lng: (sw.lng + ne.lng) / 2.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_passes_validation() {
        let checked = Coordinate::new(Coordinate::FALLBACK.lat(), Coordinate::FALLBACK.lng());
        assert_eq!(checked, Ok(Coordinate::FALLBACK));
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_components() {
        assert!(matches!(
            Coordinate::new(f64::NAN, 0.0),
            Err(CoordinateError::Latitude(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(CoordinateError::Longitude(_))
        ));
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(39.7392, -104.9903).is_ok());
    }

    #[test]
    fn deserialize_validates_through_constructor() {
        let ok: Coordinate = serde_json::from_str(r#"{"lat": 34.09, "lng": -118.41}"#).unwrap();
        assert!((ok.lat() - 34.09).abs() < f64::EPSILON);

        let bad = serde_json::from_str::<Coordinate>(r#"{"lat": 120.0, "lng": 0.0}"#);
        assert!(bad.is_err(), "out-of-range latitude must not deserialize");

        let missing = serde_json::from_str::<Coordinate>(r#"{"lat": 12.0}"#);
        assert!(missing.is_err(), "both fields are required");
    }

    #[test]
    fn empty_bounds_has_no_corners() {
        let none: [Coordinate; 0] = [];
        let bounds = Bounds::from_coordinates(&none);
        assert!(bounds.is_empty());
        assert_eq!(bounds.center(), None);
        assert!(!bounds.contains(&Coordinate::new(0.0, 0.0).unwrap()));
    }

    #[test]
    fn bounds_grow_to_cover_every_coordinate() {
        let coords = [
            Coordinate::new(39.7392, -104.9903).unwrap(),
            Coordinate::new(39.75, -105.0).unwrap(),
            Coordinate::new(39.70, -104.95).unwrap(),
        ];
        let bounds = Bounds::from_coordinates(&coords);
        let sw = bounds.south_west().unwrap();
        let ne = bounds.north_east().unwrap();
        assert!((sw.lat() - 39.70).abs() < 1e-9);
        assert!((sw.lng() - (-105.0)).abs() < 1e-9);
        assert!((ne.lat() - 39.75).abs() < 1e-9);
        assert!((ne.lng() - (-104.95)).abs() < 1e-9);
        assert!(coords.iter().all(|c| bounds.contains(c)));
    }
}

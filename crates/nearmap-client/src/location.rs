//! Resolves the user's location from device position, free text, or the
//! configured fallback.

use std::sync::Arc;
use std::time::Duration;

use nearmap_core::{Coordinate, DefaultLocationConfig, Location, LocationSource};
use nearmap_providers::{
    postal_code_from_components, AddressComponent, GeocodeError, Geocoder, GeolocationError,
    PositionSource,
};
use tokio::sync::watch;

/// Returned by [`LocationResolver::get_postal_code`] when no postal code
/// can be determined.
pub const UNKNOWN_POSTAL_CODE: &str = "Unknown";

const FALLBACK_NAME: &str = "Denver, CO";
const CURRENT_LOCATION_NAME: &str = "Your location";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationState {
    Idle,
    Fetching,
    Geocoding,
    Ready,
    Error,
}

pub struct LocationResolver {
    position: Arc<dyn PositionSource>,
    geocoder: Arc<dyn Geocoder>,
    default_location: Location,
    geolocation_timeout: Duration,
    state: watch::Sender<LocationState>,
}

impl LocationResolver {
    #[must_use]
    pub fn new(
        position: Arc<dyn PositionSource>,
        geocoder: Arc<dyn Geocoder>,
        default_location: &DefaultLocationConfig,
        geolocation_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(LocationState::Idle);
        Self {
            position,
            geocoder,
            default_location: default_location_from(default_location),
            geolocation_timeout,
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> LocationState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: LocationState) {
        self.state.send_replace(next);
        tracing::debug!(state = ?next, "location state");
    }

    /// Reads the device position, waiting at most the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns the source's [`GeolocationError`], or
    /// [`GeolocationError::Timeout`] when the wait elapses.
    pub async fn get_current_location(&self) -> Result<Location, GeolocationError> {
        self.set_state(LocationState::Fetching);

        let outcome =
            match tokio::time::timeout(self.geolocation_timeout, self.position.current_position())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GeolocationError::Timeout),
            };

        match outcome {
            Ok(coordinate) => {
                self.set_state(LocationState::Ready);
                tracing::info!(%coordinate, "device position resolved");
                Ok(Location::new(coordinate, LocationSource::GEOLOCATION)
                    .with_name(CURRENT_LOCATION_NAME))
            }
            Err(e) => {
                self.set_state(LocationState::Error);
                tracing::warn!(error = %e, "device position unavailable");
                Err(e)
            }
        }
    }

    /// Best-effort postal code for `coord`. Never fails: any lookup error,
    /// or a response without a postal code, yields [`UNKNOWN_POSTAL_CODE`].
    pub async fn get_postal_code(&self, coord: Coordinate) -> String {
        self.set_state(LocationState::Geocoding);
        match self.geocoder.reverse(coord).await {
            Ok(reverse) => {
                self.set_state(LocationState::Ready);
                reverse
                    .postal_code()
                    .map_or_else(|| UNKNOWN_POSTAL_CODE.to_string(), str::to_string)
            }
            Err(e) => {
                self.set_state(LocationState::Error);
                tracing::warn!(%coord, error = %e, "reverse geocoding failed");
                UNKNOWN_POSTAL_CODE.to_string()
            }
        }
    }

    /// Forward-geocodes a zip code, city name, or address fragment.
    ///
    /// # Errors
    ///
    /// Returns the geocoder's [`GeocodeError`].
    pub async fn geocode_zip_code(&self, query: &str) -> Result<Location, GeocodeError> {
        self.set_state(LocationState::Geocoding);
        match self.geocoder.forward(query).await {
            Ok(forward) => {
                self.set_state(LocationState::Ready);
                let mut location = Location::new(forward.coordinate, LocationSource::GEOCODING)
                    .with_formatted_address(forward.formatted_address);
                if let Some(code) = postal_code_from_components(&forward.address_components) {
                    location = location.with_postal_code(code);
                }
                tracing::info!(query, coordinate = %location.coordinate, "query geocoded");
                Ok(location)
            }
            Err(e) => {
                self.set_state(LocationState::Error);
                tracing::warn!(query, error = %e, "forward geocoding failed");
                Err(e)
            }
        }
    }

    /// The configured fallback location. Pure; does not touch the state tag.
    #[must_use]
    pub fn get_default_location(&self) -> Location {
        self.default_location.clone()
    }
}

/// Builds a [`Location`] from a place the user picked from autocomplete.
/// Does not touch any state tag.
#[must_use]
pub fn location_from_place(
    coordinate: Coordinate,
    name: Option<&str>,
    formatted_address: Option<&str>,
    components: &[AddressComponent],
) -> Location {
    let mut location = Location::new(coordinate, LocationSource::AUTOCOMPLETE);
    if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
        location = location.with_name(name);
    }
    if let Some(address) = formatted_address.filter(|a| !a.trim().is_empty()) {
        location = location.with_formatted_address(address);
    }
    if let Some(code) = postal_code_from_components(components) {
        location = location.with_postal_code(code);
    }
    location
}

fn default_location_from(config: &DefaultLocationConfig) -> Location {
    let coordinate = match (config.lat, config.lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "configured default location is invalid; using fallback");
            Coordinate::FALLBACK
        }),
        _ => Coordinate::FALLBACK,
    };
    let name = if config.name.trim().is_empty() {
        FALLBACK_NAME
    } else {
        config.name.as_str()
    };
    Location::new(coordinate, LocationSource::DEFAULT).with_name(name)
}

#[cfg(test)]
#[path = "location_test.rs"]
mod tests;

//! Adapters for the external places, geocoding and geolocation backends.
//!
//! Every adapter decodes provider JSON into typed records at this edge;
//! nothing downstream sees raw provider payloads.

pub mod composite;
pub mod error;
pub mod geocoding;
pub mod geolocation;
pub mod http;
pub mod overlay;
pub mod places;
mod retry;

pub use composite::CompositeProvider;
pub use error::{GeocodeError, ProviderError};
pub use geocoding::{
    postal_code_from_components, AddressComponent, ForwardGeocode, GeocodedAddress, Geocoder,
    GeocodingClient, ReverseGeocode, UnconfiguredGeocoder,
};
pub use geolocation::{
    FixedPosition, GeolocationError, IpGeolocator, NoGeolocation, PositionSource,
};
pub use http::HttpSettings;
pub use overlay::{BusinessOverride, OverlayError, StaticOverlay};
pub use places::{PlaceProvider, PlacesClient};

//! Builds an [`Orchestrator`] from application config, choosing a concrete
//! adapter for every port.

use std::sync::Arc;
use std::time::Duration;

use nearmap_client::{
    AppView, BusinessResolver, LocationResolver, MapSurface, Orchestrator, OrchestratorSettings,
};
use nearmap_core::{AppConfig, Coordinate};
use nearmap_providers::{
    CompositeProvider, FixedPosition, Geocoder, GeocodingClient, HttpSettings, IpGeolocator,
    NoGeolocation, PlacesClient, PositionSource, StaticOverlay, UnconfiguredGeocoder,
};

use crate::text_map::{TextMap, TextMapReader};

/// Where the "current position" comes from for this run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PositionMode {
    /// Approximate position from the IP geolocation service.
    Ip,
    Fixed(Coordinate),
    Disabled,
}

pub(crate) struct App {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) map: TextMapReader,
}

fn position_source(
    mode: PositionMode,
    config: &AppConfig,
    settings: &HttpSettings,
) -> anyhow::Result<Arc<dyn PositionSource>> {
    Ok(match mode {
        PositionMode::Fixed(coord) => Arc::new(FixedPosition(coord)),
        PositionMode::Disabled => Arc::new(NoGeolocation),
        PositionMode::Ip => {
            let locator = match config.ip_geolocation_url.as_deref() {
                Some(url) => IpGeolocator::with_url(settings.clone(), url),
                None => IpGeolocator::new(settings.clone()),
            }
            .map_err(|e| anyhow::anyhow!("failed to build IP geolocator: {e}"))?;
            Arc::new(locator)
        }
    })
}

fn geocoder(config: &AppConfig, settings: &HttpSettings) -> anyhow::Result<Arc<dyn Geocoder>> {
    let Some(key) = config.map_api_key.as_deref() else {
        tracing::warn!("map API key is not set; geocoding is unavailable");
        return Ok(Arc::new(UnconfiguredGeocoder));
    };
    let client = match config.geocoding_base_url.as_deref() {
        Some(url) => GeocodingClient::with_base_url(key, settings.clone(), url),
        None => GeocodingClient::new(key, settings.clone()),
    }
    .map_err(|e| anyhow::anyhow!("failed to build geocoding client: {e}"))?;
    Ok(Arc::new(client))
}

fn place_provider(config: &AppConfig, settings: &HttpSettings) -> anyhow::Result<CompositeProvider> {
    let mut provider = CompositeProvider::new();

    match config.places_api_key.as_deref() {
        Some(key) => {
            let client = match config.places_base_url.as_deref() {
                Some(url) => PlacesClient::with_base_url(key, settings.clone(), url),
                None => PlacesClient::new(key, settings.clone()),
            }
            .map_err(|e| anyhow::anyhow!("failed to build places client: {e}"))?;
            provider = provider.with_primary(Arc::new(client));
        }
        None => tracing::warn!("places API key is not set; business search will return nothing"),
    }

    if let Some(path) = config.overrides_path.as_deref() {
        let overlay = StaticOverlay::load(path, config.overlay_policy)?;
        tracing::info!(path = %path.display(), entries = overlay.len(), "loaded business overrides");
        provider = provider.with_overlay(overlay);
    }

    Ok(provider)
}

/// Assembles the full client for a terminal session.
///
/// # Errors
///
/// Returns an error if an HTTP client cannot be built or the overrides file
/// cannot be read.
pub(crate) fn build_app(
    config: &AppConfig,
    mode: PositionMode,
    view: Arc<dyn AppView>,
) -> anyhow::Result<App> {
    let settings = HttpSettings::from_app_config(config);

    let location = LocationResolver::new(
        position_source(mode, config, &settings)?,
        geocoder(config, &settings)?,
        &config.default_location,
        Duration::from_secs(config.geolocation_timeout_secs),
    );
    let business = BusinessResolver::new(Arc::new(place_provider(config, &settings)?));

    let (widget, reader) = TextMap::new();
    let map = MapSurface::new(Box::new(widget));

    let orchestrator = Orchestrator::new(
        map,
        location,
        business,
        view,
        OrchestratorSettings::from_app_config(config),
    );
    Ok(App {
        orchestrator,
        map: reader,
    })
}

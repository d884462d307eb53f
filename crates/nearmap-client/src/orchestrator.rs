//! Top-level sequencing of map, location and business resolution.
//!
//! A resolution cycle renders the location first (center + user marker),
//! then runs postal-code lookup and business search concurrently, then
//! reconciles both into the label, the list and the business markers.
//! Failures are classified and only the resulting [`RecoveryAction`]
//! decides what happens next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use nearmap_core::{
    classify, AppConfig, Business, ClassifiedError, Coordinate, ErrorOrigin, FailureCode,
    Location, MarkerIcon, RecoveryAction,
};
use nearmap_providers::AddressComponent;
use regex::Regex;
use tokio::sync::watch;

use crate::business::{
    create_marker_icons, BusinessResolver, MarkerBindings, MarkerInfo, DEFAULT_RESULT_LIMIT,
};
use crate::error::MapError;
use crate::location::{location_from_place, LocationResolver, UNKNOWN_POSTAL_CODE};
use crate::map_surface::{MapSurface, MarkerRole, MarkerScope};
use crate::ports::{AppView, FitOptions, InteractionEvent, MarkerOptions};

static ZIP_PLUS_FOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{5})-\d{4}$").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Initializing,
    ConfigError,
    MapReady,
    MapError,
    FetchingLocation,
    LocationError,
    LocationReady,
    UseDefaultLocation,
    SearchingBusinesses,
    SearchError,
    BusinessesReady,
    PartialResults,
    DisplayComplete,
}

impl AppState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppState::ConfigError | AppState::MapError | AppState::DisplayComplete
        )
    }

    /// Whether `self -> next` is in the transition table.
    #[must_use]
    pub fn can_transition_to(self, next: AppState) -> bool {
        use AppState::{
            BusinessesReady, ConfigError, DisplayComplete, FetchingLocation, Initializing,
            LocationError, LocationReady, MapError, MapReady, PartialResults, SearchError,
            SearchingBusinesses, UseDefaultLocation,
        };
        matches!(
            (self, next),
            (Initializing, ConfigError | MapReady)
                | (MapReady, MapError | FetchingLocation)
                | (
                    FetchingLocation,
                    LocationError | LocationReady | UseDefaultLocation
                )
                | (LocationError, UseDefaultLocation)
                | (UseDefaultLocation | LocationReady, SearchingBusinesses)
                | (
                    SearchingBusinesses,
                    SearchError | BusinessesReady | PartialResults
                )
                | (
                    SearchError | BusinessesReady | PartialResults,
                    DisplayComplete
                )
        )
    }
}

/// How a resolution cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Postal code and at least one business rendered.
    Complete,
    /// Rendered, but the postal code is unknown or no businesses were found.
    Partial,
    /// Rendering the joined results failed; the location is shown as uncertain.
    RenderFailed,
    /// A newer cycle started before this one finished; nothing was rendered.
    Stale,
    /// The map never loaded, so nothing was attempted.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub container_id: String,
    pub map_api_key: Option<String>,
    pub result_limit: usize,
    pub initial_zoom: u8,
    pub location_zoom: u8,
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            map_api_key: config.map_api_key.clone(),
            result_limit: config.result_limit,
            ..Self::default()
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            container_id: "map".to_string(),
            map_api_key: None,
            result_limit: DEFAULT_RESULT_LIMIT,
            initial_zoom: 12,
            location_zoom: 14,
        }
    }
}

pub struct Orchestrator {
    map: MapSurface,
    location: LocationResolver,
    business: BusinessResolver,
    bindings: MarkerBindings,
    view: Arc<dyn AppView>,
    settings: OrchestratorSettings,
    state: watch::Sender<AppState>,
    latest_cycle: AtomicU64,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        map: MapSurface,
        location: LocationResolver,
        business: BusinessResolver,
        view: Arc<dyn AppView>,
        settings: OrchestratorSettings,
    ) -> Self {
        let (state, _) = watch::channel(AppState::Initializing);
        Self {
            map,
            location,
            business,
            bindings: MarkerBindings::default(),
            view,
            settings,
            state,
            latest_cycle: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> AppState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    #[must_use]
    pub fn location(&self) -> &LocationResolver {
        &self.location
    }

    #[must_use]
    pub fn business(&self) -> &BusinessResolver {
        &self.business
    }

    /// Moves to `next` if the table allows it. Illegal moves are logged and
    /// leave the state unchanged.
    pub fn transition(&self, next: AppState) -> bool {
        self.state.send_if_modified(|current| {
            let from = *current;
            if from.can_transition_to(next) {
                tracing::debug!(?from, to = ?next, "app state");
                *current = next;
                true
            } else {
                tracing::warn!(?from, to = ?next, "illegal app state transition rejected");
                false
            }
        })
    }

    /// Page-load sequence: config check, map load, device location (or the
    /// default), then the first resolution cycle. Returns the final state.
    pub async fn bootstrap(&self) -> AppState {
        let key_missing = self
            .settings
            .map_api_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty());
        if key_missing {
            let classified = classify(ErrorOrigin::Config, Some(FailureCode::ApiKeyMissing));
            self.apply_recovery(&classified);
            self.transition(AppState::ConfigError);
            return self.state();
        }

        let default_location = self.location.get_default_location();
        if let Err(e) = self.map.initialize(
            &self.settings.container_id,
            default_location.coordinate,
            self.settings.initial_zoom,
        ) {
            let classified = classify(ErrorOrigin::MapLoad, Some(e.failure_code()));
            self.apply_recovery(&classified);
            self.transition(AppState::MapReady);
            self.transition(AppState::MapError);
            return self.state();
        }
        self.transition(AppState::MapReady);
        self.transition(AppState::FetchingLocation);

        let location = match self.location.get_current_location().await {
            Ok(location) => {
                self.transition(AppState::LocationReady);
                location
            }
            Err(e) if e.failure_code() == FailureCode::NotSupported => {
                tracing::info!("geolocation not supported; using default location");
                self.transition(AppState::UseDefaultLocation);
                default_location
            }
            Err(e) => {
                self.transition(AppState::LocationError);
                let classified = classify(ErrorOrigin::Geolocation, Some(e.failure_code()));
                match self.apply_recovery(&classified) {
                    Some(fallback) => {
                        self.transition(AppState::UseDefaultLocation);
                        fallback
                    }
                    None => return self.state(),
                }
            }
        };

        self.transition(AppState::SearchingBusinesses);
        let outcome = self.run_cycle(location).await;
        self.transition(match outcome {
            CycleOutcome::Complete => AppState::BusinessesReady,
            CycleOutcome::Partial | CycleOutcome::Stale => AppState::PartialResults,
            CycleOutcome::RenderFailed | CycleOutcome::Unavailable => AppState::SearchError,
        });
        self.transition(AppState::DisplayComplete);
        self.state()
    }

    /// "Locate me": clears every marker, then resolves from the device
    /// position, falling back to the default location.
    pub async fn locate_me(&self) -> CycleOutcome {
        if !self.map_loaded() {
            return CycleOutcome::Unavailable;
        }
        self.clear_all();
        let location = match self.location.get_current_location().await {
            Ok(location) => location,
            Err(e) if e.failure_code() == FailureCode::NotSupported => {
                tracing::info!("geolocation not supported; using default location");
                self.location.get_default_location()
            }
            Err(e) => {
                let classified = classify(ErrorOrigin::Geolocation, Some(e.failure_code()));
                match self.apply_recovery(&classified) {
                    Some(fallback) => fallback,
                    None => return CycleOutcome::RenderFailed,
                }
            }
        };
        self.run_cycle(location).await
    }

    /// Search form submit. Returns `None` when the query could not be
    /// geocoded; the search input is focused for re-entry.
    pub async fn search(&self, query: &str) -> Option<CycleOutcome> {
        if !self.map_loaded() {
            return Some(CycleOutcome::Unavailable);
        }
        let query = normalize_query(query);
        match self.location.geocode_zip_code(&query).await {
            Ok(location) => Some(self.run_cycle(location).await),
            Err(e) => {
                let classified = classify(ErrorOrigin::Geocoding, Some(e.failure_code()));
                match self.apply_recovery(&classified) {
                    Some(fallback) => Some(self.run_cycle(fallback).await),
                    None => None,
                }
            }
        }
    }

    /// Autocomplete selection. The postal code comes from `components` when
    /// present, otherwise from reverse geocoding.
    pub async fn select_place(
        &self,
        coordinate: Coordinate,
        name: Option<&str>,
        formatted_address: Option<&str>,
        components: &[AddressComponent],
    ) -> CycleOutcome {
        if !self.map_loaded() {
            return CycleOutcome::Unavailable;
        }
        let location = location_from_place(coordinate, name, formatted_address, components);
        self.run_cycle(location).await
    }

    /// Routes a marker/row pointer event to the hover and click bindings.
    pub fn handle_interaction(&self, event: InteractionEvent) -> bool {
        self.bindings
            .dispatch(event, &self.business, &self.map, self.view.as_ref())
    }

    /// Shows the classified message and returns the fallback location when
    /// the directive asks for one.
    fn apply_recovery(&self, classified: &ClassifiedError) -> Option<Location> {
        tracing::info!(
            category = %classified.category,
            recovery = ?classified.recovery,
            "applying recovery"
        );
        self.view.show_error(classified.region, classified.message);
        match classified.recovery {
            RecoveryAction::UseDefaultLocation => Some(self.location.get_default_location()),
            RecoveryAction::PromptManualEntry => {
                self.view.focus_search_input();
                None
            }
            RecoveryAction::ContinueWithPartialData | RecoveryAction::None => None,
        }
    }

    /// User-triggered cycles need a mounted map; after `CONFIG_ERROR` or
    /// `MAP_ERROR` they are refused without any provider calls.
    fn map_loaded(&self) -> bool {
        let loaded = self.map.is_initialized();
        if !loaded {
            tracing::warn!(state = ?self.state(), "map is not loaded; ignoring request");
        }
        loaded
    }

    /// Also invalidates any in-flight cycle, so nothing renders businesses
    /// onto the cleared map before the next user marker is placed.
    fn clear_all(&self) {
        self.latest_cycle.fetch_add(1, Ordering::SeqCst);
        self.map.clear_markers(MarkerScope::All);
        self.bindings.clear();
    }

    /// One resolution cycle for an already-resolved location.
    async fn run_cycle(&self, location: Location) -> CycleOutcome {
        let cycle = self.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let coordinate = location.coordinate;
        tracing::info!(cycle, %coordinate, source = %location.source, "resolution cycle started");

        if let Err(e) = self.render_location(&location) {
            tracing::warn!(cycle, error = %e, "could not render location");
        }

        let limit = self.settings.result_limit;
        let (postal_code, businesses) = tokio::join!(
            self.postal_code_for(&location),
            self.business.get_nearby_businesses(coordinate, limit)
        );

        if self.latest_cycle.load(Ordering::SeqCst) != cycle {
            tracing::debug!(cycle, "discarding stale resolution cycle");
            return CycleOutcome::Stale;
        }

        match self.render_results(&location, &postal_code, &businesses) {
            Ok(()) => {
                let complete = postal_code != UNKNOWN_POSTAL_CODE && !businesses.is_empty();
                tracing::info!(
                    cycle,
                    postal_code = %postal_code,
                    businesses = businesses.len(),
                    "resolution cycle complete"
                );
                if complete {
                    CycleOutcome::Complete
                } else {
                    CycleOutcome::Partial
                }
            }
            Err(e) => {
                let classified = classify(ErrorOrigin::Render, Some(e.failure_code()));
                tracing::error!(
                    cycle,
                    category = %classified.category,
                    error = %e,
                    "rendering results failed"
                );
                self.view.show_location_label(&format!(
                    "{} (location uncertain)",
                    location.display_name()
                ));
                CycleOutcome::RenderFailed
            }
        }
    }

    fn render_location(&self, location: &Location) -> Result<(), MapError> {
        self.map
            .set_center(location.coordinate, Some(self.settings.location_zoom))?;
        self.map.clear_markers(MarkerScope::Role(MarkerRole::User));
        let options = MarkerOptions {
            title: Some(location.display_name()),
            label: None,
            icon: Some(MarkerIcon::user()),
        };
        self.map
            .add_marker(location.coordinate, &options, MarkerRole::User)?;
        Ok(())
    }

    async fn postal_code_for(&self, location: &Location) -> String {
        match location.postal_code.as_deref() {
            Some(code) => code.to_string(),
            None => self.location.get_postal_code(location.coordinate).await,
        }
    }

    fn render_results(
        &self,
        location: &Location,
        postal_code: &str,
        businesses: &[Business],
    ) -> Result<(), MapError> {
        if postal_code == UNKNOWN_POSTAL_CODE {
            let classified = classify(ErrorOrigin::PostalCode, None);
            tracing::debug!(recovery = ?classified.recovery, "postal code unavailable");
            self.view.show_location_label(&location.display_name());
        } else {
            self.view
                .show_location_label(&format!("{} ({postal_code})", location.display_name()));
        }

        self.map.clear_markers(MarkerScope::Role(MarkerRole::Business));
        self.bindings.clear();

        if businesses.is_empty() {
            self.view.show_no_results();
            return Ok(());
        }

        let icons = create_marker_icons();
        let rows = self.view.render_businesses(businesses);
        for (business, row) in businesses.iter().zip(rows) {
            let options = MarkerOptions {
                title: Some(business.name.clone()),
                label: None,
                icon: Some(icons.default.clone()),
            };
            let marker =
                self.map
                    .add_marker(business.location.coordinate, &options, MarkerRole::Business)?;
            let info = MarkerInfo {
                marker,
                row,
                default_icon: icons.default.clone(),
                highlighted_icon: icons.highlighted.clone(),
                business: business.clone(),
            };
            self.bindings.setup_hover_sync(&info);
            self.bindings.setup_click_navigation(&info);
        }

        let positions: Vec<Coordinate> = self
            .map
            .markers(MarkerScope::All)
            .into_iter()
            .map(|m| m.position)
            .collect();
        self.map
            .fit_bounds(&MapSurface::create_bounds(&positions), &FitOptions::default())?;
        Ok(())
    }
}

/// Trims, collapses inner whitespace, and reduces ZIP+4 to the five-digit
/// zip.
fn normalize_query(query: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(query.trim(), " ");
    if let Some(zip) = ZIP_PLUS_FOUR_RE
        .captures(&collapsed)
        .map(|caps| caps[1].to_string())
    {
        return zip;
    }
    collapsed.into_owned()
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;

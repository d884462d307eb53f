//! In-memory fakes for every port. The map widget and the view append to
//! one shared [`Journal`] so tests can assert cross-component ordering.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nearmap_core::{Bounds, Business, BusinessLocation, Coordinate, MarkerIcon, UiRegion};
use nearmap_providers::{
    AddressComponent, ForwardGeocode, GeocodeError, GeocodedAddress, Geocoder, GeolocationError,
    PlaceProvider, PositionSource, ProviderError, ReverseGeocode,
};

use crate::error::MapError;
use crate::ports::{AppView, FitOptions, MapView, MapWidget, MarkerHandle, MarkerOptions, RowHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(String),
    AddMarker(Coordinate, Option<String>),
    RemoveMarker(MarkerHandle),
    SetIcon(MarkerHandle, MarkerIcon),
    SetCenter(Coordinate, Option<u8>),
    FitBounds(Bounds),
    Label(String),
    RenderRows(Vec<String>),
    NoResults,
    Error(UiRegion, String),
    FocusSearch,
    RowHighlight(RowHandle, bool),
    OpenUrl(String),
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(pred)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Label(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeWidget {
    journal: Journal,
    missing_container: bool,
    /// `add_marker` fails once this many markers have been placed.
    marker_budget: Option<u64>,
    next_handle: u64,
    view: Option<MapView>,
}

impl FakeWidget {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            missing_container: false,
            marker_budget: None,
            next_handle: 1,
            view: None,
        }
    }

    pub fn without_container(journal: Journal) -> Self {
        Self {
            missing_container: true,
            ..Self::new(journal)
        }
    }

    pub fn failing_after(journal: Journal, markers: u64) -> Self {
        Self {
            marker_budget: Some(markers),
            ..Self::new(journal)
        }
    }
}

impl MapWidget for FakeWidget {
    fn create(&mut self, container_id: &str, center: Coordinate, zoom: u8) -> Result<(), MapError> {
        if self.missing_container {
            return Err(MapError::ContainerNotFound(container_id.to_string()));
        }
        self.journal.push(Call::Create(container_id.to_string()));
        self.view = Some(MapView { center, zoom });
        Ok(())
    }

    fn add_marker(
        &mut self,
        position: Coordinate,
        options: &MarkerOptions,
    ) -> Result<MarkerHandle, MapError> {
        if self
            .marker_budget
            .is_some_and(|budget| self.next_handle > budget)
        {
            return Err(MapError::Widget("marker limit reached".to_string()));
        }
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.journal
            .push(Call::AddMarker(position, options.title.clone()));
        Ok(handle)
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.journal.push(Call::RemoveMarker(marker));
    }

    fn set_marker_icon(&mut self, marker: MarkerHandle, icon: &MarkerIcon) {
        self.journal.push(Call::SetIcon(marker, icon.clone()));
    }

    fn set_center(&mut self, center: Coordinate, zoom: Option<u8>) {
        self.journal.push(Call::SetCenter(center, zoom));
        if let Some(view) = self.view.as_mut() {
            view.center = center;
            if let Some(z) = zoom {
                view.zoom = z;
            }
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds, _options: &FitOptions) {
        self.journal.push(Call::FitBounds(*bounds));
        if let (Some(view), Some(center)) = (self.view.as_mut(), bounds.center()) {
            view.center = center;
        }
    }

    fn view(&self) -> Option<MapView> {
        self.view
    }
}

pub struct FakeView {
    journal: Journal,
}

impl FakeView {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl AppView for FakeView {
    fn show_location_label(&self, text: &str) {
        self.journal.push(Call::Label(text.to_string()));
    }

    fn render_businesses(&self, businesses: &[Business]) -> Vec<RowHandle> {
        self.journal.push(Call::RenderRows(
            businesses.iter().map(|b| b.id.clone()).collect(),
        ));
        (0..businesses.len()).map(RowHandle).collect()
    }

    fn show_no_results(&self) {
        self.journal.push(Call::NoResults);
    }

    fn show_error(&self, region: UiRegion, message: &str) {
        self.journal.push(Call::Error(region, message.to_string()));
    }

    fn focus_search_input(&self) {
        self.journal.push(Call::FocusSearch);
    }

    fn set_row_highlight(&self, row: RowHandle, highlighted: bool) {
        self.journal.push(Call::RowHighlight(row, highlighted));
    }

    fn open_url(&self, url: &str) {
        self.journal.push(Call::OpenUrl(url.to_string()));
    }
}

/// Returns queued outcomes in order, then repeats the last one.
pub struct FakePosition {
    outcomes: Mutex<VecDeque<Result<Coordinate, GeolocationError>>>,
    delay: Duration,
}

impl FakePosition {
    pub fn ok(coord: Coordinate) -> Self {
        Self::sequence(vec![Ok(coord)])
    }

    pub fn err(err: GeolocationError) -> Self {
        Self::sequence(vec![Err(err)])
    }

    pub fn sequence(outcomes: Vec<Result<Coordinate, GeolocationError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PositionSource for FakePosition {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap()
        } else {
            outcomes
                .front()
                .cloned()
                .unwrap_or(Err(GeolocationError::NotSupported))
        }
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    pub forward_result: Option<ForwardGeocode>,
    pub postal_code: Option<String>,
    pub reverse_fails: bool,
    pub reverse_delay: Duration,
    pub reverse_calls: Mutex<Vec<Coordinate>>,
}

impl FakeGeocoder {
    pub fn with_postal_code(code: &str) -> Self {
        Self {
            postal_code: Some(code.to_string()),
            ..Self::default()
        }
    }

    pub fn with_forward(mut self, coord: Coordinate, formatted: &str, postal: Option<&str>) -> Self {
        self.forward_result = Some(ForwardGeocode {
            coordinate: coord,
            formatted_address: formatted.to_string(),
            address_components: postal
                .map(|p| vec![postal_component(p)])
                .unwrap_or_default(),
        });
        self
    }
}

pub fn postal_component(code: &str) -> AddressComponent {
    AddressComponent {
        long_name: code.to_string(),
        short_name: code.to_string(),
        types: vec!["postal_code".to_string()],
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn forward(&self, address: &str) -> Result<ForwardGeocode, GeocodeError> {
        self.forward_result
            .clone()
            .ok_or_else(|| GeocodeError::NoResults {
                query: address.to_string(),
            })
    }

    async fn reverse(&self, coord: Coordinate) -> Result<ReverseGeocode, GeocodeError> {
        self.reverse_calls.lock().unwrap().push(coord);
        if !self.reverse_delay.is_zero() {
            tokio::time::sleep(self.reverse_delay).await;
        }
        if self.reverse_fails {
            return Err(GeocodeError::Api {
                status: "UNKNOWN_ERROR".to_string(),
                message: "boom".to_string(),
            });
        }
        Ok(ReverseGeocode {
            results: vec![GeocodedAddress {
                formatted_address: None,
                address_components: self
                    .postal_code
                    .as_deref()
                    .map(|p| vec![postal_component(p)])
                    .unwrap_or_default(),
            }],
        })
    }
}

pub struct FakePlaces {
    pub businesses: Vec<Business>,
    pub fails: bool,
    pub delay: Duration,
    pub calls: Mutex<Vec<(Coordinate, usize)>>,
}

impl FakePlaces {
    pub fn returning(businesses: Vec<Business>) -> Self {
        Self {
            businesses,
            fails: false,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Self::returning(Vec::new())
        }
    }
}

#[async_trait]
impl PlaceProvider for FakePlaces {
    fn name(&self) -> &str {
        "fake"
    }

    async fn nearby(&self, coord: Coordinate, limit: usize) -> Result<Vec<Business>, ProviderError> {
        self.calls.lock().unwrap().push((coord, limit));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fails {
            return Err(ProviderError::UnexpectedStatus {
                status: 500,
                url: "http://places".to_string(),
            });
        }
        Ok(self.businesses.iter().take(limit).cloned().collect())
    }
}

pub fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

pub fn denver() -> Coordinate {
    coord(39.7392, -104.9903)
}

pub fn business(id: &str, at: Coordinate, website: Option<&str>) -> Business {
    Business {
        id: id.to_string(),
        name: format!("Business {id}"),
        location: BusinessLocation {
            address: None,
            locality: None,
            region: None,
            postcode: None,
            country: None,
            coordinate: at,
            formatted_address: vec![],
        },
        categories: vec![],
        website: website.map(str::to_string),
        phone: None,
        rating: None,
        distance: None,
        hours: None,
        photos: vec![],
    }
}

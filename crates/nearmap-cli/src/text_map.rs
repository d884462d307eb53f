//! Terminal map backend. Keeps widget state in memory and renders it as a
//! short text summary after each resolution cycle.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard};

use nearmap_client::{
    create_marker_icons, FitOptions, MapError, MapView, MapWidget, MarkerHandle, MarkerOptions,
};
use nearmap_core::{Bounds, Coordinate, MarkerIcon};

/// The only container the terminal "page" has.
pub(crate) const CONTAINER_ID: &str = "map";

const MAX_FIT_ZOOM: u8 = 18;

#[derive(Debug, Clone)]
struct TextMarker {
    position: Coordinate,
    title: Option<String>,
    icon: Option<MarkerIcon>,
}

#[derive(Debug, Default)]
struct TextMapState {
    view: Option<MapView>,
    markers: BTreeMap<u64, TextMarker>,
    next_id: u64,
}

fn lock(state: &Mutex<TextMapState>) -> MutexGuard<'_, TextMapState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

pub(crate) struct TextMap {
    state: Arc<Mutex<TextMapState>>,
}

/// Read side of a [`TextMap`] that stays with the caller after the widget
/// is handed to the map surface.
#[derive(Clone)]
pub(crate) struct TextMapReader {
    state: Arc<Mutex<TextMapState>>,
}

impl TextMap {
    pub(crate) fn new() -> (Self, TextMapReader) {
        let state = Arc::new(Mutex::new(TextMapState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            TextMapReader { state },
        )
    }
}

impl MapWidget for TextMap {
    fn create(&mut self, container_id: &str, center: Coordinate, zoom: u8) -> Result<(), MapError> {
        if container_id != CONTAINER_ID {
            return Err(MapError::ContainerNotFound(container_id.to_string()));
        }
        lock(&self.state).view = Some(MapView { center, zoom });
        Ok(())
    }

    fn add_marker(
        &mut self,
        position: Coordinate,
        options: &MarkerOptions,
    ) -> Result<MarkerHandle, MapError> {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.markers.insert(
            id,
            TextMarker {
                position,
                title: options.title.clone(),
                icon: options.icon.clone(),
            },
        );
        Ok(MarkerHandle(id))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        lock(&self.state).markers.remove(&marker.0);
    }

    fn set_marker_icon(&mut self, marker: MarkerHandle, icon: &MarkerIcon) {
        if let Some(m) = lock(&self.state).markers.get_mut(&marker.0) {
            m.icon = Some(icon.clone());
        }
    }

    fn set_center(&mut self, center: Coordinate, zoom: Option<u8>) {
        let mut state = lock(&self.state);
        if let Some(view) = state.view.as_mut() {
            view.center = center;
            if let Some(z) = zoom {
                view.zoom = z;
            }
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds, options: &FitOptions) {
        let (Some(center), Some(sw), Some(ne)) =
            (bounds.center(), bounds.south_west(), bounds.north_east())
        else {
            return;
        };
        let span = (ne.lat() - sw.lat()).max(ne.lng() - sw.lng());
        let max_zoom = options.max_zoom.unwrap_or(MAX_FIT_ZOOM);
        let mut state = lock(&self.state);
        if let Some(view) = state.view.as_mut() {
            view.center = center;
            view.zoom = zoom_for_span(span).min(max_zoom);
        }
    }

    fn view(&self) -> Option<MapView> {
        lock(&self.state).view
    }
}

/// Web-mercator style zoom: each level halves the visible span of 360°.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn zoom_for_span(span_degrees: f64) -> u8 {
    if span_degrees <= 0.0 {
        return MAX_FIT_ZOOM;
    }
    (360.0 / span_degrees)
        .log2()
        .floor()
        .clamp(0.0, f64::from(MAX_FIT_ZOOM)) as u8
}

impl TextMapReader {
    pub(crate) fn render(&self) -> String {
        let state = lock(&self.state);
        let mut out = String::new();
        match state.view {
            Some(view) => {
                let _ = writeln!(out, "map: center {} zoom {}", view.center, view.zoom);
            }
            None => {
                let _ = writeln!(out, "map: not loaded");
                return out;
            }
        }
        let highlight = create_marker_icons().highlighted;
        for (id, marker) in &state.markers {
            let highlighted = marker.icon.as_ref() == Some(&highlight);
            let _ = writeln!(
                out,
                "  [{id}] {}{} @ {}",
                marker.title.as_deref().unwrap_or("marker"),
                if highlighted { " *" } else { "" },
                marker.position
            );
        }
        out
    }
}

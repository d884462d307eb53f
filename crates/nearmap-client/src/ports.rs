//! Traits for the collaborators the coordination core drives but does not
//! own: the map widget and the list/label view. Front ends implement them.

use nearmap_core::{Bounds, Business, Coordinate, MarkerIcon, UiRegion};

use crate::error::MapError;

/// Opaque widget-assigned marker identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Opaque view-assigned list row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(pub usize);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerOptions {
    pub title: Option<String>,
    pub label: Option<String>,
    pub icon: Option<MarkerIcon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    pub padding_px: u32,
    /// Upper zoom bound so a single marker does not zoom to street level.
    pub max_zoom: Option<u8>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding_px: 50,
            max_zoom: Some(16),
        }
    }
}

/// Current camera position of the widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

/// A single map widget instance.
pub trait MapWidget: Send {
    /// Mounts the widget into `container_id`.
    ///
    /// # Errors
    ///
    /// [`MapError::ContainerNotFound`] when the container does not exist.
    fn create(&mut self, container_id: &str, center: Coordinate, zoom: u8) -> Result<(), MapError>;

    /// # Errors
    ///
    /// Returns [`MapError`] if the widget cannot place the marker.
    fn add_marker(
        &mut self,
        position: Coordinate,
        options: &MarkerOptions,
    ) -> Result<MarkerHandle, MapError>;

    fn remove_marker(&mut self, marker: MarkerHandle);

    fn set_marker_icon(&mut self, marker: MarkerHandle, icon: &MarkerIcon);

    fn set_center(&mut self, center: Coordinate, zoom: Option<u8>);

    /// Only called with non-empty bounds.
    fn fit_bounds(&mut self, bounds: &Bounds, options: &FitOptions);

    fn view(&self) -> Option<MapView>;
}

/// The non-map UI: location label, result list, messages.
pub trait AppView: Send + Sync {
    fn show_location_label(&self, text: &str);

    /// Renders one row per business, in order, returning their handles.
    fn render_businesses(&self, businesses: &[Business]) -> Vec<RowHandle>;

    fn show_no_results(&self);

    /// Replaces `region` with a short, non-technical message.
    fn show_error(&self, region: UiRegion, message: &str);

    fn focus_search_input(&self);

    fn set_row_highlight(&self, row: RowHandle, highlighted: bool);

    fn open_url(&self, url: &str);
}

/// Where a pointer event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionTarget {
    Marker(MarkerHandle),
    Row(RowHandle),
    /// A link element embedded in a row. It navigates on its own.
    RowLink(RowHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    HoverStart(InteractionTarget),
    HoverEnd(InteractionTarget),
    Click(InteractionTarget),
}

//! Client-side coordination core: map surface, location and business
//! resolution, and the orchestration that sequences them.

pub mod business;
pub mod error;
pub mod location;
pub mod map_surface;
pub mod orchestrator;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use business::{
    create_marker_icons, BusinessResolver, BusinessState, InteractionScope, MarkerBindings,
    MarkerIcons, MarkerInfo, DEFAULT_RESULT_LIMIT,
};
pub use error::MapError;
pub use location::{location_from_place, LocationResolver, LocationState, UNKNOWN_POSTAL_CODE};
pub use map_surface::{MapState, MapSurface, MarkerRole, MarkerScope, PlacedMarker};
pub use orchestrator::{AppState, CycleOutcome, Orchestrator, OrchestratorSettings};
pub use ports::{
    AppView, FitOptions, InteractionEvent, InteractionTarget, MapView, MapWidget, MarkerHandle,
    MarkerOptions, RowHandle,
};

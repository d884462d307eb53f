//! Owner of the single map widget and its marker collections.
//!
//! Every operation is safe to call in any state: calls before
//! [`MapSurface::initialize`] fail with [`MapError::NotInitialized`] and
//! leave the surface in [`MapState::Error`], from which the next successful
//! call returns to [`MapState::Ready`].

use std::sync::{Mutex, MutexGuard};

use nearmap_core::{Bounds, Coordinate, MarkerIcon};
use tokio::sync::watch;

use crate::error::MapError;
use crate::ports::{FitOptions, MapView, MapWidget, MarkerHandle, MarkerOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapState {
    Uninitialized,
    Initializing,
    Ready,
    Updating,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerRole {
    User,
    Business,
}

/// Which markers [`MapSurface::clear_markers`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerScope {
    All,
    Role(MarkerRole),
}

impl MarkerScope {
    fn includes(self, role: MarkerRole) -> bool {
        match self {
            MarkerScope::All => true,
            MarkerScope::Role(r) => r == role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedMarker {
    pub handle: MarkerHandle,
    pub position: Coordinate,
    pub role: MarkerRole,
}

struct Surface {
    widget: Box<dyn MapWidget>,
    initialized: bool,
    /// Insertion order across both roles.
    markers: Vec<PlacedMarker>,
}

pub struct MapSurface {
    surface: Mutex<Surface>,
    state: watch::Sender<MapState>,
}

impl MapSurface {
    #[must_use]
    pub fn new(widget: Box<dyn MapWidget>) -> Self {
        let (state, _) = watch::channel(MapState::Uninitialized);
        Self {
            surface: Mutex::new(Surface {
                widget,
                initialized: false,
                markers: Vec::new(),
            }),
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> MapState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MapState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: MapState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::trace!(?prev, ?next, "map state");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Surface> {
        self.surface
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mounts the widget. A second call on an initialized surface is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::ContainerNotFound`] (state becomes `Error`) when
    /// the widget cannot mount.
    pub fn initialize(&self, container_id: &str, center: Coordinate, zoom: u8) -> Result<(), MapError> {
        let mut surface = self.lock();
        if surface.initialized {
            tracing::debug!(container_id, "map already initialized");
            return Ok(());
        }

        self.set_state(MapState::Initializing);
        match surface.widget.create(container_id, center, zoom) {
            Ok(()) => {
                surface.initialized = true;
                self.set_state(MapState::Ready);
                tracing::info!(container_id, %center, zoom, "map initialized");
                Ok(())
            }
            Err(e) => {
                self.set_state(MapState::Error);
                tracing::error!(container_id, error = %e, "map initialization failed");
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Runs `op` on an initialized widget, bracketed by `Updating`.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Surface) -> Result<T, MapError>,
    ) -> Result<T, MapError> {
        let mut surface = self.lock();
        if !surface.initialized {
            self.set_state(MapState::Error);
            return Err(MapError::NotInitialized);
        }
        self.set_state(MapState::Updating);
        let result = op(&mut surface);
        self.set_state(if result.is_ok() {
            MapState::Ready
        } else {
            MapState::Error
        });
        result
    }

    /// # Errors
    ///
    /// [`MapError::NotInitialized`] before `initialize`, or the widget's
    /// own error.
    pub fn add_marker(
        &self,
        position: Coordinate,
        options: &MarkerOptions,
        role: MarkerRole,
    ) -> Result<MarkerHandle, MapError> {
        self.mutate(|surface| {
            let handle = surface.widget.add_marker(position, options)?;
            surface.markers.push(PlacedMarker {
                handle,
                position,
                role,
            });
            tracing::debug!(?role, %position, "marker added");
            Ok(handle)
        })
    }

    /// Removes every tracked marker in `scope`. Clearing an empty set, or
    /// clearing before initialization, is a no-op.
    pub fn clear_markers(&self, scope: MarkerScope) {
        if !self.is_initialized() {
            return;
        }
        let cleared = self.mutate(|surface| {
            let Surface {
                widget, markers, ..
            } = surface;
            let before = markers.len();
            markers.retain(|m| {
                if scope.includes(m.role) {
                    widget.remove_marker(m.handle);
                    false
                } else {
                    true
                }
            });
            Ok(before - markers.len())
        });
        if let Ok(removed) = cleared {
            tracing::debug!(?scope, removed, "markers cleared");
        }
    }

    /// # Errors
    ///
    /// [`MapError::NotInitialized`] before `initialize`.
    pub fn set_marker_icon(&self, marker: MarkerHandle, icon: &MarkerIcon) -> Result<(), MapError> {
        self.mutate(|surface| {
            surface.widget.set_marker_icon(marker, icon);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// [`MapError::NotInitialized`] before `initialize`.
    pub fn set_center(&self, center: Coordinate, zoom: Option<u8>) -> Result<(), MapError> {
        self.mutate(|surface| {
            surface.widget.set_center(center, zoom);
            Ok(())
        })
    }

    #[must_use]
    pub fn create_bounds(positions: &[Coordinate]) -> Bounds {
        Bounds::from_coordinates(positions)
    }

    /// Fits the view to `bounds`. Returns `Ok(false)` without touching the
    /// map when `bounds` is empty.
    ///
    /// # Errors
    ///
    /// [`MapError::NotInitialized`] before `initialize`.
    pub fn fit_bounds(&self, bounds: &Bounds, options: &FitOptions) -> Result<bool, MapError> {
        if bounds.is_empty() {
            tracing::debug!("ignoring fit to empty bounds");
            return Ok(false);
        }
        self.mutate(|surface| {
            surface.widget.fit_bounds(bounds, options);
            Ok(true)
        })
    }

    #[must_use]
    pub fn view(&self) -> Option<MapView> {
        let surface = self.lock();
        if surface.initialized {
            surface.widget.view()
        } else {
            None
        }
    }

    /// Tracked markers in `scope`, in insertion order.
    #[must_use]
    pub fn markers(&self, scope: MarkerScope) -> Vec<PlacedMarker> {
        self.lock()
            .markers
            .iter()
            .filter(|m| scope.includes(m.role))
            .copied()
            .collect()
    }
}

#[cfg(test)]
#[path = "map_surface_test.rs"]
mod tests;

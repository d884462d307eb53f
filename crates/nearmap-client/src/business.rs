//! Nearby business lookup and the marker/list-row bindings that keep hover
//! highlights and click navigation in sync.

use std::sync::{Arc, Mutex, MutexGuard};

use nearmap_core::{Business, Coordinate, MarkerIcon};
use nearmap_providers::PlaceProvider;
use tokio::sync::watch;

use crate::map_surface::MapSurface;
use crate::ports::{AppView, InteractionEvent, InteractionTarget, MarkerHandle, RowHandle};

pub const DEFAULT_RESULT_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessState {
    Idle,
    Searching,
    Ready,
    Error,
    /// Held only while a hover or click handler runs.
    Interacting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerIcons {
    pub default: MarkerIcon,
    pub highlighted: MarkerIcon,
}

/// The two visual states of a business marker.
#[must_use]
pub fn create_marker_icons() -> MarkerIcons {
    MarkerIcons {
        default: MarkerIcon {
            fill_color: "#EA4335".to_string(),
            stroke_color: "#B31412".to_string(),
            scale: 8.0,
            z_index: 1,
        },
        highlighted: MarkerIcon {
            fill_color: "#FBBC04".to_string(),
            stroke_color: "#E37400".to_string(),
            scale: 11.0,
            z_index: 999,
        },
    }
}

pub struct BusinessResolver {
    provider: Arc<dyn PlaceProvider>,
    state: watch::Sender<BusinessState>,
}

impl BusinessResolver {
    #[must_use]
    pub fn new(provider: Arc<dyn PlaceProvider>) -> Self {
        let (state, _) = watch::channel(BusinessState::Idle);
        Self { provider, state }
    }

    #[must_use]
    pub fn state(&self) -> BusinessState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BusinessState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: BusinessState) -> BusinessState {
        self.state.send_replace(next)
    }

    /// Up to `limit` businesses near `coord`. A provider failure is logged
    /// and reported as an empty list; the caller cannot tell it apart from
    /// zero results.
    pub async fn get_nearby_businesses(&self, coord: Coordinate, limit: usize) -> Vec<Business> {
        self.set_state(BusinessState::Searching);
        let businesses = match self.provider.nearby(coord, limit).await {
            Ok(mut found) => {
                found.truncate(limit);
                tracing::info!(
                    provider = self.provider.name(),
                    %coord,
                    count = found.len(),
                    "nearby businesses resolved"
                );
                found
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    %coord,
                    error = %e,
                    "business search failed; showing no results"
                );
                Vec::new()
            }
        };
        self.set_state(BusinessState::Ready);
        businesses
    }

    /// Enters [`BusinessState::Interacting`] until the returned scope drops.
    #[must_use]
    pub fn begin_interaction(&self) -> InteractionScope<'_> {
        let previous = self.set_state(BusinessState::Interacting);
        InteractionScope {
            resolver: self,
            previous,
        }
    }
}

/// Restores the pre-interaction business state on every exit path.
pub struct InteractionScope<'a> {
    resolver: &'a BusinessResolver,
    previous: BusinessState,
}

impl Drop for InteractionScope<'_> {
    fn drop(&mut self) {
        self.resolver.set_state(self.previous);
    }
}

/// Joins a map marker with its list row.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInfo {
    pub marker: MarkerHandle,
    pub row: RowHandle,
    pub default_icon: MarkerIcon,
    pub highlighted_icon: MarkerIcon,
    pub business: Business,
}

struct Binding {
    info: MarkerInfo,
    hover: bool,
    navigate: bool,
}

/// Hover and click wiring for the rendered businesses. Cleared together
/// with the business markers.
#[derive(Default)]
pub struct MarkerBindings {
    bindings: Mutex<Vec<Binding>>,
}

impl MarkerBindings {
    fn lock(&self) -> MutexGuard<'_, Vec<Binding>> {
        self.bindings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn upsert(&self, info: &MarkerInfo, apply: impl FnOnce(&mut Binding)) {
        let mut bindings = self.lock();
        if let Some(existing) = bindings.iter_mut().find(|b| b.info.marker == info.marker) {
            apply(existing);
        } else {
            let mut binding = Binding {
                info: info.clone(),
                hover: false,
                navigate: false,
            };
            apply(&mut binding);
            bindings.push(binding);
        }
    }

    /// Hovering either the marker or the row highlights both.
    pub fn setup_hover_sync(&self, info: &MarkerInfo) {
        self.upsert(info, |b| b.hover = true);
    }

    /// Clicking the marker or the row opens the business website. No-op
    /// for businesses without one.
    pub fn setup_click_navigation(&self, info: &MarkerInfo) {
        if info.business.website.is_none() {
            return;
        }
        self.upsert(info, |b| b.navigate = true);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn find(&self, target: InteractionTarget) -> Option<(MarkerInfo, bool, bool)> {
        let bindings = self.lock();
        bindings
            .iter()
            .find(|b| match target {
                InteractionTarget::Marker(m) => b.info.marker == m,
                InteractionTarget::Row(r) | InteractionTarget::RowLink(r) => b.info.row == r,
            })
            .map(|b| (b.info.clone(), b.hover, b.navigate))
    }

    /// Routes a pointer event. Returns `false` for events with no bound
    /// target.
    pub fn dispatch(
        &self,
        event: InteractionEvent,
        resolver: &BusinessResolver,
        map: &MapSurface,
        view: &dyn AppView,
    ) -> bool {
        let (target, action) = match event {
            InteractionEvent::HoverStart(t) => (t, Action::Highlight(true)),
            InteractionEvent::HoverEnd(t) => (t, Action::Highlight(false)),
            InteractionEvent::Click(t) => (t, Action::Navigate),
        };
        let Some((info, hover, navigate)) = self.find(target) else {
            return false;
        };

        let _scope = resolver.begin_interaction();
        match action {
            Action::Highlight(on) if hover => set_highlight(&info, on, map, view),
            Action::Navigate if navigate => {
                // Embedded links navigate by themselves.
                if matches!(target, InteractionTarget::RowLink(_)) {
                    return true;
                }
                if let Some(url) = info.business.website.as_deref() {
                    tracing::debug!(id = %info.business.id, url, "opening business website");
                    view.open_url(url);
                }
            }
            _ => {}
        }
        true
    }
}

enum Action {
    Highlight(bool),
    Navigate,
}

/// The single effect both hover directions converge on.
pub fn set_highlight(info: &MarkerInfo, highlighted: bool, map: &MapSurface, view: &dyn AppView) {
    let icon = if highlighted {
        &info.highlighted_icon
    } else {
        &info.default_icon
    };
    if let Err(e) = map.set_marker_icon(info.marker, icon) {
        tracing::debug!(error = %e, "marker highlight skipped");
    }
    view.set_row_highlight(info.row, highlighted);
}

//! Map rendering abstraction
//!
//! One [`MapAdapter`] trait, two concrete variants selected once at
//! construction time from configuration: the managed host widget and the
//! self-hosted tile map. The orchestrator never branches on which variant
//! it holds.

mod loader;
mod managed;
mod tile;

pub use loader::{InstantLoader, LibraryBundle, LibraryLoader, LoadError};
pub use managed::{ManagedMapAdapter, ManagedMarker};
pub use tile::{BoundsFit, MarkerVisual, RenderedMarker, TileMapAdapter};

use crate::geo::LatLng;
use crate::marker::Marker;
use async_trait::async_trait;

/// Where the viewport should center.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCenter {
    Coordinates(LatLng),
    /// Address tuple; resolvable only by renderers with geocoding (the
    /// managed widget). The tile map ignores it and lets fit-bounds own
    /// the view.
    Address {
        street: String,
        city: String,
        state: String,
        postal_code: String,
        country: String,
    },
    /// Fit-to-bounds owns the view.
    Auto,
}

impl MapCenter {
    /// Centering precedence for a marker: coordinates win over address.
    pub fn for_marker(marker: &Marker) -> Self {
        if let Some(coords) = marker.coordinates() {
            return Self::Coordinates(LatLng::from(coords));
        }
        if marker.has_address() {
            return Self::Address {
                street: marker.street.clone(),
                city: marker.city.clone(),
                state: marker.state.clone(),
                postal_code: marker.postal_code.clone(),
                country: marker.country.clone(),
            };
        }
        Self::Auto
    }
}

/// Interaction events flowing from the rendering surface back to the
/// orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A rendered marker was clicked; reports its position in the visible
    /// list and its id.
    MarkerClicked { index: usize, id: String },
    /// A marker drag finished.
    MarkerDragged {
        id: String,
        original: LatLng,
        new: LatLng,
    },
}

/// Capability set both renderer variants implement.
#[async_trait]
pub trait MapAdapter: Send + Sync {
    /// Prepare the rendering surface. Idempotent: repeat calls after a
    /// successful initialization are no-ops.
    async fn initialize(&mut self) -> Result<(), LoadError>;

    fn is_initialized(&self) -> bool;

    /// Clear-then-rebuild the marker layer from the visible set. Markers
    /// without coordinates are handled per variant (the managed widget can
    /// geocode addresses; the tile map skips them silently).
    fn render_markers(&mut self, markers: &[Marker]);

    fn set_center(&mut self, center: MapCenter, zoom: u8);

    fn set_zoom(&mut self, zoom: u8);

    /// Mark a rendered marker as the current selection.
    fn select(&mut self, marker_id: &str);

    /// Fit the viewport to all markers with valid coordinates; no-op when
    /// none qualify.
    fn fit_bounds(&mut self, markers: &[Marker]);

    /// Install a read-only styled GeoJSON overlay. Renderers without an
    /// overlay layer ignore it.
    fn set_overlay(&mut self, _document: serde_json::Value) {}

    fn supports_clustering(&self) -> bool {
        false
    }

    fn supports_drawing(&self) -> bool {
        false
    }
}

//! Managed map widget adapter
//!
//! Delegates rendering, selection highlighting, and address geocoding to a
//! pre-built widget supplied by the hosting platform. The adapter's job is
//! to keep a declarative marker list and the bound selected value in sync,
//! and to translate the widget's selection-changed callback into a
//! [`MapEvent`]. No clustering, no drawing.

use super::{LoadError, MapAdapter, MapCenter, MapEvent};
use crate::config::{MarkerKind, MarkerStyle};
use crate::marker::Marker;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One entry of the declarative list handed to the widget. Address parts
/// are passed through so the widget can geocode markers without
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedMarker {
    pub value: String,
    pub title: String,
    pub description: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub icon: String,
}

pub struct ManagedMapAdapter {
    style: MarkerStyle,
    events: mpsc::UnboundedSender<MapEvent>,
    initialized: bool,
    markers: Vec<ManagedMarker>,
    selected_value: Option<String>,
    center: Option<MapCenter>,
    zoom: Option<u8>,
}

impl ManagedMapAdapter {
    pub fn new(style: MarkerStyle, events: mpsc::UnboundedSender<MapEvent>) -> Self {
        Self {
            style,
            events,
            initialized: false,
            markers: Vec::new(),
            selected_value: None,
            center: None,
            zoom: None,
        }
    }

    /// The declarative list currently bound to the widget.
    pub fn markers(&self) -> &[ManagedMarker] {
        &self.markers
    }

    /// The bound selected value.
    pub fn selected_value(&self) -> Option<&str> {
        self.selected_value.as_deref()
    }

    /// The center last handed to the widget. Address centers are passed
    /// through untouched; the widget geocodes them itself.
    pub fn center(&self) -> Option<&MapCenter> {
        self.center.as_ref()
    }

    /// Entry point for the widget's selection-changed callback.
    pub fn selection_changed(&mut self, value: &str) {
        if let Some(index) = self.markers.iter().position(|m| m.value == value) {
            let _ = self.events.send(MapEvent::MarkerClicked {
                index,
                id: value.to_string(),
            });
        }
    }

    fn icon_for(&self, marker: &Marker) -> String {
        if self.style.marker_type == MarkerKind::CustomIcon {
            if let Some(icon) = marker
                .custom_icon
                .clone()
                .or_else(|| self.style.custom_icon_svg.clone())
            {
                return icon;
            }
        }
        "standard:location".to_string()
    }
}

#[async_trait]
impl MapAdapter for ManagedMapAdapter {
    async fn initialize(&mut self) -> Result<(), LoadError> {
        // The widget loads its own engine; nothing to await here.
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn render_markers(&mut self, markers: &[Marker]) {
        self.markers = markers
            .iter()
            .map(|m| ManagedMarker {
                value: m.id.clone(),
                title: m.title.clone(),
                description: m.description.clone(),
                latitude: m.latitude,
                longitude: m.longitude,
                street: m.street.clone(),
                city: m.city.clone(),
                state: m.state.clone(),
                postal_code: m.postal_code.clone(),
                country: m.country.clone(),
                icon: self.icon_for(m),
            })
            .collect();
    }

    fn set_center(&mut self, center: MapCenter, zoom: u8) {
        self.center = Some(center);
        self.zoom = Some(zoom);
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = Some(zoom);
    }

    fn select(&mut self, marker_id: &str) {
        self.selected_value = Some(marker_id.to_string());
    }

    fn fit_bounds(&mut self, _markers: &[Marker]) {
        // The widget owns its viewport and auto-fits to the marker list.
    }
}

//! Self-hosted tile map adapter
//!
//! Owns the map instance outright: base tile layer, marker layer (or
//! cluster layer), selection, and the rendered marker primitives. The
//! engine and optional plugin bundles load sequentially before the map is
//! constructed; construction happens once per component lifetime.

use super::loader::{LibraryBundle, LibraryLoader, LoadError};
use super::{MapAdapter, MapCenter, MapEvent};
use crate::config::{ClusterConfig, MapConfig, MarkerKind, MarkerStyle};
use crate::geo::{LatLng, LatLngBounds};
use crate::marker::Marker;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_ATTRIBUTION: &str = "© OpenStreetMap contributors";
/// Viewport padding applied when fitting bounds, in pixels.
pub const FIT_BOUNDS_PADDING: u32 = 50;

/// Built-in icon used when a custom-icon marker carries no markup.
const FALLBACK_ICON_SVG: &str = r##"<svg viewBox="0 0 25 41" xmlns="http://www.w3.org/2000/svg"><path d="M12.5 0C5.6 0 0 5.6 0 12.5 0 21.9 12.5 41 12.5 41S25 21.9 25 12.5C25 5.6 19.4 0 12.5 0z" fill="#2A81CB"/><circle cx="12.5" cy="12.5" r="5" fill="#fff"/></svg>"##;

/// How one marker is drawn on the tile map.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerVisual {
    Circle {
        radius: f64,
        fill_color: String,
        fill_opacity: f64,
        stroke_color: String,
        stroke_width: f64,
    },
    Icon {
        markup: String,
        /// Icon box edge in pixels (32 × scale).
        size: f64,
        /// True when no markup was supplied and the built-in icon is used.
        fallback: bool,
    },
    Pin {
        fill_color: String,
        stroke_color: String,
    },
}

impl MarkerVisual {
    /// Inline markup for DOM-based render surfaces. Circles render on the
    /// vector layer and have no markup.
    pub fn html(&self) -> Option<String> {
        match self {
            Self::Circle { .. } => None,
            Self::Icon { markup, .. } => Some(markup.clone()),
            Self::Pin {
                fill_color,
                stroke_color,
            } => Some(format!(
                r#"<div style="background-color:{fill_color};width:24px;height:24px;border-radius:50% 50% 50% 0;border:2px solid {stroke_color};transform:rotate(-45deg);"></div>"#
            )),
        }
    }
}

/// One rendering primitive on the marker layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    /// Position in the visible marker list (what the click handler reports).
    pub index: usize,
    pub id: String,
    pub position: LatLng,
    pub visual: MarkerVisual,
    pub draggable: bool,
    /// Popup markup, when the marker has a title or description.
    pub popup: Option<String>,
}

/// A requested fit-to-bounds, consumed by the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsFit {
    pub bounds: LatLngBounds,
    /// Viewport padding in pixels.
    pub padding: u32,
}

/// Map state constructed once in phase two of initialization.
struct TileMap {
    center: LatLng,
    zoom: u8,
    tile_url: String,
    attribution: String,
    /// Cluster-layer options, present when clustering is enabled.
    cluster: Option<ClusterConfig>,
    markers: Vec<RenderedMarker>,
    selected: Option<String>,
    /// Explicit configured center rendered as its own pin.
    center_pin: Option<LatLng>,
    /// Read-only styled GeoJSON layer; never part of the editable shapes.
    overlay: Option<serde_json::Value>,
    fit: Option<BoundsFit>,
}

pub struct TileMapAdapter {
    loader: Arc<dyn LibraryLoader>,
    style: MarkerStyle,
    clustering: ClusterConfig,
    drawing_enabled: bool,
    drag_enabled: bool,
    tile_url: String,
    attribution: String,
    initial_center: Option<LatLng>,
    display_center_pin: bool,
    zoom: u8,
    events: mpsc::UnboundedSender<MapEvent>,
    map: Option<TileMap>,
}

impl TileMapAdapter {
    pub fn from_config(
        config: &MapConfig,
        loader: Arc<dyn LibraryLoader>,
        events: mpsc::UnboundedSender<MapEvent>,
    ) -> Self {
        Self {
            loader,
            style: config.marker_style.clone(),
            clustering: config.clustering.clone(),
            drawing_enabled: config.drawing.enabled,
            drag_enabled: config.enable_marker_drag,
            tile_url: config
                .tile_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TILE_URL.to_string()),
            attribution: config
                .tile_attribution
                .clone()
                .unwrap_or_else(|| DEFAULT_ATTRIBUTION.to_string()),
            initial_center: config.center.coordinates().map(LatLng::from),
            display_center_pin: config.center.display_as_marker,
            zoom: config.zoom(),
            events,
            map: None,
        }
    }

    /// Rendered primitives on the active marker layer.
    pub fn rendered_markers(&self) -> &[RenderedMarker] {
        self.map.as_ref().map(|m| m.markers.as_slice()).unwrap_or(&[])
    }

    pub fn center(&self) -> Option<LatLng> {
        self.map.as_ref().map(|m| m.center)
    }

    pub fn zoom(&self) -> Option<u8> {
        self.map.as_ref().map(|m| m.zoom)
    }

    pub fn selected(&self) -> Option<&str> {
        self.map.as_ref().and_then(|m| m.selected.as_deref())
    }

    pub fn tile_url(&self) -> Option<&str> {
        self.map.as_ref().map(|m| m.tile_url.as_str())
    }

    pub fn attribution(&self) -> Option<&str> {
        self.map.as_ref().map(|m| m.attribution.as_str())
    }

    pub fn is_clustered(&self) -> bool {
        self.map.as_ref().is_some_and(|m| m.cluster.is_some())
    }

    /// Options for the active cluster layer, when clustering is enabled.
    pub fn cluster_options(&self) -> Option<&ClusterConfig> {
        self.map.as_ref().and_then(|m| m.cluster.as_ref())
    }

    pub fn center_pin(&self) -> Option<LatLng> {
        self.map.as_ref().and_then(|m| m.center_pin)
    }

    /// The installed read-only GeoJSON overlay.
    pub fn overlay(&self) -> Option<&serde_json::Value> {
        self.map.as_ref().and_then(|m| m.overlay.as_ref())
    }

    /// The last requested fit-to-bounds, for the render surface to apply.
    pub fn bounds_fit(&self) -> Option<BoundsFit> {
        self.map.as_ref().and_then(|m| m.fit)
    }

    /// Click handler bound to every rendered marker.
    pub fn click_marker(&self, id: &str) {
        if let Some(marker) = self.rendered_markers().iter().find(|m| m.id == id) {
            let _ = self.events.send(MapEvent::MarkerClicked {
                index: marker.index,
                id: marker.id.clone(),
            });
        }
    }

    /// Drag-end handler; only bound when dragging is enabled.
    pub fn drag_marker(&mut self, id: &str, new: LatLng) {
        if !self.drag_enabled {
            return;
        }
        let Some(map) = self.map.as_mut() else { return };
        if let Some(marker) = map.markers.iter_mut().find(|m| m.id == id) {
            let original = marker.position;
            marker.position = new;
            let _ = self.events.send(MapEvent::MarkerDragged {
                id: id.to_string(),
                original,
                new,
            });
        }
    }

    fn visual_for(&self, marker: &Marker) -> MarkerVisual {
        match self.style.marker_type {
            MarkerKind::Circle => MarkerVisual::Circle {
                radius: self.style.radius * self.style.scale,
                fill_color: self.style.fill_color.clone(),
                fill_opacity: self.style.fill_opacity,
                stroke_color: self.style.stroke_color.clone(),
                stroke_width: self.style.stroke_width,
            },
            MarkerKind::CustomIcon => {
                let markup = marker
                    .custom_icon
                    .clone()
                    .or_else(|| self.style.custom_icon_svg.clone());
                match markup {
                    Some(markup) => MarkerVisual::Icon {
                        markup,
                        size: 32.0 * self.style.scale,
                        fallback: false,
                    },
                    None => MarkerVisual::Icon {
                        markup: FALLBACK_ICON_SVG.to_string(),
                        size: 32.0 * self.style.scale,
                        fallback: true,
                    },
                }
            }
            MarkerKind::Default => MarkerVisual::Pin {
                fill_color: self.style.fill_color.clone(),
                stroke_color: self.style.stroke_color.clone(),
            },
        }
    }

    fn popup_for(marker: &Marker) -> Option<String> {
        if marker.title.is_empty() && marker.description.is_empty() {
            return None;
        }
        let mut popup = format!("<strong>{}</strong>", marker.title);
        if !marker.description.is_empty() {
            popup.push_str(&format!("<p>{}</p>", marker.description));
        }
        if !marker.address.is_empty() {
            popup.push_str(&format!(r#"<p class="address">{}</p>"#, marker.address));
        }
        Some(popup)
    }
}

#[async_trait]
impl MapAdapter for TileMapAdapter {
    /// Phase one: load the engine bundle, then each enabled plugin bundle,
    /// sequentially — all must succeed before the map exists. Phase two:
    /// construct the map and its layers, exactly once.
    async fn initialize(&mut self) -> Result<(), LoadError> {
        if self.map.is_some() {
            return Ok(());
        }

        self.loader.load(LibraryBundle::MapEngine).await?;
        if self.clustering.enabled {
            self.loader.load(LibraryBundle::Clustering).await?;
        }
        if self.drawing_enabled {
            self.loader.load(LibraryBundle::Drawing).await?;
        }

        self.map = Some(TileMap {
            center: self.initial_center.unwrap_or(LatLng::new(0.0, 0.0)),
            zoom: self.zoom,
            tile_url: self.tile_url.clone(),
            attribution: self.attribution.clone(),
            cluster: self.clustering.enabled.then(|| self.clustering.clone()),
            markers: Vec::new(),
            selected: None,
            center_pin: self
                .display_center_pin
                .then_some(self.initial_center)
                .flatten(),
            overlay: None,
            fit: None,
        });
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.map.is_some()
    }

    fn render_markers(&mut self, markers: &[Marker]) {
        let rendered: Vec<RenderedMarker> = markers
            .iter()
            .enumerate()
            .filter_map(|(index, m)| {
                // No coordinates, no primitive — not an error.
                let (lat, lng) = m.coordinates()?;
                Some(RenderedMarker {
                    index,
                    id: m.id.clone(),
                    position: LatLng::new(lat, lng),
                    visual: self.visual_for(m),
                    draggable: self.drag_enabled,
                    popup: Self::popup_for(m),
                })
            })
            .collect();

        if let Some(map) = self.map.as_mut() {
            map.markers = rendered;
        }
    }

    fn set_center(&mut self, center: MapCenter, zoom: u8) {
        let Some(map) = self.map.as_mut() else { return };
        match center {
            MapCenter::Coordinates(point) => {
                map.center = point;
                map.zoom = zoom;
            }
            // No geocoder here; fit-bounds keeps owning the view.
            MapCenter::Address { .. } | MapCenter::Auto => {}
        }
    }

    fn set_zoom(&mut self, zoom: u8) {
        if let Some(map) = self.map.as_mut() {
            map.zoom = zoom;
        }
    }

    fn select(&mut self, marker_id: &str) {
        if let Some(map) = self.map.as_mut() {
            map.selected = Some(marker_id.to_string());
        }
    }

    fn fit_bounds(&mut self, markers: &[Marker]) {
        let Some(map) = self.map.as_mut() else { return };
        let points = markers
            .iter()
            .filter_map(Marker::coordinates)
            .map(LatLng::from);
        if let Some(bounds) = LatLngBounds::from_points(points) {
            map.center = bounds.center();
            map.fit = Some(BoundsFit {
                bounds,
                padding: FIT_BOUNDS_PADDING,
            });
        }
    }

    fn set_overlay(&mut self, document: serde_json::Value) {
        if let Some(map) = self.map.as_mut() {
            map.overlay = Some(document);
        }
    }

    fn supports_clustering(&self) -> bool {
        true
    }

    fn supports_drawing(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::normalize;
    use serde_json::json;

    struct FailingLoader(LibraryBundle);

    #[async_trait]
    impl LibraryLoader for FailingLoader {
        async fn load(&self, bundle: LibraryBundle) -> Result<(), LoadError> {
            if bundle == self.0 {
                Err(LoadError::new(bundle, "network unreachable"))
            } else {
                Ok(())
            }
        }
    }

    fn adapter_with(config: MapConfig) -> (TileMapAdapter, mpsc::UnboundedReceiver<MapEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            TileMapAdapter::from_config(&config, Arc::new(super::super::InstantLoader), tx),
            rx,
        )
    }

    fn sample_markers() -> Vec<Marker> {
        normalize(&[
            json!({"id": "1", "name": "A", "lat": 10.0, "lng": 20.0}),
            json!({"id": "2", "name": "B", "lat": 30.0, "lng": 40.0}),
            json!({"id": "3", "name": "NoCoords", "City": "Berlin"}),
        ])
    }

    #[tokio::test]
    async fn initialization_is_idempotent() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        assert_eq!(a.rendered_markers().len(), 2);

        // A second initialize must not rebuild the map.
        a.initialize().await.unwrap();
        assert_eq!(a.rendered_markers().len(), 2);
    }

    #[tokio::test]
    async fn plugin_load_failure_aborts_without_map() {
        let mut config = MapConfig::default();
        config.clustering.enabled = true;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut a = TileMapAdapter::from_config(
            &config,
            Arc::new(FailingLoader(LibraryBundle::Clustering)),
            tx,
        );
        let err = a.initialize().await.unwrap_err();
        assert_eq!(err.bundle, LibraryBundle::Clustering);
        assert!(!a.is_initialized());
    }

    #[tokio::test]
    async fn drawing_bundle_loads_only_when_enabled() {
        let (tx, _rx) = mpsc::unbounded_channel();
        // Drawing disabled: a loader that would fail on the drawing bundle
        // is never asked for it.
        let mut a = TileMapAdapter::from_config(
            &MapConfig::default(),
            Arc::new(FailingLoader(LibraryBundle::Drawing)),
            tx,
        );
        a.initialize().await.unwrap();
        assert!(a.is_initialized());
    }

    #[tokio::test]
    async fn markers_without_coordinates_are_skipped_silently() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        let ids: Vec<&str> = a.rendered_markers().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn rerender_clears_then_rebuilds() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        let markers = sample_markers();
        a.render_markers(&markers);
        a.render_markers(&markers[..1]);
        assert_eq!(a.rendered_markers().len(), 1);
    }

    #[tokio::test]
    async fn fit_bounds_centers_on_bounding_box_with_padding() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        let markers = sample_markers();
        a.fit_bounds(&markers);
        assert_eq!(a.center(), Some(LatLng::new(20.0, 30.0)));

        let fit = a.bounds_fit().unwrap();
        assert_eq!(fit.padding, FIT_BOUNDS_PADDING);
        assert_eq!(fit.bounds.south_west, LatLng::new(10.0, 20.0));
        assert_eq!(fit.bounds.north_east, LatLng::new(30.0, 40.0));
    }

    #[tokio::test]
    async fn fit_bounds_without_valid_coordinates_is_a_noop() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        let before = a.center();
        let markers = normalize(&[json!({"id": "x", "City": "Berlin"})]);
        a.fit_bounds(&markers);
        assert_eq!(a.center(), before);
        assert_eq!(a.bounds_fit(), None);
    }

    #[tokio::test]
    async fn cluster_layer_carries_the_configured_options() {
        let mut config = MapConfig::default();
        config.clustering.enabled = true;
        config.clustering.max_cluster_radius = 120;
        config.clustering.show_coverage_on_hover = true;
        config.clustering.disable_clustering_at_zoom = Some(15);
        let (mut a, _rx) = adapter_with(config);
        a.initialize().await.unwrap();

        assert!(a.is_clustered());
        let options = a.cluster_options().unwrap();
        assert_eq!(options.max_cluster_radius, 120);
        assert!(options.show_coverage_on_hover);
        assert_eq!(options.disable_clustering_at_zoom, Some(15));
    }

    #[tokio::test]
    async fn overlay_installs_independent_of_markers() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        assert_eq!(a.overlay(), None);

        let document = json!({"type": "FeatureCollection", "features": []});
        a.set_overlay(document.clone());
        a.render_markers(&sample_markers());
        // Re-renders clear the marker layer, never the overlay.
        assert_eq!(a.overlay(), Some(&document));
    }

    #[tokio::test]
    async fn click_reports_index_and_id() {
        let (mut a, mut rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        a.click_marker("2");
        assert_eq!(
            rx.try_recv().unwrap(),
            MapEvent::MarkerClicked {
                index: 1,
                id: "2".to_string()
            }
        );
    }

    #[tokio::test]
    async fn drag_reports_original_and_new_position() {
        let mut config = MapConfig::default();
        config.enable_marker_drag = true;
        let (mut a, mut rx) = adapter_with(config);
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());

        a.drag_marker("1", LatLng::new(11.0, 21.0));
        assert_eq!(
            rx.try_recv().unwrap(),
            MapEvent::MarkerDragged {
                id: "1".to_string(),
                original: LatLng::new(10.0, 20.0),
                new: LatLng::new(11.0, 21.0),
            }
        );
    }

    #[tokio::test]
    async fn drag_is_inert_when_disabled() {
        let (mut a, mut rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        a.drag_marker("1", LatLng::new(11.0, 21.0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn circle_visual_scales_radius() {
        let mut config = MapConfig::default();
        config.marker_style.marker_type = MarkerKind::Circle;
        config.marker_style.radius = 10.0;
        config.marker_style.scale = 2.0;
        let (mut a, _rx) = adapter_with(config);
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        match &a.rendered_markers()[0].visual {
            MarkerVisual::Circle { radius, .. } => assert_eq!(*radius, 20.0),
            other => panic!("expected circle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn custom_icon_without_markup_uses_fallback() {
        let mut config = MapConfig::default();
        config.marker_style.marker_type = MarkerKind::CustomIcon;
        let (mut a, _rx) = adapter_with(config);
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        match &a.rendered_markers()[0].visual {
            MarkerVisual::Icon { fallback, .. } => assert!(*fallback),
            other => panic!("expected icon, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn default_pin_markup_carries_configured_colors() {
        let (mut a, _rx) = adapter_with(MapConfig::default());
        a.initialize().await.unwrap();
        a.render_markers(&sample_markers());
        let html = a.rendered_markers()[0].visual.html().unwrap();
        assert!(html.contains("#EA4335"));
        assert!(html.contains("#C62828"));
    }

    #[tokio::test]
    async fn explicit_center_config_seeds_the_map() {
        let mut config = MapConfig::default();
        config.center.latitude = Some(52.5);
        config.center.longitude = Some(13.4);
        config.center.display_as_marker = true;
        let (mut a, _rx) = adapter_with(config);
        a.initialize().await.unwrap();
        assert_eq!(a.center(), Some(LatLng::new(52.5, 13.4)));
        assert_eq!(a.center_pin(), Some(LatLng::new(52.5, 13.4)));
    }
}

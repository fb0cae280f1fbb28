//! MapDataOrchestrator — the top-level coordinator
//!
//! Owns the canonical marker list, the filter state, selection and popup
//! state, the chosen map adapter, and (when drawing is enabled) the
//! DrawingController. Data flows load → normalize → filter → render; user
//! interaction flows back through [`MapEvent`]s into selection/drag
//! handling and out through the [`OutputSynchronizer`].
//!
//! Every error is local to the action that caused it: a failed load empties
//! the visible markers and captures one message, a failed library load
//! leaves the component mapless but alive, and nothing panics across the
//! public boundary.

use crate::adapter::{
    LibraryLoader, LoadError, ManagedMapAdapter, MapAdapter, MapCenter, MapEvent, TileMapAdapter,
};
use crate::config::{EngineKind, ListVisibility, MapConfig, SourceKind};
use crate::draw::{DrawError, DrawTool, DrawingController, ShapeGeometry};
use crate::filter::{self, FilterState};
use crate::geo::LatLng;
use crate::host::{DragResult, HostSink, Severity};
use crate::marker::{normalize, Marker};
use crate::storage::{DocumentStore, RecordSource};
use crate::sync::OutputSynchronizer;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One row of the marker list panel: the marker plus its recomputed
/// selection-highlight flag. The flag is derived from the current selection
/// on every filter pass, never stored on the marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub marker: Marker,
    pub selected: bool,
}

pub struct MapDataOrchestrator {
    config: MapConfig,
    outputs: Arc<OutputSynchronizer>,
    source: Option<Arc<dyn RecordSource>>,
    documents: Option<Arc<dyn DocumentStore>>,

    adapter: Box<dyn MapAdapter>,
    map_events: mpsc::UnboundedReceiver<MapEvent>,
    drawing: Option<DrawingController>,

    markers: Vec<Marker>,
    filter_state: FilterState,
    visible: Vec<Marker>,

    selected_index: Option<usize>,
    popup_open: bool,
    overlay: Option<serde_json::Value>,

    data_loaded: bool,
    initial_center_applied: bool,
    load_error: Option<String>,
}

impl MapDataOrchestrator {
    /// Build the orchestrator for a configuration. The renderer variant is
    /// chosen here, once; nothing downstream branches on it again.
    pub fn new(
        config: MapConfig,
        sink: Arc<dyn HostSink>,
        loader: Arc<dyn LibraryLoader>,
    ) -> Self {
        let outputs = Arc::new(OutputSynchronizer::new(sink));
        let (tx, rx) = mpsc::unbounded_channel();

        let adapter: Box<dyn MapAdapter> = match config.engine {
            EngineKind::Managed => {
                Box::new(ManagedMapAdapter::new(config.marker_style.clone(), tx))
            }
            EngineKind::Tile => Box::new(TileMapAdapter::from_config(&config, loader, tx)),
        };

        let drawing = (config.drawing.enabled && adapter.supports_drawing())
            .then(|| DrawingController::new(config.drawing.clone(), &config.marker_style));

        Self {
            config,
            outputs,
            source: None,
            documents: None,
            adapter,
            map_events: rx,
            drawing,
            markers: Vec::new(),
            filter_state: FilterState::new(),
            visible: Vec::new(),
            selected_index: None,
            popup_open: false,
            overlay: None,
            data_loaded: false,
            initial_center_applied: false,
            load_error: None,
        }
    }

    /// Attach the backend query path for query-sourced data.
    pub fn with_record_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Attach the document store for drawing preload and persistence.
    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(Arc::clone(&store));
        if let Some(drawing) = self.drawing.take() {
            self.drawing =
                Some(drawing.with_persistence(store, Arc::clone(&self.outputs)));
        }
        self
    }

    /// Prepare the rendering surface. A bundle-load failure leaves the
    /// component alive but mapless; the message is captured like a data
    /// error and surfaced once.
    pub async fn initialize(&mut self) -> Result<(), LoadError> {
        match self.adapter.initialize().await {
            Ok(()) => {
                self.render_if_ready();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "map library load failed");
                self.load_error = Some(e.to_string());
                self.outputs
                    .notify(Severity::Error, "Error", &e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    /// Load (or reload) markers from the configured source, normalize,
    /// filter, and — when the adapter is ready — render. Failures empty the
    /// visible set and capture one human-readable message; they never
    /// propagate.
    pub async fn load(&mut self) {
        self.load_error = None;
        let records = match self.fetch_raw_records().await {
            Ok(records) => records,
            Err(message) => {
                tracing::warn!(error = %message, "marker data load failed");
                self.markers.clear();
                self.visible.clear();
                self.selected_index = None;
                self.popup_open = false;
                self.data_loaded = false;
                // Empty rather than partial: clear the rendered layer too,
                // so the map never keeps showing markers the model dropped.
                self.adapter.render_markers(&self.visible);
                self.load_error = Some(message.clone());
                self.outputs.notify(Severity::Error, "Error", &message).await;
                return;
            }
        };

        self.markers = normalize(&records);
        self.data_loaded = true;
        tracing::debug!(count = self.markers.len(), "markers loaded");

        self.apply_filters();
        self.render_if_ready();
        self.preload_drawings().await;
        self.load_overlay().await;
    }

    async fn fetch_raw_records(&self) -> Result<Vec<serde_json::Value>, String> {
        match self.config.source {
            SourceKind::Manual | SourceKind::Variable => {
                let Some(json) = self.config.markers_json.as_deref() else {
                    return Ok(Vec::new());
                };
                if json.trim().is_empty() {
                    return Ok(Vec::new());
                }
                serde_json::from_str::<Vec<serde_json::Value>>(json)
                    .map_err(|e| format!("Invalid marker JSON: {e}"))
            }
            SourceKind::Query => {
                // No object configured yet: render an empty map, not an error.
                let Some(object_name) = self.config.object_name.as_deref() else {
                    return Ok(Vec::new());
                };
                let Some(source) = &self.source else {
                    return Err("No record source attached for query data".to_string());
                };
                source
                    .fetch_records(
                        object_name,
                        &self.config.field_mapping,
                        self.config.query_filter.as_deref(),
                        self.config.record_limit.unwrap_or(200),
                    )
                    .await
                    .map_err(|e| format!("Failed to load records: {e}"))
            }
        }
    }

    async fn preload_drawings(&mut self) {
        let Some(document_id) = self.config.drawing.preload_document_id.clone() else {
            return;
        };
        let Some(store) = &self.documents else { return };
        let Some(drawing) = self.drawing.as_mut() else { return };
        if !drawing.shapes().is_empty() {
            return;
        }

        match store.fetch_document(&document_id).await {
            Ok(content) => match drawing.preload_document(&content) {
                Ok(count) => {
                    tracing::debug!(count, "preloaded drawn shapes");
                    let document = drawing.to_interchange_document().to_string();
                    self.outputs.drawing_changed(&document).await;
                }
                Err(e) => {
                    self.outputs
                        .notify(Severity::Error, "Error", &format!("Invalid drawing document: {e}"))
                        .await;
                }
            },
            Err(e) => {
                self.outputs
                    .notify(Severity::Error, "Error", &format!("Failed to load drawing: {e}"))
                    .await;
            }
        }
    }

    /// Resolve the read-only GeoJSON overlay: inline JSON wins over a
    /// stored document id. A malformed inline blob degrades to no overlay;
    /// a failed document fetch surfaces a notification. Resolved once per
    /// load; the overlay never enters the editable shape layer.
    async fn load_overlay(&mut self) {
        if self.overlay.is_some() {
            return;
        }

        let document = if let Some(inline) = self.config.overlay_geojson.as_deref() {
            match serde_json::from_str::<serde_json::Value>(inline) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed overlay GeoJSON");
                    None
                }
            }
        } else if let Some(document_id) = self.config.overlay_document_id.clone() {
            let Some(store) = &self.documents else { return };
            match store.fetch_document(&document_id).await {
                Ok(content) => serde_json::from_str(&content).ok(),
                Err(e) => {
                    self.outputs
                        .notify(Severity::Error, "Error", &format!("Failed to load overlay: {e}"))
                        .await;
                    None
                }
            }
        } else {
            None
        };

        if let Some(document) = document {
            self.adapter.set_overlay(document.clone());
            self.overlay = Some(document);
        }
    }

    /// Markers render only once both the data load and the adapter
    /// initialization have completed.
    fn render_if_ready(&mut self) {
        if !self.data_loaded || !self.adapter.is_initialized() {
            return;
        }
        self.adapter.render_markers(&self.visible);
        if !self.initial_center_applied {
            self.apply_initial_center();
            self.initial_center_applied = true;
        }
    }

    /// First-render center precedence: explicit coordinates > explicit
    /// address > fit-bounds. Applied once; afterwards only selection
    /// centering moves the view.
    fn apply_initial_center(&mut self) {
        let center = &self.config.center;
        if let Some(coords) = center.coordinates() {
            self.adapter
                .set_center(MapCenter::Coordinates(LatLng::from(coords)), self.config.zoom());
        } else if center.has_address() {
            self.adapter.set_center(
                MapCenter::Address {
                    street: center.street.clone().unwrap_or_default(),
                    city: center.city.clone().unwrap_or_default(),
                    state: center.state.clone().unwrap_or_default(),
                    postal_code: center.postal_code.clone().unwrap_or_default(),
                    country: center.country.clone().unwrap_or_default(),
                },
                self.config.zoom(),
            );
        } else {
            self.adapter.fit_bounds(&self.visible);
        }
    }

    fn apply_filters(&mut self) {
        // Remember the selection by id; the index shifts as filters subtract.
        let selected_id = self
            .selected_index
            .and_then(|i| self.visible.get(i))
            .map(|m| m.id.clone());

        self.visible = filter::apply(&self.markers, &self.filter_state);

        self.selected_index =
            selected_id.and_then(|id| self.visible.iter().position(|m| m.id == id));
        if self.selected_index.is_none() {
            self.popup_open = false;
        }
    }

    /// Update the free-text search term, recompute the visible set, and
    /// re-render. Inert unless search is enabled in configuration.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        if !self.config.searchable {
            return;
        }
        self.filter_state.search_term = term.into();
        self.apply_filters();
        self.rerender_filtered();
    }

    /// Update one per-field filter value. Empty values are inert; inert
    /// entirely unless field filters are enabled, and restricted to the
    /// configured filter fields when any are defined.
    pub fn set_field_filter(&mut self, field: impl Into<String>, value: impl Into<String>) {
        if !self.config.show_filters {
            return;
        }
        let field = field.into();
        let configured = self.config.filter_fields();
        if !configured.is_empty() && !configured.iter().any(|f| f.field_name == field) {
            return;
        }
        self.filter_state.field_values.insert(field, value.into());
        self.apply_filters();
        self.rerender_filtered();
    }

    /// Clear search and all field filters.
    pub fn clear_filters(&mut self) {
        self.filter_state = FilterState::new();
        self.apply_filters();
        self.rerender_filtered();
    }

    fn rerender_filtered(&mut self) {
        if self.data_loaded && self.adapter.is_initialized() {
            self.adapter.render_markers(&self.visible);
            self.adapter.fit_bounds(&self.visible);
        }
    }

    /// Select the marker at `index` in the visible list. Re-selecting the
    /// same index toggles the detail popup without re-emitting outputs.
    pub async fn select_marker(&mut self, index: usize) {
        if self.selected_index == Some(index) {
            if self.config.enable_popups {
                self.popup_open = !self.popup_open;
            }
            return;
        }
        let Some(marker) = self.visible.get(index).cloned() else {
            return;
        };

        self.selected_index = Some(index);
        self.popup_open = self.config.enable_popups;
        self.adapter.select(&marker.id);
        // Dynamic center: coordinates win over address.
        self.adapter
            .set_center(MapCenter::for_marker(&marker), self.config.zoom());
        self.outputs.selection_changed(&marker).await;
    }

    /// Clear the selection and close the popup.
    pub fn clear_selection(&mut self) {
        self.selected_index = None;
        self.popup_open = false;
    }

    /// Center the view on a marker by id without changing the selection.
    pub fn center_on_marker(&mut self, marker_id: &str) {
        if let Some(marker) = self.visible.iter().find(|m| m.id == marker_id) {
            self.adapter
                .set_center(MapCenter::for_marker(marker), self.config.zoom());
        }
    }

    /// Drain pending adapter events into selection/drag handling.
    pub async fn pump_events(&mut self) {
        while let Ok(event) = self.map_events.try_recv() {
            match event {
                MapEvent::MarkerClicked { index, .. } => self.select_marker(index).await,
                MapEvent::MarkerDragged { id, original, new } => {
                    self.handle_drag(&id, original, new).await
                }
            }
        }
    }

    async fn handle_drag(&mut self, id: &str, original: LatLng, new: LatLng) {
        let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
            return;
        };
        marker.latitude = Some(new.lat);
        marker.longitude = Some(new.lng);
        let title = marker.title.clone();
        // Keep the visible projection in step with the canonical list.
        if let Some(visible) = self.visible.iter_mut().find(|m| m.id == id) {
            visible.latitude = Some(new.lat);
            visible.longitude = Some(new.lng);
        }

        self.outputs
            .marker_dragged(DragResult {
                id: id.to_string(),
                title,
                original_latitude: Some(original.lat),
                original_longitude: Some(original.lng),
                new_latitude: new.lat,
                new_longitude: new.lng,
            })
            .await;
    }

    /// A header button was activated. Unknown names are ignored.
    pub async fn header_action(&self, action_name: &str) {
        if !self
            .config
            .header_buttons()
            .iter()
            .any(|b| b.name == action_name)
        {
            return;
        }
        self.outputs.header_action(action_name).await;
    }

    /// Arm a draw tool and report the resulting mode.
    pub fn activate_draw_tool(&mut self, tool: DrawTool) -> Result<(), DrawError> {
        let drawing = self.drawing.as_mut().ok_or(DrawError::DrawingDisabled)?;
        drawing.activate_tool(tool)?;
        Ok(())
    }

    /// A draw interaction completed a shape; the regenerated document goes
    /// out as an output value.
    pub async fn complete_shape(&mut self, geometry: ShapeGeometry) -> Result<(), DrawError> {
        let drawing = self.drawing.as_mut().ok_or(DrawError::DrawingDisabled)?;
        let effect = drawing.complete_shape(geometry)?;
        self.outputs.drawing_changed(&effect.document).await;
        Ok(())
    }

    /// Apply an edit-mode mutation to an existing shape.
    pub async fn edit_shape(&mut self, id: Uuid, geometry: ShapeGeometry) -> Result<(), DrawError> {
        let drawing = self.drawing.as_mut().ok_or(DrawError::DrawingDisabled)?;
        let effect = drawing.apply_edit(id, geometry)?;
        self.outputs.drawing_changed(&effect.document).await;
        Ok(())
    }

    /// Delete-mode click on a shape.
    pub async fn delete_shape(&mut self, id: Uuid) -> Result<(), DrawError> {
        let drawing = self.drawing.as_mut().ok_or(DrawError::DrawingDisabled)?;
        let effect = drawing.delete_click(id)?;
        self.outputs.drawing_changed(&effect.document).await;
        Ok(())
    }

    /// Host-initiated clear of all drawn shapes.
    pub async fn clear_shapes(&mut self) {
        if let Some(drawing) = self.drawing.as_mut() {
            let effect = drawing.clear_all();
            self.outputs.drawing_changed(&effect.document).await;
        }
    }

    /// The drawing controller, when drawing is enabled on this renderer.
    pub fn drawing(&mut self) -> Option<&mut DrawingController> {
        self.drawing.as_mut()
    }

    /// Reload data from the configured source.
    pub async fn refresh(&mut self) {
        self.load().await;
    }

    /// Cancel pending deferred work. Called on component disposal.
    pub fn teardown(&mut self) {
        if let Some(drawing) = self.drawing.as_mut() {
            drawing.teardown();
        }
    }

    // Read-side accessors for the presentation layer.

    pub fn visible_markers(&self) -> &[Marker] {
        &self.visible
    }

    /// The visible list with per-row selection flags, recomputed from the
    /// current selection index.
    pub fn list_entries(&self) -> Vec<ListEntry> {
        self.visible
            .iter()
            .enumerate()
            .map(|(i, marker)| ListEntry {
                marker: marker.clone(),
                selected: self.selected_index == Some(i),
            })
            .collect()
    }

    /// Whether the marker list panel should show, honoring the `auto` rule
    /// (visible only with more than one marker).
    pub fn list_visible(&self) -> bool {
        match self.config.list_visibility {
            ListVisibility::Visible => true,
            ListVisibility::Hidden => false,
            ListVisibility::Auto => self.visible.len() > 1,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selected_index.and_then(|i| self.visible.get(i))
    }

    pub fn popup_open(&self) -> bool {
        self.popup_open
    }

    /// The resolved read-only GeoJSON overlay, if configured.
    pub fn overlay_document(&self) -> Option<&serde_json::Value> {
        self.overlay.as_ref()
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter_state
    }

    /// The captured message of the last failed load, if any.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.data_loaded && self.adapter.is_initialized()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn adapter(&self) -> &dyn MapAdapter {
        self.adapter.as_ref()
    }
}

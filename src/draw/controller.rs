//! Drawing state machine
//!
//! States: idle, drawing:{marker|line|polygon|circle}, editing, deleting.
//! Activating a tool implicitly exits any other active tool; completed
//! shapes drop back to idle; invalid operations for the current state are
//! rejected. Every mutation regenerates the interchange document, and —
//! when auto-persist is configured — (re)arms the 2 s trailing debounce.

use super::geojson::{document_from_shapes, shapes_from_document, GeoJsonError};
use super::shapes::{DrawMode, DrawnShape, ShapeGeometry, ShapeKind, ShapeStyle};
use crate::config::{DrawConfig, MarkerStyle};
use crate::host::Severity;
use crate::storage::DocumentStore;
use crate::sync::{Debouncer, OutputSynchronizer};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Quiet period before an auto-persist fires.
const AUTOSAVE_QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// The six toolbar tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTool {
    Marker,
    Line,
    Polygon,
    Circle,
    Edit,
    Delete,
}

#[derive(Debug, Error)]
pub enum DrawError {
    #[error("drawing is not enabled")]
    DrawingDisabled,

    #[error("tool {0:?} is not enabled")]
    ToolDisabled(DrawTool),

    #[error("operation requires {required:?} mode, current mode is {current:?}")]
    WrongMode {
        required: &'static str,
        current: DrawMode,
    },

    #[error("geometry kind {got:?} does not match armed tool {expected:?}")]
    GeometryMismatch { expected: ShapeKind, got: ShapeKind },

    #[error("no shape with id {0}")]
    UnknownShape(Uuid),

    #[error(transparent)]
    Document(#[from] GeoJsonError),
}

/// What a mutation produced: the regenerated document, and whether an
/// auto-persist was (re)scheduled.
#[derive(Debug, Clone)]
pub struct DrawingEffect {
    pub document: String,
    pub autosave_armed: bool,
}

/// Collaborators the persistence path needs, shared with spawned saves.
struct PersistContext {
    store: Arc<dyn DocumentStore>,
    outputs: Arc<OutputSynchronizer>,
    linked_entity_id: String,
    title: String,
    /// Id of the persisted document; updates in place once known.
    document_id: Mutex<Option<String>>,
}

impl PersistContext {
    async fn persist(self: Arc<Self>, content: String) {
        let existing = self.document_id.lock().unwrap().clone();
        match self
            .store
            .persist_document(&self.linked_entity_id, &content, &self.title, existing.as_deref())
            .await
        {
            Ok(id) => {
                *self.document_id.lock().unwrap() = Some(id.clone());
                self.outputs.document_persisted(&id).await;
                self.outputs
                    .notify(Severity::Success, "Success", "Map drawings saved")
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "drawing persistence failed");
                self.outputs
                    .notify(
                        Severity::Error,
                        "Error",
                        &format!("Failed to save drawings: {e}"),
                    )
                    .await;
            }
        }
    }
}

/// Owns all drawn shapes and the draw-tool state machine; the sole writer
/// of the geographic interchange output.
pub struct DrawingController {
    config: DrawConfig,
    armed_style: ShapeStyle,
    mode: DrawMode,
    shapes: Vec<DrawnShape>,
    debouncer: Debouncer,
    persist: Option<Arc<PersistContext>>,
}

impl DrawingController {
    pub fn new(config: DrawConfig, style: &MarkerStyle) -> Self {
        Self {
            config,
            armed_style: ShapeStyle::from_marker_style(style),
            mode: DrawMode::Idle,
            shapes: Vec::new(),
            debouncer: Debouncer::new(AUTOSAVE_QUIET_PERIOD),
            persist: None,
        }
    }

    /// Attach the persistence backend. Without it, save requests are no-ops
    /// and only the in-memory document output is produced.
    pub fn with_persistence(
        mut self,
        store: Arc<dyn DocumentStore>,
        outputs: Arc<OutputSynchronizer>,
    ) -> Self {
        if let Some(linked_entity_id) = self.config.linked_entity_id.clone() {
            self.persist = Some(Arc::new(PersistContext {
                store,
                outputs,
                linked_entity_id,
                title: self.config.document_title.clone(),
                document_id: Mutex::new(self.config.existing_document_id.clone()),
            }));
        }
        self
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn shapes(&self) -> &[DrawnShape] {
        &self.shapes
    }

    /// The current interchange document.
    pub fn to_interchange_document(&self) -> serde_json::Value {
        document_from_shapes(&self.shapes)
    }

    /// Arm a tool. Re-activating the armed edit/delete tool toggles it off;
    /// anything else implicitly exits whatever was active.
    pub fn activate_tool(&mut self, tool: DrawTool) -> Result<DrawMode, DrawError> {
        if !self.config.enabled {
            return Err(DrawError::DrawingDisabled);
        }
        if !self.tool_enabled(tool) {
            return Err(DrawError::ToolDisabled(tool));
        }

        self.mode = match (tool, self.mode) {
            (DrawTool::Edit, DrawMode::Editing) | (DrawTool::Delete, DrawMode::Deleting) => {
                DrawMode::Idle
            }
            (DrawTool::Edit, _) => DrawMode::Editing,
            (DrawTool::Delete, _) => DrawMode::Deleting,
            (DrawTool::Marker, _) => DrawMode::Drawing(ShapeKind::Marker),
            (DrawTool::Line, _) => DrawMode::Drawing(ShapeKind::Line),
            (DrawTool::Polygon, _) => DrawMode::Drawing(ShapeKind::Polygon),
            (DrawTool::Circle, _) => DrawMode::Drawing(ShapeKind::Circle),
        };
        Ok(self.mode)
    }

    /// Disarm whatever tool is active.
    pub fn deactivate(&mut self) {
        self.mode = DrawMode::Idle;
    }

    /// A draw interaction finished a shape. Valid only while drawing; the
    /// geometry must match the armed tool. Returns to idle.
    pub fn complete_shape(&mut self, geometry: ShapeGeometry) -> Result<DrawingEffect, DrawError> {
        let DrawMode::Drawing(expected) = self.mode else {
            return Err(DrawError::WrongMode {
                required: "drawing",
                current: self.mode,
            });
        };
        if geometry.kind() != expected {
            return Err(DrawError::GeometryMismatch {
                expected,
                got: geometry.kind(),
            });
        }

        self.shapes
            .push(DrawnShape::new(geometry, self.armed_style.clone()));
        self.mode = DrawMode::Idle;
        Ok(self.mutated())
    }

    /// Move/resize an existing shape while editing. Stays in editing mode.
    pub fn apply_edit(
        &mut self,
        id: Uuid,
        geometry: ShapeGeometry,
    ) -> Result<DrawingEffect, DrawError> {
        if self.mode != DrawMode::Editing {
            return Err(DrawError::WrongMode {
                required: "editing",
                current: self.mode,
            });
        }
        let shape = self
            .shapes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DrawError::UnknownShape(id))?;
        if geometry.kind() != shape.geometry.kind() {
            return Err(DrawError::GeometryMismatch {
                expected: shape.geometry.kind(),
                got: geometry.kind(),
            });
        }
        shape.geometry = geometry;
        Ok(self.mutated())
    }

    /// Click-to-delete one shape. Stays in deleting mode.
    pub fn delete_click(&mut self, id: Uuid) -> Result<DrawingEffect, DrawError> {
        if self.mode != DrawMode::Deleting {
            return Err(DrawError::WrongMode {
                required: "deleting",
                current: self.mode,
            });
        }
        let before = self.shapes.len();
        self.shapes.retain(|s| s.id != id);
        if self.shapes.len() == before {
            return Err(DrawError::UnknownShape(id));
        }
        Ok(self.mutated())
    }

    /// Host-initiated clear of every shape. Valid in any state.
    pub fn clear_all(&mut self) -> DrawingEffect {
        self.shapes.clear();
        self.mutated()
    }

    /// Load shapes from a serialized document into the editable layer.
    /// Returns how many shapes were added. Does not count as a mutation.
    pub fn preload_document(&mut self, content: &str) -> Result<usize, DrawError> {
        let shapes = shapes_from_document(content)?;
        let count = shapes.len();
        self.shapes.extend(shapes);
        Ok(count)
    }

    /// Persist immediately, bypassing the debounce (the on-demand save).
    pub async fn save_now(&mut self) {
        self.debouncer.cancel();
        if !self.config.save_document {
            return;
        }
        if let Some(persist) = &self.persist {
            let content = self.to_interchange_document().to_string();
            Arc::clone(persist).persist(content).await;
        }
    }

    /// The persisted document id, once a save has completed.
    pub fn persisted_document_id(&self) -> Option<String> {
        self.persist
            .as_ref()
            .and_then(|p| p.document_id.lock().unwrap().clone())
    }

    /// Cancel any pending auto-persist. Called on component disposal.
    pub fn teardown(&mut self) {
        self.debouncer.cancel();
    }

    fn tool_enabled(&self, tool: DrawTool) -> bool {
        match tool {
            DrawTool::Marker => self.config.tool_marker,
            DrawTool::Line => self.config.tool_line,
            DrawTool::Polygon => self.config.tool_polygon,
            DrawTool::Circle => self.config.tool_circle,
            DrawTool::Edit => self.config.tool_edit,
            DrawTool::Delete => self.config.tool_delete,
        }
    }

    /// Regenerate the document and, when auto-persist applies, restart the
    /// quiet-period timer. Auto-save honors the same `save_document` gate
    /// as the on-demand save.
    fn mutated(&mut self) -> DrawingEffect {
        let document = self.to_interchange_document().to_string();

        let autosave_armed = match &self.persist {
            Some(persist) if self.config.save_document && self.config.auto_save => {
                self.debouncer.arm(Arc::clone(persist).persist(document.clone()));
                true
            }
            _ => false,
        };

        DrawingEffect {
            document,
            autosave_armed,
        }
    }
}

//! Vector shape drawing
//!
//! The [`DrawingController`] is a closed state machine over the draw tools;
//! it exclusively owns the drawn shapes and is the sole writer of the
//! GeoJSON interchange document.

mod controller;
mod geojson;
mod shapes;

pub use controller::{DrawError, DrawTool, DrawingController, DrawingEffect};
pub use geojson::{document_from_shapes, shapes_from_document, GeoJsonError};
pub use shapes::{DrawMode, DrawnShape, ShapeGeometry, ShapeKind, ShapeStyle};

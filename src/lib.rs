//! Mapflow: Map Data & Interaction Engine
//!
//! Renders geographic point data and operator-drawn shapes on an
//! interactive map embedded inside a host application, and keeps that
//! visual state synchronized with the output values the host reads back.
//!
//! # Core Concepts
//!
//! - **Markers**: canonical point entities normalized from heterogeneous
//!   raw records
//! - **Adapters**: one rendering abstraction over a managed host widget
//!   and a self-hosted tile map
//! - **Drawing**: a closed state machine over vector shapes, serialized as
//!   a GeoJSON interchange document
//!
//! # Example
//!
//! ```
//! use mapflow::{normalize, FilterState};
//! use serde_json::json;
//!
//! let markers = normalize(&[json!({"id": "1", "Name": "HQ"})]);
//! let visible = mapflow::filter::apply(&markers, &FilterState::new());
//! assert_eq!(visible.len(), 1);
//! ```

pub mod adapter;
pub mod config;
pub mod draw;
pub mod filter;
pub mod geo;
pub mod host;
pub mod marker;
pub mod orchestrator;
pub mod session;
pub mod storage;
pub mod sync;

pub use adapter::{
    InstantLoader, LibraryBundle, LibraryLoader, LoadError, ManagedMapAdapter, MapAdapter,
    MapCenter, MapEvent, TileMapAdapter,
};
pub use config::{EngineKind, FieldMapping, MapConfig, MarkerKind, SourceKind};
pub use draw::{DrawError, DrawMode, DrawTool, DrawingController, DrawnShape, ShapeGeometry};
pub use filter::FilterState;
pub use geo::{LatLng, LatLngBounds};
pub use host::{ChannelSink, DragResult, HostEvent, HostSink, OutputValue, Severity};
pub use marker::{normalize, Marker};
pub use orchestrator::MapDataOrchestrator;
pub use session::{EditorSession, SessionId, SessionStore};
pub use storage::{DocumentStore, RecordSource, SourceError, SqliteDocumentStore, StorageError};
pub use sync::{Debouncer, OutputSynchronizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

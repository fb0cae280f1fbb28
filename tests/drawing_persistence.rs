//! Drawing persistence: preload, auto-save debounce, and failure handling.

mod common;

use common::{drain, MemoryDocumentStore};
use mapflow::draw::{document_from_shapes, DrawnShape, ShapeStyle};
use mapflow::{
    ChannelSink, DrawTool, EngineKind, HostEvent, InstantLoader, LatLng, MapConfig,
    MapDataOrchestrator, Severity, ShapeGeometry, SourceKind,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn drawing_config() -> MapConfig {
    let mut config = MapConfig::default();
    config.engine = EngineKind::Tile;
    config.source = SourceKind::Manual;
    config.markers_json = Some(json!([]).to_string());
    config.drawing.enabled = true;
    config.drawing.tool_marker = true;
    config.drawing.tool_line = true;
    config.drawing.tool_delete = true;
    config.drawing.save_document = true;
    config.drawing.auto_save = true;
    config.drawing.linked_entity_id = Some("entity-1".to_string());
    config
}

async fn drawing_orchestrator(
    config: MapConfig,
    store: Arc<MemoryDocumentStore>,
) -> (MapDataOrchestrator, mpsc::UnboundedReceiver<HostEvent>) {
    let (sink, rx) = ChannelSink::new();
    let mut orch = MapDataOrchestrator::new(config, Arc::new(sink), Arc::new(InstantLoader))
        .with_document_store(store);
    orch.initialize().await.unwrap();
    orch.load().await;
    (orch, rx)
}

async fn complete_point(orch: &mut MapDataOrchestrator, lat: f64, lng: f64) {
    orch.activate_draw_tool(DrawTool::Marker).unwrap();
    orch.complete_shape(ShapeGeometry::Point(LatLng::new(lat, lng)))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn burst_of_mutations_persists_exactly_once() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (mut orch, _rx) = drawing_orchestrator(drawing_config(), Arc::clone(&store)).await;

    for i in 0..4 {
        complete_point(&mut orch, i as f64, i as f64).await;
        tokio::time::advance(Duration::from_millis(400)).await;
    }
    assert_eq!(store.persist_calls(), 0);

    tokio::time::advance(Duration::from_millis(2000)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.persist_calls(), 1);

    // The persisted document carries all four shapes.
    let doc: serde_json::Value =
        serde_json::from_str(&store.content("doc-1").unwrap()).unwrap();
    assert_eq!(doc["features"].as_array().unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn spaced_mutations_persist_each_time() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (mut orch, _rx) = drawing_orchestrator(drawing_config(), Arc::clone(&store)).await;

    for i in 0..3 {
        complete_point(&mut orch, i as f64, i as f64).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(2500)).await;
        tokio::task::yield_now().await;
    }
    assert_eq!(store.persist_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_the_pending_save() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (mut orch, _rx) = drawing_orchestrator(drawing_config(), Arc::clone(&store)).await;

    complete_point(&mut orch, 1.0, 2.0).await;
    orch.teardown();

    tokio::time::advance(Duration::from_millis(5000)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.persist_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_notifies_and_keeps_shapes_editable() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.set_failing(true);
    let (mut orch, mut rx) = drawing_orchestrator(drawing_config(), Arc::clone(&store)).await;

    complete_point(&mut orch, 1.0, 2.0).await;
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(2000)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.persist_calls(), 1);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        HostEvent::Notification {
            severity: Severity::Error,
            ..
        }
    )));

    // Shapes stay in memory; the next mutation retries.
    assert_eq!(orch.drawing().unwrap().shapes().len(), 1);
    store.set_failing(false);
    complete_point(&mut orch, 3.0, 4.0).await;
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(2000)).await;
    tokio::task::yield_now().await;
    assert_eq!(store.persist_calls(), 2);
    assert!(store.content("doc-1").is_some());
}

#[tokio::test(start_paused = true)]
async fn successful_save_reports_the_document_id() {
    let store = Arc::new(MemoryDocumentStore::new());
    let (mut orch, mut rx) = drawing_orchestrator(drawing_config(), Arc::clone(&store)).await;

    complete_point(&mut orch, 1.0, 2.0).await;
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_millis(2000)).await;
    tokio::task::yield_now().await;

    let events = drain(&mut rx);
    let id_output = events.iter().find_map(|e| match e {
        HostEvent::OutputsChanged(batch) => batch
            .iter()
            .find(|o| o.name == "contentDocumentIdOutput")
            .map(|o| o.value.clone()),
        _ => None,
    });
    assert_eq!(id_output, Some(json!("doc-1")));
    assert_eq!(orch.drawing().unwrap().persisted_document_id().as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn preloaded_document_becomes_editable_shapes() {
    let seeded = document_from_shapes(&[
        DrawnShape::new(ShapeGeometry::Point(LatLng::new(9.0, 9.0)), ShapeStyle::default()),
        DrawnShape::new(
            ShapeGeometry::Circle {
                center: LatLng::new(1.0, 1.0),
                radius_meters: 250.0,
            },
            ShapeStyle::default(),
        ),
    ]);
    let store =
        Arc::new(MemoryDocumentStore::new().with_document("doc-9", &seeded.to_string()));

    let mut config = drawing_config();
    config.drawing.auto_save = false;
    config.drawing.preload_document_id = Some("doc-9".to_string());
    let (mut orch, mut rx) = drawing_orchestrator(config, store).await;

    assert_eq!(orch.drawing().unwrap().shapes().len(), 2);
    // The preload republished the document output.
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        HostEvent::OutputsChanged(batch) if batch.iter().any(|o| o.name == "drawnShapesGeoJson")
    )));
}

#[tokio::test]
async fn missing_preload_document_is_a_notification_not_a_failure() {
    let mut config = drawing_config();
    config.drawing.auto_save = false;
    config.drawing.preload_document_id = Some("ghost".to_string());
    let (mut orch, mut rx) =
        drawing_orchestrator(config, Arc::new(MemoryDocumentStore::new())).await;

    assert!(orch.drawing().unwrap().shapes().is_empty());
    assert!(orch.load_error().is_none());
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        HostEvent::Notification {
            severity: Severity::Error,
            ..
        }
    )));
}

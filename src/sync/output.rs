//! OutputSynchronizer — batched value changes toward the host
//!
//! Output names follow the host-side attribute contract
//! (`selectedMarkerId`, `draggedMarkerData`, ...). Each user action emits
//! one batch; the host applies it in a single tick.

use crate::host::{DragResult, HostEvent, HostSink, OutputValue, Severity};
use crate::marker::Marker;
use serde_json::Value;
use std::sync::Arc;

pub struct OutputSynchronizer {
    sink: Arc<dyn HostSink>,
}

impl OutputSynchronizer {
    pub fn new(sink: Arc<dyn HostSink>) -> Self {
        Self { sink }
    }

    /// Emit the selection output batch (id, title, lat, lng, raw-data
    /// snapshot) plus the marker-selected interaction event.
    pub async fn selection_changed(&self, marker: &Marker) {
        let raw_snapshot = serde_json::to_string(&marker.raw_data).unwrap_or_default();
        let batch = vec![
            OutputValue::new("selectedMarkerId", marker.id.clone()),
            OutputValue::new("selectedMarkerTitle", marker.title.clone()),
            OutputValue::new("selectedMarkerLatitude", json_number(marker.latitude)),
            OutputValue::new("selectedMarkerLongitude", json_number(marker.longitude)),
            OutputValue::new("selectedMarkerData", raw_snapshot),
        ];
        self.emit(HostEvent::OutputsChanged(batch)).await;
        self.emit(HostEvent::MarkerSelected {
            marker: marker.clone(),
        })
        .await;
    }

    /// Emit the drag-result payload and its interaction event.
    pub async fn marker_dragged(&self, result: DragResult) {
        self.emit(HostEvent::OutputsChanged(vec![OutputValue::new(
            "draggedMarkerData",
            result.to_value().to_string(),
        )]))
        .await;
        self.emit(HostEvent::MarkerDragged(result)).await;
    }

    /// Emit the header action output and its interaction event.
    pub async fn header_action(&self, action_name: &str) {
        self.emit(HostEvent::OutputsChanged(vec![OutputValue::new(
            "headerActionName",
            action_name,
        )]))
        .await;
        self.emit(HostEvent::HeaderAction {
            action_name: action_name.to_string(),
        })
        .await;
    }

    /// Emit the regenerated interchange document.
    pub async fn drawing_changed(&self, document_json: &str) {
        self.emit(HostEvent::OutputsChanged(vec![OutputValue::new(
            "drawnShapesGeoJson",
            document_json,
        )]))
        .await;
    }

    /// Emit the id a persisted drawing document received.
    pub async fn document_persisted(&self, document_id: &str) {
        self.emit(HostEvent::OutputsChanged(vec![OutputValue::new(
            "contentDocumentIdOutput",
            document_id,
        )]))
        .await;
    }

    /// Surface a transient notification.
    pub async fn notify(&self, severity: Severity, title: &str, message: &str) {
        self.emit(HostEvent::Notification {
            severity,
            title: title.to_string(),
            message: message.to_string(),
        })
        .await;
    }

    async fn emit(&self, event: HostEvent) {
        if self.sink.emit(event).await.is_err() {
            tracing::debug!("host sink disconnected; dropping event");
        }
    }
}

fn json_number(value: Option<f64>) -> Value {
    value
        .and_then(|v| serde_json::Number::from_f64(v).map(Value::Number))
        .unwrap_or(Value::Null)
}

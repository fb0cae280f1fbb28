//! Events the engine raises toward the hosting environment
//!
//! One variant per outward contract: batched output values, the three
//! custom interaction events, and transient notifications (the toast seam).

use crate::marker::Marker;
use serde_json::Value;

/// A single named output value change.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputValue {
    pub name: String,
    pub value: Value,
}

impl OutputValue {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Payload of a completed marker drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragResult {
    pub id: String,
    pub title: String,
    pub original_latitude: Option<f64>,
    pub original_longitude: Option<f64>,
    pub new_latitude: f64,
    pub new_longitude: f64,
}

impl DragResult {
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "title": self.title,
            "originalLatitude": self.original_latitude,
            "originalLongitude": self.original_longitude,
            "newLatitude": self.new_latitude,
            "newLongitude": self.new_longitude,
        })
    }
}

/// Notification severity, mapped by the host onto its toast variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// An event delivered to the hosting environment.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A batch of output value changes, delivered in one tick so a single
    /// user action causes at most one host re-render.
    OutputsChanged(Vec<OutputValue>),
    /// Custom interaction event: a marker was selected.
    MarkerSelected { marker: Marker },
    /// Custom interaction event: a marker drag completed.
    MarkerDragged(DragResult),
    /// Custom interaction event: a header button was activated.
    HeaderAction { action_name: String },
    /// Transient user-facing notification.
    Notification {
        severity: Severity,
        title: String,
        message: String,
    },
}

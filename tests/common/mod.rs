//! Shared test doubles for integration tests
//!
//! A canned record source, an in-memory document store with a persist-call
//! counter, and helpers for building a ready orchestrator over a channel
//! sink.

// Each integration binary uses a different subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use mapflow::config::FieldMapping;
use mapflow::storage::{DocumentStore, RecordSource, SourceError, StorageError, StorageResult};
use mapflow::{ChannelSink, HostEvent, InstantLoader, MapConfig, MapDataOrchestrator};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Record source returning a fixed record set, or failing on demand.
pub struct MockRecordSource {
    records: Vec<Value>,
    fail_with: Option<String>,
}

impl MockRecordSource {
    pub fn returning(records: Vec<Value>) -> Self {
        Self {
            records,
            fail_with: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_records(
        &self,
        _object_name: &str,
        _mapping: &FieldMapping,
        _filter_expression: Option<&str>,
        _limit: u32,
    ) -> Result<Vec<Value>, SourceError> {
        match &self.fail_with {
            Some(message) => Err(SourceError::Query(message.clone())),
            None => Ok(self.records.clone()),
        }
    }
}

/// In-memory document store counting persist calls, with optional failure.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, String>>,
    persist_calls: AtomicUsize,
    fail_persists: Mutex<bool>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, content: &str) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(id.to_string(), content.to_string());
        self
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn content(&self, id: &str) -> Option<String> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.fail_persists.lock().unwrap() = failing;
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_document(&self, document_id: &str) -> StorageResult<String> {
        self.documents
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| StorageError::DocumentNotFound(document_id.to_string()))
    }

    async fn persist_document(
        &self,
        _linked_entity_id: &str,
        content: &str,
        _title: &str,
        existing_id: Option<&str>,
    ) -> StorageResult<String> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_persists.lock().unwrap() {
            return Err(StorageError::Io(std::io::Error::other("backend down")));
        }
        let id = existing_id
            .map(str::to_string)
            .unwrap_or_else(|| "doc-1".to_string());
        self.documents
            .lock()
            .unwrap()
            .insert(id.clone(), content.to_string());
        Ok(id)
    }
}

/// Orchestrator over an instant loader and a channel sink, initialized and
/// loaded.
pub async fn ready_orchestrator(
    config: MapConfig,
) -> (MapDataOrchestrator, mpsc::UnboundedReceiver<HostEvent>) {
    let (sink, rx) = ChannelSink::new();
    let mut orch = MapDataOrchestrator::new(config, Arc::new(sink), Arc::new(InstantLoader));
    orch.initialize().await.unwrap();
    orch.load().await;
    (orch, rx)
}

/// Drain every event currently queued on the sink receiver.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> Vec<HostEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

//! Storage trait definitions

use crate::config::FieldMapping;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from the record query path.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("object not accessible: {0}")]
    ObjectNotAccessible(String),
}

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Read path for query-sourced marker records.
///
/// The backend resolves the object/field names against its own schema and
/// returns raw records; the engine only ever sees `serde_json::Value`s.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(
        &self,
        object_name: &str,
        mapping: &FieldMapping,
        filter_expression: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Value>, SourceError>;
}

/// A persisted drawing document with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub linked_entity_id: String,
    pub title: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Persistence backend for geographic interchange documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the serialized document content for preload.
    async fn fetch_document(&self, document_id: &str) -> StorageResult<String>;

    /// Persist a document, updating in place when `existing_id` names a
    /// known document. Returns the document id.
    async fn persist_document(
        &self,
        linked_entity_id: &str,
        content: &str,
        title: &str,
        existing_id: Option<&str>,
    ) -> StorageResult<String>;
}

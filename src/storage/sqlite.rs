//! SQLite document store
//!
//! One database file, one `documents` table. Thread-safe via an internal
//! mutex on the connection; the async trait methods are short blocking
//! calls, acceptable for a single-operator component.

use super::traits::{DocumentStore, StorageError, StorageResult, StoredDocument};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// SQLite-backed [`DocumentStore`].
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `path` and initialize the schema.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by the CLI's dry-run mode and tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                linked_entity_id TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_linked_entity
                ON documents(linked_entity_id);

            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Full document row, including metadata.
    pub fn get_document(&self, document_id: &str) -> StorageResult<StoredDocument> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, linked_entity_id, title, content, created_at, updated_at
             FROM documents WHERE id = ?1",
            params![document_id],
            |row| {
                Ok(StoredDocument {
                    id: row.get(0)?,
                    linked_entity_id: row.get(1)?,
                    title: row.get(2)?,
                    content: row.get(3)?,
                    created_at: row.get::<_, String>(4)?.parse().unwrap_or_else(|_| Utc::now()),
                    updated_at: row.get::<_, String>(5)?.parse().unwrap_or_else(|_| Utc::now()),
                })
            },
        )
        .optional()?
        .ok_or_else(|| StorageError::DocumentNotFound(document_id.to_string()))
    }

    /// All documents linked to an entity, newest first.
    pub fn list_documents(&self, linked_entity_id: &str) -> StorageResult<Vec<StoredDocument>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, linked_entity_id, title, content, created_at, updated_at
             FROM documents WHERE linked_entity_id = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![linked_entity_id], |row| {
            Ok(StoredDocument {
                id: row.get(0)?,
                linked_entity_id: row.get(1)?,
                title: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get::<_, String>(4)?.parse().unwrap_or_else(|_| Utc::now()),
                updated_at: row.get::<_, String>(5)?.parse().unwrap_or_else(|_| Utc::now()),
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn fetch_document(&self, document_id: &str) -> StorageResult<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT content FROM documents WHERE id = ?1",
            params![document_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .ok_or_else(|| StorageError::DocumentNotFound(document_id.to_string()))
    }

    async fn persist_document(
        &self,
        linked_entity_id: &str,
        content: &str,
        title: &str,
        existing_id: Option<&str>,
    ) -> StorageResult<String> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        if let Some(id) = existing_id {
            let updated = conn.execute(
                "UPDATE documents SET content = ?1, title = ?2, updated_at = ?3 WHERE id = ?4",
                params![content, title, now, id],
            )?;
            if updated > 0 {
                return Ok(id.to_string());
            }
            // Stale id from a previous session: fall through and insert fresh.
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO documents (id, linked_entity_id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, linked_entity_id, title, content, now],
        )?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persist_then_fetch_round_trips() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let id = store
            .persist_document("entity-1", r#"{"type":"FeatureCollection"}"#, "Drawing", None)
            .await
            .unwrap();
        let content = store.fetch_document(&id).await.unwrap();
        assert_eq!(content, r#"{"type":"FeatureCollection"}"#);
    }

    #[tokio::test]
    async fn persist_with_existing_id_updates_in_place() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let id = store
            .persist_document("entity-1", "v1", "Drawing", None)
            .await
            .unwrap();
        let same = store
            .persist_document("entity-1", "v2", "Drawing", Some(&id))
            .await
            .unwrap();
        assert_eq!(same, id);
        assert_eq!(store.fetch_document(&id).await.unwrap(), "v2");
        assert_eq!(store.list_documents("entity-1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_existing_id_inserts_fresh_document() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let id = store
            .persist_document("entity-1", "v1", "Drawing", Some("gone"))
            .await
            .unwrap();
        assert_ne!(id, "gone");
        assert_eq!(store.fetch_document(&id).await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        let err = store.fetch_document("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapflow.db");
        let store = SqliteDocumentStore::open(&path).unwrap();
        store
            .persist_document("e", "c", "t", None)
            .await
            .unwrap();
        assert!(path.exists());
    }
}

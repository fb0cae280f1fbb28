//! Backend collaborators: record query source and document persistence

mod sqlite;
mod traits;

pub use sqlite::SqliteDocumentStore;
pub use traits::{
    DocumentStore, RecordSource, SourceError, StorageError, StorageResult, StoredDocument,
};

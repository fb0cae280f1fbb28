//! Map library loading
//!
//! The tile map depends on external script/style bundles the hosting
//! environment fetches. The engine only sequences the loads; the actual
//! fetching lives behind [`LibraryLoader`].

use async_trait::async_trait;
use thiserror::Error;

/// The three loadable bundles, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryBundle {
    MapEngine,
    Clustering,
    Drawing,
}

impl std::fmt::Display for LibraryBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapEngine => write!(f, "map engine"),
            Self::Clustering => write!(f, "clustering plugin"),
            Self::Drawing => write!(f, "drawing plugin"),
        }
    }
}

/// A bundle failed to load. Aborts map construction; the component stays
/// alive, mapless.
#[derive(Debug, Error)]
#[error("failed to load {bundle}: {reason}")]
pub struct LoadError {
    pub bundle: LibraryBundle,
    pub reason: String,
}

impl LoadError {
    pub fn new(bundle: LibraryBundle, reason: impl Into<String>) -> Self {
        Self {
            bundle,
            reason: reason.into(),
        }
    }
}

/// Fetches one script/style bundle. Implemented by the hosting integration.
#[async_trait]
pub trait LibraryLoader: Send + Sync {
    async fn load(&self, bundle: LibraryBundle) -> Result<(), LoadError>;
}

/// Loader that resolves immediately — for embedded engines that ship their
/// own bundles, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantLoader;

#[async_trait]
impl LibraryLoader for InstantLoader {
    async fn load(&self, _bundle: LibraryBundle) -> Result<(), LoadError> {
        Ok(())
    }
}

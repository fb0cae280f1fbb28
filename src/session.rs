//! Editor session state
//!
//! The configuration editor is recreated by the host whenever the
//! surrounding screen re-renders. Draft state survives those re-creations
//! in an externally owned [`SessionStore`] with an explicit create/destroy
//! lifecycle — never in process-wide statics. The editor receives its
//! session id at construction and reads/writes through the store.

use crate::config::MapConfig;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one editor session across re-creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Draft configuration being edited, plus whatever pick state the editor
/// needs to restore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSession {
    pub draft: MapConfig,
    /// Object whose fields the field pickers are currently listing.
    pub picked_object: Option<String>,
    pub dirty: bool,
}

/// Externally owned store of editor sessions. The owner decides when a
/// session is created and destroyed; re-created editors just look theirs up.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, EditorSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a session seeded with the given draft; returns its id.
    pub fn create(&self, draft: MapConfig) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(
            id,
            EditorSession {
                draft,
                picked_object: None,
                dirty: false,
            },
        );
        id
    }

    pub fn get(&self, id: SessionId) -> Option<EditorSession> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    /// Apply a mutation to a session, marking it dirty. Returns false when
    /// the session no longer exists.
    pub fn update(&self, id: SessionId, f: impl FnOnce(&mut EditorSession)) -> bool {
        match self.sessions.get_mut(&id) {
            Some(mut session) => {
                f(&mut session);
                session.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Destroy a session, returning its final state.
    pub fn destroy(&self, id: SessionId) -> Option<EditorSession> {
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;

    #[test]
    fn session_survives_reacquisition() {
        let store = SessionStore::new();
        let id = store.create(MapConfig::default());

        store.update(id, |s| {
            s.draft.engine = EngineKind::Tile;
            s.picked_object = Some("Account".to_string());
        });

        // A re-created editor looks the session up by id.
        let session = store.get(id).unwrap();
        assert_eq!(session.draft.engine, EngineKind::Tile);
        assert_eq!(session.picked_object.as_deref(), Some("Account"));
        assert!(session.dirty);
    }

    #[test]
    fn destroy_removes_the_session() {
        let store = SessionStore::new();
        let id = store.create(MapConfig::default());
        assert_eq!(store.len(), 1);
        let final_state = store.destroy(id).unwrap();
        assert!(!final_state.dirty);
        assert!(store.is_empty());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn update_on_destroyed_session_reports_failure() {
        let store = SessionStore::new();
        let id = store.create(MapConfig::default());
        store.destroy(id);
        assert!(!store.update(id, |_| {}));
    }
}

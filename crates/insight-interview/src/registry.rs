//! In-memory registry of active interview sessions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::session::InterviewSession;

/// A session shared between request handlers.
///
/// The async mutex is held for the whole of a turn, including the generation
/// call, so turns within one session are processed strictly one at a time.
pub type SharedSession = Arc<Mutex<InterviewSession>>;

/// Active sessions keyed by id.
///
/// Uses `std::sync::RwLock` for the map: every lock acquisition is a brief
/// HashMap operation that never spans an `.await`. Sessions never share
/// mutable state with each other.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `session` and returns its shared handle.
    ///
    /// If a session with the same id is already registered, the existing
    /// handle wins and `session` is dropped.
    pub fn insert(&self, session: InterviewSession) -> SharedSession {
        let id = session.id();
        let mut map = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone()
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_get_remove() {
        let registry = SessionRegistry::new();
        let session = InterviewSession::new("tea", None);
        let id = session.id();

        registry.insert(session);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.ids(), vec![id]);

        let handle = registry.get(&id).expect("session should be registered");
        assert_eq!(handle.lock().await.theme(), "tea");

        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_existing_session() {
        let registry = SessionRegistry::new();
        let mut first = InterviewSession::new("tea", None);
        first.record_user_turn("hello").unwrap();
        let id = first.id();
        let handle = registry.insert(first);

        let duplicate = InterviewSession::restore(
            id,
            "tea",
            None,
            Default::default(),
            false,
            chrono::Utc::now(),
        );
        let second = registry.insert(duplicate);

        assert!(Arc::ptr_eq(&handle, &second));
        assert_eq!(second.lock().await.turn_count(), 1);
    }
}

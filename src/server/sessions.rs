//! In-memory chat sessions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::chat::ChatHistory;
use crate::util::cache::LruCache;

/// Sessions kept before the least recently used one is dropped.
pub const MAX_SESSIONS: usize = 256;

/// One session's history. The lock is held for a whole turn.
pub type SessionHandle = Arc<Mutex<ChatHistory>>;

/// Session id → history, bounded by recency of use.
///
/// Histories die when the session is deleted, when it is evicted to make room
/// for a newer one, or with the process.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<LruCache<Uuid, SessionHandle>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(LruCache::new(capacity)),
        }
    }

    /// Open a new empty session, evicting the stalest one when full.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Arc::new(Mutex::new(ChatHistory::new())));
        debug!(session = %id, open = self.sessions.len(), "session.created");
        id
    }

    /// Look up a session and mark it as recently used.
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id)
    }

    /// Drop a session; returns whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
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

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();

        store.get(&a).unwrap().lock().await.append("user", "oi");

        assert_eq!(store.get(&a).unwrap().lock().await.len(), 1);
        assert!(store.get(&b).unwrap().lock().await.is_empty());
    }

    #[test]
    fn remove_destroys_history() {
        let store = SessionStore::new();
        let id = store.create();
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn full_store_drops_the_least_recently_used_session() {
        let store = SessionStore::with_capacity(2);
        let stale = store.create();
        let active = store.create();
        assert!(store.get(&active).is_some());

        let fresh = store.create();

        assert!(store.get(&stale).is_none());
        assert!(store.get(&active).is_some());
        assert!(store.get(&fresh).is_some());
        assert_eq!(store.len(), 2);
    }
}

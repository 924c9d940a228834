//! Session registry
//!
//! Thread-safe map from address to the one session registered for it.

use crate::transport::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of a compare-and-set registration
#[derive(Debug)]
pub enum Registration<S> {
    /// The session is now registered; a dead predecessor, if any, is handed back for closing
    Registered {
        /// Closed session that previously occupied the slot
        replaced: Option<Arc<S>>,
    },
    /// A live session was registered concurrently and is kept
    Existing(Arc<S>),
    /// The address is new and the registry is at its bound
    Full,
}

/// Registry of sessions keyed by address
///
/// Every operation holds the internal lock only for the map access itself,
/// never across a network operation on a session.
#[derive(Debug)]
pub struct SessionRegistry<S> {
    sessions: Mutex<HashMap<String, Arc<S>>>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionRegistry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the session registered for an address
    pub async fn get(&self, addr: &str) -> Option<Arc<S>> {
        self.sessions.lock().await.get(addr).cloned()
    }

    /// Register a session, overwriting and returning any previous entry
    ///
    /// The caller is responsible for closing the returned session.
    pub async fn put(&self, addr: &str, session: Arc<S>) -> Option<Arc<S>> {
        self.sessions.lock().await.insert(addr.to_string(), session)
    }

    /// Remove the entry for an address; no-op if absent
    pub async fn remove(&self, addr: &str) -> Option<Arc<S>> {
        self.sessions.lock().await.remove(addr)
    }

    /// Remove the entry only if it is still `session`
    ///
    /// Returns false when the address is absent or already holds a
    /// different session.
    pub async fn remove_if_same(&self, addr: &str, session: &Arc<S>) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(addr) {
            Some(current) if Arc::ptr_eq(current, session) => {
                sessions.remove(addr);
                true
            }
            _ => false,
        }
    }

    /// Number of registered addresses at this instant
    pub async fn size(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether an address has a registered session
    pub async fn contains(&self, addr: &str) -> bool {
        self.sessions.lock().await.contains_key(addr)
    }

    /// Whether a dial for `addr` may proceed under `max_sessions`
    ///
    /// An address that already holds an entry never counts against the
    /// bound, since registering it replaces or reuses that entry.
    pub async fn has_room(&self, addr: &str, max_sessions: usize) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.contains_key(addr) || sessions.len() < max_sessions
    }

    /// Remove and return every registered session
    pub async fn drain(&self) -> Vec<(String, Arc<S>)> {
        self.sessions.lock().await.drain().collect()
    }
}

impl<S: Session> SessionRegistry<S> {
    /// Register a freshly dialed session without ever overwriting a live one
    ///
    /// The capacity bound is checked under the same lock as the insert, so
    /// concurrent registrations can never push the size past `max_sessions`.
    pub async fn register(
        &self,
        addr: &str,
        session: Arc<S>,
        max_sessions: usize,
    ) -> Registration<S> {
        let mut sessions = self.sessions.lock().await;

        let replaced = match sessions.get(addr).cloned() {
            Some(current) if !current.is_closed() => return Registration::Existing(current),
            Some(_) => sessions.remove(addr),
            None if sessions.len() >= max_sessions => return Registration::Full,
            None => None,
        };

        sessions.insert(addr.to_string(), session);
        Registration::Registered { replaced }
    }
}

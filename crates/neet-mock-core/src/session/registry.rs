use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use super::exam::{ExamSession, SessionId, SessionSettings};

/// Shared handle to one session. Hold the lock for one logical operation.
pub type SessionHandle = Arc<AsyncMutex<ExamSession>>;

/// Owns every live session, keyed by id.
///
/// The map lock is only taken to look a handle up and is never held across
/// an `.await`; a slow paper generation in one session does not block any
/// other session.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, settings: SessionSettings) -> (SessionId, SessionHandle) {
        self.insert(ExamSession::new(settings))
    }

    /// Adopt an existing session, e.g. one restored from storage.
    pub fn insert(&self, session: ExamSession) -> (SessionId, SessionHandle) {
        let id = session.id();
        let handle = Arc::new(AsyncMutex::new(session));
        self.lock().insert(id, Arc::clone(&handle));
        tracing::debug!(session = %id, "session registered");
        (id, handle)
    }

    pub fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.lock().get(&id).cloned()
    }

    pub fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        self.lock().remove(&id)
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionHandle>> {
        // The map holds only Arcs, so a poisoned guard is still consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

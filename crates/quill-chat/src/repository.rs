//! Session persistence seam.
//!
//! The conversation store talks to sessions only through
//! [`SessionRepository`], so tests and embedders can supply isolated
//! instances instead of sharing one process-wide map.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::ChatError;
use crate::types::ConversationSession;

/// Keyed storage for conversation sessions.
pub trait SessionRepository: Send + Sync {
    /// Fetch a copy of the session.
    fn get(&self, id: &str) -> Result<Option<ConversationSession>, ChatError>;

    /// Insert or replace a session.
    fn put(&self, session: ConversationSession) -> Result<(), ChatError>;

    /// Mutate a session in place. Returns `false` if it does not exist.
    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut ConversationSession),
    ) -> Result<bool, ChatError>;

    /// Delete a session, returning it if it existed.
    fn remove(&self, id: &str) -> Result<Option<ConversationSession>, ChatError>;

    /// Copies of every stored session, in no particular order.
    fn all(&self) -> Result<Vec<ConversationSession>, ChatError>;

    fn len(&self) -> Result<usize, ChatError>;
}

/// Process-memory repository guarded by a single mutex.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, ConversationSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, ConversationSession>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn get(&self, id: &str) -> Result<Option<ConversationSession>, ChatError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn put(&self, session: ConversationSession) -> Result<(), ChatError> {
        self.lock()?.insert(session.id.clone(), session);
        Ok(())
    }

    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&mut ConversationSession),
    ) -> Result<bool, ChatError> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(id) {
            Some(session) => {
                apply(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: &str) -> Result<Option<ConversationSession>, ChatError> {
        Ok(self.lock()?.remove(id))
    }

    fn all(&self) -> Result<Vec<ConversationSession>, ChatError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn len(&self) -> Result<usize, ChatError> {
        Ok(self.lock()?.len())
    }
}

//! Conversation context management.
//!
//! Owns session lifecycle, the rolling turn window and running metrics,
//! and resolves follow-up references against prior turns.

use std::sync::Arc;

use quill_core::config::ConversationConfig;
use quill_core::types::Timestamp;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::repository::{InMemorySessionRepository, SessionRepository};
use crate::types::{
    ConversationContext, ConversationKind, ConversationSession, ConversationSummary, Turn,
};

/// Default number of turns returned by [`ConversationStore::get_history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

// =============================================================================
// ConversationStore
// =============================================================================

/// Registry of conversation sessions.
///
/// `message_count` tracks the retained window, not the all-time total: once
/// the window truncates, dropped turns no longer count.
pub struct ConversationStore {
    repository: Arc<dyn SessionRepository>,
    /// Idle time after which a session is evicted, if set.
    session_ttl_millis: Option<i64>,
    /// Maximum live sessions, if set.
    max_sessions: Option<usize>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySessionRepository::new()))
    }
}

impl ConversationStore {
    /// Create a store over `repository` with no expiry and no cap.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            session_ttl_millis: None,
            max_sessions: None,
        }
    }

    /// Create a store honouring the eviction settings in `config`.
    pub fn from_config(repository: Arc<dyn SessionRepository>, config: &ConversationConfig) -> Self {
        Self {
            repository,
            session_ttl_millis: config.session_ttl_millis(),
            max_sessions: config.session_cap(),
        }
    }

    pub fn with_ttl_millis(mut self, ttl_millis: i64) -> Self {
        self.session_ttl_millis = Some(ttl_millis);
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = Some(max_sessions);
        self
    }

    /// Create (or overwrite) a session.
    pub fn init(
        &self,
        id: &str,
        kind: ConversationKind,
        initial_context: Option<ConversationContext>,
    ) -> Result<ConversationSession, ChatError> {
        if self.repository.get(id)?.is_none() {
            self.make_room()?;
        }

        let session = ConversationSession::new(id, kind, initial_context.unwrap_or_default());
        self.repository.put(session.clone())?;
        info!(session_id = %id, kind = ?kind, "Conversation started");
        Ok(session)
    }

    /// Fetch a live session. Expired sessions are evicted and reported absent.
    pub fn get(&self, id: &str) -> Result<Option<ConversationSession>, ChatError> {
        let Some(session) = self.repository.get(id)? else {
            return Ok(None);
        };
        if self.is_expired(&session) {
            self.repository.remove(id)?;
            info!(session_id = %id, "Conversation expired and evicted");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Append a turn, dropping the oldest turns beyond `max_context_length`.
    pub fn add_message(
        &self,
        id: &str,
        turn: Turn,
        max_context_length: usize,
    ) -> Result<(), ChatError> {
        self.require(id)?;
        let mut turn = Some(turn);
        let found = self.repository.update(id, &mut |session| {
            if let Some(turn) = turn.take() {
                append_turn(session, turn, max_context_length);
            }
        })?;
        if !found {
            return Err(ChatError::SessionNotFound(id.to_string()));
        }
        debug!(session_id = %id, "Turn recorded");
        Ok(())
    }

    /// Apply `change` to the session context.
    pub fn update_context<F>(&self, id: &str, change: F) -> Result<(), ChatError>
    where
        F: FnOnce(&mut ConversationContext),
    {
        self.require(id)?;
        let mut change = Some(change);
        let found = self.repository.update(id, &mut |session| {
            if let Some(change) = change.take() {
                change(&mut session.context);
            }
        })?;
        if found {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(id.to_string()))
        }
    }

    /// The most recent `limit` retained turns, oldest first.
    pub fn get_history(&self, id: &str, limit: usize) -> Result<Vec<Turn>, ChatError> {
        let session = self.require(id)?;
        let skip = session.turns.len().saturating_sub(limit);
        Ok(session.turns.into_iter().skip(skip).collect())
    }

    pub fn get_summary(&self, id: &str) -> Result<ConversationSummary, ChatError> {
        Ok(summarize(&self.require(id)?))
    }

    /// Summaries of every live session, most recently updated first.
    pub fn list(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let mut sessions: Vec<ConversationSession> = self
            .repository
            .all()?
            .into_iter()
            .filter(|s| !self.is_expired(s))
            .collect();
        sessions.sort_by(|a, b| b.metadata.updated_at.cmp(&a.metadata.updated_at));
        Ok(sessions.iter().map(summarize).collect())
    }

    /// Delete a session outright.
    pub fn end(&self, id: &str) -> Result<(), ChatError> {
        self.require(id)?;
        self.repository
            .remove(id)?
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))?;
        info!(session_id = %id, "Conversation ended");
        Ok(())
    }

    /// Whether `session` has been idle longer than the configured TTL.
    pub fn is_expired(&self, session: &ConversationSession) -> bool {
        match self.session_ttl_millis {
            Some(ttl) => Timestamp::now().0 - session.metadata.updated_at.0 > ttl,
            None => false,
        }
    }

    // -- Private helpers --

    fn require(&self, id: &str) -> Result<ConversationSession, ChatError> {
        self.get(id)?
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    /// Evict expired sessions, then the least recently updated ones, until a
    /// new session fits under the cap.
    fn make_room(&self) -> Result<(), ChatError> {
        let Some(cap) = self.max_sessions else {
            return Ok(());
        };

        let mut sessions = self.repository.all()?;
        for expired in sessions.iter().filter(|s| self.is_expired(s)) {
            self.repository.remove(&expired.id)?;
        }
        sessions.retain(|s| !self.is_expired(s));

        sessions.sort_by(|a, b| a.metadata.updated_at.cmp(&b.metadata.updated_at));
        let excess = (sessions.len() + 1).saturating_sub(cap);
        for victim in sessions.iter().take(excess) {
            self.repository.remove(&victim.id)?;
            info!(session_id = %victim.id, "Conversation evicted to respect session cap");
        }
        Ok(())
    }
}

fn append_turn(session: &mut ConversationSession, turn: Turn, max_context_length: usize) {
    if let Some(ref metadata) = turn.metadata {
        session.metadata.record_latency(metadata.processing_time_ms);
    }
    session.turns.push_back(turn);
    while session.turns.len() > max_context_length {
        session.turns.pop_front();
    }
    session.metadata.message_count = session.turns.len();
    session.metadata.updated_at = Timestamp::now();
}

fn summarize(session: &ConversationSession) -> ConversationSummary {
    ConversationSummary {
        id: session.id.clone(),
        kind: session.kind,
        message_count: session.metadata.message_count,
        topic: session.context.current_topic.clone(),
        duration_ms: session
            .metadata
            .updated_at
            .millis_since(session.metadata.created_at),
        avg_latency_ms: session.metadata.average_response_time_ms,
    }
}

// =============================================================================
// FollowUpResolver
// =============================================================================

/// Phrases that point at one of the previously cited sources.
const ORDINAL_REFERENCES: &[(&[&str], usize)] = &[
    (&["first", "option 1"], 0),
    (&["second", "option 2"], 1),
    (&["third", "option 3"], 2),
];

/// Resolves references like "the first one" to sources cited earlier.
pub struct FollowUpResolver;

impl FollowUpResolver {
    /// Index of the source the follow-up text points at, if any.
    pub fn referenced_index(&self, text: &str) -> Option<usize> {
        let lower = text.to_lowercase();
        ORDINAL_REFERENCES
            .iter()
            .find(|(phrases, _)| phrases.iter().any(|p| lower.contains(p)))
            .map(|(_, index)| *index)
    }

    /// Document ids to record as selected for this follow-up.
    ///
    /// Looks at the sources cited by the most recent assistant turn. Returns
    /// `None` when the text has no reference or the reference is out of range.
    pub fn resolve(&self, text: &str, session: &ConversationSession) -> Option<Vec<String>> {
        let index = self.referenced_index(text)?;
        let cited = &session.last_assistant_turn()?.metadata.as_ref()?.sources;
        cited.get(index).map(|id| vec![id.clone()])
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Conversation orchestrator: entry point wiring classifier, search,
//! synthesizer and store together for each turn.
//!
//! Calls on the same session are serialized by a per-session async mutex
//! held for the whole turn, search included, so the user and assistant
//! turns of one call are always adjacent. Different sessions run
//! concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use quill_core::config::ConversationConfig;
use tracing::{debug, info, warn};

use crate::clarify;
use crate::context::{ConversationStore, FollowUpResolver, DEFAULT_HISTORY_LIMIT};
use crate::error::ChatError;
use crate::intent::IntentClassifier;
use crate::repository::{InMemorySessionRepository, SessionRepository};
use crate::response::ResponseSynthesizer;
use crate::search::SearchProvider;
use crate::types::{
    ConversationContext, ConversationKind, ConversationSession, ConversationSummary,
    ConversationalResponse, ResponseMetadata, Turn, TurnContext,
};

/// Preference key recording the style of the latest response.
pub const PREF_RESPONSE_STYLE: &str = "response_style";
/// Preference key recording the intent of the latest query.
pub const PREF_LAST_INTENT: &str = "last_intent";

type SessionLock = Arc<tokio::sync::Mutex<()>>;

/// Central coordinator for conversational search sessions.
pub struct ConversationOrchestrator {
    classifier: IntentClassifier,
    synthesizer: ResponseSynthesizer,
    follow_up_resolver: FollowUpResolver,
    store: ConversationStore,
    config: ConversationConfig,
    locks: Mutex<HashMap<String, SessionLock>>,
}

impl Default for ConversationOrchestrator {
    fn default() -> Self {
        Self::new(ConversationConfig::default())
    }
}

impl ConversationOrchestrator {
    /// Create an orchestrator backed by a fresh in-memory repository.
    pub fn new(config: ConversationConfig) -> Self {
        Self::with_repository(config, Arc::new(InMemorySessionRepository::new()))
    }

    /// Create an orchestrator over a caller-supplied session repository.
    pub fn with_repository(
        config: ConversationConfig,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        let store = ConversationStore::from_config(repository, &config);
        Self {
            classifier: IntentClassifier::default(),
            synthesizer: ResponseSynthesizer::default(),
            follow_up_resolver: FollowUpResolver,
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the intent classifier.
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Defaults used when a call passes no config of its own.
    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Create (or overwrite) a session.
    pub fn init_conversation(
        &self,
        id: &str,
        kind: ConversationKind,
        initial_context: Option<ConversationContext>,
    ) -> Result<ConversationSession, ChatError> {
        self.release_idle_locks()?;
        self.store.init(id, kind, initial_context)
    }

    /// Answer `query` within session `id`.
    ///
    /// Fails with [`ChatError::SessionNotFound`] for an unknown session and
    /// with [`ChatError::UpstreamSearch`] if the search provider fails; in
    /// the latter case no turns are recorded.
    pub async fn process_query(
        &self,
        id: &str,
        query: &str,
        search: &dyn SearchProvider,
        config: Option<&ConversationConfig>,
    ) -> Result<ConversationalResponse, ChatError> {
        let config = config.unwrap_or(&self.config);
        let lock = self.session_lock(id)?;
        let _guard = lock.lock().await;

        self.run_turn(id, query, search, config).await
    }

    /// Answer a follow-up, first resolving references such as "the first
    /// one" against the sources cited by the previous answer.
    pub async fn continue_conversation(
        &self,
        id: &str,
        follow_up: &str,
        search: &dyn SearchProvider,
        config: Option<&ConversationConfig>,
    ) -> Result<ConversationalResponse, ChatError> {
        let config = config.unwrap_or(&self.config);
        let lock = self.session_lock(id)?;
        let _guard = lock.lock().await;

        if config.enable_multi_turn {
            let session = self.require(id)?;
            if let Some(selected) = self.follow_up_resolver.resolve(follow_up, &session) {
                debug!(session_id = %id, selected = ?selected, "Resolved follow-up reference");
                self.store
                    .update_context(id, |ctx| ctx.selected_results = selected)?;
            }
        }

        self.run_turn(id, follow_up, search, config).await
    }

    /// A copy of the session, or `None` if it does not exist (or expired).
    pub fn get_conversation(&self, id: &str) -> Result<Option<ConversationSession>, ChatError> {
        self.store.get(id)
    }

    /// The most recent retained turns, oldest first. `limit` defaults to 20.
    pub fn get_conversation_history(
        &self,
        id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Turn>, ChatError> {
        self.store
            .get_history(id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    }

    pub fn get_conversation_summary(&self, id: &str) -> Result<ConversationSummary, ChatError> {
        self.store.get_summary(id)
    }

    /// Summaries of every live session, most recently updated first.
    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.store.list()
    }

    /// Delete a session. Waits for any in-flight turn on it to finish.
    pub async fn end_conversation(&self, id: &str) -> Result<(), ChatError> {
        let lock = self.session_lock(id)?;
        let guard = lock.lock().await;
        self.store.end(id)?;
        drop(guard);

        self.locks_guard()?.remove(id);
        Ok(())
    }

    pub fn generate_clarification_questions(
        &self,
        query: &str,
        session: &ConversationSession,
    ) -> Vec<String> {
        clarify::generate_clarification_questions(query, session)
    }

    // -- Private helpers --

    /// One full turn. The caller holds the session lock.
    async fn run_turn(
        &self,
        id: &str,
        query: &str,
        search: &dyn SearchProvider,
        config: &ConversationConfig,
    ) -> Result<ConversationalResponse, ChatError> {
        let started = Instant::now();
        let session = self.require(id)?;

        let intent = self.classifier.classify(query, &session);
        debug!(session_id = %id, intent = ?intent, "Classified query");

        let results = search.search(query).await.map_err(|e| {
            warn!(session_id = %id, error = %e, "Search provider failed");
            ChatError::UpstreamSearch(e)
        })?;
        debug!(session_id = %id, results = results.len(), "Search returned");

        let mut response =
            self.synthesizer
                .synthesize(query, intent, &results, config.response_style);

        if !config.enable_suggestions {
            response.suggested_actions.clear();
        }
        if config.enable_clarification && response.sources.is_empty() {
            for question in clarify::generate_clarification_questions(query, &session) {
                if !response.follow_up_questions.contains(&question) {
                    response.follow_up_questions.push(question);
                }
            }
        }
        response.processing_time_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let user_turn = Turn::user(
            query,
            TurnContext {
                query: query.to_string(),
                results,
                intent,
            },
        );
        let assistant_turn = Turn::assistant(
            response.text.clone(),
            ResponseMetadata {
                confidence: response.confidence,
                sources: response.sources.iter().map(|s| s.id.clone()).collect(),
                processing_time_ms: response.processing_time_ms,
            },
        );
        self.store
            .add_message(id, user_turn, config.max_context_length)?;
        self.store
            .add_message(id, assistant_turn, config.max_context_length)?;

        let update = response.context_update.clone();
        let style = config.response_style;
        let personalize = config.enable_personalization;
        self.store.update_context(id, |ctx| {
            if let Some(update) = update {
                if let Some(topic) = update.current_topic {
                    ctx.current_topic = Some(topic);
                }
                if let Some(goal) = update.user_goal {
                    ctx.user_goal = Some(goal);
                }
            }
            ctx.last_query = Some(query.to_string());
            ctx.search_history.push(query.to_string());
            if personalize {
                ctx.preferences
                    .insert(PREF_RESPONSE_STYLE.to_string(), style.as_str().into());
                ctx.preferences
                    .insert(PREF_LAST_INTENT.to_string(), intent.as_str().into());
            }
        })?;

        info!(
            session_id = %id,
            intent = ?intent,
            sources = response.sources.len(),
            elapsed_ms = response.processing_time_ms,
            "Query answered"
        );
        Ok(response)
    }

    fn require(&self, id: &str) -> Result<ConversationSession, ChatError> {
        self.store
            .get(id)?
            .ok_or_else(|| ChatError::SessionNotFound(id.to_string()))
    }

    /// The async mutex serializing turns on session `id`.
    ///
    /// Fails fast for unknown sessions so no lock is registered for them.
    fn session_lock(&self, id: &str) -> Result<SessionLock, ChatError> {
        self.require(id)?;
        let mut locks = self.locks_guard()?;
        Ok(locks.entry(id.to_string()).or_default().clone())
    }

    /// Drop locks nobody holds or waits on. They are recreated on demand.
    fn release_idle_locks(&self) -> Result<(), ChatError> {
        self.locks_guard()?
            .retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(())
    }

    fn locks_guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionLock>>, ChatError> {
        self.locks
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock registry poisoned: {}", e)))
    }
}

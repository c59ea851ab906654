//! Conversational search for Quill.
//!
//! Classifies query intent, runs a caller-supplied search, synthesizes a
//! templated answer with follow-ups, and keeps per-session dialogue state.

pub mod clarify;
pub mod context;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod repository;
pub mod response;
pub mod search;
pub mod terms;
pub mod types;

pub use clarify::generate_clarification_questions;
pub use context::{ConversationStore, FollowUpResolver, DEFAULT_HISTORY_LIMIT};
pub use error::{ChatError, SearchFailure};
pub use intent::{IntentClassifier, IntentRule, Predicate};
pub use orchestrator::ConversationOrchestrator;
pub use repository::{InMemorySessionRepository, SessionRepository};
pub use response::ResponseSynthesizer;
pub use search::{FnSearch, SearchProvider};
pub use terms::KeyTerms;
pub use types::{
    ActionKind, ContextUpdate, ConversationContext, ConversationKind, ConversationSession,
    ConversationSummary, ConversationalResponse, QueryIntent, ResponseMetadata, Role,
    SessionMetrics, SourceRef, SuggestedAction, Turn, TurnContext,
};

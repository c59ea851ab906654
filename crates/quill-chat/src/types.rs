//! Conversation data model.

use std::collections::{BTreeMap, VecDeque};

use quill_core::types::{ScoredDocument, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// What kind of conversation a session is, fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    QuestionAnswering,
    Exploratory,
    Comparison,
    Tutorial,
    Troubleshooting,
    Recommendation,
    Research,
    Creative,
}

/// Classified purpose of a single user query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    QuestionAnswering,
    Comparison,
    Troubleshooting,
    Recommendation,
    Exploratory,
}

impl QueryIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryIntent::QuestionAnswering => "question_answering",
            QueryIntent::Comparison => "comparison",
            QueryIntent::Troubleshooting => "troubleshooting",
            QueryIntent::Recommendation => "recommendation",
            QueryIntent::Exploratory => "exploratory",
        }
    }

    /// Goal recorded in the session context after a query with this intent.
    pub fn user_goal(&self) -> &'static str {
        match self {
            QueryIntent::QuestionAnswering => "find an answer",
            QueryIntent::Comparison => "compare options",
            QueryIntent::Troubleshooting => "resolve an issue",
            QueryIntent::Recommendation => "get a recommendation",
            QueryIntent::Exploratory => "explore a topic",
        }
    }
}

impl std::fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Tag telling the caller how to interpret a [`SuggestedAction`] payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Search,
    Filter,
    Sort,
}

// =============================================================================
// Turns
// =============================================================================

/// What produced a user turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    pub query: String,
    pub results: Vec<ScoredDocument>,
    pub intent: QueryIntent,
}

/// Response details attached to an assistant turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Confidence in `0.0..=1.0`.
    pub confidence: f32,
    /// Ids of the cited documents, in citation order.
    pub sources: Vec<String>,
    pub processing_time_ms: u64,
}

/// One message within a conversation. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TurnContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Timestamp::now(),
            context: None,
            metadata: None,
        }
    }

    /// A user query, remembering the results and intent it produced.
    pub fn user(content: impl Into<String>, context: TurnContext) -> Self {
        Self {
            context: Some(context),
            ..Self::new(Role::User, content)
        }
    }

    /// An assistant reply carrying its response metadata.
    pub fn assistant(content: impl Into<String>, metadata: ResponseMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Mutable per-session scratch state, updated after every turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    pub current_topic: Option<String>,
    pub user_goal: Option<String>,
    pub last_query: Option<String>,
    /// Every query asked in this session, oldest first.
    pub search_history: Vec<String>,
    /// Document ids the user has singled out.
    pub selected_results: Vec<String>,
    pub preferences: BTreeMap<String, serde_json::Value>,
}

/// Running session counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Number of retained turns. Always equals `turns.len()`.
    pub message_count: usize,
    /// Incremental mean of assistant-turn processing time.
    pub average_response_time_ms: f64,
    /// Turns folded into `average_response_time_ms`.
    pub latency_samples: u64,
}

impl SessionMetrics {
    fn new() -> Self {
        let now = Timestamp::now();
        Self {
            created_at: now,
            updated_at: now,
            message_count: 0,
            average_response_time_ms: 0.0,
            latency_samples: 0,
        }
    }

    /// Fold one latency sample into the running mean.
    pub fn record_latency(&mut self, latency_ms: u64) {
        self.latency_samples += 1;
        let n = self.latency_samples as f64;
        self.average_response_time_ms += (latency_ms as f64 - self.average_response_time_ms) / n;
    }
}

/// A conversation: its turns, context, and metrics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub kind: ConversationKind,
    /// Retained turns, oldest first.
    pub turns: VecDeque<Turn>,
    pub context: ConversationContext,
    pub metadata: SessionMetrics,
}

impl ConversationSession {
    pub fn new(id: impl Into<String>, kind: ConversationKind, context: ConversationContext) -> Self {
        Self {
            id: id.into(),
            kind,
            turns: VecDeque::new(),
            context,
            metadata: SessionMetrics::new(),
        }
    }

    /// The most recent assistant turn still in the window.
    pub fn last_assistant_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }
}

/// Snapshot returned by `get_conversation_summary`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub kind: ConversationKind,
    pub message_count: usize,
    pub topic: Option<String>,
    pub duration_ms: u64,
    pub avg_latency_ms: f64,
}

// =============================================================================
// Response
// =============================================================================

/// A cited document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub url: String,
    pub relevance: f32,
}

/// Something the caller may offer the user next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    /// Opaque payload interpreted by the caller.
    pub action: serde_json::Value,
}

/// Context changes a response asks the session to apply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextUpdate {
    pub current_topic: Option<String>,
    pub user_goal: Option<String>,
}

/// The synthesized answer to one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationalResponse {
    pub text: String,
    pub intent: QueryIntent,
    pub confidence: f32,
    pub sources: Vec<SourceRef>,
    pub follow_up_questions: Vec<String>,
    pub suggested_actions: Vec<SuggestedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_update: Option<ContextUpdate>,
    /// Wall-clock time of the whole turn, search included. Zero until the
    /// orchestrator fills it in.
    pub processing_time_ms: u64,
}

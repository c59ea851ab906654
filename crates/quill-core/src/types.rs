use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Shape of the natural-language text produced for a response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStyle {
    /// Truncated to a short paragraph.
    Concise,
    /// Full snippets interleaved with source titles (default).
    #[default]
    Detailed,
    /// Adds source attribution framing.
    Technical,
    /// Rendered like `Detailed`.
    Casual,
}

impl ResponseStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStyle::Concise => "concise",
            ResponseStyle::Detailed => "detailed",
            ResponseStyle::Technical => "technical",
            ResponseStyle::Casual => "casual",
        }
    }
}

/// Requested response language.
///
/// Accepted and stored, but every template is English: no translation
/// happens anywhere in the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Zh,
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in milliseconds since epoch.
///
/// Compared by value. Two Timestamps with the same inner value are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.0).unwrap_or_default()
    }

    /// Milliseconds elapsed from `earlier` to `self`, clamped at zero.
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        u64::try_from(self.0 - earlier.0).unwrap_or(0)
    }
}

// =============================================================================
// ScoredDocument
// =============================================================================

/// Relevance assumed for a document that carries no similarity score.
pub const DEFAULT_RELEVANCE: f32 = 0.5;

/// A search hit handed back by the external search function.
///
/// `id`, `title` and `url` are always present. The text fields are optional
/// and consulted in priority order (snippet, summary, content) wherever an
/// excerpt is needed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Similarity to the query in `0.0..=1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    /// Query-specific highlight produced by the search backend.
    #[serde(default, rename = "_snippet", skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl ScoredDocument {
    /// Create a document with only the required fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            similarity: None,
            snippet: None,
            summary: None,
            content: None,
            rating: None,
        }
    }

    pub fn with_similarity(mut self, similarity: f32) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Similarity score, or [`DEFAULT_RELEVANCE`] when the backend gave none.
    pub fn relevance(&self) -> f32 {
        self.similarity.unwrap_or(DEFAULT_RELEVANCE)
    }

    /// The best available body text: snippet, then summary, then content.
    ///
    /// Empty fields are skipped. Returns `""` when nothing is set.
    pub fn best_text(&self) -> &str {
        [&self.snippet, &self.summary, &self.content]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|text| !text.is_empty())
            .unwrap_or("")
    }

    /// The first `max_chars` characters of [`best_text`](Self::best_text).
    pub fn excerpt(&self, max_chars: usize) -> String {
        self.best_text().chars().take(max_chars).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

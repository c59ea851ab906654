use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QuillError, Result};
use crate::types::{Language, ResponseStyle};

/// Top-level configuration for Quill.
///
/// Loaded from `~/.quill/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
}

impl QuillConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QuillConfig = toml::from_str(&content)?;
        config.conversation.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation behaviour.
///
/// Used both as the orchestrator's defaults and as the optional per-call
/// override for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Turns retained per session; older turns are dropped first.
    pub max_context_length: usize,
    /// Resolve references like "the first one" against the previous answer.
    pub enable_multi_turn: bool,
    /// Append clarification questions when nothing relevant was found.
    pub enable_clarification: bool,
    /// Attach suggested actions to every response.
    pub enable_suggestions: bool,
    pub response_style: ResponseStyle,
    /// Accepted but inert: templates are always English.
    pub language: Language,
    /// Record style and intent preferences in the session context.
    pub enable_personalization: bool,
    /// Idle minutes before a session is evicted. 0 disables expiry.
    pub session_ttl_minutes: u32,
    /// Maximum live sessions; the least recently updated is evicted first.
    /// 0 means unbounded.
    pub max_sessions: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_context_length: 10,
            enable_multi_turn: true,
            enable_clarification: true,
            enable_suggestions: true,
            response_style: ResponseStyle::Detailed,
            language: Language::En,
            enable_personalization: true,
            session_ttl_minutes: 0,
            max_sessions: 0,
        }
    }
}

impl ConversationConfig {
    /// Reject settings that would leave a session unable to hold any turn.
    pub fn validate(&self) -> Result<()> {
        if self.max_context_length == 0 {
            return Err(QuillError::Config(
                "conversation.max_context_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Session idle timeout in milliseconds, if expiry is enabled.
    pub fn session_ttl_millis(&self) -> Option<i64> {
        (self.session_ttl_minutes > 0).then(|| i64::from(self.session_ttl_minutes) * 60 * 1000)
    }

    /// Session cap, if one is configured.
    pub fn session_cap(&self) -> Option<usize> {
        (self.max_sessions > 0).then_some(self.max_sessions)
    }
}

/// Document corpus used by the command-line front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Path to a JSON array of documents.
    pub path: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: "corpus.json".to_string(),
        }
    }
}

//! CLI argument definitions for the Quill application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use quill_chat::ConversationKind;
use quill_core::types::ResponseStyle;
use std::path::PathBuf;

/// Quill: conversational search over a local document corpus.
#[derive(Parser, Debug)]
#[command(name = "quill", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// JSON file holding the documents to search.
    #[arg(long = "corpus")]
    pub corpus: Option<PathBuf>,

    /// Response style (concise, detailed, technical, casual).
    #[arg(long = "style", value_parser = parse_style)]
    pub style: Option<ResponseStyle>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Conversation kind for the session.
    #[arg(long = "kind", value_parser = parse_kind, default_value = "exploratory")]
    pub kind: ConversationKind,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QUILL_CONFIG env var > platform default (~/.quill/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QUILL_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the corpus path.
    ///
    /// Priority: --corpus flag > config file value.
    pub fn resolve_corpus_path(&self, config_path: &str) -> PathBuf {
        self.corpus
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > config file value > "info".
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if !config_level.is_empty() {
            return config_level.to_string();
        }
        "info".to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".quill").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".quill").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Parse a snake_case variant name through its serde representation.
fn parse_snake_case<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| format!("unknown value '{}'", s))
}

fn parse_style(s: &str) -> Result<ResponseStyle, String> {
    parse_snake_case(s)
}

fn parse_kind(s: &str) -> Result<ConversationKind, String> {
    parse_snake_case(&s.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::parse_from(["quill"]);
        assert!(args.config.is_none());
        assert!(args.style.is_none());
        assert_eq!(args.kind, ConversationKind::Exploratory);
    }

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::parse_from([
            "quill",
            "-c",
            "/tmp/q.toml",
            "--corpus",
            "docs.json",
            "--style",
            "technical",
            "-l",
            "debug",
            "--kind",
            "question-answering",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/q.toml"));
        assert_eq!(args.resolve_corpus_path("ignored.json"), PathBuf::from("docs.json"));
        assert_eq!(args.style, Some(ResponseStyle::Technical));
        assert_eq!(args.resolve_log_level("warn"), "debug");
        assert_eq!(args.kind, ConversationKind::QuestionAnswering);
    }

    #[test]
    fn test_invalid_style_rejected() {
        assert!(CliArgs::try_parse_from(["quill", "--style", "poetic"]).is_err());
    }

    #[test]
    fn test_fallbacks_to_config_values() {
        let args = CliArgs::parse_from(["quill"]);
        assert_eq!(args.resolve_corpus_path("corpus.json"), PathBuf::from("corpus.json"));
        assert_eq!(args.resolve_log_level("warn"), "warn");
        assert_eq!(args.resolve_log_level(""), "info");
    }
}

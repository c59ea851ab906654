//! Error types for the conversational search service.

use quill_core::error::QuillError;

/// Error produced by an injected search function.
///
/// Carried through [`ChatError::UpstreamSearch`] untouched so callers can
/// downcast it back to their own type.
pub type SearchFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("search failed: {0}")]
    UpstreamSearch(#[source] SearchFailure),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<QuillError> for ChatError {
    fn from(err: QuillError) -> Self {
        ChatError::StorageError(err.to_string())
    }
}

//! External search seam.
//!
//! The orchestrator never retrieves documents itself; callers hand it a
//! [`SearchProvider`] for each turn.

use std::future::Future;

use async_trait::async_trait;
use quill_core::types::ScoredDocument;

use crate::error::SearchFailure;

/// Something that can answer a query with scored documents.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ScoredDocument>, SearchFailure>;
}

/// Adapts an async closure into a [`SearchProvider`].
///
/// ```ignore
/// let search = FnSearch(|query: String| async move {
///     Ok::<_, SearchFailure>(vec![ScoredDocument::new("1", query, "https://example.org")])
/// });
/// ```
pub struct FnSearch<F>(pub F);

#[async_trait]
impl<F, Fut> SearchProvider for FnSearch<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<ScoredDocument>, SearchFailure>> + Send,
{
    async fn search(&self, query: &str) -> Result<Vec<ScoredDocument>, SearchFailure> {
        (self.0)(query.to_string()).await
    }
}

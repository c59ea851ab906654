//! Local document corpus and the keyword search run over it.

use std::path::Path;

use async_trait::async_trait;
use quill_chat::{KeyTerms, SearchFailure, SearchProvider};
use quill_core::types::ScoredDocument;
use quill_core::Result;
use tracing::{debug, info};

/// Maximum documents returned per query.
const MAX_HITS: usize = 10;

/// Load a JSON array of documents.
pub fn load_corpus(path: &Path) -> Result<Vec<ScoredDocument>> {
    let content = std::fs::read_to_string(path)?;
    let docs: Vec<ScoredDocument> = serde_json::from_str(&content)?;
    info!(path = %path.display(), documents = docs.len(), "Corpus loaded");
    Ok(docs)
}

/// Scores documents by the share of query key terms they mention.
pub struct KeywordSearch {
    documents: Vec<ScoredDocument>,
}

impl KeywordSearch {
    pub fn new(documents: Vec<ScoredDocument>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn rank(&self, query: &str) -> Vec<ScoredDocument> {
        let terms = KeyTerms::extract(query);
        let total = terms.len();
        if total == 0 {
            return Vec::new();
        }

        let mut hits: Vec<ScoredDocument> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let haystack = format!("{} {}", doc.title, doc.best_text()).to_lowercase();
                let matched = terms.iter().filter(|t| haystack.contains(t)).count();
                (matched > 0).then(|| {
                    doc.clone()
                        .with_similarity(matched as f32 / total as f32)
                })
            })
            .collect();

        hits.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        hits.truncate(MAX_HITS);
        hits
    }
}

#[async_trait]
impl SearchProvider for KeywordSearch {
    async fn search(&self, query: &str) -> std::result::Result<Vec<ScoredDocument>, SearchFailure> {
        let hits = self.rank(query);
        debug!(query, hits = hits.len(), "Keyword search");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corpus() -> KeywordSearch {
        KeywordSearch::new(vec![
            ScoredDocument::new("1", "Ownership in Rust", "/own")
                .with_summary("Every value has exactly one owner."),
            ScoredDocument::new("2", "Borrowing", "/borrow")
                .with_content("Shared and mutable references to an owner's value."),
            ScoredDocument::new("3", "Gardening", "/garden").with_snippet("Tomatoes need sun."),
        ])
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_overlap() {
        let hits = corpus().search("rust ownership value").await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(hits[0].similarity, Some(1.0));
        assert!((hits[1].relevance() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_without_terms_is_empty() {
        assert!(corpus().search("is it?").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_no_match() {
        assert!(corpus().search("quantum chromodynamics").await.unwrap().is_empty());
    }

    #[test]
    fn test_load_corpus_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"a","title":"Doc A","url":"/a","_snippet":"alpha"}},
                {{"id":"b","title":"Doc B","url":"/b","similarity":0.4}}]"#
        )
        .unwrap();

        let docs = load_corpus(file.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].snippet.as_deref(), Some("alpha"));
        assert_eq!(docs[1].similarity, Some(0.4));
    }

    #[test]
    fn test_load_corpus_missing_file() {
        let err = load_corpus(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, quill_core::QuillError::Io(_)));
    }

    #[test]
    fn test_load_corpus_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_corpus(file.path()).is_err());
    }
}

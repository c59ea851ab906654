//! Key-term extraction.
//!
//! Lower-cases a query, strips punctuation, and keeps the words that carry
//! meaning: anything longer than two characters that is not a stop word.

use std::sync::LazyLock;

use regex::Regex;

static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("Invalid punctuation regex"));

/// Articles, auxiliary verbs, question words, prepositions and other glue.
static STOP_WORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "been", "being", "have", "has", "had", "does", "did",
    "will", "would", "shall", "should", "can", "could", "may", "might", "must", "what",
    "which", "who", "whom", "whose", "when", "where", "why", "how", "for", "from", "with",
    "into", "onto", "about", "above", "below", "between", "through", "during", "before",
    "after", "under", "over", "this", "that", "these", "those", "there", "their", "they",
    "them", "you", "your", "our", "but", "not", "any", "all", "its", "than", "then", "also",
    "just", "very", "some",
];

/// Salient terms of a query.
///
/// Holds the normalized text; every call to [`iter`](Self::iter) starts a
/// fresh lazy pass over it, so the sequence can be walked any number of
/// times and always yields the same terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTerms {
    normalized: String,
}

impl KeyTerms {
    pub fn extract(query: &str) -> Self {
        let lower = query.to_lowercase();
        let normalized = PUNCTUATION_RE.replace_all(&lower, "").into_owned();
        Self { normalized }
    }

    pub fn iter(&self) -> Terms<'_> {
        Terms {
            words: self.normalized.split_whitespace(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.iter().next()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    /// Collect the terms into owned strings.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_string).collect()
    }

    /// The terms joined by single spaces.
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

impl<'a> IntoIterator for &'a KeyTerms {
    type Item = &'a str;
    type IntoIter = Terms<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the terms of a [`KeyTerms`].
#[derive(Debug, Clone)]
pub struct Terms<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Iterator for Terms<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.words.by_ref().find(|w| is_key_term(w))
    }
}

/// Extract the key terms of `query`.
pub fn extract(query: &str) -> KeyTerms {
    KeyTerms::extract(query)
}

fn is_key_term(word: &str) -> bool {
    word.chars().count() > 2 && !STOP_WORDS.contains(&word)
}

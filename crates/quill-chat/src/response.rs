//! Response synthesis for conversational queries.
//!
//! Composes human-readable answers from ranked search results using
//! intent-specific templates, without requiring an LLM.

use quill_core::types::{ResponseStyle, ScoredDocument};
use serde_json::json;

use crate::terms::KeyTerms;
use crate::types::{
    ActionKind, ContextUpdate, ConversationalResponse, QueryIntent, SourceRef, SuggestedAction,
};

/// Results at or below this similarity are ignored.
pub const MIN_SIMILARITY: f32 = 0.1;
/// Maximum number of results cited in one response.
pub const MAX_RELEVANT_RESULTS: usize = 5;
/// Length of a source excerpt, in characters.
pub const EXCERPT_CHARS: usize = 150;
/// Length of a concise response, in characters (before the ellipsis).
pub const CONCISE_CHARS: usize = 150;

const NO_RESULTS_CONFIDENCE: f32 = 0.5;
const FALLBACK_TOPIC: &str = "this topic";

/// Fixed confidence reported for a response with at least one relevant result.
pub fn intent_confidence(intent: QueryIntent) -> f32 {
    match intent {
        QueryIntent::QuestionAnswering => 0.8,
        QueryIntent::Comparison => 0.7,
        QueryIntent::Troubleshooting => 0.75,
        QueryIntent::Recommendation => 0.8,
        QueryIntent::Exploratory => 0.6,
    }
}

/// Text, confidence and follow-ups produced by one template.
struct Draft {
    text: String,
    confidence: f32,
    follow_ups: Vec<String>,
}

// =============================================================================
// ResponseSynthesizer
// =============================================================================

/// Builds [`ConversationalResponse`]s from ranked search results.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    /// Maximum number of results to cite.
    pub max_results: usize,
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new(MAX_RELEVANT_RESULTS)
    }
}

impl ResponseSynthesizer {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    /// Keep results above [`MIN_SIMILARITY`], best first, capped at `max_results`.
    ///
    /// Equal scores keep their original order.
    pub fn relevant_results<'a>(&self, results: &'a [ScoredDocument]) -> Vec<&'a ScoredDocument> {
        let mut relevant: Vec<&ScoredDocument> = results
            .iter()
            .filter(|r| r.relevance() > MIN_SIMILARITY)
            .collect();
        relevant.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        relevant.truncate(self.max_results);
        relevant
    }

    /// Compose the full response for `query`.
    ///
    /// Never fails: an empty or irrelevant result set produces an apology with
    /// no sources.
    pub fn synthesize(
        &self,
        query: &str,
        intent: QueryIntent,
        results: &[ScoredDocument],
        style: ResponseStyle,
    ) -> ConversationalResponse {
        let terms = KeyTerms::extract(query);
        let topic = terms.first().unwrap_or(FALLBACK_TOPIC);
        let relevant = self.relevant_results(results);

        let draft = if relevant.is_empty() {
            no_results_draft(query, intent, topic)
        } else {
            match intent {
                QueryIntent::QuestionAnswering => question_draft(&relevant, style, topic),
                QueryIntent::Comparison => comparison_draft(&relevant, style, topic),
                QueryIntent::Troubleshooting => troubleshooting_draft(&relevant, style, topic),
                QueryIntent::Recommendation => recommendation_draft(&relevant, style, topic),
                QueryIntent::Exploratory => exploratory_draft(&relevant, style, topic),
            }
        };

        let text = if style == ResponseStyle::Concise {
            truncate_with_ellipsis(&draft.text, CONCISE_CHARS)
        } else {
            draft.text
        };

        ConversationalResponse {
            text,
            intent,
            confidence: draft.confidence,
            sources: relevant.iter().map(|doc| source_ref(doc)).collect(),
            follow_up_questions: draft.follow_ups,
            suggested_actions: self.suggested_actions(query, &terms),
            context_update: Some(ContextUpdate {
                current_topic: terms.first().map(str::to_string),
                user_goal: Some(intent.user_goal().to_string()),
            }),
            processing_time_ms: 0,
        }
    }

    /// The three actions offered with every response.
    pub fn suggested_actions(&self, query: &str, terms: &KeyTerms) -> Vec<SuggestedAction> {
        let search_query = if terms.is_empty() {
            query.trim().to_string()
        } else {
            terms.joined()
        };

        vec![
            SuggestedAction {
                kind: ActionKind::Search,
                label: "Search for related topics".to_string(),
                action: json!({ "query": search_query }),
            },
            SuggestedAction {
                kind: ActionKind::Filter,
                label: "Filter by category".to_string(),
                action: json!({ "filter": "category" }),
            },
            SuggestedAction {
                kind: ActionKind::Sort,
                label: "Sort by relevance".to_string(),
                action: json!({ "sort": "relevance" }),
            },
        ]
    }
}

// =============================================================================
// Templates
// =============================================================================

fn no_results_draft(query: &str, intent: QueryIntent, topic: &str) -> Draft {
    let query = query.trim();
    let text = match intent {
        QueryIntent::QuestionAnswering => format!(
            "I couldn't find specific information to answer \"{}\". Try rephrasing your question or using different keywords.",
            query
        ),
        QueryIntent::Comparison => format!(
            "I couldn't find enough information to compare the items in \"{}\". Try naming the options you want compared.",
            query
        ),
        QueryIntent::Troubleshooting => format!(
            "I couldn't find any solutions for \"{}\". Try describing the error message or the steps that lead to it.",
            query
        ),
        QueryIntent::Recommendation => format!(
            "I couldn't find any recommendations matching \"{}\". Try broadening what you're looking for.",
            query
        ),
        QueryIntent::Exploratory => format!(
            "I couldn't find any content related to \"{}\". Try a broader search or different keywords.",
            query
        ),
    };

    Draft {
        text,
        confidence: NO_RESULTS_CONFIDENCE,
        follow_ups: vec![
            "Could you rephrase your question?".to_string(),
            format!("Would you like to explore topics related to {}?", topic),
        ],
    }
}

fn question_draft(results: &[&ScoredDocument], style: ResponseStyle, topic: &str) -> Draft {
    let top = results[0];
    let mut text = match style {
        ResponseStyle::Technical => format!(
            "According to \"{}\" (relevance {:.2}): {}",
            top.title,
            top.relevance(),
            top.best_text()
        ),
        _ => format!("Based on \"{}\": {}", top.title, top.best_text()),
    };

    if results.len() > 1 {
        let others: Vec<&str> = results[1..].iter().map(|r| r.title.as_str()).collect();
        text.push_str(&format!(
            "\n\nYou may also find these helpful: {}.",
            others.join(", ")
        ));
    }

    Draft {
        text: with_attribution(text, results, style),
        confidence: intent_confidence(QueryIntent::QuestionAnswering),
        follow_ups: vec![
            format!("Can you tell me more about {}?", topic),
            format!("What are some practical examples of {}?", topic),
        ],
    }
}

fn comparison_draft(results: &[&ScoredDocument], style: ResponseStyle, topic: &str) -> Draft {
    let intro = format!(
        "Here's how {} compare:",
        plural(results.len(), "source", "sources")
    );
    let entries = results.iter().enumerate().map(|(i, doc)| {
        format!("- {}", entry(doc, i, style))
    });

    Draft {
        text: with_attribution(list_text(intro, entries), results, style),
        confidence: intent_confidence(QueryIntent::Comparison),
        follow_ups: vec![
            "What are the key advantages of each option?".to_string(),
            format!("Which {} option is best for beginners?", topic),
        ],
    }
}

fn troubleshooting_draft(results: &[&ScoredDocument], style: ResponseStyle, topic: &str) -> Draft {
    let intro = "Here are some possible solutions:".to_string();
    let entries = results
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("{}. {}", i + 1, entry(doc, i, style)));

    Draft {
        text: with_attribution(list_text(intro, entries), results, style),
        confidence: intent_confidence(QueryIntent::Troubleshooting),
        follow_ups: vec![
            "What if this solution doesn't work?".to_string(),
            format!("How can I prevent {} problems in the future?", topic),
        ],
    }
}

fn recommendation_draft(results: &[&ScoredDocument], style: ResponseStyle, topic: &str) -> Draft {
    let intro = "Here are my top recommendations:".to_string();
    let entries = results.iter().enumerate().map(|(i, doc)| {
        let rating = doc
            .rating
            .map(|r| format!(" (rated {:.1}/5)", r))
            .unwrap_or_default();
        format!("{}. {}{}", i + 1, entry(doc, i, style), rating)
    });

    Draft {
        text: with_attribution(list_text(intro, entries), results, style),
        confidence: intent_confidence(QueryIntent::Recommendation),
        follow_ups: vec![
            format!("What are the alternatives for {}?", topic),
            format!("Which {} option is the most popular?", topic),
        ],
    }
}

fn exploratory_draft(results: &[&ScoredDocument], style: ResponseStyle, topic: &str) -> Draft {
    let intro = format!(
        "I found {} related to your query:",
        plural(results.len(), "result", "results")
    );
    let entries = results
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("- {}", entry(doc, i, style)));

    Draft {
        text: with_attribution(list_text(intro, entries), results, style),
        confidence: intent_confidence(QueryIntent::Exploratory),
        follow_ups: vec![
            format!("What are the latest developments in {}?", topic),
            format!("Can you explain {} in more detail?", topic),
        ],
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// One result rendered for a list. Technical style cites by number and
/// shortens the body to an excerpt.
fn entry(doc: &ScoredDocument, index: usize, style: ResponseStyle) -> String {
    match style {
        ResponseStyle::Technical => format!(
            "[{}] {}: {}",
            index + 1,
            doc.title,
            doc.excerpt(EXCERPT_CHARS)
        ),
        _ => format!("{}: {}", doc.title, doc.best_text()),
    }
}

fn list_text(intro: String, entries: impl Iterator<Item = String>) -> String {
    let mut lines = vec![intro];
    lines.extend(entries);
    lines.join("\n\n")
}

/// Technical style closes with a numbered source list.
fn with_attribution(text: String, results: &[&ScoredDocument], style: ResponseStyle) -> String {
    if style != ResponseStyle::Technical {
        return text;
    }
    let citations: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[{}] {} ({})", i + 1, doc.title, doc.url))
        .collect();
    format!("{}\n\nSources:\n{}", text, citations.join("\n"))
}

fn source_ref(doc: &ScoredDocument) -> SourceRef {
    SourceRef {
        id: doc.id.clone(),
        title: doc.title.clone(),
        excerpt: doc.excerpt(EXCERPT_CHARS),
        url: doc.url.clone(),
        relevance: doc.relevance(),
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str("...");
    truncated
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> ResponseSynthesizer {
        ResponseSynthesizer::default()
    }

    fn doc(id: &str, title: &str, similarity: f32, snippet: &str) -> ScoredDocument {
        ScoredDocument::new(id, title, format!("/posts/{}", id))
            .with_similarity(similarity)
            .with_snippet(snippet)
    }

    // ---- Empty results ----

    #[test]
    fn test_empty_results_never_fail() {
        for intent in [
            QueryIntent::QuestionAnswering,
            QueryIntent::Comparison,
            QueryIntent::Troubleshooting,
            QueryIntent::Recommendation,
            QueryIntent::Exploratory,
        ] {
            let resp = synth().synthesize("anything", intent, &[], ResponseStyle::Detailed);
            assert!(resp.sources.is_empty());
            assert!(resp.text.contains("couldn't find"));
            assert!(resp.confidence >= 0.0);
            assert_eq!(resp.follow_up_questions.len(), 2);
            assert_eq!(resp.intent, intent);
        }
    }

    #[test]
    fn test_empty_results_messages_differ_by_intent() {
        let qa = synth().synthesize("q", QueryIntent::QuestionAnswering, &[], ResponseStyle::Detailed);
        let fix = synth().synthesize("q", QueryIntent::Troubleshooting, &[], ResponseStyle::Detailed);
        assert_ne!(qa.text, fix.text);
        assert!(fix.text.contains("solutions"));
    }

    #[test]
    fn test_all_results_below_threshold_treated_as_empty() {
        let results = vec![doc("a", "Low", 0.1, "x"), doc("b", "Lower", 0.05, "y")];
        let resp = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Detailed);
        assert!(resp.sources.is_empty());
        assert!((resp.confidence - NO_RESULTS_CONFIDENCE).abs() < f32::EPSILON);
    }

    // ---- Filtering and ranking ----

    #[test]
    fn test_relevant_results_sorted_and_capped() {
        let results: Vec<ScoredDocument> = (0..8)
            .map(|i| doc(&i.to_string(), &format!("Doc{}", i), 0.2 + i as f32 * 0.1, "s"))
            .collect();
        let relevant = synth().relevant_results(&results);
        assert_eq!(relevant.len(), MAX_RELEVANT_RESULTS);
        assert_eq!(relevant[0].id, "7");
        assert!(relevant
            .windows(2)
            .all(|w| w[0].relevance() >= w[1].relevance()));
    }

    #[test]
    fn test_relevant_results_missing_similarity_kept() {
        let results = vec![ScoredDocument::new("a", "A", "/a")];
        assert_eq!(synth().relevant_results(&results).len(), 1);
    }

    #[test]
    fn test_relevant_results_ties_keep_input_order() {
        let results = vec![doc("a", "A", 0.5, "s"), doc("b", "B", 0.5, "s")];
        let relevant = synth().relevant_results(&results);
        assert_eq!(relevant[0].id, "a");
        assert_eq!(relevant[1].id, "b");
    }

    // ---- Sources ----

    #[test]
    fn test_sources_mirror_results() {
        let results = vec![
            doc("a", "A", 0.9, "alpha"),
            ScoredDocument::new("b", "B", "/b").with_summary("beta summary"),
        ];
        let resp = synth().synthesize("q", QueryIntent::Exploratory, &results, ResponseStyle::Detailed);
        assert_eq!(resp.sources.len(), 2);
        assert_eq!(resp.sources[0].id, "a");
        assert!((resp.sources[0].relevance - 0.9).abs() < f32::EPSILON);
        assert_eq!(resp.sources[1].excerpt, "beta summary");
        assert!((resp.sources[1].relevance - 0.5).abs() < f32::EPSILON);
        assert_eq!(resp.sources[1].url, "/b");
    }

    #[test]
    fn test_source_excerpt_truncated() {
        let results = vec![doc("a", "A", 0.9, &"x".repeat(400))];
        let resp = synth().synthesize("q", QueryIntent::Exploratory, &results, ResponseStyle::Detailed);
        assert_eq!(resp.sources[0].excerpt.len(), EXCERPT_CHARS);
    }

    // ---- Intent templates ----

    #[test]
    fn test_question_answer_cites_title() {
        let results = vec![doc("1", "Doc1", 0.9, "X is a thing")];
        let resp = synth().synthesize(
            "What is X?",
            QueryIntent::QuestionAnswering,
            &results,
            ResponseStyle::Detailed,
        );
        assert!(resp.text.contains("Doc1"));
        assert!(resp.text.contains("X is a thing"));
        assert!((resp.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_question_answer_mentions_other_sources() {
        let results = vec![doc("1", "Main", 0.9, "answer"), doc("2", "Extra", 0.4, "more")];
        let resp = synth().synthesize(
            "how does it work",
            QueryIntent::QuestionAnswering,
            &results,
            ResponseStyle::Detailed,
        );
        assert!(resp.text.contains("also find these helpful: Extra"));
    }

    #[test]
    fn test_fixed_confidence_per_intent() {
        let results = vec![doc("1", "A", 0.3, "s")];
        let cases = [
            (QueryIntent::QuestionAnswering, 0.8),
            (QueryIntent::Comparison, 0.7),
            (QueryIntent::Troubleshooting, 0.75),
            (QueryIntent::Recommendation, 0.8),
            (QueryIntent::Exploratory, 0.6),
        ];
        for (intent, expected) in cases {
            let resp = synth().synthesize("q", intent, &results, ResponseStyle::Detailed);
            assert!((resp.confidence - expected).abs() < f32::EPSILON, "{:?}", intent);
        }
    }

    #[test]
    fn test_recommendation_lists_every_title() {
        let results = vec![doc("1", "Hammer", 0.8, "solid"), doc("2", "Wrench", 0.7, "handy")];
        let resp = synth().synthesize(
            "best tool for Y",
            QueryIntent::Recommendation,
            &results,
            ResponseStyle::Detailed,
        );
        assert!(resp.text.contains("1. Hammer"));
        assert!(resp.text.contains("2. Wrench"));
    }

    #[test]
    fn test_recommendation_includes_rating() {
        let results = vec![doc("1", "Hammer", 0.8, "solid").with_rating(4.5)];
        let resp = synth().synthesize("top hammer", QueryIntent::Recommendation, &results, ResponseStyle::Detailed);
        assert!(resp.text.contains("(rated 4.5/5)"));
    }

    #[test]
    fn test_troubleshooting_numbered() {
        let results = vec![doc("1", "Fix A", 0.8, "restart"), doc("2", "Fix B", 0.7, "reinstall")];
        let resp = synth().synthesize("error on boot", QueryIntent::Troubleshooting, &results, ResponseStyle::Detailed);
        assert!(resp.text.starts_with("Here are some possible solutions:"));
        assert!(resp.text.contains("1. Fix A: restart"));
        assert!(resp.text.contains("2. Fix B: reinstall"));
    }

    #[test]
    fn test_comparison_counts_sources() {
        let results = vec![doc("1", "A", 0.8, "a"), doc("2", "B", 0.7, "b")];
        let resp = synth().synthesize("a vs b", QueryIntent::Comparison, &results, ResponseStyle::Detailed);
        assert!(resp.text.contains("2 sources"));
        assert!(resp.text.contains("- A: a"));
    }

    #[test]
    fn test_exploratory_singular_result() {
        let results = vec![doc("1", "A", 0.8, "a")];
        let resp = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Detailed);
        assert!(resp.text.contains("I found 1 result related"));
    }

    // ---- Follow-ups ----

    #[test]
    fn test_follow_ups_use_key_term() {
        let results = vec![doc("1", "A", 0.8, "a")];
        let resp = synth().synthesize("explain ownership", QueryIntent::QuestionAnswering, &results, ResponseStyle::Detailed);
        assert_eq!(resp.follow_up_questions.len(), 2);
        assert!(resp.follow_up_questions[0].contains("explain"));
    }

    #[test]
    fn test_follow_ups_fallback_topic() {
        let results = vec![doc("1", "A", 0.8, "a")];
        let resp = synth().synthesize("??", QueryIntent::QuestionAnswering, &results, ResponseStyle::Detailed);
        assert!(resp.follow_up_questions[0].contains("this topic"));
    }

    // ---- Styles ----

    #[test]
    fn test_concise_truncates() {
        let results = vec![doc("1", "A", 0.8, &"word ".repeat(100))];
        let resp = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Concise);
        assert!(resp.text.chars().count() <= CONCISE_CHARS + 3);
        assert!(resp.text.ends_with("..."));
    }

    #[test]
    fn test_concise_short_text_untouched() {
        let results = vec![doc("1", "A", 0.8, "short")];
        let resp = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Concise);
        assert!(!resp.text.ends_with("..."));
    }

    #[test]
    fn test_technical_adds_attribution() {
        let results = vec![doc("1", "Doc1", 0.9, "X is a thing")];
        let resp = synth().synthesize("what is x", QueryIntent::QuestionAnswering, &results, ResponseStyle::Technical);
        assert!(resp.text.starts_with("According to \"Doc1\" (relevance 0.90)"));
        assert!(resp.text.contains("Sources:\n[1] Doc1 (/posts/1)"));
    }

    #[test]
    fn test_technical_list_uses_citation_numbers() {
        let results = vec![doc("1", "A", 0.8, "a"), doc("2", "B", 0.7, "b")];
        let resp = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Technical);
        assert!(resp.text.contains("- [2] B: b"));
    }

    #[test]
    fn test_casual_renders_like_detailed() {
        let results = vec![doc("1", "A", 0.8, "a")];
        let casual = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Casual);
        let detailed = synth().synthesize("rust", QueryIntent::Exploratory, &results, ResponseStyle::Detailed);
        assert_eq!(casual.text, detailed.text);
    }

    // ---- Suggested actions and context ----

    #[test]
    fn test_three_suggested_actions_always() {
        let resp = synth().synthesize("rust async", QueryIntent::Exploratory, &[], ResponseStyle::Detailed);
        let kinds: Vec<ActionKind> = resp.suggested_actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Search, ActionKind::Filter, ActionKind::Sort]);
        assert_eq!(resp.suggested_actions[0].action["query"], "rust async");
    }

    #[test]
    fn test_context_update_carries_topic_and_goal() {
        let resp = synth().synthesize("tokio vs smol", QueryIntent::Comparison, &[], ResponseStyle::Detailed);
        let update = resp.context_update.unwrap();
        assert_eq!(update.current_topic.as_deref(), Some("tokio"));
        assert_eq!(update.user_goal.as_deref(), Some("compare options"));
    }

    #[test]
    fn test_processing_time_left_for_orchestrator() {
        let resp = synth().synthesize("q", QueryIntent::Exploratory, &[], ResponseStyle::Detailed);
        assert_eq!(resp.processing_time_ms, 0);
    }

    // ---- Helpers ----

    #[test]
    fn test_truncate_with_ellipsis_unicode() {
        let s = "\u{00e9}".repeat(10);
        let out = truncate_with_ellipsis(&s, 4);
        assert_eq!(out, format!("{}...", "\u{00e9}".repeat(4)));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "source", "sources"), "1 source");
        assert_eq!(plural(3, "source", "sources"), "3 sources");
    }
}

//! Rule-based intent classification.
//!
//! An ordered table of `(predicates, intent)` rules is evaluated top to
//! bottom against the lower-cased query; the first rule with any matching
//! predicate wins. Nothing is scored, so there are no ties.

use crate::types::{ConversationSession, QueryIntent};

/// Sessions with more turns than this use the "established" fallback.
const ESTABLISHED_TURNS: usize = 2;

const QUESTION_PREFIXES: &[&str] = &["what", "how", "why", "when", "where", "who"];
const COMPARISON_MARKERS: &[&str] = &["vs", "versus", "compare", "better than", "difference between"];
const TROUBLESHOOTING_MARKERS: &[&str] = &["problem", "issue", "error", "not working", "help"];
const RECOMMENDATION_MARKERS: &[&str] = &["best", "recommend", "suggest", "top", "popular"];

// =============================================================================
// Rules
// =============================================================================

/// A plain substring test against the normalized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Contains(String),
    StartsWith(String),
}

impl Predicate {
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Predicate::Contains(needle) => normalized.contains(needle.as_str()),
            Predicate::StartsWith(prefix) => normalized.starts_with(prefix.as_str()),
        }
    }
}

/// One row of the classification table. Matches if any predicate matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub intent: QueryIntent,
    pub predicates: Vec<Predicate>,
}

impl IntentRule {
    pub fn new(intent: QueryIntent) -> Self {
        Self {
            intent,
            predicates: Vec::new(),
        }
    }

    pub fn containing(mut self, needles: &[&str]) -> Self {
        self.predicates
            .extend(needles.iter().map(|n| Predicate::Contains(n.to_lowercase())));
        self
    }

    pub fn starting_with(mut self, prefixes: &[&str]) -> Self {
        self.predicates
            .extend(prefixes.iter().map(|p| Predicate::StartsWith(p.to_lowercase())));
        self
    }

    pub fn matches(&self, normalized: &str) -> bool {
        self.predicates.iter().any(|p| p.matches(normalized))
    }
}

// =============================================================================
// IntentClassifier
// =============================================================================

/// First-match intent classifier over an ordered rule table.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
    fresh_fallback: QueryIntent,
    established_fallback: QueryIntent,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(standard_rules())
    }
}

impl IntentClassifier {
    /// Create a classifier over `rules`, falling back to exploratory.
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self {
            rules,
            fresh_fallback: QueryIntent::Exploratory,
            established_fallback: QueryIntent::Exploratory,
        }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: IntentRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the intents used when no rule matches, for sessions with at most
    /// two turns and for longer sessions respectively.
    pub fn with_fallbacks(mut self, fresh: QueryIntent, established: QueryIntent) -> Self {
        self.fresh_fallback = fresh;
        self.established_fallback = established;
        self
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify `query` in the context of `session`.
    pub fn classify(&self, query: &str, session: &ConversationSession) -> QueryIntent {
        let normalized = query.trim().to_lowercase();

        if let Some(rule) = self.rules.iter().find(|r| r.matches(&normalized)) {
            return rule.intent;
        }

        if session.turns.len() > ESTABLISHED_TURNS {
            self.established_fallback
        } else {
            self.fresh_fallback
        }
    }
}

/// The built-in cascade: question, comparison, troubleshooting, recommendation.
pub fn standard_rules() -> Vec<IntentRule> {
    vec![
        IntentRule::new(QueryIntent::QuestionAnswering)
            .containing(&["?"])
            .starting_with(QUESTION_PREFIXES),
        IntentRule::new(QueryIntent::Comparison).containing(COMPARISON_MARKERS),
        IntentRule::new(QueryIntent::Troubleshooting).containing(TROUBLESHOOTING_MARKERS),
        IntentRule::new(QueryIntent::Recommendation).containing(RECOMMENDATION_MARKERS),
    ]
}

//! Clarification questions for underspecified queries.

use crate::intent::IntentClassifier;
use crate::terms::KeyTerms;
use crate::types::{ConversationKind, ConversationSession, QueryIntent};

/// At most this many questions are returned.
pub const MAX_CLARIFICATIONS: usize = 3;

const VAGUE_REFERENCES: &[&str] = &["it", "this", "that", "they"];

/// Questions that would help pin down what `query` is after.
///
/// Deterministic; checks run in a fixed order and the list is capped at
/// [`MAX_CLARIFICATIONS`].
pub fn generate_clarification_questions(query: &str, session: &ConversationSession) -> Vec<String> {
    let terms = KeyTerms::extract(query);
    let intent = IntentClassifier::default().classify(query, session);
    let mut questions = Vec::new();

    if terms.len() < 2 {
        questions.push("Could you provide more details about what you're looking for?".to_string());
    }

    if has_vague_reference(query) {
        if let Some(ref topic) = session.context.current_topic {
            questions.push(format!("Are you asking about {}?", topic));
        }
    }

    if intent == QueryIntent::Comparison && terms.len() < 2 {
        questions.push("Which items would you like me to compare?".to_string());
    }

    if matches!(
        session.kind,
        ConversationKind::Tutorial | ConversationKind::Troubleshooting
    ) {
        let subject = terms.first().unwrap_or("this topic");
        questions.push(format!(
            "What is your current level of experience with {}?",
            subject
        ));
    }

    if let Some(last) = session.context.search_history.last() {
        if last.as_str() != query {
            questions.push(format!(
                "Is this related to your earlier question about \"{}\"?",
                last
            ));
        }
    }

    questions.truncate(MAX_CLARIFICATIONS);
    questions
}

fn has_vague_reference(query: &str) -> bool {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| VAGUE_REFERENCES.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversationContext;

    fn session(kind: ConversationKind) -> ConversationSession {
        ConversationSession::new("s", kind, ConversationContext::default())
    }

    // ---- Detail ----

    #[test]
    fn test_short_query_asks_for_details() {
        let questions = generate_clarification_questions("rust", &session(ConversationKind::Research));
        assert_eq!(
            questions,
            vec!["Could you provide more details about what you're looking for?"]
        );
    }

    #[test]
    fn test_specific_query_needs_nothing() {
        let questions = generate_clarification_questions(
            "tokio runtime shutdown ordering",
            &session(ConversationKind::Research),
        );
        assert!(questions.is_empty());
    }

    // ---- Vague references ----

    #[test]
    fn test_vague_reference_with_topic() {
        let mut s = session(ConversationKind::Research);
        s.context.current_topic = Some("serde".to_string());
        let questions = generate_clarification_questions("how does it handle enums", &s);
        assert!(questions.contains(&"Are you asking about serde?".to_string()));
    }

    #[test]
    fn test_vague_reference_without_topic() {
        let questions = generate_clarification_questions(
            "how does it handle enums",
            &session(ConversationKind::Research),
        );
        assert!(!questions.iter().any(|q| q.starts_with("Are you asking about")));
    }

    #[test]
    fn test_vague_reference_must_be_whole_word() {
        let mut s = session(ConversationKind::Research);
        s.context.current_topic = Some("serde".to_string());
        let questions = generate_clarification_questions("iterator thistle mappings", &s);
        assert!(questions.is_empty());
    }

    // ---- Comparison ----

    #[test]
    fn test_underspecified_comparison() {
        let questions = generate_clarification_questions("compare", &session(ConversationKind::Comparison));
        assert_eq!(
            questions,
            vec![
                "Could you provide more details about what you're looking for?".to_string(),
                "Which items would you like me to compare?".to_string(),
            ]
        );
    }

    // ---- Session kind ----

    #[test]
    fn test_tutorial_asks_experience_with_first_term() {
        let questions = generate_clarification_questions(
            "learning async closures",
            &session(ConversationKind::Tutorial),
        );
        assert_eq!(
            questions,
            vec!["What is your current level of experience with learning?"]
        );
    }

    #[test]
    fn test_troubleshooting_without_terms_uses_fallback_subject() {
        let questions =
            generate_clarification_questions("", &session(ConversationKind::Troubleshooting));
        assert!(questions
            .contains(&"What is your current level of experience with this topic?".to_string()));
    }

    // ---- History ----

    #[test]
    fn test_refers_back_to_earlier_question() {
        let mut s = session(ConversationKind::Research);
        s.context.search_history.push("borrow checker rules".to_string());
        let questions = generate_clarification_questions("lifetime elision rules", &s);
        assert_eq!(
            questions,
            vec!["Is this related to your earlier question about \"borrow checker rules\"?"]
        );
    }

    #[test]
    fn test_repeated_query_not_referred_back() {
        let mut s = session(ConversationKind::Research);
        s.context.search_history.push("lifetime elision rules".to_string());
        assert!(generate_clarification_questions("lifetime elision rules", &s).is_empty());
    }

    // ---- Cap ----

    #[test]
    fn test_capped_at_three() {
        let mut s = session(ConversationKind::Tutorial);
        s.context.current_topic = Some("macros".to_string());
        s.context.search_history.push("macro hygiene".to_string());
        let questions = generate_clarification_questions("compare it", &s);
        assert_eq!(questions.len(), MAX_CLARIFICATIONS);
        assert_eq!(
            questions,
            vec![
                "Could you provide more details about what you're looking for?".to_string(),
                "Are you asking about macros?".to_string(),
                "Which items would you like me to compare?".to_string(),
            ]
        );
    }

    #[test]
    fn test_deterministic() {
        let s = session(ConversationKind::Tutorial);
        assert_eq!(
            generate_clarification_questions("what now", &s),
            generate_clarification_questions("what now", &s)
        );
    }
}

//! Chat pipeline type definitions.

use chrono::{DateTime, Utc};
use parley_core::{Department, Role};
use serde::{Deserialize, Serialize};

/// Fixed answer returned when retrieval yields no accessible content.
/// This is a successful response, not an error.
pub const FALLBACK_ANSWER: &str = "I couldn't find any relevant information that you are \
authorized to access. Try rephrasing your question, or contact your administrator if you \
believe you should have access to this information.";

/// A single chat request, as handed over by the identity-aware edge.
///
/// The (user, role) pair comes from the upstream identity provider and is
/// trusted unconditionally here.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// User identity (session key for conversation memory)
    pub user: String,

    /// The user's role
    pub role: Role,

    /// Query text
    pub query: String,

    /// Optional cap on how many prior turns to feed into generation
    pub prior_turns_hint: Option<usize>,
}

/// A source citation attached to an answer.
///
/// Derived strictly from the fragments supplied to generation for this
/// query, never from the wider corpus, so a citation can never reference
/// content the user was not permitted to see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source file name (e.g., "quarterly_financial_report.md")
    pub file: String,

    /// Department the source belongs to
    pub department: Department,

    /// When the source was last updated
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,

    /// Relevance of the source to the query, in [0, 1]
    pub relevance: f32,
}

/// The composed reply to a chat query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Natural language answer
    pub answer: String,

    /// Sources used to generate the answer
    pub sources: Vec<SourceRef>,

    /// Internal: whether this reply is the no-accessible-content fallback.
    /// Used for logging, not shown to users.
    #[serde(skip_serializing, default)]
    pub refused: bool,
}

impl ChatReply {
    /// Create a composed reply.
    pub fn new(answer: String, sources: Vec<SourceRef>) -> Self {
        Self {
            answer,
            sources,
            refused: false,
        }
    }

    /// The fixed fallback reply for queries with no accessible content.
    pub fn refused() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
            refused: true,
        }
    }
}

/// One query/answer exchange in a user's session. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Query text
    pub query: String,

    /// Answer text
    pub answer: String,

    /// Citations attached to the answer
    pub sources: Vec<SourceRef>,

    /// When the turn completed
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn from a completed query/reply pair.
    pub fn new(query: impl Into<String>, reply: &ChatReply) -> Self {
        Self {
            query: query.into(),
            answer: reply.answer.clone(),
            sources: reply.sources.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_reply_has_fallback_and_no_sources() {
        let reply = ChatReply::refused();
        assert_eq!(reply.answer, FALLBACK_ANSWER);
        assert!(reply.sources.is_empty());
        assert!(reply.refused);
    }

    #[test]
    fn test_refused_flag_not_serialized() {
        let reply = ChatReply::refused();
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("refused"));
    }

    #[test]
    fn test_turn_captures_reply() {
        let reply = ChatReply::new("An answer".to_string(), vec![]);
        let turn = Turn::new("A question", &reply);
        assert_eq!(turn.query, "A question");
        assert_eq!(turn.answer, "An answer");
        assert!(turn.sources.is_empty());
    }
}

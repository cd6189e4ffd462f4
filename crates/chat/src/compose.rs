//! Answer composition and source attribution.

use crate::types::{ChatReply, SourceRef};
use parley_index::Fragment;
use std::collections::HashSet;

/// Compose the final reply from a raw completion and the fragments that
/// were actually supplied to generation for this query.
///
/// Citations come only from `fragments_used`, deduplicated by source file
/// (the first occurrence wins, which is the highest-scoring one since the
/// input is ranked).
pub fn compose(raw_completion: &str, fragments_used: &[(Fragment, f32)]) -> ChatReply {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for (fragment, score) in fragments_used {
        if !seen.insert(fragment.source_file.clone()) {
            continue;
        }

        sources.push(SourceRef {
            file: fragment.source_file.clone(),
            department: fragment.department,
            updated_at: fragment.updated_at,
            relevance: score.clamp(0.0, 1.0),
        });
    }

    ChatReply::new(raw_completion.trim().to_string(), sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::Department;

    fn fragment(id: &str, file: &str, department: Department) -> Fragment {
        Fragment {
            id: id.to_string(),
            source_file: file.to_string(),
            department,
            content: format!("content {}", id),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_sources_derived_from_fragments_used() {
        let used = vec![
            (fragment("a", "report.md", Department::Finance), 0.9),
            (fragment("b", "handbook.md", Department::General), 0.5),
        ];

        let reply = compose("  The answer.  ", &used);

        assert_eq!(reply.answer, "The answer.");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[0].file, "report.md");
        assert_eq!(reply.sources[0].department, Department::Finance);
        assert!((reply.sources[0].relevance - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_sources_deduplicated_by_file_keeping_best_score() {
        let used = vec![
            (fragment("a", "report.md", Department::Finance), 0.9),
            (fragment("b", "report.md", Department::Finance), 0.7),
            (fragment("c", "handbook.md", Department::General), 0.4),
        ];

        let reply = compose("answer", &used);

        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[0].file, "report.md");
        assert!((reply.sources[0].relevance - 0.9).abs() < 0.001);
    }

    #[test]
    fn test_empty_fragments_produce_empty_sources() {
        let reply = compose("answer", &[]);
        assert!(reply.sources.is_empty());
        assert!(!reply.refused);
    }

    #[test]
    fn test_relevance_clamped_to_unit_interval() {
        let used = vec![(fragment("a", "report.md", Department::Finance), -0.3)];
        let reply = compose("answer", &used);
        assert_eq!(reply.sources[0].relevance, 0.0);
    }
}

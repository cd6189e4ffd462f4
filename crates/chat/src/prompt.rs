//! Generation request building.
//!
//! Renders the prompt handed to the generation service: a system prompt
//! constraining the model to the supplied context, the retrieved fragments
//! as numbered context blocks, the user's recent turns (most recent last),
//! and the current query.

use crate::types::Turn;
use handlebars::Handlebars;
use parley_core::{AppError, AppResult, Role};
use parley_index::Fragment;
use std::collections::HashMap;

/// Cap on the characters taken from each fragment for the prompt.
const MAX_CHARS_PER_FRAGMENT: usize = 800;

/// Prompt template rendered per query.
const GENERATION_TEMPLATE: &str = "\
{{#if history}}Conversation history:
{{history}}

{{/if}}User role: {{role}}
User query: {{query}}

Context from company documents:
{{context}}";

/// A rendered generation request, split into system and user messages.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
}

/// Build the generation request for a query.
pub fn build_generation_prompt(
    role: Role,
    query: &str,
    fragments_used: &[(Fragment, f32)],
    history: &[Turn],
) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("role".to_string(), role.to_string());
    variables.insert("query".to_string(), query.to_string());
    variables.insert("context".to_string(), build_context(fragments_used));
    variables.insert("history".to_string(), format_history(history));

    let user = render_template(GENERATION_TEMPLATE, &variables)?;

    Ok(BuiltPrompt {
        system: build_system_prompt(),
        user,
    })
}

/// System prompt for answer generation.
fn build_system_prompt() -> String {
    String::from(
        "You are an assistant for internal company documents. \
         Provide helpful, accurate, and concise responses based only on the provided context. \
         If the information is not in the context, state that explicitly. \
         Always cite the document names from the context when referencing information. \
         Use the conversation history to maintain context for follow-up questions. \
         Keep responses to a few sentences.",
    )
}

/// Format retrieved fragments as numbered context blocks.
fn build_context(fragments: &[(Fragment, f32)]) -> String {
    fragments
        .iter()
        .enumerate()
        .map(|(i, (fragment, _score))| {
            let content: String = fragment.content.chars().take(MAX_CHARS_PER_FRAGMENT).collect();
            format!(
                "[Document {}] Source: {}\n{}",
                i + 1,
                fragment.source_file,
                content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Format prior turns as alternating user/assistant lines, most recent last.
fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.query, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("generation", template)
        .map_err(|e| AppError::Other(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("generation", &variables)
        .map_err(|e| AppError::Other(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatReply;
    use chrono::Utc;
    use parley_core::Department;

    fn fragment(file: &str, content: &str) -> (Fragment, f32) {
        (
            Fragment {
                id: "f1".to_string(),
                source_file: file.to_string(),
                department: Department::Finance,
                content: content.to_string(),
                embedding: None,
                updated_at: Utc::now(),
            },
            0.8,
        )
    }

    #[test]
    fn test_prompt_contains_context_and_query() {
        let used = vec![fragment("report.md", "Revenue was 2.1 million.")];
        let built =
            build_generation_prompt(Role::Finance, "What was revenue?", &used, &[]).unwrap();

        assert!(built.user.contains("[Document 1] Source: report.md"));
        assert!(built.user.contains("Revenue was 2.1 million."));
        assert!(built.user.contains("User query: What was revenue?"));
        assert!(built.user.contains("User role: finance"));
        assert!(built.system.contains("based only on the provided context"));
    }

    #[test]
    fn test_history_omitted_when_empty() {
        let used = vec![fragment("report.md", "content")];
        let built = build_generation_prompt(Role::Finance, "q", &used, &[]).unwrap();

        assert!(!built.user.contains("Conversation history:"));
    }

    #[test]
    fn test_history_rendered_most_recent_last() {
        let used = vec![fragment("report.md", "content")];
        let first = Turn::new("first question", &ChatReply::new("first answer".into(), vec![]));
        let second = Turn::new("second question", &ChatReply::new("second answer".into(), vec![]));

        let built =
            build_generation_prompt(Role::Finance, "q", &used, &[first, second]).unwrap();

        assert!(built.user.contains("Conversation history:"));
        let first_pos = built.user.find("first question").unwrap();
        let second_pos = built.user.find("second question").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn test_long_fragment_content_is_truncated() {
        let long = "x".repeat(5000);
        let used = vec![fragment("report.md", &long)];
        let built = build_generation_prompt(Role::Finance, "q", &used, &[]).unwrap();

        assert!(built.user.len() < 5000);
    }

    #[test]
    fn test_multiple_fragments_are_numbered() {
        let used = vec![
            fragment("a.md", "first block"),
            fragment("b.md", "second block"),
        ];
        let built = build_generation_prompt(Role::CLevel, "q", &used, &[]).unwrap();

        assert!(built.user.contains("[Document 1] Source: a.md"));
        assert!(built.user.contains("[Document 2] Source: b.md"));
    }
}

//! Query orchestration.
//!
//! One `chat` call runs the whole pipeline for a query: resolve the role's
//! allowed departments, retrieve filtered fragments, fetch the user's
//! recent turns, generate, compose, remember. Early exits: no accessible
//! content yields the fixed fallback reply (a success), a generation
//! timeout or provider error yields `AppError::Generation` (a failure that
//! leaves memory untouched).

use crate::compose::compose;
use crate::memory::ConversationMemory;
use crate::prompt::build_generation_prompt;
use crate::types::{ChatOptions, ChatReply, Turn};
use parley_core::config::ChatTuning;
use parley_core::{AccessPolicy, AppError, AppResult, Department, Role};
use parley_index::DocumentIndex;
use parley_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;

/// The role-filtered retrieval-and-memory pipeline.
///
/// Shared freely across concurrent queries: the index is read-only here,
/// the access table is immutable, and conversation memory serializes
/// per-user internally.
pub struct ChatEngine {
    index: Arc<DocumentIndex>,
    llm: Arc<dyn LlmClient>,
    memory: ConversationMemory,
    model: String,
    top_k: usize,
    generation_timeout: Duration,
}

impl ChatEngine {
    /// Create an engine over an index and a generation client.
    pub fn new(
        index: Arc<DocumentIndex>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tuning: &ChatTuning,
    ) -> Self {
        Self {
            index,
            llm,
            memory: ConversationMemory::new(tuning.memory_window),
            model: model.into(),
            top_k: tuning.top_k,
            generation_timeout: Duration::from_secs(tuning.generation_timeout_secs),
        }
    }

    /// Answer a query for an authenticated (user, role) pair.
    ///
    /// Returns the composed reply with citations; the fixed fallback reply
    /// when nothing accessible matches; `AppError::Generation` when the
    /// generation service fails or times out. A turn is appended to the
    /// user's session only after generation succeeds; a failed attempt
    /// leaves memory untouched.
    pub async fn chat(&self, options: ChatOptions) -> AppResult<ChatReply> {
        tracing::info!(
            "Processing query for user '{}' (role: {}): {}",
            options.user,
            options.role,
            options.query
        );

        // 1. Resolve allowed departments (infallible for a valid role)
        let allowed = AccessPolicy::allowed_departments(options.role);

        // 2. Filtered retrieval; empty means refuse, not fail
        let hits = self.index.search(&options.query, self.top_k, allowed).await?;
        if hits.is_empty() {
            tracing::info!(
                "No accessible fragments for user '{}' (role: {}); returning fallback",
                options.user,
                options.role
            );
            return Ok(ChatReply::refused());
        }

        // 3. Recent turns for this user, oldest first
        let window = options
            .prior_turns_hint
            .map(|hint| hint.min(self.memory.window()))
            .unwrap_or_else(|| self.memory.window());
        let history = self.memory.recent(&options.user, window).await;

        // 4. Merge fragments, history, and query into the generation request
        let prompt = build_generation_prompt(options.role, &options.query, &hits, &history)?;
        let request = LlmRequest::new(prompt.user, &self.model)
            .with_system(prompt.system)
            .with_temperature(0.3)
            .with_max_tokens(500);

        // 5. Generate, bounded by the configured timeout
        let response = tokio::time::timeout(self.generation_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "Generation timed out after {}s",
                    self.generation_timeout.as_secs()
                ))
            })??;

        // 6. Compose, then remember the completed turn
        let reply = compose(&response.content, &hits);
        self.memory
            .append(&options.user, Turn::new(&options.query, &reply))
            .await;

        tracing::info!(
            "Answered query for user '{}' with {} sources",
            options.user,
            reply.sources.len()
        );

        Ok(reply)
    }

    /// Departments the role may consult.
    pub fn accessible_departments(&self, role: Role) -> Vec<Department> {
        AccessPolicy::allowed_departments(role).to_vec()
    }

    /// Drop a user's conversation session.
    pub async fn clear_session(&self, user: &str) {
        self.memory.clear(user).await;
    }

    /// The engine's conversation memory.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }
}

//! Generation-service integration for Parley.
//!
//! This crate provides a provider-agnostic abstraction for the external
//! text-completion service that turns a prompt context into an answer.
//! The pipeline treats the service as opaque: one `complete` call in, one
//! completion out, bounded by the caller's timeout.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Deterministic completions for tests and offline runs
//! - Future: OpenAI, Anthropic

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockClient, OllamaClient};

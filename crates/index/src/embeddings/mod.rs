//! Embedding generation for fragments and queries.
//!
//! Provider-agnostic: the trigram provider is deterministic and fully local
//! (tests, offline runs), the Ollama provider produces neural embeddings.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

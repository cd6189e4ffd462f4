//! Role-filtered chat pipeline for Parley.
//!
//! Wires the access policy, the document index, per-user conversation
//! memory, and the generation service into one orchestrated query path:
//! resolve allowed departments, retrieve filtered fragments, merge recent
//! turns, generate, compose an attributed answer, remember the turn.
//!
//! Content a role may not see is excluded from retrieval itself, before
//! generation: the generation service is architecturally incapable of
//! leaking it, whatever its prompt does.

pub mod compose;
pub mod engine;
pub mod memory;
pub mod prompt;
pub mod types;

// Re-export commonly used types
pub use compose::compose;
pub use engine::ChatEngine;
pub use memory::ConversationMemory;
pub use types::{ChatOptions, ChatReply, SourceRef, Turn, FALLBACK_ANSWER};

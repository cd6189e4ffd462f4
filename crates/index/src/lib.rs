//! Document index for Parley.
//!
//! Stores embedded, department-tagged document fragments in SQLite and
//! serves similarity search with the department filter applied to the
//! candidate pool itself: a role's disallowed content is excluded before
//! ranking or truncation ever happens, so it can never crowd out allowed
//! content or leak into generation context.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod search;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use ingest::ingest;
pub use search::{DocumentIndex, MIN_RELEVANCE_SCORE};
pub use types::{Fragment, IndexStats, IngestOptions, IngestStats};

use std::path::{Path, PathBuf};

/// Default location of the fragment store inside a workspace.
pub fn default_index_path(workspace: &Path) -> PathBuf {
    workspace.join(".parley").join("index.sqlite")
}

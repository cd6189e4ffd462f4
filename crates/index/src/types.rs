//! Document index type definitions.

use chrono::{DateTime, Utc};
use parley_core::Department;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A retrievable unit of document text.
///
/// Fragments are created at ingestion time, tagged with a department, and
/// immutable afterwards. They are owned collectively by the fragment store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique fragment identifier
    pub id: String,

    /// Name of the file this fragment was cut from
    pub source_file: String,

    /// Department tag controlling which roles may see this fragment
    pub department: Department,

    /// Text content
    pub content: String,

    /// Embedding vector (normalized)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// When the source document was last updated
    pub updated_at: DateTime<Utc>,
}

/// Options for the ingest operation.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Files or directories to ingest
    pub paths: Vec<PathBuf>,

    /// Department tag applied to every fragment from these paths
    pub department: Department,

    /// Include patterns (substring match)
    pub include: Vec<String>,

    /// Exclude patterns (substring match)
    pub exclude: Vec<String>,

    /// Reset the store before ingesting
    pub reset: bool,
}

/// Statistics from an ingest operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of source files processed
    pub sources_count: u32,

    /// Number of fragments created
    pub fragments_count: u32,

    /// Total bytes processed
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for the fragment store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of fragments
    pub fragments_count: u32,

    /// Number of distinct source files
    pub sources_count: u32,

    /// Fragment count per department tag
    pub by_department: Vec<(Department, u32)>,
}

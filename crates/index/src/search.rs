//! Department-filtered similarity search.
//!
//! `DocumentIndex` is the read path over the fragment store: it embeds the
//! query, runs the filtered store query off the async runtime, and applies
//! the relevance cutoff. The store is read-mostly and safely shared across
//! concurrent queries; writes only happen during ingestion.

use crate::embeddings::EmbeddingProvider;
use crate::store;
use crate::types::{Fragment, IndexStats};
use parley_core::{AppError, AppResult, Department};
use std::path::PathBuf;
use std::sync::Arc;

/// Minimum cosine similarity score for a fragment to be considered relevant.
/// Note: 0.20 is suitable for trigram embeddings; neural embedding models
/// usually want 0.3-0.5.
pub const MIN_RELEVANCE_SCORE: f32 = 0.20;

/// Similarity-search view over the fragment store, filterable by department.
pub struct DocumentIndex {
    db_path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl DocumentIndex {
    /// Create an index over the store at `db_path`, embedding queries with
    /// the given provider (which must match the provider used at ingestion).
    pub fn new(db_path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            db_path: db_path.into(),
            embedder,
        }
    }

    /// The embedding provider backing this index.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Path of the underlying SQLite store.
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Retrieve the top-k fragments relevant to `query`, restricted to the
    /// allowed departments.
    ///
    /// The filter constrains the candidate pool inside the store query;
    /// an empty result means "no accessible content", not failure.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        allowed: &[Department],
    ) -> AppResult<Vec<(Fragment, f32)>> {
        if allowed.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let db_path = self.db_path.clone();
        let allowed = allowed.to_vec();
        let results = tokio::task::spawn_blocking(move || {
            let conn = store::open(&db_path)?;
            store::query_fragments(&conn, &query_embedding, top_k, &allowed)
        })
        .await
        .map_err(|e| AppError::Index(format!("Search task failed: {}", e)))??;

        if !results.is_empty() {
            let scores: Vec<f32> = results.iter().map(|(_, s)| *s).collect();
            tracing::debug!("Retrieved {} fragments before cutoff - scores: {:?}", results.len(), scores);
        }

        // Relevance cutoff: drop fragments with low similarity
        let filtered: Vec<_> = results
            .into_iter()
            .filter(|(_fragment, score)| *score >= MIN_RELEVANCE_SCORE)
            .collect();

        if filtered.is_empty() {
            tracing::info!(
                "No relevant fragments found (all scores below {:.2} threshold)",
                MIN_RELEVANCE_SCORE
            );
        } else {
            tracing::info!(
                "Retrieved {} relevant fragments (top score: {:.3})",
                filtered.len(),
                filtered.first().map(|(_, s)| *s).unwrap_or(0.0)
            );
        }

        Ok(filtered)
    }

    /// Get statistics for the store.
    pub async fn stats(&self) -> AppResult<IndexStats> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store::open(&db_path)?;
            store::get_stats(&conn)
        })
        .await
        .map_err(|e| AppError::Index(format!("Stats task failed: {}", e)))?
    }

    /// Reset the store, removing all fragments.
    pub async fn reset(&self) -> AppResult<()> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = store::open(&db_path)?;
            store::reset(&conn)
        })
        .await
        .map_err(|e| AppError::Index(format!("Reset task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::store::{insert_fragment, open};
    use chrono::Utc;
    use tempfile::TempDir;

    async fn seeded_index(fragments: &[(&str, Department, &str)]) -> (TempDir, DocumentIndex) {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("index.sqlite");
        let embedder = Arc::new(TrigramProvider::new(384));

        let conn = open(&db_path).unwrap();
        for (id, department, content) in fragments {
            let embedding = embedder.embed(content).await.unwrap();
            let fragment = Fragment {
                id: id.to_string(),
                source_file: format!("{}.md", id),
                department: *department,
                content: content.to_string(),
                embedding: Some(embedding),
                updated_at: Utc::now(),
            };
            insert_fragment(&conn, &fragment).unwrap();
        }

        let index = DocumentIndex::new(db_path, embedder);
        (temp, index)
    }

    #[tokio::test]
    async fn test_search_returns_relevant_fragments() {
        let (_temp, index) = seeded_index(&[
            (
                "rev",
                Department::Finance,
                "Q1 2024 revenue reached 2.1 million dollars with strong quarterly growth",
            ),
            (
                "pasta",
                Department::General,
                "The cafeteria menu now includes fresh pasta every Thursday",
            ),
        ])
        .await;

        let results = index
            .search(
                "Q1 2024 revenue quarterly growth",
                5,
                &[Department::Finance, Department::General],
            )
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].0.id, "rev");
    }

    #[tokio::test]
    async fn test_search_excludes_disallowed_departments() {
        let (_temp, index) = seeded_index(&[(
            "rev",
            Department::Finance,
            "Q1 2024 revenue reached 2.1 million dollars",
        )])
        .await;

        let results = index
            .search("Q1 2024 revenue", 5, &[Department::General])
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_with_no_allowed_departments_is_empty() {
        let (_temp, index) = seeded_index(&[(
            "rev",
            Department::Finance,
            "Q1 2024 revenue reached 2.1 million dollars",
        )])
        .await;

        let results = index.search("Q1 2024 revenue", 5, &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_irrelevant_query_is_cut_off() {
        let (_temp, index) = seeded_index(&[(
            "rev",
            Department::Finance,
            "Q1 2024 revenue reached 2.1 million dollars",
        )])
        .await;

        let results = index
            .search(
                "zebra migration patterns across the serengeti",
                5,
                &[Department::Finance],
            )
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let (_temp, index) = seeded_index(&[
            ("a", Department::Finance, "budget allocations for hardware"),
            ("b", Department::General, "office opening hours"),
        ])
        .await;

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.fragments_count, 2);
        assert_eq!(stats.sources_count, 2);
    }
}

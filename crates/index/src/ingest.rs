//! Department-tagged document ingestion.
//!
//! Reads documents, chunks them into overlapping word windows, embeds the
//! chunks, and inserts them as fragments tagged with the department given
//! in the options. Ingestion is expected to run while the index is
//! otherwise idle; queries only ever read.

use crate::chunker;
use crate::search::DocumentIndex;
use crate::store;
use crate::types::{Fragment, IngestOptions, IngestStats};
use chrono::{DateTime, Utc};
use parley_core::AppResult;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Chunk size in words.
const CHUNK_SIZE_WORDS: usize = 500;

/// Overlap between consecutive chunks, in words.
const CHUNK_OVERLAP_WORDS: usize = 50;

/// Number of chunks embedded per provider call.
const EMBED_BATCH_SIZE: usize = 32;

/// Ingest documents into the fragment store.
pub async fn ingest(index: &DocumentIndex, options: IngestOptions) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!(
        "Starting ingest for department '{}' ({} paths)",
        options.department,
        options.paths.len()
    );

    if options.reset {
        tracing::info!("Resetting fragment store");
        index.reset().await?;
    }

    let files = collect_files(&options);

    let mut sources_count = 0u32;
    let mut fragments_count = 0u32;
    let mut bytes_processed = 0u64;

    let conn = store::open(index.db_path())?;

    for file in files {
        match ingest_file(&conn, index, &options, &file).await {
            Ok((fragments, bytes)) => {
                sources_count += 1;
                fragments_count += fragments;
                bytes_processed += bytes;
            }
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", file, e);
            }
        }
    }

    let duration = start.elapsed();

    tracing::info!(
        "Ingest completed: {} sources, {} fragments, {} bytes in {:.2}s",
        sources_count,
        fragments_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        sources_count,
        fragments_count,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Ingest a single file. Returns (fragments inserted, bytes processed).
async fn ingest_file(
    conn: &rusqlite::Connection,
    index: &DocumentIndex,
    options: &IngestOptions,
    path: &Path,
) -> AppResult<(u32, u64)> {
    tracing::debug!("Processing file: {:?}", path);

    let text = std::fs::read_to_string(path)?;
    let size_bytes = text.len() as u64;
    let updated_at = file_updated_at(path);

    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let chunks = chunker::chunk_text(&text, CHUNK_SIZE_WORDS, CHUNK_OVERLAP_WORDS);
    if chunks.is_empty() {
        return Ok((0, size_bytes));
    }

    // Embed batches concurrently, then insert in chunk order
    let batches: Vec<&[String]> = chunks.chunks(EMBED_BATCH_SIZE).collect();
    let results =
        futures::future::join_all(batches.iter().map(|batch| index.embedder().embed_batch(batch)))
            .await;

    let mut embeddings = Vec::with_capacity(chunks.len());
    for result in results {
        embeddings.extend(result?);
    }

    let mut fragments_count = 0u32;

    for (content, embedding) in chunks.into_iter().zip(embeddings) {
        let fragment = Fragment {
            id: uuid::Uuid::new_v4().to_string(),
            source_file: source_file.clone(),
            department: options.department,
            content,
            embedding: Some(embedding),
            updated_at,
        };

        store::insert_fragment(conn, &fragment)?;
        fragments_count += 1;
    }

    tracing::debug!(
        "Processed {:?}: {} fragments, {} bytes",
        path,
        fragments_count,
        size_bytes
    );

    Ok((fragments_count, size_bytes))
}

/// Resolve the files to ingest from the option paths.
fn collect_files(options: &IngestOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in &options.paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && should_include(entry_path, options) {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else {
            tracing::warn!("Path does not exist, skipping: {:?}", path);
        }
    }

    files
}

/// Check if a file should be included based on patterns.
fn should_include(path: &Path, options: &IngestOptions) -> bool {
    let path_str = path.to_string_lossy();

    // Check excludes first
    for pattern in &options.exclude {
        if path_str.contains(pattern) {
            return false;
        }
    }

    // If includes are specified, must match at least one
    if !options.include.is_empty() {
        for pattern in &options.include {
            if path_str.contains(pattern) {
                return true;
            }
        }
        return false;
    }

    true
}

/// Last-modified timestamp of a file, falling back to now.
fn file_updated_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use parley_core::Department;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_options(paths: Vec<PathBuf>, department: Department) -> IngestOptions {
        IngestOptions {
            paths,
            department,
            include: vec![],
            exclude: vec![],
            reset: false,
        }
    }

    #[tokio::test]
    async fn test_ingest_single_file() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("financial_summary.md");
        std::fs::write(&doc, "Q1 2024 revenue reached 2.1 million dollars.").unwrap();

        let index = DocumentIndex::new(
            temp.path().join("index.sqlite"),
            Arc::new(TrigramProvider::new(384)),
        );

        let stats = ingest(&index, test_options(vec![doc], Department::Finance))
            .await
            .unwrap();

        assert_eq!(stats.sources_count, 1);
        assert_eq!(stats.fragments_count, 1);

        let index_stats = index.stats().await.unwrap();
        assert_eq!(index_stats.fragments_count, 1);
        assert_eq!(
            index_stats.by_department,
            vec![(Department::Finance, 1)]
        );
    }

    #[tokio::test]
    async fn test_ingest_directory_with_exclude() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("handbook.md"), "Employee handbook content.").unwrap();
        std::fs::write(docs.join("draft.tmp"), "Unfinished draft.").unwrap();

        let index = DocumentIndex::new(
            temp.path().join("index.sqlite"),
            Arc::new(TrigramProvider::new(384)),
        );

        let mut options = test_options(vec![docs], Department::General);
        options.exclude = vec![".tmp".to_string()];

        let stats = ingest(&index, options).await.unwrap();
        assert_eq!(stats.sources_count, 1);
    }

    #[tokio::test]
    async fn test_ingest_reset_clears_previous_fragments() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("notes.md");
        std::fs::write(&doc, "General company notes.").unwrap();

        let index = DocumentIndex::new(
            temp.path().join("index.sqlite"),
            Arc::new(TrigramProvider::new(384)),
        );

        ingest(&index, test_options(vec![doc.clone()], Department::General))
            .await
            .unwrap();

        let mut options = test_options(vec![doc], Department::General);
        options.reset = true;
        ingest(&index, options).await.unwrap();

        let stats = index.stats().await.unwrap();
        assert_eq!(stats.fragments_count, 1);
    }

    #[tokio::test]
    async fn test_long_document_produces_multiple_fragments() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("report.md");
        let text = "budget planning review ".repeat(400); // 1200 words
        std::fs::write(&doc, text).unwrap();

        let index = DocumentIndex::new(
            temp.path().join("index.sqlite"),
            Arc::new(TrigramProvider::new(384)),
        );

        let stats = ingest(&index, test_options(vec![doc], Department::Finance))
            .await
            .unwrap();

        assert!(stats.fragments_count > 1);
    }
}

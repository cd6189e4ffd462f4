//! SQLite-backed fragment store.
//!
//! The department filter lives in the SQL WHERE clause: the candidate set
//! handed to ranking is already restricted to the caller's allowed
//! departments, never an unrestricted top-k filtered afterwards.

use crate::types::{Fragment, IndexStats};
use chrono::{DateTime, Utc};
use parley_core::{AppError, AppResult, Department};
use rusqlite::{params, Connection};
use std::cmp::Ordering;
use std::path::Path;

/// Open (and if necessary initialize) the fragment store.
pub fn open(db_path: &Path) -> AppResult<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Index(format!("Failed to open fragment store: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS fragments (
            id TEXT PRIMARY KEY,
            source_file TEXT NOT NULL,
            department TEXT NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_fragments_department ON fragments(department);
        "#,
    )
    .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Opened fragment store at {:?}", db_path);
    Ok(conn)
}

/// Insert a fragment with its embedding into the store.
pub fn insert_fragment(conn: &Connection, fragment: &Fragment) -> AppResult<()> {
    let embedding_bytes = embedding_to_bytes(
        fragment
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Index("Fragment missing embedding".to_string()))?,
    );

    conn.execute(
        "INSERT OR REPLACE INTO fragments (id, source_file, department, content, embedding, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            fragment.id,
            fragment.source_file,
            fragment.department.as_str(),
            fragment.content,
            embedding_bytes,
            fragment.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| AppError::Index(format!("Failed to insert fragment: {}", e)))?;

    Ok(())
}

/// Query the store for the top-k fragments most similar to the query
/// embedding, restricted to the allowed departments.
///
/// Ranking: similarity descending, ties broken by most-recent `updated_at`,
/// then by insertion order. Returns an empty vec (not an error) when no
/// fragment satisfies the filter.
pub fn query_fragments(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
    allowed: &[Department],
) -> AppResult<Vec<(Fragment, f32)>> {
    if allowed.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    // Department filter in the WHERE clause: disallowed fragments never
    // enter the candidate pool.
    let placeholders = vec!["?"; allowed.len()].join(", ");
    let sql = format!(
        "SELECT rowid, id, source_file, department, content, embedding, updated_at
         FROM fragments WHERE department IN ({})",
        placeholders
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map(
            rusqlite::params_from_iter(allowed.iter().map(|d| d.as_str())),
            |row| {
                let rowid: i64 = row.get(0)?;

                let department_raw: String = row.get(3)?;
                let department: Department = department_raw
                    .parse()
                    .map_err(|e: AppError| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

                let embedding_bytes: Vec<u8> = row.get(5)?;
                let embedding = bytes_to_embedding(&embedding_bytes)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

                let updated_raw: String = row.get(6)?;
                let updated_at = DateTime::parse_from_rfc3339(&updated_raw)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?
                    .with_timezone(&Utc);

                Ok((
                    rowid,
                    Fragment {
                        id: row.get(1)?,
                        source_file: row.get(2)?,
                        department,
                        content: row.get(4)?,
                        embedding: Some(embedding),
                        updated_at,
                    },
                ))
            },
        )
        .map_err(|e| AppError::Index(format!("Failed to query fragments: {}", e)))?;

    let mut scored: Vec<(i64, Fragment, f32)> = Vec::new();

    for row in rows {
        let (rowid, fragment) =
            row.map_err(|e| AppError::Index(format!("Failed to read fragment row: {}", e)))?;

        // A stored embedding of the wrong dimension is a corrupted index,
        // not a recoverable condition.
        let embedding = fragment
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Index("Fragment missing embedding".to_string()))?;
        if embedding.len() != query_embedding.len() {
            return Err(AppError::Index(format!(
                "Embedding dimension mismatch: fragment '{}' has {}, query has {}",
                fragment.id,
                embedding.len(),
                query_embedding.len()
            )));
        }

        let score = cosine_similarity(query_embedding, embedding);
        scored.push((rowid, fragment, score));
    }

    // Similarity desc, ties by most-recent update, then insertion order.
    scored.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.updated_at.cmp(&a.1.updated_at))
            .then_with(|| a.0.cmp(&b.0))
    });

    scored.truncate(top_k);

    tracing::debug!(
        "Retrieved {} fragments (requested top-{}, {} departments allowed)",
        scored.len(),
        top_k,
        allowed.len()
    );

    Ok(scored
        .into_iter()
        .map(|(_, fragment, score)| (fragment, score))
        .collect())
}

/// Get statistics for the store.
pub fn get_stats(conn: &Connection) -> AppResult<IndexStats> {
    let fragments_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM fragments", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Index(format!("Failed to count fragments: {}", e)))?;

    let sources_count: u32 = conn
        .query_row("SELECT COUNT(DISTINCT source_file) FROM fragments", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Index(format!("Failed to count sources: {}", e)))?;

    let mut stmt = conn
        .prepare("SELECT department, COUNT(*) FROM fragments GROUP BY department ORDER BY department")
        .map_err(|e| AppError::Index(format!("Failed to prepare stats query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let department_raw: String = row.get(0)?;
            let department: Department = department_raw
                .parse()
                .map_err(|e: AppError| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            let count: i64 = row.get(1)?;
            Ok((department, count as u32))
        })
        .map_err(|e| AppError::Index(format!("Failed to query stats: {}", e)))?;

    let mut by_department = Vec::new();
    for row in rows {
        by_department
            .push(row.map_err(|e| AppError::Index(format!("Failed to read stats row: {}", e)))?);
    }

    Ok(IndexStats {
        fragments_count,
        sources_count,
        by_department,
    })
}

/// Reset the store (delete all fragments).
pub fn reset(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM fragments", [])
        .map_err(|e| AppError::Index(format!("Failed to delete fragments: {}", e)))?;

    tracing::info!("Reset fragment store");
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

//! Ingest command handler.
//!
//! Chunks, embeds, and stores department-tagged documents. Run once per
//! department, pointing at that department's files or directories.

use clap::Args;
use parley_core::config::AppConfig;
use parley_core::{AppResult, Department};
use parley_index::{
    create_provider, default_index_path, ingest, DocumentIndex, EmbeddingConfig, IngestOptions,
};
use std::path::PathBuf;

/// Ingest department-tagged documents into the index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    pub paths: Vec<PathBuf>,

    /// Department tag applied to every ingested fragment
    #[arg(short, long)]
    pub department: String,

    /// Include patterns (substring match)
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude patterns (substring match)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Reset the store before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let department: Department = self.department.parse()?;
        tracing::info!("Executing ingest command for department '{}'", department);

        let embed_config = EmbeddingConfig::from_app_config(config);
        let embedder = create_provider(&embed_config).await?;
        let index = DocumentIndex::new(default_index_path(&config.workspace), embedder);

        let options = IngestOptions {
            paths: self.paths.clone(),
            department,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            reset: self.reset,
        };

        let stats = ingest(&index, options).await?;

        if self.json {
            let output = serde_json::json!({
                "department": department,
                "sourcesCount": stats.sources_count,
                "fragmentsCount": stats.fragments_count,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Ingested {} sources ({} fragments, {} bytes) as '{}' in {:.2}s",
                stats.sources_count,
                stats.fragments_count,
                stats.bytes_processed,
                department,
                stats.duration_secs
            );
        }

        Ok(())
    }
}

//! Stats command handler.
//!
//! Reports fragment store statistics.

use clap::Args;
use parley_core::config::AppConfig;
use parley_core::{AppError, AppResult};
use parley_index::{default_index_path, store};

/// Show fragment store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let index_path = default_index_path(&config.workspace);
        if !index_path.exists() {
            return Err(AppError::Index(format!(
                "No fragment store at {:?}. Run 'parley ingest' first.",
                index_path
            )));
        }

        let stats = tokio::task::spawn_blocking(move || {
            let conn = store::open(&index_path)?;
            store::get_stats(&conn)
        })
        .await
        .map_err(|e| AppError::Index(format!("Stats task failed: {}", e)))??;

        if self.json {
            let output = serde_json::to_value(&stats)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Fragment store:");
            println!("  Fragments: {}", stats.fragments_count);
            println!("  Sources: {}", stats.sources_count);
            println!("  By department:");
            for (department, count) in &stats.by_department {
                println!("    {}: {}", department, count);
            }
        }

        Ok(())
    }
}

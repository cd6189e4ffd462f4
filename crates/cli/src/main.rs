//! Parley CLI
//!
//! Main entry point for the parley command-line tool: role-filtered
//! question answering over internal company documents, with per-user
//! conversation memory.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChatCommand, DepartmentsCommand, IngestCommand, StatsCommand};
use parley_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Parley - role-aware Q&A over internal company documents
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Role-aware Q&A over internal company documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PARLEY_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, mock)
    #[arg(short, long, global = true, env = "PARLEY_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "PARLEY_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask questions as an authenticated user
    Chat(ChatCommand),

    /// Ingest department-tagged documents into the index
    Ingest(IngestCommand),

    /// Show the departments a role may access
    Departments(DepartmentsCommand),

    /// Show fragment store statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    // Log startup
    tracing::info!("Parley CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure .parley directory exists
    config.ensure_parley_dir()?;

    let command_name = match &cli.command {
        Commands::Chat(_) => "chat",
        Commands::Ingest(_) => "ingest",
        Commands::Departments(_) => "departments",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Departments(cmd) => cmd.execute(),
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

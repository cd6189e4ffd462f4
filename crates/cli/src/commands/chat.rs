//! Chat command handler.
//!
//! Runs the role-filtered query pipeline for an authenticated user. The
//! (user, role) pair is accepted from the command line and trusted: the
//! identity provider sits upstream of this binary.

use clap::Args;
use parley_chat::{ChatEngine, ChatOptions, ChatReply};
use parley_core::config::{AppConfig, ProviderConfig};
use parley_core::{AppError, AppResult, Role};
use parley_index::{create_provider, default_index_path, DocumentIndex, EmbeddingConfig};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Ask questions as an authenticated user
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The question to ask (omit with --interactive)
    pub query: Option<String>,

    /// User identity, as resolved by the upstream identity provider
    #[arg(short, long)]
    pub user: String,

    /// The user's role (finance, marketing, hr, engineering, c-level, employee)
    #[arg(short, long)]
    pub role: String,

    /// Read queries from stdin in a loop (/clear resets the session, /quit exits)
    #[arg(short, long)]
    pub interactive: bool,

    /// Cap on prior turns supplied to generation
    #[arg(long)]
    pub prior_turns: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command for user '{}'", self.user);

        config.validate()?;
        let role: Role = self.role.parse()?;

        let engine = self.build_engine(config).await?;

        if self.interactive {
            self.run_interactive(&engine, role).await
        } else {
            let query = self.query.as_deref().ok_or_else(|| {
                AppError::Config("No query provided (or pass --interactive)".to_string())
            })?;
            self.run_query(&engine, role, query).await
        }
    }

    /// Wire the index, embedding provider, and generation client together.
    async fn build_engine(&self, config: &AppConfig) -> AppResult<ChatEngine> {
        let embed_config = EmbeddingConfig::from_app_config(config);
        let embedder = create_provider(&embed_config).await?;
        let index = Arc::new(DocumentIndex::new(
            default_index_path(&config.workspace),
            embedder,
        ));

        let provider_config = config.get_provider_config(&config.provider)?;
        let endpoint = provider_config.as_ref().and_then(|pc| match pc {
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.clone()),
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.clone(),
            ProviderConfig::Claude { endpoint, .. } => endpoint.clone(),
        });

        let api_key = config.resolve_api_key(&config.provider)?;

        // Provider-level timeout, falling back to the pipeline's generation bound
        let timeout_secs = provider_config
            .as_ref()
            .and_then(|pc| match pc {
                ProviderConfig::Ollama { timeout, .. } => *timeout,
                _ => None,
            })
            .unwrap_or(config.chat.generation_timeout_secs);
        let timeout = Duration::from_secs(timeout_secs);

        let client = parley_llm::create_client(
            &config.provider,
            endpoint.as_deref(),
            api_key.as_deref(),
            Some(timeout),
        )
        .map_err(AppError::Config)?;

        Ok(ChatEngine::new(index, client, &config.model, &config.chat))
    }

    /// Run a single query and print the reply.
    async fn run_query(&self, engine: &ChatEngine, role: Role, query: &str) -> AppResult<()> {
        let options = ChatOptions {
            user: self.user.clone(),
            role,
            query: query.to_string(),
            prior_turns_hint: self.prior_turns,
        };

        match engine.chat(options).await {
            Ok(reply) => self.print_reply(&reply),
            Err(AppError::Generation(message)) => {
                // Generation being down is a user-visible outcome, not a crash
                tracing::warn!("Generation unavailable: {}", message);
                println!("Generation is currently unavailable. Please try again later.");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Print a reply as text or JSON.
    fn print_reply(&self, reply: &ChatReply) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string_pretty(reply)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", reply.answer);

            if !reply.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &reply.sources {
                    println!(
                        "- {} ({}, updated {})",
                        source.file,
                        source.department,
                        source.updated_at.format("%Y-%m-%d")
                    );
                }
            }
        }

        Ok(())
    }

    /// Read queries from stdin until EOF or /quit.
    async fn run_interactive(&self, engine: &ChatEngine, role: Role) -> AppResult<()> {
        println!(
            "Chatting as '{}' (role: {}). /clear resets the session, /quit exits.",
            self.user, role
        );

        let stdin = std::io::stdin();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query == "/quit" || query == "/exit" {
                break;
            }
            if query == "/clear" {
                engine.clear_session(&self.user).await;
                println!("(session cleared)");
                continue;
            }

            self.run_query(engine, role, query).await?;
        }

        Ok(())
    }
}

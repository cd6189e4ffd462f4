//! Embedding configuration.

use parley_core::config::{AppConfig, ProviderConfig};
use serde::{Deserialize, Serialize};

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Derive the embedding configuration from the application config.
    ///
    /// The active embedding provider comes from `llm.activeEmbeddingProvider`
    /// in config.yaml; without one the deterministic trigram provider is used.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let Some(ref llm) = config.llm else {
            return Self::default();
        };

        match llm.active_embedding_provider.as_str() {
            "ollama" => {
                let model = llm
                    .providers
                    .get("ollama")
                    .and_then(|p| match p {
                        ProviderConfig::Ollama {
                            embedding_model, ..
                        } => embedding_model.clone(),
                        _ => None,
                    })
                    .unwrap_or_else(|| "nomic-embed-text".to_string());

                Self {
                    provider: "ollama".to_string(),
                    model,
                    dimensions: 768,
                    batch_size: default_batch_size(),
                }
            }
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
    }

    #[test]
    fn test_from_app_config_without_llm_section() {
        let app_config = AppConfig::default();
        let config = EmbeddingConfig::from_app_config(&app_config);
        assert_eq!(config.provider, "trigram");
    }
}

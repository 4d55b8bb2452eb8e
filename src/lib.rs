// src/lib.rs

use std::sync::Arc;

use anyhow::Result;

// Re-export modules
pub mod agent;
pub mod api;
pub mod config;
pub mod kadena;
pub mod mcp;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::Config>,
    /// Operation descriptors and token catalog
    pub registry: Arc<kadena::registry::Registry>,
    /// Chat-completion client for the language model
    pub llm: agent::llm::LlmClient,
    /// Client for the unsigned-transaction API
    pub transactions: kadena::client::TransactionClient,
    /// Client for the question-answering service
    pub analysis: kadena::client::AnalysisClient,
}

impl AppState {
    /// Builds the shared clients from configuration.
    pub fn new(config: config::Config, registry: kadena::registry::Registry) -> Self {
        let http = reqwest::Client::new();
        let llm = agent::llm::LlmClient::new(
            http.clone(),
            &config.openai_base_url,
            config.openai_api_key.clone(),
        );
        let transactions = kadena::client::TransactionClient::new(
            http.clone(),
            &config.kadena_api_base_url,
            config.kadena_api_key.clone(),
        );
        let analysis = kadena::client::AnalysisClient::new(http, &config.analysis_api_url);

        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            llm,
            transactions,
            analysis,
        }
    }

    /// Loads the bundled registry and builds the state.
    pub fn from_config(config: config::Config) -> Result<Self> {
        let registry = kadena::registry::Registry::load()?;
        Ok(Self::new(config, registry))
    }
}

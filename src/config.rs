// src/config.rs

use std::env;
use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

use crate::agent::history::DEFAULT_MAX_HISTORY_LENGTH;
use crate::kadena::models::ChainIdPolicy;

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub host: IpAddr,
    pub port: u16,

    /// Language model settings (OpenAI-compatible chat completions)
    pub openai_api_key: Arc<SecretString>,
    pub openai_base_url: String,
    /// Model used for the agent decision and the trading launcher
    pub model_name: String,
    /// Model used to turn raw tool output and errors into user-facing text
    pub processing_model: String,

    // Downstream services
    pub kadena_api_base_url: String,
    pub kadena_api_key: Arc<SecretString>,
    pub analysis_api_url: String,

    // Request handling
    pub max_history_length: usize,
    pub chain_id_policy: ChainIdPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            openai_api_key: Arc::new(SecretString::new(String::new())),
            openai_base_url: "https://api.openai.com".to_string(),
            model_name: "o4-mini".to_string(),
            processing_model: "gpt-4o".to_string(),
            kadena_api_base_url: "https://kadena-agents.onrender.com".to_string(),
            kadena_api_key: Arc::new(SecretString::new(String::new())),
            analysis_api_url: "https://analyze-slaz.onrender.com/analyze".to_string(),
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            chain_id_policy: ChainIdPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;

        let chain_id_policy = match env::var("CHAIN_ID_POLICY") {
            Ok(raw) => raw
                .parse::<ChainIdPolicy>()
                .context("CHAIN_ID_POLICY must look like 'range:0-19' or 'exact:2'")?,
            Err(_) => defaults.chain_id_policy,
        };

        Ok(Config {
            // Server settings
            host: env::var("HOST")
                .unwrap_or_else(|_| defaults.host.to_string())
                .parse()
                .context("HOST must be a valid IP address")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("PORT must be a valid number")?,

            // Language model settings
            openai_api_key: Arc::new(SecretString::new(openai_api_key)),
            openai_base_url: url_var("OPENAI_BASE_URL", &defaults.openai_base_url)?,
            model_name: env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            processing_model: env::var("PROCESSING_MODEL").unwrap_or(defaults.processing_model),

            // Downstream services
            kadena_api_base_url: url_var("KADENA_API_BASE_URL", &defaults.kadena_api_base_url)?,
            kadena_api_key: Arc::new(SecretString::new(
                env::var("KADENA_API_KEY").unwrap_or_default(),
            )),
            analysis_api_url: url_var("ANALYSIS_API_URL", &defaults.analysis_api_url)?,

            // Request handling
            max_history_length: env::var("MAX_HISTORY_LENGTH")
                .unwrap_or_else(|_| defaults.max_history_length.to_string())
                .parse()
                .context("MAX_HISTORY_LENGTH must be a valid number")?,
            chain_id_policy,
        })
    }
}

// Reads a URL variable, falling back to `default`, and checks it parses.
fn url_var(key: &str, default: &str) -> Result<String> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).with_context(|| format!("{} must be a valid URL, got '{}'", key, raw))?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hosted_service() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.model_name, "o4-mini");
        assert_eq!(config.processing_model, "gpt-4o");
        assert_eq!(config.max_history_length, 10);
        assert_eq!(config.chain_id_policy, ChainIdPolicy::Range { min: 0, max: 19 });
    }

    #[test]
    fn url_var_falls_back_to_default() {
        let url = url_var("KADENA_AGENT_TEST_UNSET_URL", "http://localhost:9000/analyze").unwrap();
        assert_eq!(url, "http://localhost:9000/analyze");
    }

    #[test]
    fn url_var_rejects_garbage() {
        env::set_var("KADENA_AGENT_TEST_BAD_URL", "not a url");
        let err = url_var("KADENA_AGENT_TEST_BAD_URL", "http://localhost").unwrap_err();
        assert!(err.to_string().contains("KADENA_AGENT_TEST_BAD_URL must be a valid URL"));
    }
}

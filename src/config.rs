use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Model endpoint settings. The reference deployment is an Ollama instance
/// exposing the OpenAI-compatible API at http://localhost:11434/v1.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Options handed to the query engine for every ask.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    pub enable_cache: bool,
    pub verbose: bool,
    pub use_error_correction: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            llm: LlmConfig {
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3".to_string()),
                timeout_secs: env::var("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            },
            query: QueryConfig {
                enable_cache: env::var("QUERY_ENABLE_CACHE")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()?,
                verbose: env::var("QUERY_VERBOSE")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
                use_error_correction: env::var("QUERY_USE_ERROR_CORRECTION")
                    .unwrap_or_else(|_| "true".to_string())
                    .parse()?,
            },
        })
    }
}

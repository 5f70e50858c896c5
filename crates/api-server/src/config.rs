use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    // External APIs
    pub tavily_api_key: String,
    pub gemini_api_key: String,
    pub gemini_model: Option<String>,

    // Storage
    pub database_url: String,

    // Server
    pub bind_addr: String,

    // Resource protection
    pub daily_free_quota: u32,
    pub daily_global_limit: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            tavily_api_key: env::var("TAVILY_API_KEY").context("TAVILY_API_KEY must be set")?,
            gemini_api_key: env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?,
            gemini_model: env::var("GEMINI_MODEL").ok(),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:stock_research.db".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            daily_free_quota: env::var("DAILY_FREE_QUOTA")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("DAILY_FREE_QUOTA must be a non-negative integer")?,
            daily_global_limit: env::var("DAILY_GLOBAL_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("DAILY_GLOBAL_LIMIT must be a non-negative integer")?,
        };

        Ok(config)
    }
}

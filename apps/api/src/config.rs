use std::num::NonZeroU32;

use anyhow::{Context, Result};

use crate::consultation::prompts::DEFAULT_TOPIC;

/// Application configuration loaded from environment variables.
/// Every variable is optional; without `DATABASE_URL` sessions live in memory.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: NonZeroU32,
    pub port: u16,
    pub rust_log: String,
    pub consultation_topic: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse::<NonZeroU32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            consultation_topic: var("CONSULTATION_TOPIC")
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
        })
    }
}

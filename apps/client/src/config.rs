use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::api_client::DEFAULT_API_URL;

pub const DEFAULT_TOKEN_FILE: &str = ".ions/session.json";

/// Client configuration loaded from environment variables (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token_file: PathBuf,
    pub http_timeout: Option<Duration>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_url = env_or("IONS_API_URL", DEFAULT_API_URL);
        Url::parse(&api_url)
            .with_context(|| format!("IONS_API_URL is not a valid URL: '{api_url}'"))?;

        let http_timeout = match std::env::var("IONS_HTTP_TIMEOUT_SECS") {
            Ok(secs) => Some(Duration::from_secs(
                secs.parse::<u64>()
                    .context("IONS_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            )),
            Err(_) => None,
        };

        Ok(Config {
            api_url,
            token_file: PathBuf::from(env_or("IONS_TOKEN_FILE", DEFAULT_TOKEN_FILE)),
            http_timeout,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

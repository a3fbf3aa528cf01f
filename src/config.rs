//! Process configuration.
//!
//! Everything the service needs (credentials included) is read once at start-up
//! and handed to the clients explicitly, so the publishing core never touches
//! the environment.
//!
//! Recognized variables:
//! - `HOST` / `PORT` - listen address (default `0.0.0.0:7860`)
//! - `SHARED_SECRET` - secret every brief must carry (legacy name: `secretkey`)
//! - `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_API_BASE` - text generation
//! - `GITHUB_TOKEN`, `GITHUB_OWNER`, `GITHUB_API_BASE` - repository host
//! - `PAGES_BRANCH` - branch files are committed to and served from
//! - `DATA_DIR` - local mirror of requests, attachments and generated files
//! - `EVALUATION_TIMEOUT_SECS` - bound on the evaluation callback

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_PAGES_BRANCH: &str = "main";
pub const DEFAULT_EVALUATION_TIMEOUT_SECS: u64 = 10;

/// Text generation settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

/// Repository host settings.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// Account that owns generated repositories (used for reuse and pages URLs).
    pub owner: String,
    pub api_base: String,
    pub branch: String,
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Secret every inbound brief must match. `None` rejects every request.
    pub shared_secret: Option<String>,
    pub gemini: GeminiConfig,
    pub github: GitHubConfig,
    pub data_dir: PathBuf,
    pub evaluation_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the normal case in deployment.
        let _ = dotenvy::dotenv();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => 7860,
        };

        let evaluation_timeout = match std::env::var("EVALUATION_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("EVALUATION_TIMEOUT_SECS is not a number: {raw}"))?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_EVALUATION_TIMEOUT_SECS),
        };

        let shared_secret = non_empty_var("SHARED_SECRET").or_else(|| non_empty_var("secretkey"));
        if shared_secret.is_none() {
            tracing::warn!("No SHARED_SECRET configured; every task submission will be rejected");
        }

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            shared_secret,
            gemini: GeminiConfig {
                api_key: required_var("GEMINI_API_KEY")?,
                model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
                api_base: std::env::var("GEMINI_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_GEMINI_API_BASE.into()),
            },
            github: GitHubConfig {
                token: required_var("GITHUB_TOKEN")?,
                owner: required_var("GITHUB_OWNER")?,
                api_base: std::env::var("GITHUB_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_GITHUB_API_BASE.into()),
                branch: std::env::var("PAGES_BRANCH")
                    .unwrap_or_else(|_| DEFAULT_PAGES_BRANCH.into()),
            },
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            evaluation_timeout,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required_var(key: &str) -> Result<String> {
    non_empty_var(key).with_context(|| format!("{key} must be set"))
}

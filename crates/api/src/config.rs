//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use documents::DEFAULT_MAX_UPLOAD_BYTES;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory holding uploaded files.
    pub blob_dir: PathBuf,
    /// Public URL prefix for stored files, handed to the model for extraction.
    pub blob_base_url: Option<String>,
    /// Upper bound on a single model call.
    pub llm_call_timeout_secs: u64,
    /// Webhook receiving owner notifications; notifications are only logged when unset.
    pub owner_webhook_url: Option<String>,
    /// Bearer token required on every request when set.
    pub api_token: Option<String>,
    /// Largest accepted upload.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:construction.db?mode=rwc` |
    /// | `BLOB_DIR` | Upload directory | `./blobs` |
    /// | `BLOB_BASE_URL` | Public URL prefix for uploads | (none) |
    /// | `LLM_CALL_TIMEOUT_SECS` | Model call timeout | `180` |
    /// | `OWNER_WEBHOOK_URL` | Owner notification webhook | (none) |
    /// | `API_TOKEN` | Required bearer token | (none) |
    /// | `MAX_UPLOAD_BYTES` | Upload size limit | `52428800` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:construction.db?mode=rwc".to_string());

        let blob_dir = env::var("BLOB_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./blobs"));

        let blob_base_url = non_empty("BLOB_BASE_URL");

        let llm_call_timeout_secs = match env::var("LLM_CALL_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("LLM_CALL_TIMEOUT_SECS"))?,
            Err(_) => 180,
        };

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("MAX_UPLOAD_BYTES"))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            addr,
            database_url,
            blob_dir,
            blob_base_url,
            llm_call_timeout_secs,
            owner_webhook_url: non_empty("OWNER_WEBHOOK_URL"),
            api_token: non_empty("API_TOKEN"),
            max_upload_bytes,
        })
    }
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("{0} must be a non-negative integer")]
    InvalidNumber(&'static str),
}

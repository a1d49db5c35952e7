//! Configuration module
//!
//! Runtime configuration is read from environment variables (a `.env` file
//! is honored in development via dotenvy). Every knob has a deliberate
//! default so a bare `datadrop-api` starts a working local server.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UI_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_STORAGE_PATH: &str = "./data";
const DEFAULT_RETENTION_HOURS: i64 = 24;
// The companion UI has always capped uploads at 100 MB; the server enforces it.
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 300;

/// Server configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Port the HTTP API binds to.
    pub server_port: u16,
    /// Base URL used when constructing share URLs returned to clients.
    pub public_base_url: String,
    /// Origins allowed to call the API cross-origin (the UI lives elsewhere).
    pub cors_origins: Vec<String>,
    /// Root directory for blob storage; staging and published blobs live under it.
    pub storage_path: PathBuf,
    /// How long an uploaded file stays retrievable.
    pub retention_hours: i64,
    /// Maximum accepted file size in bytes.
    pub max_file_size_bytes: u64,
    /// Seconds between reaper sweeps.
    pub reaper_interval_secs: u64,
    pub environment: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let server_port = parse_env("DATADROP_PORT", DEFAULT_PORT)?;
        let public_base_url = env::var("DATADROP_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", server_port));
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_UI_ORIGIN.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let storage_path = PathBuf::from(
            env::var("DATADROP_STORAGE_PATH").unwrap_or_else(|_| DEFAULT_STORAGE_PATH.to_string()),
        );

        let config = Config {
            server_port,
            public_base_url,
            cors_origins,
            storage_path,
            retention_hours: parse_env("RETENTION_HOURS", DEFAULT_RETENTION_HOURS)?,
            max_file_size_bytes: parse_env("MAX_FILE_SIZE_BYTES", DEFAULT_MAX_FILE_SIZE_BYTES)?,
            reaper_interval_secs: parse_env("REAPER_INTERVAL_SECS", DEFAULT_REAPER_INTERVAL_SECS)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on configuration that cannot produce a working server.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.retention_hours < 1 {
            anyhow::bail!("RETENTION_HOURS must be at least 1 (got {})", self.retention_hours);
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_BYTES must be positive");
        }
        if self.reaper_interval_secs == 0 {
            anyhow::bail!("REAPER_INTERVAL_SECS must be positive");
        }
        if self.cors_origins.is_empty() {
            anyhow::bail!("CORS_ORIGINS must name at least one origin (or '*')");
        }
        if self.public_base_url.trim().is_empty() {
            anyhow::bail!("DATADROP_PUBLIC_URL must not be empty");
        }
        Ok(())
    }

    /// Retention window as a chrono duration, for computing `expires_at`.
    pub fn retention_window(&self) -> Duration {
        Duration::hours(self.retention_hours)
    }

    /// Share URL for a freshly uploaded file, as returned to clients.
    pub fn share_url(&self, id: &str) -> String {
        format!("{}/files/{}", self.public_base_url.trim_end_matches('/'), id)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

//! Server configuration
//!
//! Environment-sourced settings with defaults matching the original
//! deployment contract: DB_PATH, MEETING_DATA_DIR, HOST, PORT,
//! ALLOWED_ORIGINS (comma-separated, `*` for any).

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Runtime settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite database file path
    pub db_path: String,
    /// Directory for per-meeting descriptor files
    pub meeting_data_dir: String,
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Comma-separated allowed CORS origins
    pub allowed_origins: String,
}

impl Settings {
    /// Load settings from the environment, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("db_path", "attention_scores.db")?
            .set_default("meeting_data_dir", "meeting_data")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("allowed_origins", "*")?
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// SQLite connection URL for the configured database path
    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.db_path)
    }

    /// Allowed origins as a trimmed list
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

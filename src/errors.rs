// src/errors.rs
use thiserror::Error;

/// Shown when a failure carries no message of its own.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// A failure reported by the execution service itself.
    #[error("API Error {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("Invalid neuron path '{0}': expected organization/neuron-slug")]
    InvalidPath(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Transport(String),
}

impl SandboxError {
    /// Formats the error the way the output pane shows it.
    pub fn display_error(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            format!("Error: {}", UNKNOWN_ERROR)
        } else {
            format!("Error: {}", message)
        }
    }
}

pub type Result<T> = std::result::Result<T, SandboxError>;

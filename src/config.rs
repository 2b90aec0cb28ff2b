// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::errors::{Result, SandboxError};

pub const DEFAULT_API_BASE: &str = "https://run.prompteus.com";

/// Where the sandbox keeps the neuron path and credential.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// SQLite database file.
    Sqlite(PathBuf),
    /// Process-lifetime only; nothing survives a restart.
    Memory,
}

/// Settings for the execution service client.
#[derive(Debug, Clone)]
pub struct NeuronConfig {
    pub api_base: String,
    pub timeout: Option<Duration>,
}

/// High-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub neuron: NeuronConfig,
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
}

/// Optional TOML file layered under the environment.
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 9000
///
/// [neuron]
/// api_base = "https://run.example.com"
/// timeout_secs = 30
///
/// database_url = "sqlite:/tmp/sandbox.db"
/// ```
#[derive(Deserialize, Debug, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub neuron: NeuronSection,
    #[serde(default)]
    pub database_url: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NeuronSection {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

impl AppConfig {
    /// Load configuration from `SANDBOX_CONFIG` (if set) and environment variables.
    pub fn from_env() -> Result<Self> {
        let file = match std::env::var("SANDBOX_CONFIG") {
            Ok(path) => FileConfig::from_file(Path::new(&path))?,
            Err(_) => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merges file settings with variables looked up through `var`; variables win.
    pub fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base = var("NEURON_API_BASE")
            .or(file.neuron.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = api_base.trim_end_matches('/').to_string();
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(SandboxError::Config(format!(
                "NEURON_API_BASE must be an http(s) URL, got '{}'",
                api_base
            )));
        }

        let timeout_secs = match var("NEURON_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                SandboxError::Config(format!("NEURON_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?),
            None => file.neuron.timeout_secs,
        };

        let host = var("SANDBOX_HOST")
            .or(file.server.host)
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match var("SANDBOX_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                SandboxError::Config(format!("SANDBOX_PORT must be a port number, got '{}'", raw))
            })?,
            None => file.server.port.unwrap_or(8080),
        };

        let storage = match var("DATABASE_URL").or(file.database_url) {
            Some(url) => parse_database_url(&url)?,
            None => StorageConfig::Sqlite(default_db_path()?),
        };

        Ok(AppConfig {
            neuron: NeuronConfig {
                api_base,
                timeout: timeout_secs.map(Duration::from_secs),
            },
            host,
            port,
            storage,
        })
    }

    /// Address of the sandbox page, used for share links.
    pub fn public_url(&self) -> Result<reqwest::Url> {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            host => host,
        };
        reqwest::Url::parse(&format!("http://{}:{}/", host, self.port))
            .map_err(|e| SandboxError::Config(format!("Invalid server address: {}", e)))
    }
}

fn parse_database_url(url: &str) -> Result<StorageConfig> {
    if url == "memory" {
        return Ok(StorageConfig::Memory);
    }
    let path = url.strip_prefix("sqlite:").ok_or_else(|| {
        SandboxError::Config("DATABASE_URL must start with 'sqlite:' or be 'memory'".to_string())
    })?;
    let path = path.trim_start_matches("//");
    if path.is_empty() {
        return Err(SandboxError::Config("DATABASE_URL has an empty path".to_string()));
    }
    Ok(StorageConfig::Sqlite(PathBuf::from(path)))
}

fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| SandboxError::Config("Could not determine a local data directory".to_string()))?;
    Ok(base.join("neuron-sandbox").join("sandbox.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::resolve(
            FileConfig::default(),
            env(&[("DATABASE_URL", "memory")]),
        )
        .unwrap();
        assert_eq!(config.neuron.api_base, DEFAULT_API_BASE);
        assert_eq!(config.neuron.timeout, None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageConfig::Memory);
    }

    #[test]
    fn environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            database_url = "sqlite:/tmp/from-file.db"

            [server]
            host = "0.0.0.0"
            port = 9000

            [neuron]
            api_base = "https://file.example.com/"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(
            file,
            env(&[("SANDBOX_PORT", "9100"), ("NEURON_API_BASE", "http://localhost:4000/")]),
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.neuron.api_base, "http://localhost:4000");
        assert_eq!(config.neuron.timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            config.storage,
            StorageConfig::Sqlite(PathBuf::from("/tmp/from-file.db"))
        );
        assert_eq!(config.public_url().unwrap().as_str(), "http://127.0.0.1:9100/");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let bad_port = AppConfig::resolve(
            FileConfig::default(),
            env(&[("SANDBOX_PORT", "eighty"), ("DATABASE_URL", "memory")]),
        );
        assert!(matches!(bad_port, Err(SandboxError::Config(_))));

        let bad_db = AppConfig::resolve(
            FileConfig::default(),
            env(&[("DATABASE_URL", "postgres://x")]),
        );
        assert!(matches!(bad_db, Err(SandboxError::Config(_))));

        let bad_base = AppConfig::resolve(
            FileConfig::default(),
            env(&[("NEURON_API_BASE", "run.prompteus.com"), ("DATABASE_URL", "memory")]),
        );
        assert!(matches!(bad_base, Err(SandboxError::Config(_))));
    }
}

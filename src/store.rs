// src/store.rs
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::StorageConfig;
use crate::errors::Result;

/// Storage key for the last used neuron path.
pub const NEURON_PATH_KEY: &str = "neuronPath";
/// Storage key for the bearer credential.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Durable string key-value storage for sandbox settings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Opens the store described by `config`.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match config {
        StorageConfig::Sqlite(path) => Ok(Arc::new(SqliteStore::open(path).await?)),
        StorageConfig::Memory => {
            log::warn!("⚠️  Using in-memory storage; settings will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Settings kept in a SQLite `settings` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database file at `path` and runs migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let absolute_path = if path.is_relative() {
            std::env::current_dir()?.join(path)
        } else {
            path.to_path_buf()
        };

        log::info!("📦 Database file path: {}", absolute_path.display());

        let db_url = format!("sqlite://{}?mode=rwc", absolute_path.display());
        Self::connect(&db_url, 5).await
    }

    /// Connects to `db_url` and runs migrations.
    pub async fn connect(db_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        log::info!("✅ Database ready");

        Ok(Self { pool })
    }

    /// A private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        // A single connection keeps every query on the same in-memory database.
        Self::connect("sqlite::memory:", 1).await
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>(0)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Settings held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sqlite_store_round_trips_and_overwrites() {
        let store = SqliteStore::in_memory().await.unwrap();

        assert_eq!(store.get(NEURON_PATH_KEY).await.unwrap(), None);

        store.set(NEURON_PATH_KEY, "acme/summarize").await.unwrap();
        store.set(NEURON_PATH_KEY, "acme/translate").await.unwrap();
        store.set(AUTH_TOKEN_KEY, "sk-test").await.unwrap();

        assert_eq!(
            store.get(NEURON_PATH_KEY).await.unwrap().as_deref(),
            Some("acme/translate")
        );
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("sk-test"));
    }

    #[tokio::test]
    async fn sqlite_store_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("neuron-sandbox-{}", uuid::Uuid::new_v4()));
        let path = dir.join("sandbox.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.set(NEURON_PATH_KEY, "acme/summarize").await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(NEURON_PATH_KEY).await.unwrap().as_deref(),
            Some("acme/summarize")
        );
        reopened.pool.close().await;

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn memory_store_returns_last_write() {
        let store = MemoryStore::new();

        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        store.set(AUTH_TOKEN_KEY, "first").await.unwrap();
        store.set(AUTH_TOKEN_KEY, "second").await.unwrap();
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("second"));
    }
}

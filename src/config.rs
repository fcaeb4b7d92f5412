use crate::errors::{AppError, AppResult};
use crate::persistence::{JsonFileStore, MemoryStore, PersistenceAdapter, SqliteStore};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKind {
    #[default]
    Memory,
    JsonFile,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizerConfig {
    pub debounce_ms: u64,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl OrganizerConfig {
    /// Reads a YAML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.to_string_lossy(), "no config file; using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.to_string_lossy()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn open_persistence(&self) -> AppResult<Arc<dyn PersistenceAdapter>> {
        self.validate()?;
        let adapter: Arc<dyn PersistenceAdapter> = match (self.storage.kind, self.storage.path.as_deref()) {
            (StorageKind::Memory, _) => Arc::new(MemoryStore::new()),
            (StorageKind::JsonFile, Some(path)) => Arc::new(JsonFileStore::new(path)),
            (StorageKind::Sqlite, Some(path)) => Arc::new(SqliteStore::new(path)?),
            (kind, None) => {
                return Err(AppError::Validation(format!("storage kind {:?} requires a path", kind)));
            }
        };
        Ok(adapter)
    }

    fn validate(&self) -> AppResult<()> {
        if self.storage.kind != StorageKind::Memory && self.storage.path.is_none() {
            return Err(AppError::Validation(format!(
                "storage kind {:?} requires a path",
                self.storage.kind
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(AppError::Validation("logging level cannot be empty".to_string()));
        }
        Ok(())
    }
}

// Configuration loading and parsing (tracker.toml).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::db::SqliteStore;
use crate::kv::{MemoryStore, Storage};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// tracker.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub schedule: ScheduleConfig,
    pub dynasty: DynastyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite file, relative to the base directory. Empty means the
    /// platform data directory.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub autosave_debounce_ms: u64,
}

impl ScheduleConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynastyConfig {
    pub default_start_year: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "dynasty_core=info,warn".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

const CONFIG_FILE: &str = "tracker.toml";

/// Load and validate `config/tracker.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer [`load_config`].
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Copy defaults if needed, then load config relative to `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Storage construction
// ---------------------------------------------------------------------------

impl Config {
    /// Where the SQLite file lives: `storage.path` under `base_dir`, or the
    /// platform data directory when the path is empty.
    pub fn database_path(&self, base_dir: &Path) -> anyhow::Result<PathBuf> {
        if !self.storage.path.trim().is_empty() {
            return Ok(base_dir.join(&self.storage.path));
        }
        let dirs = ProjectDirs::from("", "", "dynasty-tracker")
            .context("could not determine a platform data directory")?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        Ok(data_dir.join("dynasty-tracker.db"))
    }

    /// Open the configured backend.
    pub fn open_storage(&self, base_dir: &Path) -> anyhow::Result<Storage> {
        match self.storage.backend {
            StorageBackend::Memory => Ok(Storage::new(Arc::new(MemoryStore::new()))),
            StorageBackend::Sqlite => {
                let path = self.database_path(base_dir)?;
                let path_str = path
                    .to_str()
                    .with_context(|| format!("database path is not UTF-8: {}", path.display()))?;
                let store = SqliteStore::open(path_str)?;
                Ok(Storage::new(Arc::new(store)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.schedule.autosave_debounce_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "schedule.autosave_debounce_ms".into(),
            message: "must be greater than 0".into(),
        });
    }
    if config.schedule.autosave_debounce_ms > 60_000 {
        return Err(ConfigError::ValidationError {
            field: "schedule.autosave_debounce_ms".into(),
            message: format!(
                "must be at most 60000, got {}",
                config.schedule.autosave_debounce_ms
            ),
        });
    }

    let year = config.dynasty.default_start_year;
    if !(1869..=2200).contains(&year) {
        return Err(ConfigError::ValidationError {
            field: "dynasty.default_start_year".into(),
            message: format!("must be between 1869 and 2200, got {year}"),
        });
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

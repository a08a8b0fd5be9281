//! Storage backend configuration.
//!
//! # Responsibility
//! - Describe which persistence backend a store should use.
//! - Build the configured backend behind the `PageStorage` port.
//!
//! # Invariants
//! - `local` is the default backend.
//! - An `api` selection without a URL falls back to `local`.

use crate::storage::remote::DEFAULT_REMOTE_TIMEOUT;
use crate::storage::{
    PageStorage, RemoteApiStorage, SqliteKvStorage, StorageResult, DEFAULT_STORAGE_KEY,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_STORAGE: &str = "NOTEPAD_STORAGE";
pub const ENV_DB_PATH: &str = "NOTEPAD_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "NOTEPAD_STORAGE_KEY";
pub const ENV_API_URL: &str = "NOTEPAD_API_URL";
pub const ENV_API_KEY: &str = "NOTEPAD_API_KEY";
pub const ENV_API_TIMEOUT_MS: &str = "NOTEPAD_API_TIMEOUT_MS";

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { name: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, value } => {
                write!(f, "invalid value `{value}` for {name}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Persistence backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// SQLite key/value store; `db_path = None` keeps data in memory.
    Local {
        #[serde(default)]
        db_path: Option<PathBuf>,
        #[serde(default)]
        key: Option<String>,
    },
    /// REST API backend.
    Api {
        api_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            db_path: None,
            key: None,
        }
    }
}

impl StorageConfig {
    /// Reads the configuration from `NOTEPAD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let kind = get(ENV_STORAGE).map(|value| value.to_ascii_lowercase());
        match kind.as_deref() {
            None | Some("local") => {}
            Some("api") => {
                if let Some(api_url) = get(ENV_API_URL) {
                    let timeout_ms = match get(ENV_API_TIMEOUT_MS) {
                        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                            ConfigError::InvalidValue {
                                name: ENV_API_TIMEOUT_MS,
                                value: raw.clone(),
                            }
                        })?),
                        None => None,
                    };
                    return Ok(Self::Api {
                        api_url,
                        api_key: get(ENV_API_KEY),
                        timeout_ms,
                    });
                }
                warn!("event=config_load module=config status=fallback reason=missing_api_url backend=local");
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: ENV_STORAGE,
                    value: other.to_string(),
                })
            }
        }

        Ok(Self::Local {
            db_path: get(ENV_DB_PATH).map(PathBuf::from),
            key: get(ENV_STORAGE_KEY),
        })
    }
}

/// Builds the backend described by `config`.
pub fn open_storage(config: &StorageConfig) -> StorageResult<Box<dyn PageStorage>> {
    match config {
        StorageConfig::Local { db_path, key } => {
            let storage = match db_path {
                Some(path) => SqliteKvStorage::open(path)?,
                None => SqliteKvStorage::open_in_memory()?,
            };
            let storage =
                storage.with_key(key.clone().unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()));
            info!(
                "event=storage_open module=config status=ok backend=sqlite_kv persistent={}",
                db_path.is_some()
            );
            Ok(Box::new(storage))
        }
        StorageConfig::Api {
            api_url,
            api_key,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REMOTE_TIMEOUT);
            let storage = RemoteApiStorage::with_timeout(api_url, api_key.clone(), timeout)?;
            info!(
                "event=storage_open module=config status=ok backend=remote authenticated={}",
                api_key.is_some()
            );
            Ok(Box::new(storage))
        }
    }
}

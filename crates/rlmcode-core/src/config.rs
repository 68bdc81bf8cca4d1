//! Persistent configuration for rlm-code.
//!
//! Looks for `<root>/.rlm-code.toml`, then `~/.rlm-code/config.toml`, and
//! falls back to defaults.

use crate::{Language, RlmError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".rlm-code.toml";

/// Default store file name, placed at the project root.
pub const DEFAULT_DB_FILE: &str = ".rlm-code.db";

/// Directory names skipped during discovery unless overridden.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    "target",
    "build",
    "dist",
    ".mypy_cache",
    ".pytest_cache",
];

/// Top-level rlm-code configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RlmConfig {
    pub index: IndexConfig,
    pub storage: StorageConfig,
    pub git: GitConfig,
}

impl RlmConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, RlmError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RlmError::Config(e.to_string()))
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<(), RlmError> {
        let content = toml::to_string_pretty(self).map_err(|e| RlmError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the first config found for `root`, or defaults.
    ///
    /// A config file that exists but fails to parse is an error; a missing
    /// one is not.
    pub fn load_for_project(root: &Path) -> Result<Self, RlmError> {
        let candidates = [
            Some(root.join(PROJECT_CONFIG_FILE)),
            Self::user_config_path(),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// User-wide config path: `~/.rlm-code/config.toml`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".rlm-code").join("config.toml"))
    }

    /// Store location for `root`. Relative `db_path` values resolve against the root.
    pub fn db_path(&self, root: &Path) -> PathBuf {
        match &self.storage.db_path {
            Some(p) => {
                let p = PathBuf::from(p);
                if p.is_absolute() {
                    p
                } else {
                    root.join(p)
                }
            }
            None => root.join(DEFAULT_DB_FILE),
        }
    }
}

/// Discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Language allowlist.
    pub languages: Vec<Language>,
    /// Directory names excluded at any depth.
    pub exclude_dirs: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            languages: Language::ALL.to_vec(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file. `None` means `<root>/.rlm-code.db`.
    pub db_path: Option<String>,
    /// SQLite busy timeout in seconds.
    pub busy_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_secs: 5,
        }
    }
}

/// Bounds for git subprocess calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub head_timeout_secs: u64,
    pub diff_timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            head_timeout_secs: 10,
            diff_timeout_secs: 30,
        }
    }
}

//! User-wide configuration for restore-tree.
//!
//! The configuration file is optional; a missing file means defaults.
//!
//! ```toml
//! tool = "dotnet"
//! tool_args = ["restore", "-f", "--no-cache"]
//! restore_timeout_secs = 600   # 0 disables the timeout
//! max_parallel = 4
//! escalate_failures = false
//! reload_after_restore = false
//! restorable_extensions = ["csproj", "vbproj"]
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_RESTORABLE_EXTENSIONS, DEFAULT_RESTORE_ARGS, DEFAULT_RESTORE_TIMEOUT,
    DEFAULT_RESTORE_TOOL, default_max_parallel,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

fn default_tool() -> String {
    DEFAULT_RESTORE_TOOL.to_string()
}

fn default_tool_args() -> Vec<String> {
    DEFAULT_RESTORE_ARGS.iter().map(ToString::to_string).collect()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_RESTORE_TIMEOUT.as_secs()
}

fn default_restorable_extensions() -> Vec<String> {
    DEFAULT_RESTORABLE_EXTENSIONS.iter().map(ToString::to_string).collect()
}

/// Settings read from `~/.restore-tree/config.toml`.
///
/// Every field has a default, so a partial file only overrides what it names.
/// Command-line flags override the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreConfig {
    /// Restore tool executable
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Arguments passed before the project path
    #[serde(default = "default_tool_args")]
    pub tool_args: Vec<String>,

    /// Timeout for one restore process in seconds; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub restore_timeout_secs: u64,

    /// Concurrent restores per dependency level
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Skip dependents of a failed project
    pub escalate_failures: bool,

    /// Reload each project right after its restore
    pub reload_after_restore: bool,

    /// Extensions the single-project restore accepts
    #[serde(default = "default_restorable_extensions")]
    pub restorable_extensions: Vec<String>,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            tool_args: default_tool_args(),
            restore_timeout_secs: default_timeout_secs(),
            max_parallel: default_max_parallel(),
            escalate_failures: false,
            reload_after_restore: false,
            restorable_extensions: default_restorable_extensions(),
        }
    }
}

impl RestoreConfig {
    /// Load from `path` if given, otherwise from the default location.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file is
    /// an error.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Location of the configuration file.
    ///
    /// `RESTORE_TREE_CONFIG` wins when set; otherwise
    /// `%LOCALAPPDATA%\restore-tree\config.toml` on Windows and
    /// `~/.restore-tree/config.toml` elsewhere.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("restore-tree")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".restore-tree")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// The restore timeout, or `None` when disabled.
    #[must_use]
    pub const fn restore_timeout(&self) -> Option<Duration> {
        if self.restore_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.restore_timeout_secs))
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tool.trim().is_empty() {
            return Err(crate::core::ReloadError::ConfigError {
                message: "'tool' must not be empty".to_string(),
            }
            .into());
        }
        if self.max_parallel == 0 {
            return Err(crate::core::ReloadError::ConfigError {
                message: "'max_parallel' must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

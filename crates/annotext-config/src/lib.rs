use annotext_engine::{HistoryConfig, MatchWeights};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    ConfigReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid TOML: {source}")]
    ConfigParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{path} has an unusable setting: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// How often the editor is sampled for automatic snapshots
    pub snapshot_interval_ms: u64,
    /// Optional cap on snapshots kept per file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_snapshots: Option<usize>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            snapshot_interval_ms: 5000,
            max_snapshots: None,
        }
    }
}

impl HistorySettings {
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_millis(self.snapshot_interval_ms)
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            max_snapshots: self.max_snapshots,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace opened when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_path: Option<PathBuf>,
    pub history: HistorySettings,
    pub anchoring: MatchWeights,
}

impl Config {
    /// Read the config at `path`; a missing file is `Ok(None)`
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text).map(Some),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::ConfigReadError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|source| {
            ConfigError::ConfigParseError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config
            .validate()
            .map_err(|reason| ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason,
            })?;

        if let Some(workspace) = config.workspace_path.take() {
            config.workspace_path = Some(expand_path(&workspace).unwrap_or(workspace));
        }
        Ok(config)
    }

    /// Write the config as TOML, creating missing directories
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    /// `~/.config/annotext/config.toml` with the home directory filled in
    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/annotext/config.toml").into_owned())
    }

    /// Check values the engine cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.history.snapshot_interval_ms == 0 {
            return Err("history.snapshot_interval_ms must be greater than zero".to_string());
        }
        if self.history.max_snapshots == Some(0) {
            return Err("history.max_snapshots must be greater than zero when set".to_string());
        }
        if !self.anchoring.is_ordered() {
            return Err(
                "anchoring weights must rank suffix above prefix and exact above partial matches"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Expand `~` and `$VARS`; `None` when a variable is undefined
fn expand_path(path: &Path) -> Option<PathBuf> {
    shellexpand::full(&path.to_string_lossy())
        .ok()
        .map(|expanded| PathBuf::from(expanded.into_owned()))
}

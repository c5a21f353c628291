//! Toolkit Configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::RetryPolicy;

// ============================================================================
// PANEL CONFIGURATION (panelkit.toml)
// ============================================================================

/// Configuration loaded from panelkit.toml
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Engine startup settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Default layout settings for new panels
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Logging settings
    #[serde(default)]
    pub log: LogSettings,
}

/// Presentation engine settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Name given to the engine thread
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// Upper bound on readiness checks during startup
    #[serde(default = "default_max_startup_attempts")]
    pub max_startup_attempts: u32,

    /// Backoff step; attempt n sleeps n * step
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            max_startup_attempts: default_max_startup_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
        }
    }
}

impl EngineSettings {
    /// Retry policy described by these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_startup_attempts,
            Duration::from_millis(self.backoff_step_ms),
        )
    }
}

fn default_thread_name() -> String {
    "panelkit-engine".to_string()
}

fn default_max_startup_attempts() -> u32 {
    10
}

fn default_backoff_step_ms() -> u64 {
    50
}

/// Layout defaults
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Columns used by sectioned field layouts
    #[serde(default = "default_columns")]
    pub default_columns: usize,

    /// Whether a sectioned layout puts the remainder sections in a wider first row
    #[serde(default = "default_true")]
    pub col_spanning: bool,

    /// Columns used by a plain grid when none are given
    #[serde(default = "default_grid_columns")]
    pub grid_columns: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
            col_spanning: true,
            grid_columns: default_grid_columns(),
        }
    }
}

fn default_columns() -> usize {
    2
}

fn default_grid_columns() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// Logging settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// Filter directive, e.g. "info" or "panelkit=debug"
    #[serde(default = "default_level")]
    pub level: String,

    /// Log file; defaults to panelkit.log next to the executable
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl PanelConfig {
    /// Find panelkit.toml in standard locations
    pub fn find_config_path() -> Option<PathBuf> {
        // Check in order: config dir, exe dir, cwd
        let candidates = [
            dirs::config_dir().map(|p| p.join("panelkit").join("panelkit.toml")),
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("panelkit.toml"))),
            Some(PathBuf::from("panelkit.toml")),
        ];

        candidates.into_iter().flatten().find(|c| c.exists())
    }

    /// Load configuration from file, returning defaults if not found or invalid
    pub fn load() -> Self {
        match Self::find_config_path() {
            Some(path) => match Self::load_from_path(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.engine.max_startup_attempts, 10);
        assert_eq!(config.engine.backoff_step_ms, 50);
        assert_eq!(config.layout.default_columns, 2);
        assert!(config.layout.col_spanning);
        assert_eq!(config.layout.grid_columns, 3);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PanelConfig::parse(
            r#"
            [engine]
            max_startup_attempts = 3

            [layout]
            col_spanning = false
        "#,
        )
        .unwrap();

        assert_eq!(config.engine.max_startup_attempts, 3);
        assert_eq!(config.engine.backoff_step_ms, 50);
        assert_eq!(config.engine.thread_name, "panelkit-engine");
        assert!(!config.layout.col_spanning);
        assert_eq!(config.layout.default_columns, 2);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"\nfile = \"out.log\"").unwrap();

        let config = PanelConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn test_parse_error() {
        let result = PanelConfig::parse("[engine]\nmax_startup_attempts = \"many\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = PanelConfig::load_from_path(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = EngineSettings {
            max_startup_attempts: 4,
            backoff_step_ms: 20,
            ..EngineSettings::default()
        };
        let policy = settings.retry_policy();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.backoff(3), Duration::from_millis(60));
    }
}

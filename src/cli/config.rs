//! Configuration management for bindgate
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.bindgate/config.toml

use crate::budget::ComplexityClass;
use crate::errors::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for bindgate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub qa: QaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gate pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Budget ceiling applied to every binding
    pub ceiling: ComplexityClass,
    /// Per-deployment deadline in milliseconds (0 disables)
    pub deploy_timeout_ms: u64,
    /// Latency above which a passing deployment is rejected (0 disables)
    pub max_latency_ms: u64,
    /// Timeout for shell-command targets
    pub command_timeout_secs: u64,
    /// Longest dependency chain the graph accepts (unset means unbounded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Reject bindings above a problem's declared `aux_cost`
    pub check_declared_cost: bool,
}

/// QA ledger configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Where `run` writes the ledger when no `--ledger` is given
    pub ledger_path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub level: String,
    pub color_output: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ceiling: ComplexityClass::Logarithmic,
            deploy_timeout_ms: 0,
            max_latency_ms: 0,
            command_timeout_secs: 60,
            max_depth: None,
            check_declared_cost: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GateError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| GateError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Config::default()),
        }
    }

    /// Standard config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".bindgate").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.command_timeout_secs == 0 {
            return Err(GateError::ConfigError(
                "command_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.deploy_timeout_ms > 0
            && self.pipeline.max_latency_ms > self.pipeline.deploy_timeout_ms
        {
            return Err(GateError::ConfigError(
                "max_latency_ms cannot exceed deploy_timeout_ms".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(GateError::ConfigError("logging level cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GateError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GateError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| GateError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Render as TOML for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GateError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Configured ledger path, expanded
    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.qa.ledger_path.as_deref().map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.ceiling, ComplexityClass::Logarithmic);
        assert_eq!(config.pipeline.command_timeout_secs, 60);
        assert!(config.qa.ledger_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_command_timeout() {
        let mut config = Config::default();
        config.pipeline.command_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_latency_over_deadline() {
        let mut config = Config::default();
        config.pipeline.deploy_timeout_ms = 100;
        config.pipeline.max_latency_ms = 500;
        assert!(config.validate().is_err());

        config.pipeline.deploy_timeout_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nceiling = \"linear\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pipeline.ceiling, ComplexityClass::Linear);
        assert_eq!(config.pipeline.command_timeout_secs, 60);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_graph_limits_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nmax_depth = 8\ncheck_declared_cost = true\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pipeline.max_depth, Some(8));
        assert!(config.pipeline.check_declared_cost);
        assert_eq!(Config::default().pipeline.max_depth, None);
    }

    #[test]
    fn test_bad_ceiling_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\nceiling = \"cubic\"\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GateError::ConfigError(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pipeline.ceiling = ComplexityClass::Polynomial;
        config.qa.ledger_path = Some("~/ledger.json".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.pipeline.ceiling, ComplexityClass::Polynomial);
        assert_eq!(loaded.qa.ledger_path.as_deref(), Some("~/ledger.json"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.bindgate");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = "/absolute/path";
        assert_eq!(Config::expand_path(path).to_string_lossy(), path);
    }
}

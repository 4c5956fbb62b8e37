//! Configuration loader for rwmem
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use super::validator::validate_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "rwmem.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How a session to the target is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_elevate_privilege")]
    pub elevate_privilege: bool,
    #[serde(default = "default_fallback_access")]
    pub fallback_access: bool,
}

/// Limits applied by the typed marshaller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_max_read_size")]
    pub max_read_size: usize,
    #[serde(default = "default_max_string_len", skip_serializing_if = "Option::is_none")]
    pub max_string_len: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_file", skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads and validates configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Loads configuration, or defaults if the file doesn't exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            elevate_privilege: default_elevate_privilege(),
            fallback_access: default_fallback_access(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            max_read_size: default_max_read_size(),
            max_string_len: default_max_string_len(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

// Individual field defaults
fn default_elevate_privilege() -> bool {
    default_config().session.elevate_privilege
}

fn default_fallback_access() -> bool {
    default_config().session.fallback_access
}

fn default_max_read_size() -> usize {
    default_config().memory.max_read_size
}

fn default_max_string_len() -> Option<usize> {
    default_config().memory.max_string_len
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_log_file() -> Option<String> {
    default_config().logging.file
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.session.elevate_privilege);
        assert_eq!(config.memory.max_read_size, 10485760);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_reports_bad_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[memory\nmax_read_size = ").unwrap();

        let result = ConfigLoader::new(&config_path).load_or_default();
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        fs::write(&config_path, "[memory]\nmax_read_size = 0\n").unwrap();

        let loader = ConfigLoader::new(&config_path);
        assert!(matches!(loader.load(), Err(ConfigError::Invalid(_))));
        assert!(matches!(loader.load_or_default(), Err(ConfigError::Invalid(_))));

        fs::write(&config_path, "[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(matches!(loader.load(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.memory.max_string_len = Some(256);
        config.logging.file = Some("rwmem.log".to_string());
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [session]
            fallback_access = false

            [memory]
            max_string_len = 64
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.session.fallback_access);
        assert_eq!(config.memory.max_string_len, Some(64));
        // Check defaults are applied
        assert!(config.session.elevate_privilege);
        assert_eq!(config.memory.max_read_size, 10485760);
        assert_eq!(config.logging.level, "info");
    }
}

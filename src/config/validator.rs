//! Configuration validator for rwmem
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, MemoryConfig};

/// Largest single byte-array read the validator accepts (1GB)
pub const MAX_READ_SIZE_LIMIT: usize = 1 << 30;

/// Log levels accepted by `[logging] level`
pub const VALID_LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_memory(&config.memory)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates memory configuration
    fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
        if memory.max_read_size == 0 {
            return Err(ConfigError::Invalid(
                "Maximum read size must be greater than 0".to_string(),
            ));
        }

        if memory.max_read_size > MAX_READ_SIZE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "Maximum read size cannot exceed {} bytes",
                MAX_READ_SIZE_LIMIT
            )));
        }

        if memory.max_string_len == Some(0) {
            return Err(ConfigError::Invalid(
                "Maximum string length must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, VALID_LOG_LEVELS
            )));
        }

        if matches!(&logging.file, Some(file) if file.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "Log file path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

//! Configuration module for rwmem
//!
//! Provides configuration loading, validation, default settings and
//! logging setup.

mod defaults;
mod loader;
mod logging;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use logging::{build_filter, file_writer, init_logging};
pub use validator::{validate_config, ConfigValidator, MAX_READ_SIZE_LIMIT};

// Re-export the configuration structures
pub use loader::{Config, LoggingConfig, MemoryConfig, SessionConfig};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

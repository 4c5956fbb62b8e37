//! Default configuration values for rwmem

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub session: SessionDefaults,
    pub memory: MemoryDefaults,
    pub logging: LoggingDefaults,
}

/// Default session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub elevate_privilege: bool,
    pub fallback_access: bool,
}

/// Default memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDefaults {
    pub max_read_size: usize,
    pub max_string_len: Option<usize>,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub file: Option<String>,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        session: SessionDefaults {
            elevate_privilege: true,
            fallback_access: true,
        },
        memory: MemoryDefaults {
            max_read_size: 10485760, // 10MB
            max_string_len: None,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            file: None,
        },
    }
}

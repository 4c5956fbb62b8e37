//! Tracing subscriber setup driven by `[logging]`

use super::loader::{ConfigError, LoggingConfig};
use std::path::Path;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// Writer threads stop when their guards drop
static LOG_GUARDS: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

/// Filter for the configured level. `RUST_LOG` directives take priority.
pub fn build_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    let default: LevelFilter = level
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid log level: {}", level)))?;

    Ok(EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy())
}

/// Non-blocking appender for `path`, created (with its directory) if missing.
/// Records are flushed when the guard drops.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), ConfigError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ConfigError::Invalid(format!("Invalid log file: {}", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber: stderr always, plus the log file if set.
///
/// Fails with [`ConfigError::Logging`] if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_filter(&config.level)?;
    let mut guards = Vec::new();

    let file_layer = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(Path::new(path))?;
            guards.push(guard);
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    let (stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(guard);
    let console_layer = fmt::layer().with_writer(stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    let _ = LOG_GUARDS.set(guards);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_build_filter() {
        assert!(build_filter("debug").is_ok());
        assert!(build_filter("off").is_ok());
        assert!(matches!(
            build_filter("loud"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);

        assert!(matches!(
            init_logging(&config),
            Err(ConfigError::Logging(_))
        ));
    }

    #[test]
    fn test_file_writer_appends_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("rwmem.log");

        let (writer, guard) = file_writer(&path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(pid = 42, "attached");
        });
        drop(guard);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("attached"));
        assert!(written.contains("pid=42"));
    }

    #[test]
    fn test_file_writer_needs_a_file_name() {
        assert!(matches!(
            file_writer(Path::new("/")),
            Err(ConfigError::Invalid(_))
        ));
    }
}

//! Logging and tracing initialization.

use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::config::LoggingConfig;
use crate::error::HandpadResult;

/// Initialize the tracing subscriber with the given configuration.
///
/// When `config.file` is set, log lines are appended to that file instead
/// of stderr; if it cannot be opened, logs go to stderr with a warning.
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file, open_error) = match config.file.as_deref().map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    match (config.json, file) {
        (true, Some(file)) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::sync::Mutex::new(file))
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (true, None) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (false, Some(file)) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        (false, None) => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }

    if let (Some(path), Some(error)) = (config.file.as_ref(), open_error) {
        tracing::warn!(
            path = %path.display(),
            %error,
            "Failed to open log file, logging to stderr"
        );
    }
}

/// Open `path` for appending log lines.
pub fn open_log_file(path: &Path) -> HandpadResult<File> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(file)
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandpadError;

    #[test]
    fn test_open_log_file_reports_io_error() {
        let err = open_log_file(Path::new("/nonexistent/handpad/logs/handpad.log")).unwrap_err();
        assert!(matches!(err, HandpadError::Io(_)));
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = std::env::temp_dir().join("handpad_test_log_file");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("handpad.log");
        let _ = std::fs::remove_file(&path);

        {
            use std::io::Write;
            writeln!(open_log_file(&path).unwrap(), "first").unwrap();
            writeln!(open_log_file(&path).unwrap(), "second").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        std::fs::remove_dir_all(&dir).ok();
    }
}

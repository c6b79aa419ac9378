//! Error types shared across Handpad crates.
//!
//! The per-frame gesture core never fails; these errors only surface at
//! the edges (configuration, frame sources, replay files).

use std::path::PathBuf;

/// Top-level error type for Handpad operations.
#[derive(Debug, thiserror::Error)]
pub enum HandpadError {
    #[error("Surface error: {message}")]
    Surface { message: String },

    #[error("Replay error: {message}")]
    Replay { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HandpadError.
pub type HandpadResult<T> = Result<T, HandpadError>;

impl HandpadError {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface {
            message: msg.into(),
        }
    }

    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

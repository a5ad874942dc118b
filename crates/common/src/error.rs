//! Error types shared across PoseWatch crates.

use std::path::PathBuf;

/// Top-level error type for PoseWatch operations.
#[derive(Debug, thiserror::Error)]
pub enum PoseWatchError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Inference unavailable: {message}")]
    InferenceUnavailable { message: String },

    #[error("Pose source error: {message}")]
    Source { message: String },

    #[error("Pose stream error: {message}")]
    Stream { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PoseWatchError.
pub type PoseWatchResult<T> = Result<T, PoseWatchError>;

impl PoseWatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn inference_unavailable(msg: impl Into<String>) -> Self {
        Self::InferenceUnavailable {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream {
            message: msg.into(),
        }
    }

    /// Whether the error is recoverable by skipping the current frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::InferenceUnavailable { .. } | Self::Source { .. })
    }
}

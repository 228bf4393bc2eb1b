//! Error types for sink write operations.

use std::path::Path;

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Sink or storage configuration invalid
    E001InvalidConfig,
    /// E002: Append to a sink file failed
    E002WriteFailure,
    /// E003: Record could not be rendered for a sink
    E003EncodingFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfig => "E001",
            Self::E002WriteFailure => "E002",
            Self::E003EncodingFailure => "E003",
        }
    }
}

/// Errors that can occur while writing batches to sinks
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("[{code}] Invalid configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    #[error("[{code}] Write to '{path}' failed: {source}")]
    WriteFailure {
        code: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{code}] Failed to encode rows for sink '{sink}': {message}")]
    EncodingFailure {
        code: &'static str,
        sink: String,
        message: String,
    },
}

impl WriterError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E001InvalidConfig.as_str(),
            message: message.into(),
        }
    }

    pub fn write_failure(path: &Path, source: std::io::Error) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E002WriteFailure.as_str(),
            path: path.display().to_string(),
            source,
        }
    }

    pub fn encoding_failure(sink: &str, message: impl std::fmt::Display) -> Self {
        Self::EncodingFailure {
            code: ErrorCode::E003EncodingFailure.as_str(),
            sink: sink.to_string(),
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { code, .. }
            | Self::WriteFailure { code, .. }
            | Self::EncodingFailure { code, .. } => code,
        }
    }
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;

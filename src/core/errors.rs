//! TL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TimelaneError>;

/// Top-level error type for the timeline engine.
#[derive(Debug, Error)]
pub enum TimelaneError {
    #[error("[TL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[TL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TL-2001] date arithmetic out of range: {details}")]
    DateOutOfRange { details: String },

    #[error("[TL-2002] window materialization failure: {details}")]
    Materialize { details: String },

    #[error("[TL-2003] invalid zoom factor {value}: {details}")]
    InvalidZoom { value: f64, details: String },

    #[error("[TL-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[TL-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TL-3003] persistence store failure: {details}")]
    Store { details: String },
}

impl TimelaneError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "TL-1001",
            Self::MissingConfig { .. } => "TL-1002",
            Self::ConfigParse { .. } => "TL-1003",
            Self::DateOutOfRange { .. } => "TL-2001",
            Self::Materialize { .. } => "TL-2002",
            Self::InvalidZoom { .. } => "TL-2003",
            Self::Serialization { .. } => "TL-3001",
            Self::Io { .. } => "TL-3002",
            Self::Store { .. } => "TL-3003",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Store { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for TimelaneError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TimelaneError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

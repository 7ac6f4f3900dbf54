//! Error types for dbwheel core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while resolving configuration and rendering templates
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required value was neither passed explicitly nor found in the configuration
    #[error("Could not resolve a non-null value from '{key}' or the matching CLI flag")]
    ConfigurationMissing { key: String },

    /// Configuration file extension is not JSON or YAML
    #[error("File type of {} not supported (expected .json, .yml or .yaml)", path.display())]
    UnsupportedFileType { path: PathBuf },

    /// Template references an undefined variable or has malformed syntax
    #[error("Failed to render template {}: {message}", path.display())]
    TemplateRender { path: PathBuf, message: String },

    /// Override was not written as `key=value`
    #[error("Invalid key=value pair: '{0}'")]
    InvalidKeyValue(String),

    /// Value cannot be used as a template context
    #[error("Invalid template context: {0}")]
    InvalidContext(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Check if this error is a missing configuration value
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }
}

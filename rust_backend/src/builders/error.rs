//! Error types for output builders and their configuration.

use crate::algorithms::LayoutError;
use crate::core::ParsingError;

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Error raised while rendering a schedule.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Error raised for unusable builder or application configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

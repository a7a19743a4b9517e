//! Error types for binding and capture

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sitebind operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding a template or capturing previews
#[derive(Error, Debug)]
pub enum Error {
    /// The template lacks a structural element the binder needs
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Failed to read or write one of the pipeline's files
    #[error("Failed to access {}: {source}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The binding records could not be decoded
    #[error("Invalid binding records: {0}")]
    Data(#[from] serde_json::Error),

    /// Failed to launch or initialize the renderer
    #[error("Renderer initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load the bound page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Failed to capture a screenshot
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an I/O failure together with the path it happened on
    pub fn source_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Source {
            path: path.into(),
            source,
        }
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

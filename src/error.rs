//! Error types for the chart rendering pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a chart image
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch the browser engine
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// Failed to load the document into the page
    #[error("Failed to load document: {0}")]
    Load(String),

    /// Failed to measure or capture the rendered page
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The document source collaborator failed to produce markup
    #[error("Document generation failed: {0}")]
    Generation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Render(err.to_string())
    }
}

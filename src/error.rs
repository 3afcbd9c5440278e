//! Error types for mixdown

use thiserror::Error;

/// Result type alias for mixdown operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mixdown
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Format error
    #[error("Format error: {0}")]
    Format(String),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a codec error
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        Error::Codec(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }
}

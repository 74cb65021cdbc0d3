//! Custom error types and result handling for Tankobon operations.
//!
//! This module defines the error handling system used throughout Tankobon.
//! All fallible operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! Cover resolution never surfaces these errors to the caller: every stage of the
//! cascade converts them into log warnings. Planning and execution propagate them.
use std::path::PathBuf;

/// Type alias for Results with Tankobon errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Tankobon operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image decoding or encoding errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// ZIP archive errors while reading volumes
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// HTTP transport or status errors from a remote provider
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// Malformed JSON returned by a remote provider
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    TankobonBuilder(#[from] crate::tankobon::TankobonConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// The series directory holds no eligible volume archives
    #[error("No volumes found in: {}", .0.display())]
    NoVolumes(PathBuf),
    /// A planned move could not be applied. Moves before it stay applied.
    #[error("Failed to move '{}' to '{}': {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A remote cover provider answered with something unusable
    #[error("Provider {provider} failed: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },
    /// No font could be loaded for label rendering
    #[error("Font error: {0}")]
    Font(String),
    /// Error for unsupported operations or formats (e.g., a `.cbr` first volume)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Shorthand for building a [`Error::Provider`].
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            message: message.into(),
        }
    }
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

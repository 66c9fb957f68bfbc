//! Error handling for the devcontainer tool.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// Errors that can occur while discovering or composing definitions.
///
/// Every variant is deterministic: a missing input, a clash with existing
/// files or a malformed document. None of them are retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// A named template or snippet is absent, or no search paths are configured.
    #[error("{0}.")]
    NotFoundError(String),

    /// The definition folder already exists where a new one was requested.
    #[error("Folder '{path}' already exists.")]
    ConflictError { path: String },

    /// A manifest, snippet manifest or snippet action could not be parsed.
    #[error("Malformed {source_name}: {message}.")]
    MalformedError { source_name: String, message: String },

    /// Unknown snippet action type or an operation the platform cannot do.
    #[error("Unsupported: {0}.")]
    UnsupportedError(String),

    /// Represents errors in loading or saving the tool configuration
    #[error("Configuration error: {0}.")]
    ConfigError(String),
}

impl Error {
    /// Builds a [`Error::MalformedError`] for the given document or file.
    pub fn malformed<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Error::MalformedError { source_name: source_name.into(), message: message.into() }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::IoError(err.into())
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}

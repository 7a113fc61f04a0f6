//! Error types for the mend library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using mend's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can stop a mend operation.
///
/// Defects in the analyzed text are never reported through this type; they
/// surface as [`Diagnostic`](crate::core::Diagnostic) values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The tree-sitter grammar could not be loaded into a parser.
    #[error("Grammar error: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML rendering error.
    #[error("TOML error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

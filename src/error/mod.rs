//! Error handling module for ts2mp4

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for ts2mp4 operations
#[derive(Error, Debug)]
pub enum Ts2Mp4Error {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// No convertible files in an input directory
    #[error("No .ts files found in {path}")]
    NoInputFiles { path: String },

    /// Configuration file or value error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Logging setup error
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },

    /// Required external tool missing
    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Conversion pipeline error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ts2mp4 operations
pub type Ts2Mp4Result<T> = std::result::Result<T, Ts2Mp4Error>;

// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// File not found
    FileNotFound(String),
    /// Probed stream list violates the stream model
    InvalidStreams(String),
    /// Stream sources violate the invariants of their pipeline stage
    InvalidStreamSources(String),
    /// A stream the pipeline depends on is absent from an encoded file
    MissingStream {
        file: String,
        source_stream_index: usize,
    },
    /// Decoded content of a copied stream differs from its source
    StreamIntegrity {
        output_stream_index: usize,
        source_file: String,
        source_stream_index: usize,
        expected: String,
        actual: String,
    },
    /// A stream digest could not be computed
    HashFail(String),
    /// Media probing failed
    ProbeFail(String),
    /// Transcoder failed to start or exited unsuccessfully
    ExecFail(String),
    /// File system operation failed
    FsFail(String),
    /// Requested behaviour is deliberately unsupported
    NotImplemented(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Whether this failure may be recovered by the repair pass
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            DomainError::StreamIntegrity { .. } | DomainError::HashFail(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            DomainError::InvalidStreams(msg) => write!(f, "Invalid streams: {}", msg),
            DomainError::InvalidStreamSources(msg) => {
                write!(f, "Invalid stream sources: {}", msg)
            }
            DomainError::MissingStream {
                file,
                source_stream_index,
            } => write!(
                f,
                "Encoded file {} is missing a required stream (source stream {})",
                file, source_stream_index
            ),
            DomainError::StreamIntegrity {
                output_stream_index,
                source_file,
                source_stream_index,
                expected,
                actual,
            } => write!(
                f,
                "Stream integrity check failed for output stream {}: source {} stream {} \
                 (source hash: {}, output hash: {})",
                output_stream_index, source_file, source_stream_index, expected, actual
            ),
            DomainError::HashFail(msg) => write!(f, "Hash computation failed: {}", msg),
            DomainError::ProbeFail(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::ExecFail(msg) => write!(f, "Execution failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

//! Error types for gale

use thiserror::Error;

/// Result type alias for gale operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for request construction and normalization
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid HTTP method token
    #[error("Invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// Invalid URI or URI component
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid header name or value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Unsupported protocol version
    #[error("Invalid protocol version: {0:?}")]
    InvalidProtocolVersion(String),

    /// Request target containing whitespace
    #[error("Invalid request target: {0:?}")]
    InvalidRequestTarget(String),

    /// Upload descriptor missing a required key or of the wrong shape
    #[error("Invalid uploaded file specification: {0}")]
    InvalidFileSpec(String),

    /// Uploaded file unusable (bad error code, failed upload)
    #[error("Invalid uploaded file: {0}")]
    InvalidUploadedFile(String),

    /// Uploaded file was already moved
    #[error("Uploaded file has already been moved")]
    AlreadyMoved,

    /// Body stream was closed
    #[error("Stream is closed: {0}")]
    StreamClosed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Rejected by a value type's validation (method, URI, header, upload
    /// error code, ...)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidMethod(_)
                | Error::InvalidUri(_)
                | Error::InvalidHeader(_)
                | Error::InvalidProtocolVersion(_)
                | Error::InvalidRequestTarget(_)
                | Error::InvalidUploadedFile(_)
        )
    }

    /// Upload descriptor tree could not be decomposed
    pub fn is_input_shape(&self) -> bool {
        matches!(self, Error::InvalidFileSpec(_))
    }
}

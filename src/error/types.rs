//! Error types
//!
//! Defines the closed set of failures an operation can report, plus the
//! API-level errors raised before an operation is reached.

use std::io;
use thiserror::Error;

/// Filesystem operation errors
#[derive(Debug, Error)]
pub enum FileError {
    /// Resolved path would leave the server root
    #[error("access denied: {0}")]
    PathEscape(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("payload too large (max {limit} bytes)")]
    PayloadTooLarge { limit: u64 },

    /// Any other I/O failure (permission denied, disk full, ...)
    #[error("I/O error on {path}: {source}")]
    Unknown {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Classify an I/O error raised while touching `path`.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            // a component of the path is a regular file, so the path does not exist
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => FileError::NotFound(path),
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists(path),
            _ => FileError::Unknown { path, source },
        }
    }

    /// Stable snake_case identifier used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::PathEscape(_) => "path_escape",
            FileError::NotFound(_) => "not_found",
            FileError::NotADirectory(_) => "not_a_directory",
            FileError::IsADirectory(_) => "is_a_directory",
            FileError::InvalidName(_) => "invalid_name",
            FileError::AlreadyExists(_) => "already_exists",
            FileError::PayloadTooLarge { .. } => "payload_too_large",
            FileError::Unknown { .. } => "unknown",
        }
    }

    /// Fixed human-readable message for this kind
    pub fn message(&self) -> &'static str {
        match self {
            FileError::PathEscape(_) => "Access denied",
            FileError::NotFound(_) => "File or directory not found",
            FileError::NotADirectory(_) => "Path is not a directory",
            FileError::IsADirectory(_) => "Cannot download a directory",
            FileError::InvalidName(_) => "Invalid name",
            FileError::AlreadyExists(_) => "Already exists",
            FileError::PayloadTooLarge { .. } => "File too large",
            FileError::Unknown { .. } => "Internal server error",
        }
    }
}

/// Errors surfaced by the HTTP layer
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    File(#[from] FileError),

    /// Malformed or incomplete request (missing field, unreadable body)
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::File(e) => e.kind(),
            ServerError::BadRequest(_) => "bad_request",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ServerError::File(e) => e.message().to_string(),
            ServerError::BadRequest(msg) => msg.clone(),
        }
    }

    /// Underlying cause for operator debugging, if any
    pub fn detail(&self) -> Option<String> {
        match self {
            ServerError::File(FileError::PayloadTooLarge { limit }) => {
                Some(format!("maximum upload size is {limit} bytes"))
            }
            ServerError::File(e) => Some(e.to_string()),
            ServerError::BadRequest(_) => None,
        }
    }
}

//! Error handlers
//!
//! Maps error kinds to HTTP status codes and logs failures.

use crate::error::types::{FileError, ServerError};
use axum::http::StatusCode;
use log::{error, warn};

/// Log a failed request at a level matching its severity
pub fn handle_error(err: &ServerError) {
    match err {
        ServerError::File(FileError::PathEscape(path)) => {
            warn!("Rejected path outside server root: {}", path);
        }
        ServerError::File(e @ FileError::Unknown { .. }) => {
            error!("File server error: {}", e);
        }
        _ => {}
    }
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &ServerError) -> StatusCode {
    match err {
        ServerError::File(e) => match e {
            FileError::PathEscape(_) => StatusCode::FORBIDDEN,
            FileError::NotFound(_) => StatusCode::NOT_FOUND,
            FileError::NotADirectory(_) => StatusCode::BAD_REQUEST,
            FileError::IsADirectory(_) => StatusCode::BAD_REQUEST,
            FileError::InvalidName(_) => StatusCode::BAD_REQUEST,
            FileError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            FileError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FileError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
}

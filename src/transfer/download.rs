//! File download responses
//!
//! Streams a validated file back to the client as an attachment.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, info};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::error::{FileError, ServerError};
use crate::storage::DownloadTarget;

/// Open `target` and build a streaming attachment response.
pub async fn file_response(target: DownloadTarget) -> Result<Response, ServerError> {
    let display = target.file_path.to_string_lossy().to_string();
    let file = File::open(&target.file_path).await.map_err(|e| {
        error!("Failed to open file {}: {}", display, e);
        FileError::io(target.name.as_str(), e)
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&target.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(target.size));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&target.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    info!("Starting file download: {} ({} bytes)", display, target.size);

    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// `attachment` disposition with an ASCII fallback name and, for names that
/// need it, an RFC 5987 `filename*` parameter.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == name {
        format!("attachment; filename=\"{name}\"")
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            utf8_percent_encode(name, NON_ALPHANUMERIC)
        )
    }
}

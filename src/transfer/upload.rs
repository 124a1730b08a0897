//! Streaming upload receiver
//!
//! Writes a multipart file field to a staging file chunk by chunk, checking
//! the size cap before every write so an oversized body is never buffered.

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{File, remove_file};
use tokio::io::AsyncWriteExt;

use crate::error::{FileError, ServerError};
use crate::storage::{STAGING_PREFIX, STAGING_SUFFIX};

static UPLOAD_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique hidden staging path inside `dir` for one upload
pub fn staging_path(dir: &Path) -> PathBuf {
    let seq = UPLOAD_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(
        "{}{}-{}{}",
        STAGING_PREFIX,
        process::id(),
        seq,
        STAGING_SUFFIX
    ))
}

/// Streams `field` into `temp_path`, returning the number of bytes written.
///
/// On error the partially written staging file is removed.
pub async fn receive_file(
    field: Field<'_>,
    temp_path: &Path,
    limit: u64,
) -> Result<u64, ServerError> {
    let result = write_chunks(field, temp_path, limit).await;
    if result.is_err() {
        discard(temp_path).await;
    }
    result
}

async fn write_chunks(
    mut field: Field<'_>,
    temp_path: &Path,
    limit: u64,
) -> Result<u64, ServerError> {
    let display = temp_path.to_string_lossy().to_string();
    let mut temp_file = File::create(temp_path).await.map_err(|e| {
        error!("Failed to create staging file {}: {}", display, e);
        FileError::io(display.as_str(), e)
    })?;

    let mut total_bytes_received = 0u64;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        // Check size limit BEFORE writing
        total_bytes_received += chunk.len() as u64;
        if total_bytes_received > limit {
            warn!(
                "Upload size limit exceeded: {} bytes > {} bytes",
                total_bytes_received, limit
            );
            return Err(FileError::PayloadTooLarge { limit }.into());
        }

        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| FileError::io(display.as_str(), e))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| FileError::io(display.as_str(), e))?;

    info!("Received {} bytes into {}", total_bytes_received, display);
    Ok(total_bytes_received)
}

/// Remove a staging file, ignoring a file that was never created
pub async fn discard(temp_path: &Path) {
    if let Err(e) = remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove staging file {}: {}", temp_path.display(), e);
        }
    }
}

/// Map a multipart parsing failure; a body over the router limit is a
/// payload-size failure, everything else is a malformed request.
pub fn multipart_error(err: MultipartError, limit: u64) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FileError::PayloadTooLarge { limit }.into()
    } else {
        ServerError::BadRequest(err.body_text())
    }
}

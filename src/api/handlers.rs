//! Request handlers for the file server API.
//!
//! Each handler validates its inputs, hands blocking filesystem work to
//! `spawn_blocking`, and turns the outcome into a JSON (or file) response.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::response::Response;
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::Path as FsPath;

use crate::api::AppState;
use crate::api::responses::{IndexResponse, MessageResponse, MkdirResponse, UploadResponse};
use crate::error::{FileError, ServerError};
use crate::storage::{self, EntryInfo, ListResult, sanitize_filename};
use crate::transfer;

/// JSON body of `POST /mkdir`
#[derive(Debug, Deserialize)]
pub struct MkdirRequest {
    pub name: Option<String>,
    pub path: Option<String>,
}

/// Run a blocking storage operation off the async executor.
async fn blocking<T, F>(operation: F) -> Result<T, ServerError>
where
    F: FnOnce() -> Result<T, FileError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| FileError::Unknown {
            path: String::new(),
            source: io::Error::other(e),
        })?
        .map_err(ServerError::from)
}

/// Unwrap a captured `{*path}`, turning an undecodable segment into a JSON 400.
fn captured_path(path: Result<Path<String>, PathRejection>) -> Result<String, ServerError> {
    path.map(|Path(path)| path)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

/// `GET /` - endpoint map
pub async fn index() -> Json<IndexResponse> {
    let endpoints = BTreeMap::from([
        ("GET /files", "List files and folders in the root"),
        ("GET /files/<path>", "List the contents of a folder"),
        ("GET /download/<path>", "Download a file"),
        ("POST /upload", "Upload a file (multipart: file, optional path)"),
        ("POST /mkdir", "Create a folder (JSON: name, optional path)"),
        ("DELETE /delete/<path>", "Delete a file or folder"),
    ]);

    Json(IndexResponse {
        message: "File Server API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}

/// `GET /files`
pub async fn list_root(State(state): State<AppState>) -> Result<Json<ListResult>, ServerError> {
    list(state, String::new()).await
}

/// `GET /files/{*path}`
pub async fn list_files(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ListResult>, ServerError> {
    list(state, captured_path(path)?).await
}

async fn list(state: AppState, path: String) -> Result<Json<ListResult>, ServerError> {
    let sandbox = state.sandbox.clone();
    let listing = blocking(move || storage::list_directory(&sandbox, &path)).await?;
    Ok(Json(listing))
}

/// `GET /download/{*path}`
pub async fn download_file(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ServerError> {
    let path = captured_path(path)?;
    let sandbox = state.sandbox.clone();
    let target = blocking(move || storage::prepare_download(&sandbox, &path)).await?;
    transfer::file_response(target).await
}

/// `POST /upload` - multipart form with a `file` part and an optional `path`
/// field naming the target directory.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut multipart = multipart.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let temp_path = transfer::staging_path(state.sandbox.root());

    let result = receive_upload(&state, &mut multipart, &temp_path).await;
    if result.is_err() {
        transfer::discard(&temp_path).await;
    }

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        file_info: result?,
    }))
}

async fn receive_upload(
    state: &AppState,
    multipart: &mut Multipart,
    temp_path: &FsPath,
) -> Result<EntryInfo, ServerError> {
    let limit = state.max_upload_bytes;
    let mut target_dir = String::new();
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| transfer::multipart_error(e, limit))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("path") => {
                target_dir = field
                    .text()
                    .await
                    .map_err(|e| transfer::multipart_error(e, limit))?;
            }
            Some("file") if filename.is_none() => {
                let raw_name = field.file_name().unwrap_or_default().to_string();
                if raw_name.is_empty() {
                    return Err(ServerError::BadRequest("No file selected".into()));
                }
                let name = sanitize_filename(&raw_name)?;
                transfer::receive_file(field, temp_path, limit).await?;
                filename = Some(name);
            }
            _ => {}
        }
    }

    let name = filename.ok_or_else(|| ServerError::BadRequest("No file selected".into()))?;
    info!("Upload received: {} -> {:?}", name, target_dir);

    let sandbox = state.sandbox.clone();
    let staged = temp_path.to_path_buf();
    blocking(move || storage::store_upload(&sandbox, &target_dir, &name, &staged)).await
}

/// `POST /mkdir`
pub async fn create_directory(
    State(state): State<AppState>,
    payload: Result<Json<MkdirRequest>, JsonRejection>,
) -> Result<Json<MkdirResponse>, ServerError> {
    let Json(request) =
        payload.map_err(|_| ServerError::BadRequest("Directory name required".into()))?;
    let name = request
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServerError::BadRequest("Directory name required".into()))?;
    let parent = request.path.unwrap_or_default();

    let sandbox = state.sandbox.clone();
    let info = blocking(move || storage::make_directory(&sandbox, &parent, &name)).await?;

    Ok(Json(MkdirResponse {
        message: "Directory created successfully",
        directory_info: info,
    }))
}

/// `DELETE /delete/{*path}`
pub async fn delete_item(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ServerError> {
    let path = captured_path(path)?;
    let sandbox = state.sandbox.clone();
    blocking(move || storage::delete_entry(&sandbox, &path)).await?;

    Ok(Json(MessageResponse {
        message: "Deleted successfully",
    }))
}

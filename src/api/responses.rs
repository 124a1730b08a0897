//! API response bodies
//!
//! Success envelopes and the JSON error body every failure is rendered as.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{ServerError, error_to_status, handle_error};
use crate::storage::EntryInfo;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file_info: EntryInfo,
}

#[derive(Debug, Serialize)]
pub struct MkdirResponse {
    pub message: &'static str,
    pub directory_info: EntryInfo,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Capability descriptor served at `/`
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        handle_error(&self);
        let body = ErrorBody {
            error: self.message(),
            kind: self.kind(),
            detail: self.detail(),
        };
        (error_to_status(&self), Json(body)).into_response()
    }
}

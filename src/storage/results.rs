//! Storage result types
//!
//! Defines result structures returned by storage operations.

use serde::Serialize;
use std::path::PathBuf;

/// Description of one filesystem entry, computed fresh on every request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    /// Absolute path on the server
    pub path: String,
    pub is_directory: bool,
    /// Size in bytes, 0 for directories
    pub size: u64,
    /// Last modification time, RFC 3339 in UTC
    pub modified: String,
    /// Permission bits as an octal string
    pub permissions: String,
    /// Path relative to the server root, usable in follow-up requests
    pub relative_path: String,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub current_path: String,
    pub items: Vec<EntryInfo>,
    pub total: usize,
}

/// A file validated for download
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub file_path: PathBuf,
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

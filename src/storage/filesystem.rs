//! File system helpers
//!
//! Builds [`EntryInfo`] records from on-disk metadata.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io::Result;
use std::path::Path;
use std::time::SystemTime;

use crate::storage::permissions::permission_string;
use crate::storage::results::EntryInfo;
use crate::storage::validation::Sandbox;

impl EntryInfo {
    /// Stat `path` (following symlinks) and describe it.
    pub fn from_path(sandbox: &Sandbox, path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        let is_directory = metadata.is_dir();
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_string_lossy().to_string(),
            is_directory,
            size: if is_directory { 0 } else { metadata.len() },
            modified: format_timestamp(modified),
            permissions: permission_string(&metadata),
            relative_path: sandbox.relative(path),
        })
    }
}

/// RFC 3339 timestamp with second precision, e.g. `2024-05-01T12:00:00Z`
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

//! Storage operations
//!
//! Handles the filesystem side of every API call: list, download, upload,
//! make-directory and delete. Each operation resolves its input through the
//! [`Sandbox`] before touching the filesystem.

use log::{debug, error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FileError;
use crate::storage::results::{DownloadTarget, EntryInfo, ListResult};
use crate::storage::validation::{Sandbox, is_staging_name, sanitize_filename};

/// Lists the immediate children of a directory.
///
/// Directories come before files, each group ordered by case-insensitive
/// name. An entry that cannot be stat'ed (for example because it was deleted
/// while the listing ran) is skipped rather than failing the whole listing.
/// Upload staging files are never listed.
pub fn list_directory(sandbox: &Sandbox, relative: &str) -> Result<ListResult, FileError> {
    let dir = sandbox.resolve(relative)?;

    let metadata = fs::metadata(&dir).map_err(|e| FileError::io(relative, e))?;
    if !metadata.is_dir() {
        return Err(FileError::NotADirectory(relative.to_string()));
    }

    let entries = fs::read_dir(&dir).map_err(|e| {
        error!("Failed to list directory {} (real: {}): {}", relative, dir.display(), e);
        FileError::io(relative, e)
    })?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if is_staging_name(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let entry_path = entry.path();
        match EntryInfo::from_path(sandbox, &entry_path) {
            Ok(info) => items.push(info),
            Err(e) => debug!("Skipping {}: {}", entry_path.display(), e),
        }
    }

    items.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    info!(
        "Listed directory {:?} (real: {}) - {} entries",
        relative,
        dir.display(),
        items.len()
    );

    Ok(ListResult {
        current_path: sandbox.relative(&dir),
        total: items.len(),
        items,
    })
}

/// Validates a file for download.
pub fn prepare_download(sandbox: &Sandbox, relative: &str) -> Result<DownloadTarget, FileError> {
    let file_path = sandbox.resolve(relative)?;

    let metadata = fs::metadata(&file_path).map_err(|e| FileError::io(relative, e))?;
    if metadata.is_dir() {
        return Err(FileError::IsADirectory(relative.to_string()));
    }

    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    info!(
        "Prepared download for {} (real: {}, {} bytes)",
        relative,
        file_path.display(),
        metadata.len()
    );

    Ok(DownloadTarget {
        file_path,
        name,
        size: metadata.len(),
        content_type,
    })
}

/// Resolves (and creates, if missing) the directory an upload lands in and
/// returns the final path for `filename`.
///
/// `filename` must already be sanitized; the joined path is re-validated so
/// a name that slipped through sanitization still cannot leave the root.
pub fn prepare_upload_target(
    sandbox: &Sandbox,
    target_dir: &str,
    filename: &str,
) -> Result<PathBuf, FileError> {
    let dir = sandbox.resolve(target_dir)?;

    match fs::metadata(&dir) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(FileError::NotADirectory(target_dir.to_string()));
        }
        Ok(_) => {}
        Err(_) => {
            fs::create_dir_all(&dir).map_err(|e| match e.kind() {
                io::ErrorKind::NotADirectory => FileError::NotADirectory(target_dir.to_string()),
                _ => FileError::io(target_dir, e),
            })?;
            info!("Created upload directory {}", dir.display());
        }
    }

    let file_path = sandbox.contain(&dir.join(filename))?;
    if file_path.is_dir() {
        return Err(FileError::IsADirectory(sandbox.relative(&file_path)));
    }

    Ok(file_path)
}

/// Moves a fully received upload from its staging path onto its final name.
///
/// An existing file with the same name is replaced.
pub fn store_upload(
    sandbox: &Sandbox,
    target_dir: &str,
    filename: &str,
    staged: &Path,
) -> Result<EntryInfo, FileError> {
    let file_path = prepare_upload_target(sandbox, target_dir, filename)?;
    let relative = sandbox.relative(&file_path);

    fs::rename(staged, &file_path).map_err(|e| {
        error!(
            "Failed to rename {} to {}: {}",
            staged.display(),
            file_path.display(),
            e
        );
        FileError::io(relative.as_str(), e)
    })?;

    info!("Stored upload {} (real: {})", relative, file_path.display());
    EntryInfo::from_path(sandbox, &file_path).map_err(|e| FileError::io(relative, e))
}

/// Creates exactly one new directory named `name` under `parent`.
///
/// The parent must already exist. An existing entry with the same name is
/// reported as `AlreadyExists`, never silently accepted.
pub fn make_directory(sandbox: &Sandbox, parent: &str, name: &str) -> Result<EntryInfo, FileError> {
    let dir_name = sanitize_filename(name)?;
    let parent_path = sandbox.resolve(parent)?;

    let metadata = fs::metadata(&parent_path).map_err(|e| FileError::io(parent, e))?;
    if !metadata.is_dir() {
        return Err(FileError::NotADirectory(parent.to_string()));
    }

    let new_dir = sandbox.contain(&parent_path.join(&dir_name))?;
    let relative = sandbox.relative(&new_dir);

    fs::create_dir(&new_dir).map_err(|e| FileError::io(relative.as_str(), e))?;
    info!("Created directory {} (real: {})", relative, new_dir.display());

    EntryInfo::from_path(sandbox, &new_dir).map_err(|e| FileError::io(relative, e))
}

/// Deletes a file, or a directory together with everything below it.
///
/// Recursive removal is depth-first and not atomic: if it fails part-way the
/// error is returned and some of the subtree may already be gone. The root
/// itself can never be deleted. A symlink is removed as a link; its target is
/// left alone.
pub fn delete_entry(sandbox: &Sandbox, relative: &str) -> Result<(), FileError> {
    let path = sandbox.resolve_entry(relative)?;

    if path == sandbox.root() {
        return Err(FileError::PathEscape(relative.to_string()));
    }

    let metadata = fs::symlink_metadata(&path).map_err(|e| FileError::io(relative, e))?;
    let result = if metadata.file_type().is_dir() {
        fs::remove_dir_all(&path)
    } else {
        fs::remove_file(&path)
    };

    match result {
        Ok(()) => {
            info!("Deleted {} (real: {})", relative, path.display());
            Ok(())
        }
        Err(e) => {
            error!("Failed to delete {} (real: {}): {}", relative, path.display(), e);
            Err(FileError::io(relative, e))
        }
    }
}

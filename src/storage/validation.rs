//! Path validation
//!
//! Confines every client-supplied path to the server root and sanitizes
//! client-supplied file and directory names.

use log::warn;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::FileError;

/// Device names Windows refuses as file names regardless of extension
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Prefix of in-flight upload staging files kept in the root
pub const STAGING_PREFIX: &str = ".upload-";

/// Suffix of in-flight upload staging files
pub const STAGING_SUFFIX: &str = ".tmp";

/// Whether `name` is an upload staging file, which clients never see.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
}

/// The confined directory tree every operation works in.
///
/// Holds the canonical root. Every path handed out by [`Sandbox::resolve`] or
/// [`Sandbox::contain`] is the root itself or a descendant of it, with
/// symlinks along the existing part of the path already resolved.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create the root directory if needed and canonicalize it.
    pub fn new(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client-supplied relative path to a contained absolute path.
    ///
    /// An empty string names the root. Absolute paths, drive prefixes, NUL
    /// bytes and `..` climbing above the root fail with `PathEscape`. Upload
    /// staging files are reported as `NotFound`.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, FileError> {
        let normalized = self.normalize(relative)?;
        self.contain_relative(&normalized, relative)
    }

    /// Like [`Sandbox::resolve`], but a symlink in the final component is not
    /// followed: the returned path names the link itself.
    pub fn resolve_entry(&self, relative: &str) -> Result<PathBuf, FileError> {
        let normalized = self.normalize(relative)?;
        match (normalized.parent(), normalized.file_name()) {
            (Some(parent), Some(name)) => {
                Ok(self.contain_relative(parent, relative)?.join(name))
            }
            _ => Ok(self.root.clone()),
        }
    }

    /// Lexically normalize `relative`, rejecting anything that climbs out.
    fn normalize(&self, relative: &str) -> Result<PathBuf, FileError> {
        let escape = || FileError::PathEscape(relative.to_string());

        if relative.contains('\0') {
            warn!("Rejected path containing NUL byte: {:?}", relative);
            return Err(escape());
        }

        let mut normalized = PathBuf::new();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    if is_staging_name(&part.to_string_lossy()) {
                        return Err(FileError::NotFound(relative.to_string()));
                    }
                    normalized.push(part);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        warn!("Rejected traversal above server root: {}", relative);
                        return Err(escape());
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    warn!("Rejected absolute path: {}", relative);
                    return Err(escape());
                }
            }
        }

        Ok(normalized)
    }

    fn contain_relative(&self, normalized: &Path, relative: &str) -> Result<PathBuf, FileError> {
        let resolved = self.canonicalize_existing(&self.root.join(normalized), relative)?;
        if !resolved.starts_with(&self.root) {
            warn!(
                "Rejected path resolving outside server root: {} -> {}",
                relative,
                resolved.display()
            );
            return Err(FileError::PathEscape(relative.to_string()));
        }

        Ok(resolved)
    }

    /// Re-validate an absolute path built by joining onto a resolved path.
    pub fn contain(&self, path: &Path) -> Result<PathBuf, FileError> {
        let display = path.to_string_lossy().to_string();
        let resolved = self.canonicalize_existing(path, &display)?;
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            warn!("Rejected joined path outside server root: {}", display);
            Err(FileError::PathEscape(display))
        }
    }

    /// Path of `path` relative to the root, `/`-separated; empty for the root.
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }

    /// Canonicalize the deepest existing ancestor of `path` and re-append the
    /// missing tail, so paths that do not exist yet can still be checked.
    fn canonicalize_existing(&self, path: &Path, display: &str) -> Result<PathBuf, FileError> {
        let mut existing = path.to_path_buf();
        let mut missing: Vec<OsString> = Vec::new();

        loop {
            match existing.canonicalize() {
                Ok(mut canonical) => {
                    for part in missing.iter().rev() {
                        canonical.push(part);
                    }
                    return Ok(canonical);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                    ) =>
                {
                    match (existing.file_name(), existing.parent()) {
                        (Some(name), Some(parent)) => {
                            missing.push(name.to_os_string());
                            existing = parent.to_path_buf();
                        }
                        _ => return Err(FileError::io(display, e)),
                    }
                }
                Err(e) => return Err(FileError::io(display, e)),
            }
        }
    }
}

/// Sanitize a client-supplied file or directory name.
///
/// Directory components are stripped, whitespace runs become `_`, and only
/// alphanumerics plus `_`, `.` and `-` are kept. Names containing a `..`
/// component or a NUL byte, and names left empty or without any
/// alphanumeric character, fail with `InvalidName`.
pub fn sanitize_filename(raw: &str) -> Result<String, FileError> {
    let invalid = || FileError::InvalidName(raw.to_string());

    if raw.contains('\0') {
        return Err(invalid());
    }

    let segments: Vec<&str> = raw.split(['/', '\\']).collect();
    if segments.iter().any(|s| s.trim() == "..") {
        return Err(invalid());
    }

    let base = segments
        .into_iter()
        .rev()
        .find(|s| !s.trim().is_empty())
        .unwrap_or("");

    let collapsed = base.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() || !trimmed.chars().any(char::is_alphanumeric) {
        return Err(invalid());
    }

    let stem = trimmed.split('.').next().unwrap_or(trimmed);
    if RESERVED_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
        return Ok(format!("_{trimmed}"));
    }

    Ok(trimmed.to_string())
}

//! File system storage management
//!
//! Handles path containment, file operations, and entry metadata.

pub mod filesystem;
pub mod operations;
pub mod permissions;
pub mod results;
pub mod validation;

pub use operations::{
    delete_entry, list_directory, make_directory, prepare_download, prepare_upload_target,
    store_upload,
};
pub use results::{DownloadTarget, EntryInfo, ListResult};
pub use validation::{
    STAGING_PREFIX, STAGING_SUFFIX, Sandbox, is_staging_name, sanitize_filename,
};

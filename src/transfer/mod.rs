//! Transfer module
//!
//! Moves file bytes between HTTP bodies and the filesystem: streaming
//! uploads into staging files and streaming downloads out of them.

pub mod download;
pub mod upload;

pub use download::file_response;
pub use upload::{discard, multipart_error, receive_file, staging_path};

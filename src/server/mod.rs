//! Server core functionality
//!
//! This module contains the HTTP server lifecycle: binding, serving and
//! graceful shutdown.

pub mod core;

pub use self::core::Server;

//! RAX File Server - Entry Point
//!
//! Exposes one configured directory over HTTP for listing, upload, download,
//! directory creation and deletion.

use log::{error, info};
use std::process;

use rax_file_server::utils::logging::setup_logging;
use rax_file_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    info!("Launching file server...");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.start().await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}

use log::{error, info};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::api::{AppState, router};
use crate::config::ServerConfig;
use crate::storage::Sandbox;

pub struct Server {
    listener: TcpListener,
    state: AppState,
}

impl Server {
    /// Prepare the server root and bind the listener.
    pub async fn new(config: ServerConfig) -> io::Result<Self> {
        let sandbox = Sandbox::new(&config.server_root_path()).map_err(|e| {
            error!(
                "Failed to prepare server root {}: {}",
                config.server_root, e
            );
            e
        })?;
        info!("Server root directory: {}", sandbox.root().display());

        let socket = config.socket_address();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", socket);

        Ok(Self {
            listener,
            state: AppState::new(sandbox, config.max_upload_bytes()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until Ctrl-C.
    pub async fn start(self) -> io::Result<()> {
        info!(
            "Starting RAX file server on {} (max upload {} bytes)",
            self.local_addr()?,
            self.state.max_upload_bytes
        );
        info!("Endpoints:");
        info!("  GET    /files              - list files");
        info!("  GET    /download/<path>    - download a file");
        info!("  POST   /upload             - upload a file");
        info!("  POST   /mkdir              - create a directory");
        info!("  DELETE /delete/<path>      - delete a file or directory");

        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping server"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

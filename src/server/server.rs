use crate::connection::Connection;
use crate::server::config::ServerConfig;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// TCP acceptor: binds the listen address and hands each accepted socket to
/// its own connection task.
pub struct RtmpServer {
    config: Arc<ServerConfig>,
}

impl RtmpServer {
    /// Create new server
    pub fn new(config: ServerConfig) -> Self {
        RtmpServer {
            config: Arc::new(config),
        }
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Listen and accept connections until the task is dropped
    pub async fn listen(&self) -> Result<()> {
        self.config.validate()?;

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await.map_err(Error::Io)?;
        info!(%addr, "RTMP server listening");

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            self.handle_connection(stream, peer_addr.to_string());
        }
    }

    /// Spawn the per-connection task
    fn handle_connection(&self, stream: TcpStream, peer_addr: String) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = %peer_addr, error = %e, "failed to set TCP_NODELAY");
        }

        let config = self.config.clone();
        tokio::spawn(async move {
            debug!(peer = %peer_addr, "connection accepted");

            let mut connection = Connection::new(stream, config);
            match connection.run().await {
                Ok(()) => info!(peer = %peer_addr, "connection closed"),
                Err(Error::Io(e)) => {
                    debug!(peer = %peer_addr, error = %e, "connection dropped")
                }
                Err(e) => warn!(peer = %peer_addr, error = %e, "connection failed"),
            }
        });
    }
}

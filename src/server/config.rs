use crate::chunk::{DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::message::limit_types;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Outbound chunk size; announced to the peer if not the default
    pub chunk_size: u32,

    /// Window acknowledgement size announced on connect
    pub window_ack_size: u32,

    /// Peer bandwidth announced on connect
    pub peer_bandwidth: u32,

    /// Peer bandwidth limit type (0 hard, 1 soft, 2 dynamic)
    pub peer_bandwidth_limit_type: u8,

    /// Server version string placed in the connect result
    pub fms_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 1935,
            chunk_size: DEFAULT_CHUNK_SIZE,
            window_ack_size: 512 * 1024,
            peer_bandwidth: 512 * 1024,
            peer_bandwidth_limit_type: limit_types::DYNAMIC,
            fms_version: "M/1.0".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("Invalid port: 0"));
        }

        if self.chunk_size < 1 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::config(format!(
                "Chunk size must be within 1..={}",
                MAX_CHUNK_SIZE
            )));
        }

        if self.window_ack_size == 0 {
            return Err(Error::config("Window acknowledgement size must be nonzero"));
        }

        Ok(())
    }
}

/// Builder for ServerConfig
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        ServerConfigBuilder {
            config: ServerConfig::default(),
        }
    }

    /// Set host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set outbound chunk size
    pub fn chunk_size(mut self, size: u32) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set window acknowledgement size
    pub fn window_ack_size(mut self, size: u32) -> Self {
        self.config.window_ack_size = size;
        self
    }

    /// Set announced peer bandwidth
    pub fn peer_bandwidth(mut self, size: u32) -> Self {
        self.config.peer_bandwidth = size;
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

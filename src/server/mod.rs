mod config;
mod server;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use server::RtmpServer;

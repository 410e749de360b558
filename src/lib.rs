mod amf;
mod chunk;
mod connection;
mod handshake;
mod message;
mod server;
mod utils;

// Re-export commonly used types at crate root
pub use amf::*;
pub use chunk::*;
pub use connection::*;
pub use message::*;
pub use utils::*;

// Handshake exports; the engine itself runs inside the connection
pub use handshake::{
    digest_offset, key_offset, HandshakeKind, HandshakeState, FMS_KEY, FP_KEY, HANDSHAKE_SIZE,
    RTMP_VERSION,
};

// Server exports
pub use server::{RtmpServer, ServerConfig, ServerConfigBuilder};

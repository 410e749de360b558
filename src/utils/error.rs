use std::io::Error as IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("AMF error: {0}")]
    Amf(#[from] AmfError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while exchanging C0/C1/C2 with the peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("unsupported RTMP version {0}")]
    UnsupportedVersion(u8),

    #[error("C1 digest mismatch")]
    DigestMismatch,

    #[error("handshake packet has invalid length {0}")]
    InvalidLength(usize),
}

/// Errors raised by the chunk stream codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("unsupported chunk header format {0}")]
    UnsupportedChunkType(u8),

    #[error("invalid chunk size {0}")]
    InvalidChunkSize(u32),

    #[error("continuation chunk for unknown chunk stream {0}")]
    UnexpectedContinuation(u32),
}

/// Errors raised by the AMF0 codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmfError {
    #[error("not enough bytes")]
    ShortRead,

    #[error("unsupported AMF0 marker 0x{0:02x}")]
    UnsupportedType(u8),

    #[error("invalid UTF-8 in AMF0 string")]
    BadString,
}

/// Errors raised while interpreting decoded AMF command payloads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unsupported command {0:?}")]
    UnsupportedCommand(String),

    #[error("missing field {0:?}")]
    MissingField(&'static str),

    #[error("field {0:?} has wrong type, expected {1}")]
    TypeMismatch(&'static str, &'static str),
}

/// Errors raised by the connection state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected {message} message in {state} state")]
    UnexpectedMessageInState {
        message: &'static str,
        state: &'static str,
    },

    #[error("unsupported message type {0}")]
    UnsupportedMessageType(u8),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::from(HandshakeError::UnsupportedVersion(6));
        assert_eq!(
            format!("{}", err),
            "handshake error: unsupported RTMP version 6"
        );

        let err = Error::from(AmfError::UnsupportedType(0x0d));
        assert_eq!(format!("{}", err), "AMF error: unsupported AMF0 marker 0x0d");
    }

    #[test]
    fn test_io_conversion() {
        use std::io::{Error as IoError, ErrorKind};

        let io_err = IoError::new(ErrorKind::UnexpectedEof, "EOF");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            other => panic!("expected IO error variant, got {:?}", other),
        }
    }
}

mod complex;
mod simple;
mod state;

pub use complex::{digest_offset, key_offset, FMS_KEY, FP_KEY};
pub use state::{HandshakeKind, HandshakeState};

use crate::{HandshakeError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::debug;

/// RTMP version byte accepted in C0 and echoed in S0
pub const RTMP_VERSION: u8 = 3;

/// Size of each of C1/S1/C2/S2
pub const HANDSHAKE_SIZE: usize = 1536;

/// Run the server side of the RTMP handshake.
///
/// Reads C0+C1, answers with S0+S1+S2 (simple or digest variant depending on
/// the C1 version field), then reads and discards C2. Returns which variant
/// was negotiated once the exchange is `Established`.
pub async fn serve<S>(io: &mut S) -> Result<HandshakeKind>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut state = HandshakeState::new();

    // C0 and C1 arrive together
    let mut c0c1 = vec![0u8; 1 + HANDSHAKE_SIZE];
    io.read_exact(&mut c0c1).await?;

    if c0c1[0] != RTMP_VERSION {
        return Err(HandshakeError::UnsupportedVersion(c0c1[0]).into());
    }
    let c1 = &c0c1[1..];

    // C1 layout: time(4) | version(4) | 1528 bytes of payload. An all-zero
    // version field selects the simple handshake, anything else the
    // digest variant.
    let kind = if c1[4..8] == [0, 0, 0, 0] {
        simple::respond(io, c1).await?;
        HandshakeKind::Simple
    } else {
        complex::respond(io, c1).await?;
        HandshakeKind::Complex
    };
    state.sent_response(kind);

    // Read and discard C2
    let mut c2 = crate::pool::acquire(HANDSHAKE_SIZE);
    io.read_exact(&mut c2).await?;
    state.received_c2();
    assert!(state.is_established());

    debug!(?kind, "handshake established");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn test_simple_handshake_echoes_c1_as_s2() {
        let (mut client, mut server) = duplex(16 * 1024);

        let task = tokio::spawn(async move { serve(&mut server).await });

        let mut c1 = vec![7u8; HANDSHAKE_SIZE];
        c1[4..8].copy_from_slice(&[0, 0, 0, 0]); // simple variant
        client.write_all(&[RTMP_VERSION]).await.unwrap();
        client.write_all(&c1).await.unwrap();

        let mut response = vec![0u8; 1 + 2 * HANDSHAKE_SIZE];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(response[0], RTMP_VERSION);

        // S1 starts with zeroed time and version
        assert_eq!(&response[1..9], &[0u8; 8]);

        // S2 echoes C1 byte for byte
        assert_eq!(&response[1 + HANDSHAKE_SIZE..], &c1[..]);

        client.write_all(&c1).await.unwrap(); // C2
        assert_eq!(task.await.unwrap().unwrap(), HandshakeKind::Simple);
    }

    #[tokio::test]
    async fn test_bad_version_rejected() {
        let (mut client, mut server) = duplex(16 * 1024);

        let task = tokio::spawn(async move { serve(&mut server).await });

        let mut c0c1 = vec![0u8; 1 + HANDSHAKE_SIZE];
        c0c1[0] = 6;
        client.write_all(&c0c1).await.unwrap();

        match task.await.unwrap() {
            Err(Error::Handshake(HandshakeError::UnsupportedVersion(6))) => {}
            other => panic!("expected version error, got {:?}", other),
        }
    }
}

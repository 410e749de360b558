use crate::handshake::{HANDSHAKE_SIZE, RTMP_VERSION};
use crate::{generate_random_bytes, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Answer a simple (pre-digest) handshake.
///
/// S1 carries a zero time, a zero version field and arbitrary payload; S2 is
/// a byte-for-byte echo of C1.
pub(crate) async fn respond<W>(io: &mut W, c1: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut response = Vec::with_capacity(1 + 2 * HANDSHAKE_SIZE);
    response.push(RTMP_VERSION);

    // S1: time(4) = 0, version(4) = 0, 1528 bytes of filler
    response.extend_from_slice(&[0u8; 8]);
    response.extend_from_slice(&generate_random_bytes(HANDSHAKE_SIZE - 8));

    // S2 = C1
    response.extend_from_slice(c1);

    io.write_all(&response).await?;
    io.flush().await?;
    Ok(())
}

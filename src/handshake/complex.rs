use crate::handshake::{HANDSHAKE_SIZE, RTMP_VERSION};
use crate::{fill_random, hmac_sha256, HandshakeError, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Shared key announced by Flash Media Server ("Genuine Adobe Flash Media
/// Server 001" plus 32 trailing bytes)
pub const FMS_KEY: [u8; 68] = [
    0x47, 0x65, 0x6e, 0x75, 0x69, 0x6e, 0x65, 0x20, 0x41, 0x64, 0x6f, 0x62, 0x65, 0x20, 0x46,
    0x6c, 0x61, 0x73, 0x68, 0x20, 0x4d, 0x65, 0x64, 0x69, 0x61, 0x20, 0x53, 0x65, 0x72, 0x76,
    0x65, 0x72, 0x20, 0x30, 0x30, 0x31, 0xf0, 0xee, 0xc2, 0x4a, 0x80, 0x68, 0xbe, 0xe8, 0x2e,
    0x00, 0xd0, 0xd1, 0x02, 0x9e, 0x7e, 0x57, 0x6e, 0xec, 0x5d, 0x2d, 0x29, 0x80, 0x6f, 0xab,
    0x93, 0xb8, 0xe6, 0x36, 0xcf, 0xeb, 0x31, 0xae,
];

/// Shared key announced by the Flash Player ("Genuine Adobe Flash Player
/// 001" plus 32 trailing bytes)
pub const FP_KEY: [u8; 62] = [
    0x47, 0x65, 0x6e, 0x75, 0x69, 0x6e, 0x65, 0x20, 0x41, 0x64, 0x6f, 0x62, 0x65, 0x20, 0x46,
    0x6c, 0x61, 0x73, 0x68, 0x20, 0x50, 0x6c, 0x61, 0x79, 0x65, 0x72, 0x20, 0x30, 0x30, 0x31,
    0xf0, 0xee, 0xc2, 0x4a, 0x80, 0x68, 0xbe, 0xe8, 0x2e, 0x00, 0xd0, 0xd1, 0x02, 0x9e, 0x7e,
    0x57, 0x6e, 0xec, 0x5d, 0x2d, 0x29, 0x80, 0x6f, 0xab, 0x93, 0xb8, 0xe6, 0x36, 0xcf, 0xeb,
    0x31, 0xae,
];

const DIGEST_SIZE: usize = 32;
const KEY_SIZE: usize = 128;

/// Digest/key blocks are each 764 bytes
const BLOCK_SIZE: usize = 764;

/// Offset field (4) + time (4) + version (4) precede the digest block
const DIGEST_BASE: usize = 12;

/// The key block starts after time, version and the digest block
const KEY_BASE: usize = 776;

const DIGEST_OFFSET_MAX: usize = BLOCK_SIZE - DIGEST_SIZE - 4;
const KEY_OFFSET_MAX: usize = BLOCK_SIZE - KEY_SIZE - 4;

/// Absolute offset of the 32-byte digest inside a C1/S1 packet.
///
/// The four bytes at [8..12] are summed and folded into the digest block.
pub fn digest_offset(packet: &[u8]) -> usize {
    let sum = packet[8..12].iter().map(|&b| b as usize).sum::<usize>();
    sum % DIGEST_OFFSET_MAX + DIGEST_BASE
}

/// Absolute offset of the 128-byte key inside a C1 packet.
///
/// The four bytes at [1532..1536] are summed and folded into the key block.
pub fn key_offset(packet: &[u8]) -> usize {
    let sum = packet[1532..1536].iter().map(|&b| b as usize).sum::<usize>();
    sum % KEY_OFFSET_MAX + KEY_BASE
}

/// The packet with its 32 digest bytes spliced out, for HMAC input
fn without_digest(packet: &[u8], offset: usize) -> Vec<u8> {
    let mut joined = Vec::with_capacity(packet.len() - DIGEST_SIZE);
    joined.extend_from_slice(&packet[..offset]);
    joined.extend_from_slice(&packet[offset + DIGEST_SIZE..]);
    joined
}

/// Check the C1 digest against the Flash Player key.
///
/// Returns the 32 digest bytes on success; a mismatch refuses the client.
pub(crate) fn validate_client(c1: &[u8]) -> Result<[u8; 32]> {
    let offset = digest_offset(c1);
    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&c1[offset..offset + DIGEST_SIZE]);

    let expected = hmac_sha256(&FP_KEY[..30], &without_digest(c1, offset));
    if digest != expected {
        return Err(HandshakeError::DigestMismatch.into());
    }
    Ok(digest)
}

/// The 128-byte key block payload of C1. Unused by the response itself but
/// extracted so a future crypto exchange could consume it.
pub(crate) fn client_key(c1: &[u8]) -> [u8; KEY_SIZE] {
    let offset = key_offset(c1);
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&c1[offset..offset + KEY_SIZE]);
    key
}

/// Build S1: random payload with its FMS-keyed digest spliced in
pub(crate) fn build_s1() -> Vec<u8> {
    let mut s1 = vec![0u8; HANDSHAKE_SIZE];
    fill_random(&mut s1[8..]);
    s1[0..4].copy_from_slice(&[0, 0, 0, 0]); // time
    s1[4..8].copy_from_slice(&[1, 1, 1, 1]); // version, must be nonzero

    let offset = digest_offset(&s1);
    let digest = hmac_sha256(&FMS_KEY[..36], &without_digest(&s1, offset));
    s1[offset..offset + DIGEST_SIZE].copy_from_slice(&digest);
    s1
}

/// Build S2: 1504 random bytes plus a digest chained off the C1 digest
pub(crate) fn build_s2(c1_digest: &[u8; 32]) -> Vec<u8> {
    let mut s2 = vec![0u8; HANDSHAKE_SIZE];
    fill_random(&mut s2[..HANDSHAKE_SIZE - DIGEST_SIZE]);

    let key = hmac_sha256(&FMS_KEY[..68], c1_digest);
    let digest = hmac_sha256(&key, &s2[..HANDSHAKE_SIZE - DIGEST_SIZE]);
    s2[HANDSHAKE_SIZE - DIGEST_SIZE..].copy_from_slice(&digest);
    s2
}

/// Answer a digest (FMS/FP) handshake.
pub(crate) async fn respond<W>(io: &mut W, c1: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let c1_digest = validate_client(c1)?;
    let _client_key = client_key(c1);

    let s1 = build_s1();
    let s2 = build_s2(&c1_digest);

    let mut response = Vec::with_capacity(1 + 2 * HANDSHAKE_SIZE);
    response.push(RTMP_VERSION);
    response.extend_from_slice(&s1);
    response.extend_from_slice(&s2);

    io.write_all(&response).await?;
    io.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, HandshakeError};

    /// A C1 a digest-aware client would send: nonzero version, valid
    /// FP-keyed digest at the computed offset
    pub(crate) fn make_client_c1() -> Vec<u8> {
        let mut c1 = vec![0u8; HANDSHAKE_SIZE];
        fill_random(&mut c1[8..]);
        c1[4..8].copy_from_slice(&[0x80, 0x00, 0x07, 0x02]);

        let offset = digest_offset(&c1);
        let digest = hmac_sha256(&FP_KEY[..30], &without_digest(&c1, offset));
        c1[offset..offset + DIGEST_SIZE].copy_from_slice(&digest);
        c1
    }

    #[test]
    fn test_digest_offset_arithmetic() {
        let mut packet = vec![0u8; HANDSHAKE_SIZE];
        packet[8..12].copy_from_slice(&[0, 0, 0, 3]);
        assert_eq!(digest_offset(&packet), 3 + 12);

        // Sum folds modulo 728
        packet[8..12].copy_from_slice(&[255, 255, 255, 255]);
        assert_eq!(digest_offset(&packet), (255 * 4) % 728 + 12);

        // Largest possible placement still fits inside the digest block
        assert!(digest_offset(&packet) + DIGEST_SIZE <= DIGEST_BASE + BLOCK_SIZE);
    }

    #[test]
    fn test_key_offset_arithmetic() {
        let mut packet = vec![0u8; HANDSHAKE_SIZE];
        packet[1532..1536].copy_from_slice(&[0, 0, 0, 5]);
        assert_eq!(key_offset(&packet), 5 + 776);

        packet[1532..1536].copy_from_slice(&[255, 255, 255, 255]);
        let offset = key_offset(&packet);
        assert!(offset + KEY_SIZE <= HANDSHAKE_SIZE);
    }

    #[test]
    fn test_valid_client_digest_accepted() {
        let c1 = make_client_c1();
        let digest = validate_client(&c1).unwrap();

        let offset = digest_offset(&c1);
        assert_eq!(&digest[..], &c1[offset..offset + DIGEST_SIZE]);
    }

    #[test]
    fn test_corrupt_digest_rejected() {
        let mut c1 = make_client_c1();
        let offset = digest_offset(&c1);
        c1[offset] ^= 0xFF;

        match validate_client(&c1) {
            Err(Error::Handshake(HandshakeError::DigestMismatch)) => {}
            other => panic!("expected digest mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_s1_carries_valid_fms_digest() {
        let s1 = build_s1();
        assert_eq!(s1.len(), HANDSHAKE_SIZE);
        assert_ne!(&s1[4..8], &[0, 0, 0, 0]);

        let offset = digest_offset(&s1);
        let expected = hmac_sha256(&FMS_KEY[..36], &without_digest(&s1, offset));
        assert_eq!(&s1[offset..offset + DIGEST_SIZE], &expected[..]);
    }

    #[test]
    fn test_s2_digest_chains_off_c1_digest() {
        let c1 = make_client_c1();
        let c1_digest = validate_client(&c1).unwrap();
        let s2 = build_s2(&c1_digest);

        let key = hmac_sha256(&FMS_KEY[..68], &c1_digest);
        let expected = hmac_sha256(&key, &s2[..HANDSHAKE_SIZE - DIGEST_SIZE]);
        assert_eq!(&s2[HANDSHAKE_SIZE - DIGEST_SIZE..], &expected[..]);
    }
}

// Common test utilities and helper functions
//
// Builds raw handshake packets and drives the chunk layer from the client
// side over a real TCP socket.

use rtmpd::{
    digest_offset, fill_random, hmac_sha256, Amf0Value, ChunkHeader, ChunkReader, ChunkWriter,
    Command, RtmpMessage, RtmpServer, ServerConfig, FP_KEY, HANDSHAKE_SIZE, RTMP_VERSION,
};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};

const DIGEST_SIZE: usize = 32;

/// Start a server on the given port and wait until it accepts
pub async fn start_server(port: u16) -> Arc<RtmpServer> {
    let config = ServerConfig::builder()
        .host("127.0.0.1")
        .port(port)
        .build()
        .expect("Failed to build server config");

    let server = Arc::new(RtmpServer::new(config));
    let listener = server.clone();
    tokio::spawn(async move { listener.listen().await });

    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return server;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not start on port {}", port);
}

/// A C1 selecting the simple handshake: all-zero version field
pub fn simple_c1() -> Vec<u8> {
    let mut c1 = vec![0u8; HANDSHAKE_SIZE];
    fill_random(&mut c1[8..]);
    c1[0..8].copy_from_slice(&[0; 8]);
    c1
}

/// A C1 selecting the digest handshake, with a valid FP-keyed digest
pub fn complex_c1() -> Vec<u8> {
    let mut c1 = vec![0u8; HANDSHAKE_SIZE];
    fill_random(&mut c1[8..]);
    c1[4..8].copy_from_slice(&[0x80, 0x00, 0x07, 0x02]);

    let offset = digest_offset(&c1);
    let mut spliced = Vec::with_capacity(HANDSHAKE_SIZE - DIGEST_SIZE);
    spliced.extend_from_slice(&c1[..offset]);
    spliced.extend_from_slice(&c1[offset + DIGEST_SIZE..]);

    let digest = hmac_sha256(&FP_KEY[..30], &spliced);
    c1[offset..offset + DIGEST_SIZE].copy_from_slice(&digest);
    c1
}

/// Send C0+C1, read S0+S1+S2, send C2; returns (s1, s2)
pub async fn drive_handshake(stream: &mut TcpStream, c1: &[u8]) -> (Vec<u8>, Vec<u8>) {
    stream.write_all(&[RTMP_VERSION]).await.unwrap();
    stream.write_all(c1).await.unwrap();

    let mut s0 = [0u8; 1];
    stream.read_exact(&mut s0).await.unwrap();
    assert_eq!(s0[0], RTMP_VERSION);

    let mut s1 = vec![0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut s1).await.unwrap();
    let mut s2 = vec![0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut s2).await.unwrap();

    // C2 echoes S1; the server discards it either way
    stream.write_all(&s1).await.unwrap();

    (s1, s2)
}

/// Client half of a chunked RTMP session
pub struct ChunkClient {
    pub stream: TcpStream,
    pub reader: ChunkReader,
    pub writer: ChunkWriter,
}

impl ChunkClient {
    /// Handshake (simple variant) and wrap the socket in chunk codecs
    pub async fn establish(port: u16) -> Self {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        drive_handshake(&mut stream, &simple_c1()).await;

        ChunkClient {
            stream,
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
        }
    }

    pub async fn send(&mut self, message: &RtmpMessage) {
        let (type_id, payload) = message.encode().unwrap();
        self.writer
            .write_message(&mut self.stream, type_id, &payload)
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> (ChunkHeader, Vec<u8>) {
        let (header, body) = self.reader.read_message(&mut self.stream).await.unwrap();
        (header, body.to_vec())
    }

    /// Issue a connect command for the given app
    pub async fn send_connect(&mut self, app: &str) {
        let mut command = Command::new("connect", 1.0);
        command.object = Amf0Value::Object(vec![
            ("app".to_string(), Amf0Value::String(app.to_string())),
            (
                "tcUrl".to_string(),
                Amf0Value::String(format!("rtmp://127.0.0.1/{}", app)),
            ),
            ("objectEncoding".to_string(), Amf0Value::Number(0.0)),
        ]);
        self.send(&RtmpMessage::Command(command)).await;
    }
}

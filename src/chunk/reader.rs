use crate::chunk::stream::ChunkStream;
use crate::chunk::{ChunkHeader, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP, MAX_CHUNK_SIZE};
use crate::{pool, ChunkError, PooledBuf, Result};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncReadExt};

/// De-chunks the inbound byte stream into complete messages.
///
/// Holds the per-CSID running headers, reassembles bodies that span chunk
/// boundaries, and counts every byte it consumes so the connection can emit
/// Acknowledgement messages.
pub struct ChunkReader {
    /// Chunk streams by CSID
    streams: HashMap<u32, ChunkStream>,

    /// Current chunk size for reading; the peer moves it via SetChunkSize
    chunk_size: usize,

    /// Raw bytes consumed off the socket
    sequence_number: u32,
}

impl ChunkReader {
    /// Create new chunk reader
    pub fn new() -> Self {
        ChunkReader {
            streams: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE as usize,
            sequence_number: 0,
        }
    }

    /// Set incoming chunk size; applies to subsequent chunks only
    pub fn set_chunk_size(&mut self, size: u32) -> Result<()> {
        if size < 1 || size > MAX_CHUNK_SIZE {
            return Err(ChunkError::InvalidChunkSize(size).into());
        }
        self.chunk_size = size as usize;
        Ok(())
    }

    /// Total bytes read so far
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Discard the partial body for a chunk stream (Abort message)
    pub fn abort(&mut self, chunk_stream_id: u32) {
        if let Some(stream) = self.streams.get_mut(&chunk_stream_id) {
            stream.reset_body();
        }
    }

    /// Read chunks until one message is fully reassembled
    pub async fn read_message<R>(&mut self, reader: &mut R) -> Result<(ChunkHeader, PooledBuf)>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(message) = self.read_chunk(reader).await? {
                return Ok(message);
            }
        }
    }

    /// Read one chunk; returns the message if this chunk completed it
    async fn read_chunk<R>(&mut self, reader: &mut R) -> Result<Option<(ChunkHeader, PooledBuf)>>
    where
        R: AsyncRead + Unpin,
    {
        // Basic header: fmt(2 bits) | csid(6 bits), plus 1-2 extra bytes
        // for the wide CSID forms
        let first = self.read_u8(reader).await?;
        let fmt = (first >> 6) & 0x03;
        let chunk_stream_id = match first & 0x3F {
            0 => 64 + u32::from(self.read_u8(reader).await?),
            1 => {
                let b1 = self.read_u8(reader).await?;
                let b2 = self.read_u8(reader).await?;
                64 + u32::from(b1) + (u32::from(b2) << 8)
            }
            n => u32::from(n),
        };

        let header = self.read_message_header(reader, fmt, chunk_stream_id).await?;

        // Locate the body under assembly, allocating it on first use
        let message_length = header.message_length as usize;
        let (mut body, received) = match self.streams.get_mut(&chunk_stream_id) {
            Some(stream) => {
                let body = stream
                    .body
                    .take()
                    .unwrap_or_else(|| pool::acquire(message_length));
                (body, stream.received)
            }
            None => return Err(ChunkError::UnexpectedContinuation(chunk_stream_id).into()),
        };

        let need = self.chunk_size.min(message_length.saturating_sub(received));
        reader.read_exact(&mut body[received..received + need]).await?;
        self.sequence_number = self.sequence_number.wrapping_add(need as u32);
        let received = received + need;

        if let Some(stream) = self.streams.get_mut(&chunk_stream_id) {
            if received == message_length {
                stream.received = 0;
                return Ok(Some((header, body)));
            }
            stream.body = Some(body);
            stream.received = received;
        }
        Ok(None)
    }

    /// Parse the fmt-dependent message header, folding partial headers into
    /// the running header for the chunk stream
    async fn read_message_header<R>(
        &mut self,
        reader: &mut R,
        fmt: u8,
        chunk_stream_id: u32,
    ) -> Result<ChunkHeader>
    where
        R: AsyncRead + Unpin,
    {
        match fmt {
            0 => {
                // Type 0: absolute timestamp, length, type, stream id (11 bytes)
                let mut bytes = [0u8; 11];
                self.read_exact_counted(reader, &mut bytes).await?;

                let timestamp_field = read_u24(&bytes[0..3]);
                let message_length = read_u24(&bytes[3..6]);
                let message_type = bytes[6];
                let message_stream_id =
                    u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);

                let timestamp = if timestamp_field == EXTENDED_TIMESTAMP {
                    self.read_u32_counted(reader).await?
                } else {
                    timestamp_field
                };

                let header = ChunkHeader::new(
                    chunk_stream_id,
                    timestamp,
                    message_length,
                    message_type,
                    message_stream_id,
                );

                let stream = self
                    .streams
                    .entry(chunk_stream_id)
                    .or_insert_with(|| ChunkStream::new(header));
                if stream.is_assembling() {
                    stream.reset_body();
                }
                stream.header = header;
                Ok(header)
            }
            1 => {
                // Type 1: timestamp delta, length, type (7 bytes); stream id
                // inherited
                let mut bytes = [0u8; 7];
                self.read_exact_counted(reader, &mut bytes).await?;

                let delta_field = read_u24(&bytes[0..3]);
                let message_length = read_u24(&bytes[3..6]);
                let message_type = bytes[6];

                let delta = if delta_field == EXTENDED_TIMESTAMP {
                    self.read_u32_counted(reader).await?
                } else {
                    delta_field
                };

                let stream = self
                    .streams
                    .get_mut(&chunk_stream_id)
                    .ok_or(ChunkError::UnexpectedContinuation(chunk_stream_id))?;
                if stream.is_assembling() {
                    stream.reset_body();
                }
                stream.header.timestamp = stream.header.timestamp.wrapping_add(delta);
                stream.header.message_length = message_length;
                stream.header.message_type = message_type;
                Ok(stream.header)
            }
            2 => {
                // Type 2: timestamp delta only (3 bytes)
                let mut bytes = [0u8; 3];
                self.read_exact_counted(reader, &mut bytes).await?;

                let delta_field = read_u24(&bytes);
                let delta = if delta_field == EXTENDED_TIMESTAMP {
                    self.read_u32_counted(reader).await?
                } else {
                    delta_field
                };

                let stream = self
                    .streams
                    .get_mut(&chunk_stream_id)
                    .ok_or(ChunkError::UnexpectedContinuation(chunk_stream_id))?;
                if stream.is_assembling() {
                    stream.reset_body();
                }
                stream.header.timestamp = stream.header.timestamp.wrapping_add(delta);
                Ok(stream.header)
            }
            3 => {
                // Type 3: everything inherited; continuation of an
                // in-flight message
                self.streams
                    .get(&chunk_stream_id)
                    .map(|stream| stream.header)
                    .ok_or_else(|| ChunkError::UnexpectedContinuation(chunk_stream_id).into())
            }
            other => Err(ChunkError::UnsupportedChunkType(other).into()),
        }
    }

    async fn read_u8<R>(&mut self, reader: &mut R) -> Result<u8>
    where
        R: AsyncRead + Unpin,
    {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).await?;
        self.sequence_number = self.sequence_number.wrapping_add(1);
        Ok(byte[0])
    }

    async fn read_u32_counted<R>(&mut self, reader: &mut R) -> Result<u32>
    where
        R: AsyncRead + Unpin,
    {
        let mut bytes = [0u8; 4];
        self.read_exact_counted(reader, &mut bytes).await?;
        Ok(u32::from_be_bytes(bytes))
    }

    async fn read_exact_counted<R>(&mut self, reader: &mut R, buf: &mut [u8]) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        reader.read_exact(buf).await?;
        self.sequence_number = self.sequence_number.wrapping_add(buf.len() as u32);
        Ok(())
    }
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u24(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

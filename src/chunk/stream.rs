use crate::chunk::ChunkHeader;
use crate::PooledBuf;

/// Per-CSID decode state: the running header and the body being assembled.
///
/// The running header is created by the first chunk on a chunk stream and
/// lives for the whole connection; the body buffer only exists while a
/// message is partially received.
#[derive(Debug)]
pub(crate) struct ChunkStream {
    /// Last fully-formed header for this CSID, updated in place by
    /// partial headers
    pub header: ChunkHeader,

    /// Message body under assembly, sized to the declared message length
    pub body: Option<PooledBuf>,

    /// Bytes of the body received so far
    pub received: usize,
}

impl ChunkStream {
    pub fn new(header: ChunkHeader) -> Self {
        ChunkStream {
            header,
            body: None,
            received: 0,
        }
    }

    /// Whether a message is partially assembled on this chunk stream
    pub fn is_assembling(&self) -> bool {
        self.body.is_some()
    }

    /// Discard any partial body, returning its buffer to the pool
    pub fn reset_body(&mut self) {
        self.body = None;
        self.received = 0;
    }
}

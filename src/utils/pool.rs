use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

/// Smallest bucket size in bytes
const MIN_BUCKET: usize = 16;

/// Largest bucket size in bytes
const MAX_BUCKET: usize = 64 * 1024;

/// Buckets grow by a factor of two: 16, 32, ..., 65536
const BUCKET_COUNT: usize = 13;

/// Buffers retained per bucket; beyond this, released buffers are freed
const BUCKET_DEPTH: usize = 256;

static POOL: OnceLock<BytePool> = OnceLock::new();

/// Process-wide size-bucketed buffer pool.
///
/// Chunk bodies and handshake scratch buffers are drawn from here instead of
/// the allocator. Buffers above `MAX_BUCKET` fall back to plain heap
/// allocation and are not retained on release.
pub struct BytePool {
    buckets: Vec<Mutex<Vec<Vec<u8>>>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Initialize the global pool. Called once at startup; later calls are no-ops.
pub fn init() {
    let _ = global();
}

/// Acquire a buffer of exactly `len` bytes from the global pool.
pub fn acquire(len: usize) -> PooledBuf {
    global().acquire(len)
}

fn global() -> &'static BytePool {
    POOL.get_or_init(BytePool::new)
}

impl BytePool {
    pub fn new() -> Self {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        for _ in 0..BUCKET_COUNT {
            buckets.push(Mutex::new(Vec::new()));
        }
        BytePool {
            buckets,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    /// Bucket index for a request of `len` bytes, or None if unpoolable
    fn bucket_index(len: usize) -> Option<usize> {
        if len > MAX_BUCKET {
            return None;
        }
        let size = len.max(MIN_BUCKET).next_power_of_two();
        Some(size.trailing_zeros() as usize - MIN_BUCKET.trailing_zeros() as usize)
    }

    /// Acquire a zeroed buffer of exactly `len` bytes from this pool
    pub fn acquire(&'static self, len: usize) -> PooledBuf {
        self.acquired.fetch_add(1, Ordering::Relaxed);

        let bucket = Self::bucket_index(len);
        let mut buf = match bucket {
            Some(i) => self.buckets[i]
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Vec::with_capacity(MIN_BUCKET << i)),
            None => Vec::with_capacity(len),
        };
        buf.clear();
        buf.resize(len, 0);

        PooledBuf {
            buf,
            bucket,
            pool: self,
        }
    }

    fn release(&self, mut buf: Vec<u8>, bucket: Option<usize>) {
        self.released.fetch_add(1, Ordering::Relaxed);

        if let Some(i) = bucket {
            let mut shelf = self.buckets[i].lock().unwrap();
            if shelf.len() < BUCKET_DEPTH {
                buf.clear();
                shelf.push(buf);
            }
        }
    }

    /// Number of buffers currently acquired and not yet released
    pub fn outstanding(&self) -> usize {
        self.acquired
            .load(Ordering::Relaxed)
            .saturating_sub(self.released.load(Ordering::Relaxed))
    }
}

impl Default for BytePool {
    fn default() -> Self {
        Self::new()
    }
}

/// An owned lease on a pool buffer.
///
/// Dropping the lease returns the buffer to its bucket, so release happens on
/// every exit path, including early `?` returns and panics.
pub struct PooledBuf {
    buf: Vec<u8>,
    bucket: Option<usize>,
    pool: &'static BytePool,
}

impl Deref for PooledBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(buf, self.bucket);
    }
}

impl std::fmt::Debug for PooledBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuf")
            .field("len", &self.buf.len())
            .finish()
    }
}

use bytes::BytesMut;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, OnceLock};

/// A small pool of reusable frame buffers.
///
/// `encode`/`build_frame` run on every outbound packet; without a pool each
/// one allocates fresh. `acquire` never suspends — it's a plain
/// `std::sync::Mutex`, never a `tokio::sync::Mutex` — so it's safe to call
/// from inside an async fn without risking a held lock across an await
/// point.
#[derive(Default)]
pub struct BufferPool {
    free: Mutex<Vec<BytesMut>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Borrow a buffer from the pool, allocating only if the pool is empty.
    /// The guard resets the buffer's length to zero and returns it to the
    /// pool when dropped.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self.free.lock().unwrap().pop().unwrap_or_default();
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    fn release(&self, mut buf: BytesMut) {
        buf.clear();
        self.free.lock().unwrap().push(buf);
    }
}

/// The process-wide pool used for one-shot packet encoding. A connection
/// doesn't own its own pool: frames are built and written one at a time, so
/// a single shared pool amortizes allocation across every connection.
pub fn global_pool() -> &'static BufferPool {
    static POOL: OnceLock<BufferPool> = OnceLock::new();
    POOL.get_or_init(BufferPool::new)
}

/// An exclusively-owned buffer on loan from a `BufferPool`.
pub struct PooledBuffer<'a> {
    buf: Option<BytesMut>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        self.buf.as_ref().expect("buffer taken before drop")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut BytesMut {
        self.buf.as_mut().expect("buffer taken before drop")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

//! Recycles fixed-size byte buffers used for binary sniffing.
//!
//! Acquired buffers may hold bytes from a previous caller; only the prefix a
//! caller has just written is meaningful.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

const DEFAULT_MAX_IDLE: usize = 64;

#[derive(Debug)]
pub struct BufferPool {
    buf_size: usize,
    max_idle: usize,
    idle: Mutex<Vec<Box<[u8]>>>,
}

impl BufferPool {
    pub fn new(buf_size: usize) -> Self {
        Self::with_max_idle(buf_size, DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(buf_size: usize, max_idle: usize) -> Self {
        Self {
            buf_size,
            max_idle,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn buf_size(&self) -> usize {
        self.buf_size
    }

    /// Hands out an idle buffer or allocates a fresh one. The buffer goes back
    /// to the pool when the guard drops, on every exit path.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buf_size].into_boxed_slice());
        PooledBuffer {
            pool: self,
            buf: Some(buf),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, buf: Box<[u8]>) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(buf);
        }
    }
}

/// Exclusive loan of one pooled buffer.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Box<[u8]>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

//! # Buffer Pool
//!
//! Recycles the growable line buffers used during rendering to keep the
//! per-request allocation count near zero.
//!
//! The pool is a bounded lock-free stack. Buffers that grow beyond the
//! retention ceiling are dropped on release instead of being pooled, so one
//! pathologically large line cannot pin memory for the rest of the process
//! lifetime.


use crossbeam_queue::ArrayQueue;
use std::ops::{Deref, DerefMut};

/// Buffers larger than this many bytes are discarded on release. Should be
/// larger than the typical access log line.
pub const DEFAULT_MAX_RETAINED: usize = 256;

/// Maximum number of idle buffers kept by default.
pub const DEFAULT_POOL_CAPACITY: usize = 128;

/// Initial capacity of a freshly allocated buffer.
const INITIAL_BUFFER_CAPACITY: usize = 128;

/// A bounded, lock-free pool of line buffers.
#[derive(Debug)]
pub struct BufferPool {
  idle: ArrayQueue<String>,
  max_retained: usize,
}

impl BufferPool {
  /// Creates a pool keeping at most `capacity` idle buffers and discarding
  /// released buffers whose capacity exceeds `max_retained` bytes.
  pub fn new(capacity: usize, max_retained: usize) -> Self {
    if capacity == 0 {
      panic!("pool capacity must be greater than 0");
    }
    Self {
      idle: ArrayQueue::new(capacity),
      max_retained,
    }
  }

  /// Pops a recycled buffer, or allocates a fresh one when the pool is
  /// empty. Never blocks.
  pub fn acquire(&self) -> PooledBuffer<'_> {
    let buf = self
      .idle
      .pop()
      .unwrap_or_else(|| String::with_capacity(INITIAL_BUFFER_CAPACITY));
    PooledBuffer {
      pool: self,
      buf: Some(buf),
    }
  }

  /// Number of idle buffers currently retained.
  pub fn idle_len(&self) -> usize {
    self.idle.len()
  }

  fn recycle(&self, mut buf: String) {
    if buf.capacity() > self.max_retained {
      return;
    }
    buf.clear();
    // push fails when the pool is full; the buffer is simply dropped.
    let _ = self.idle.push(buf);
  }
}

impl Default for BufferPool {
  fn default() -> Self {
    Self::new(DEFAULT_POOL_CAPACITY, DEFAULT_MAX_RETAINED)
  }
}

/// A line buffer borrowed from a [`BufferPool`].
///
/// Dereferences to `String` for writing. Dropping the guard resets the
/// buffer and returns it to the pool, unless it grew beyond the pool's
/// retention ceiling, in which case it is discarded.
#[derive(Debug)]
pub struct PooledBuffer<'a> {
  pool: &'a BufferPool,
  buf: Option<String>,
}

impl PooledBuffer<'_> {
  pub fn as_str(&self) -> &str {
    self.buf.as_deref().unwrap_or("")
  }

  /// Detaches the buffer from the pool; it will not be recycled.
  pub fn into_string(mut self) -> String {
    self.buf.take().unwrap_or_default()
  }
}

impl Deref for PooledBuffer<'_> {
  type Target = String;

  fn deref(&self) -> &String {
    // Present until drop or into_string by construction.
    self.buf.as_ref().expect("buffer already detached")
  }
}

impl DerefMut for PooledBuffer<'_> {
  fn deref_mut(&mut self) -> &mut String {
    self.buf.as_mut().expect("buffer already detached")
  }
}

impl Drop for PooledBuffer<'_> {
  fn drop(&mut self) {
    if let Some(buf) = self.buf.take() {
      self.pool.recycle(buf);
    }
  }
}

impl std::fmt::Display for PooledBuffer<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

//! Fixed-capacity lookahead window over the source image
//!
//! The window holds the bytes that still need classifying plus up to
//! [`CONTEXT_LEN`] bytes that were already consumed. It never grows: when the
//! unread part runs low it is moved to the front of the buffer and the space
//! behind it is refilled.

use std::io::{self, Read};

use crate::sector::CONTEXT_LEN;

/// Default window size: 1 MiB of lookahead plus 4 bytes
pub const WINDOW_CAPACITY: usize = 1_048_576 + 4;

pub struct Window {
    buf: Box<[u8]>,
    start: usize,
    len: usize,
}

impl Window {
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    /// Create a window with a custom capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not exceed [`CONTEXT_LEN`] plus one raw
    /// sector, since the classifier could then never see a whole sector.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity > CONTEXT_LEN + crate::domain::SECTOR_SIZE,
            "window capacity {} too small",
            capacity
        );
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            start: 0,
            len: 0,
        }
    }

    /// Unread bytes
    pub fn available(&self) -> usize {
        self.len
    }

    /// Unread bytes, in order
    pub fn data(&self) -> &[u8] {
        &self.buf[self.start..self.start + self.len]
    }

    /// Up to [`CONTEXT_LEN`] already-consumed bytes right before [`Window::data`]
    pub fn context(&self) -> &[u8] {
        &self.buf[self.start.saturating_sub(CONTEXT_LEN)..self.start]
    }

    /// Mark `n` unread bytes as consumed
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.len, "consuming {} of {} bytes", n, self.len);
        self.start += n;
        self.len -= n;
    }

    /// Free space behind the unread bytes
    pub fn spare(&self) -> usize {
        self.buf.len() - self.start - self.len
    }

    /// Move the context and unread bytes to the front of the buffer
    pub fn compact(&mut self) {
        let keep_from = self.start.saturating_sub(CONTEXT_LEN);
        if keep_from == 0 {
            return;
        }
        self.buf.copy_within(keep_from..self.start + self.len, 0);
        self.start -= keep_from;
    }

    /// Bytes a refill limited to `limit` asks for once compacted
    pub fn refill_len(&self, limit: u64) -> usize {
        let spare = self.buf.len() - (self.start.min(CONTEXT_LEN) + self.len);
        (spare as u64).min(limit) as usize
    }

    /// Compact, then read up to `limit` bytes from `reader` into the free space
    ///
    /// Reads exactly [`Window::refill_len`] bytes; a source that ends early is
    /// an error. Returns the number of bytes added.
    pub fn refill<R: Read>(&mut self, reader: &mut R, limit: u64) -> io::Result<usize> {
        let want = self.refill_len(limit);
        self.compact();
        let end = self.start + self.len;
        reader.read_exact(&mut self.buf[end..end + want])?;
        self.len += want;
        Ok(want)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

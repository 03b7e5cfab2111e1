//! Chunked line splitting over any `Read`.

use crate::consts::{INITIAL_LINE_CAPACITY, READ_CHUNK_SIZE};
use crate::errors::{FfbfError, Result};
use std::io::{ErrorKind, Read};

/// Holds the part of a line that straddles read chunks.
///
/// Capacity is tracked explicitly and doubles until it covers the line being
/// assembled; it never shrinks.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buf: Vec::with_capacity(capacity), capacity }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn len(&self) -> usize { self.buf.len() }

    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    pub fn as_slice(&self) -> &[u8] { &self.buf }

    pub fn clear(&mut self) { self.buf.clear(); }

    pub fn extend(&mut self, bytes: &[u8]) {
        let needed = self.buf.len() + bytes.len();
        if needed > self.capacity {
            while self.capacity < needed {
                self.capacity *= 2;
            }
            self.buf.reserve_exact(self.capacity - self.buf.len());
        }
        self.buf.extend_from_slice(bytes);
    }
}

impl Default for LineBuffer {
    fn default() -> Self { Self::with_capacity(INITIAL_LINE_CAPACITY) }
}

/// Splits a stream into delimiter-terminated lines without the delimiter.
/// A final line without a trailing delimiter is still reported.
pub struct LineReader<R> {
    inner: R,
    delimiter: u8,
    read_op: &'static str,
    chunk: Vec<u8>,
    carry: LineBuffer,
}

impl<R: Read> LineReader<R> {
    /// `read_op` labels read failures, e.g. "read corpus".
    pub fn new(inner: R, delimiter: u8, read_op: &'static str) -> Self {
        Self::with_chunk_size(inner, delimiter, read_op, READ_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, delimiter: u8, read_op: &'static str, chunk_size: usize) -> Self {
        Self {
            inner,
            delimiter,
            read_op,
            chunk: vec![0u8; chunk_size.max(1)],
            carry: LineBuffer::default(),
        }
    }

    pub fn carry_capacity(&self) -> usize { self.carry.capacity() }

    /// Calls `f` once per line, in order; returns the number of lines.
    pub fn for_each_line<F>(&mut self, mut f: F) -> Result<u64>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let Self { inner, delimiter, read_op, chunk, carry } = self;
        let delim = *delimiter;
        let mut lines = 0u64;
        loop {
            let n = match inner.read(chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FfbfError::resource(*read_op, e)),
            };
            let data = &chunk[..n];
            let mut start = 0usize;
            while let Some(off) = data[start..].iter().position(|&b| b == delim) {
                let end = start + off;
                if carry.is_empty() {
                    f(&data[start..end])?;
                } else {
                    carry.extend(&data[start..end]);
                    f(carry.as_slice())?;
                    carry.clear();
                }
                lines += 1;
                start = end + 1;
            }
            if start < n {
                carry.extend(&data[start..]);
            }
        }
        if !carry.is_empty() {
            f(carry.as_slice())?;
            carry.clear();
            lines += 1;
        }
        Ok(lines)
    }
}

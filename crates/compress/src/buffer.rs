//! Reusable byte buffers with a fixed growth increment.
//!
//! A [`GrowableBuffer`] starts at an initial capacity and, when a write
//! needs more room, grows by whole multiples of its increment. It never
//! shrinks on its own: [`GrowableBuffer::clear`] resets the length and keeps
//! the allocation for the next call.

use std::io::{self, Write};

/// Initial capacity of a compressor buffer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 4096;

/// Growth step of a compressor buffer.
pub const DEFAULT_GROWTH_INCREMENT: usize = 16 * 1024;

/// Byte buffer that grows in fixed increments and is reused across calls.
#[derive(Clone, Debug)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    increment: usize,
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_CAPACITY, DEFAULT_GROWTH_INCREMENT)
    }
}

impl GrowableBuffer {
    /// Allocates a buffer of `initial_capacity` bytes growing by `increment`.
    ///
    /// An increment of zero is treated as one byte.
    #[must_use]
    pub fn new(initial_capacity: usize, increment: usize) -> Self {
        Self {
            data: Vec::with_capacity(initial_capacity),
            increment: increment.max(1),
        }
    }

    /// Filled bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of filled bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Reports whether the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Growth step.
    #[must_use]
    pub const fn increment(&self) -> usize {
        self.increment
    }

    /// Forgets the contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Makes room for `additional` more bytes.
    ///
    /// The capacity grows by the smallest multiple of the increment that
    /// fits; allocation failure is reported as [`io::ErrorKind::OutOfMemory`].
    pub fn ensure_capacity(&mut self, additional: usize) -> io::Result<()> {
        let needed = self
            .data
            .len()
            .checked_add(additional)
            .ok_or_else(out_of_memory)?;
        let capacity = self.data.capacity();
        if needed <= capacity {
            return Ok(());
        }

        let steps = (needed - capacity).div_ceil(self.increment);
        let target = steps
            .checked_mul(self.increment)
            .and_then(|grow| capacity.checked_add(grow))
            .ok_or_else(out_of_memory)?;
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| out_of_memory())?;

        #[cfg(feature = "tracing")]
        logging::trace_stream!(from = capacity, to = self.data.capacity(), "buffer grown");

        Ok(())
    }

    /// Resizes the buffer to exactly `len` bytes and returns them for writing.
    ///
    /// Used as scratch space; previous contents beyond the old length are zeroed.
    pub fn scratch(&mut self, len: usize) -> io::Result<&mut [u8]> {
        if len > self.data.len() {
            self.ensure_capacity(len - self.data.len())?;
        }
        self.data.resize(len, 0);
        Ok(&mut self.data[..])
    }

    /// Consumes the buffer, returning its contents.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Write for GrowableBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_capacity(buf.len())?;
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn out_of_memory() -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, "buffer allocation failed")
}

/// Input and output buffers owned by one compressor.
#[derive(Clone, Debug, Default)]
pub struct Buffers {
    /// Staging area for data read from the source.
    pub input: GrowableBuffer,
    /// Destination of the buffer-returning compressor calls.
    pub output: GrowableBuffer,
}

impl Buffers {
    /// Allocates both buffers with the same sizing policy.
    #[must_use]
    pub fn new(initial_capacity: usize, increment: usize) -> Self {
        Self {
            input: GrowableBuffer::new(initial_capacity, increment),
            output: GrowableBuffer::new(initial_capacity, increment),
        }
    }

    /// Clears both buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}

//! Chunk sequences: a Start chunk, data chunks, then a terminator.
//!
//! [`ChunkWriter`] splits a byte stream into blocks of at most
//! `block_size` raw bytes, frames each one with [`ChunkCodec`], and brackets
//! the sequence with a Start chunk announcing the total uncompressed length
//! and a Stop (or Null) chunk. [`ChunkReader`] reverses the process from any
//! [`Read`] source, verifying every chunk as well as the announced total.
//!
//! On the wire each chunk starts with its four-byte length field, so a
//! reader needs no external delimiters:
//!
//! ```text
//! [Start total] [data] [data] ... [Stop | 00 00 00 00]
//! ```
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//! use compress::sequence::{ChunkReader, ChunkWriter};
//!
//! let data = b"chunked chunked chunked chunked".repeat(100);
//!
//! let mut writer = ChunkWriter::new(Vec::new(), data.len() as u32).unwrap();
//! writer.write_all(&data).unwrap();
//! let framed = writer.finish().unwrap();
//!
//! let mut reader = ChunkReader::new(framed.as_slice()).unwrap();
//! assert_eq!(reader.read_all().unwrap(), data);
//! ```

use std::io::{self, Read, Write};

use crate::chunk::{ChunkCodec, ChunkError};
use crate::codec::{CodecError, RawCodec};
use crate::common::fill_prefix;
use crate::header::{
    ChunkHeader, ChunkType, FrameError, HEADER_SIZE, LENGTH_FIELD_SIZE, NULL_CHUNK,
    total_length_from_prefix,
};
use crate::lzo::Lzo;

/// Default number of raw bytes per data chunk.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Default upper bound for a single chunk accepted by [`ChunkReader`].
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 64 * 1024 * 1024 + HEADER_SIZE + 64 * 1024;

/// Reports whether `prefix` begins with a valid Start chunk.
///
/// Only the first [`HEADER_SIZE`] bytes are inspected. Shorter prefixes and
/// anything that fails header verification return `false`.
#[must_use]
pub fn looks_chunked(prefix: &[u8]) -> bool {
    prefix
        .get(..HEADER_SIZE)
        .and_then(ChunkHeader::try_read_start)
        .is_some_and(|header| header.chunk_type() == ChunkType::Start)
}

/// Tunables for [`ChunkWriter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriterConfig {
    /// Raw bytes per data chunk.
    pub block_size: usize,
    /// Terminate with a four-byte Null chunk instead of a Stop chunk.
    pub null_terminator: bool,
    /// Store blocks verbatim when compression would not shrink them.
    pub store_incompressible: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            null_terminator: false,
            store_incompressible: true,
        }
    }
}

impl WriterConfig {
    /// Sets the number of raw bytes per data chunk; zero is treated as one.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Chooses the Null chunk as terminator.
    #[must_use]
    pub const fn with_null_terminator(mut self, enabled: bool) -> Self {
        self.null_terminator = enabled;
        self
    }

    /// Enables or disables storing incompressible blocks verbatim.
    #[must_use]
    pub const fn with_store_incompressible(mut self, enabled: bool) -> Self {
        self.store_incompressible = enabled;
        self
    }
}

/// Writes a chunk sequence to an underlying sink.
///
/// The Start chunk is written on construction. Call
/// [`ChunkWriter::finish`] to emit the final data chunk and the terminator;
/// dropping the writer without finishing leaves an unterminated sequence.
pub struct ChunkWriter<W: Write, C: RawCodec = Lzo> {
    inner: W,
    codec: ChunkCodec<C>,
    config: WriterConfig,
    pending: Vec<u8>,
    chunk: Vec<u8>,
    declared: u32,
    written: u64,
    chunks: u64,
}

impl<W: Write> ChunkWriter<W> {
    /// Starts a sequence of `total_length` bytes with the default LZO codec and settings.
    pub fn new(inner: W, total_length: u32) -> Result<Self, ChunkError> {
        Self::with_config(
            inner,
            ChunkCodec::new()?,
            total_length,
            WriterConfig::default(),
        )
    }
}

impl<W: Write, C: RawCodec> ChunkWriter<W, C> {
    /// Starts a sequence with an explicit codec and configuration.
    pub fn with_config(
        mut inner: W,
        codec: ChunkCodec<C>,
        total_length: u32,
        config: WriterConfig,
    ) -> Result<Self, ChunkError> {
        inner.write_all(&ChunkHeader::for_start(total_length))?;
        let config = config.with_block_size(config.block_size);
        Ok(Self {
            inner,
            codec,
            config,
            pending: Vec::with_capacity(config.block_size),
            chunk: Vec::new(),
            declared: total_length,
            written: 0,
            chunks: 0,
        })
    }

    /// Total announced by the Start chunk.
    #[must_use]
    pub const fn declared_length(&self) -> u32 {
        self.declared
    }

    /// Raw bytes accepted so far, including buffered ones.
    #[must_use]
    pub fn bytes_accepted(&self) -> u64 {
        self.written + self.pending.len() as u64
    }

    /// Data chunks emitted so far.
    #[must_use]
    pub const fn chunks_written(&self) -> u64 {
        self.chunks
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Writes the remaining data and the terminator, returning the sink.
    ///
    /// Fails with [`ChunkError::TotalLengthMismatch`] if fewer bytes were
    /// written than the Start chunk announced.
    pub fn finish(mut self) -> Result<W, ChunkError> {
        if !self.pending.is_empty() {
            self.emit_pending()?;
        }
        if self.written != u64::from(self.declared) {
            return Err(ChunkError::TotalLengthMismatch {
                declared: u64::from(self.declared),
                actual: self.written,
            });
        }

        if self.config.null_terminator {
            self.inner.write_all(&NULL_CHUNK)?;
        } else {
            self.inner.write_all(&ChunkHeader::for_stop())?;
        }
        self.inner.flush()?;

        #[cfg(feature = "tracing")]
        logging::trace_chunk!(
            total = self.written,
            chunks = self.chunks,
            null_terminator = self.config.null_terminator,
            "finished chunk sequence"
        );

        Ok(self.inner)
    }

    fn emit_pending(&mut self) -> Result<(), ChunkError> {
        if self.config.store_incompressible {
            self.chunk = self.codec.compress_or_store(&self.pending)?;
        } else {
            self.codec.compress_into(&self.pending, &mut self.chunk)?;
        }
        self.inner.write_all(&self.chunk)?;
        self.written += self.pending.len() as u64;
        self.chunks += 1;
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write, C: RawCodec> Write for ChunkWriter<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = u64::from(self.declared) - self.bytes_accepted();
        if buf.len() as u64 > room {
            return Err(ChunkError::TotalLengthMismatch {
                declared: u64::from(self.declared),
                actual: self.bytes_accepted() + buf.len() as u64,
            }
            .into());
        }

        let take = buf.len().min(self.config.block_size - self.pending.len());
        self.pending.extend_from_slice(&buf[..take]);
        if self.pending.len() == self.config.block_size {
            self.emit_pending()?;
        }
        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reads and verifies a chunk sequence from an underlying source.
///
/// Also implements [`Read`], yielding the decompressed bytes of every data
/// chunk in order.
pub struct ChunkReader<R: Read, C: RawCodec = Lzo> {
    inner: R,
    codec: ChunkCodec<C>,
    max_chunk_length: usize,
    chunk: Vec<u8>,
    declared: Option<u32>,
    produced: u64,
    finished: bool,
    current: Vec<u8>,
    position: usize,
}

impl<R: Read> ChunkReader<R> {
    /// Creates a reader using the default LZO codec.
    pub fn new(inner: R) -> Result<Self, CodecError> {
        Ok(Self::with_codec(inner, ChunkCodec::new()?))
    }
}

impl<R: Read, C: RawCodec> ChunkReader<R, C> {
    /// Creates a reader with an explicit codec.
    pub fn with_codec(inner: R, codec: ChunkCodec<C>) -> Self {
        Self {
            inner,
            codec,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            chunk: Vec::new(),
            declared: None,
            produced: 0,
            finished: false,
            current: Vec::new(),
            position: 0,
        }
    }

    /// Limits the size of a single chunk; larger chunks fail with [`FrameError::ChunkTooLong`].
    #[must_use]
    pub fn with_max_chunk_length(mut self, max_chunk_length: usize) -> Self {
        self.max_chunk_length = max_chunk_length.max(HEADER_SIZE);
        self
    }

    /// Total announced by the Start chunk, once it has been read.
    #[must_use]
    pub const fn declared_length(&self) -> Option<u32> {
        self.declared
    }

    /// Reports whether the terminator has been read.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns the payload of the next data chunk, or `None` after the terminator.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ChunkError> {
        if self.finished {
            return Ok(None);
        }
        let declared = match self.declared {
            Some(declared) => declared,
            None => self.read_start()?,
        };
        if self.finished {
            return Ok(None);
        }

        if !self.read_chunk()? {
            return Err(ChunkError::MissingStop);
        }
        let (header, payload) = ChunkHeader::read(&self.chunk)?;
        match header.chunk_type() {
            ChunkType::Stop => {
                self.finished = true;
                if self.produced != u64::from(declared) {
                    return Err(ChunkError::TotalLengthMismatch {
                        declared: u64::from(declared),
                        actual: self.produced,
                    });
                }

                #[cfg(feature = "tracing")]
                logging::trace_chunk!(
                    total = self.produced,
                    null_terminator = header.is_null(),
                    "read chunk sequence"
                );

                Ok(None)
            }
            ChunkType::Start => Err(FrameError::UnexpectedChunkType {
                expected: "data or stop",
                found: ChunkType::Start,
            }
            .into()),
            ChunkType::None | ChunkType::Lzo1x => {
                // Checked before decoding so a forged length cannot force an allocation.
                let remaining = u64::from(declared).saturating_sub(self.produced);
                let length = u64::from(header.uncompressed_length());
                if length > remaining {
                    return Err(ChunkError::TotalLengthMismatch {
                        declared: u64::from(declared),
                        actual: self.produced + length,
                    });
                }
                let data = self.codec.payload(&header, payload)?;
                self.produced += data.len() as u64;
                Ok(Some(data))
            }
        }
    }

    /// Reads the whole sequence and verifies nothing follows the terminator.
    pub fn read_all(&mut self) -> Result<Vec<u8>, ChunkError> {
        let mut output = Vec::new();
        while let Some(data) = self.next_chunk()? {
            output.extend_from_slice(&data);
        }
        let mut extra = [0u8; 1];
        if fill_prefix(&mut self.inner, &mut extra)? != 0 {
            return Err(ChunkError::TrailingData);
        }
        Ok(output)
    }

    fn read_start(&mut self) -> Result<u32, ChunkError> {
        if !self.read_chunk()? {
            return Err(ChunkError::MissingStop);
        }
        let (header, _) = ChunkHeader::read(&self.chunk)?;
        match header.chunk_type() {
            ChunkType::Start => {}
            ChunkType::Stop => self.finished = true,
            found @ (ChunkType::None | ChunkType::Lzo1x) => {
                return Err(ChunkError::MissingStart { found });
            }
        }
        self.declared = Some(header.uncompressed_length());
        Ok(header.uncompressed_length())
    }

    /// Loads the next complete chunk into `self.chunk`; `false` on a clean end of input.
    fn read_chunk(&mut self) -> Result<bool, ChunkError> {
        let mut prefix = [0u8; LENGTH_FIELD_SIZE];
        match fill_prefix(&mut self.inner, &mut prefix)? {
            0 => return Ok(false),
            LENGTH_FIELD_SIZE => {}
            _ => return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
        }

        let total = total_length_from_prefix(prefix);
        if total > self.max_chunk_length {
            return Err(FrameError::ChunkTooLong {
                len: total,
                max: self.max_chunk_length,
            }
            .into());
        }

        self.chunk.clear();
        self.chunk
            .try_reserve(total)
            .map_err(|_| CodecError::OutOfMemory)?;
        self.chunk.extend_from_slice(&prefix);
        self.chunk.resize(total, 0);
        self.inner.read_exact(&mut self.chunk[LENGTH_FIELD_SIZE..])?;
        Ok(true)
    }
}

impl<R: Read, C: RawCodec> Read for ChunkReader<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position == self.current.len() {
            match self.next_chunk()? {
                Some(data) => {
                    self.current = data;
                    self.position = 0;
                }
                None => return Ok(0),
            }
        }
        let available = &self.current[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }
}

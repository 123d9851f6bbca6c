//! Whole-stream zlib/gzip compression with reusable buffers.
//!
//! [`StreamCompressor`] is the counterpart of the chunk framing layer for
//! callers that want a plain zlib or gzip container, byte-compatible with
//! the standard tools. Every operation reduces to one of two loops:
//!
//! - **encode** pulls fixed-size blocks from the source and feeds them to an
//!   encoder opened with the configured [`Encoding`] and [`Level`], then
//!   writes the trailer. It returns the number of bytes consumed.
//! - **decode** opens a decoder for the configured [`Decoding`] (sniffing the
//!   container when it is [`Decoding::Guess`]) and copies the decoded bytes
//!   to the sink. It returns the number of bytes produced.
//!
//! The `*_buffer` variants read from a slice and/or write into an internal
//! [`GrowableBuffer`](crate::buffer::GrowableBuffer). Buffers are created on
//! first use, reused by later calls, and released by
//! [`StreamCompressor::close`] or on drop.
//!
//! # Errors
//!
//! Failures carry the stage they occurred in ([`StreamError`]). After an
//! error the contents of the sink or internal output buffer are incomplete
//! and must be discarded.
//!
//! # Examples
//!
//! ```
//! use compress::options::{Decoding, Encoding};
//! use compress::stream::StreamCompressor;
//!
//! let mut compressor = StreamCompressor::new();
//! compressor.set_encoding(Encoding::Gzip);
//! let compressed = compressor.encode_buffer(b"round and round").unwrap().to_vec();
//!
//! compressor.set_decoding(Decoding::Guess);
//! assert_eq!(compressor.decode_buffer(&compressed).unwrap(), b"round and round");
//! ```

use std::io::{self, Read, Write};

use crate::buffer::{Buffers, DEFAULT_GROWTH_INCREMENT, DEFAULT_INITIAL_CAPACITY, GrowableBuffer};
use crate::common::{CountingReader, CountingWriter, fill_prefix};
use crate::options::{CompressionOptions, Decoding, Encoding, Level, OptionError};
use crate::zlib;

/// Size of the blocks moved between source, codec and sink.
pub const CHUNK_SIZE: usize = 4096;

/// Failure of a stream compressor call.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The encoder or the sink behind it failed.
    #[error("compression failed: {0}")]
    CompressionFailed(#[source] io::Error),

    /// The input is not a valid stream for the selected decoding.
    #[error("decompression failed: {0}")]
    DecompressionFailed(#[source] io::Error),

    /// The input ended before the compressed stream did.
    #[error("compressed stream truncated after {consumed} input bytes")]
    TruncatedStream {
        /// Bytes read from the source before it ran dry.
        consumed: u64,
    },

    /// Reading the source or writing decoded output failed.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io(io_err) => io_err,
            StreamError::TruncatedStream { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Reusable zlib/gzip compressor and decompressor.
///
/// Not meant for concurrent use; give each thread its own instance.
#[derive(Debug)]
pub struct StreamCompressor {
    options: CompressionOptions,
    buffers: Option<Buffers>,
    initial_capacity: usize,
    growth_increment: usize,
}

impl Default for StreamCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCompressor {
    /// Creates a compressor with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(CompressionOptions::default())
    }

    /// Creates a compressor with the given options.
    #[must_use]
    pub fn with_options(options: CompressionOptions) -> Self {
        Self {
            options,
            buffers: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_increment: DEFAULT_GROWTH_INCREMENT,
        }
    }

    /// Overrides the sizing policy of the internal buffers.
    ///
    /// Takes effect the next time buffers are allocated.
    #[must_use]
    pub fn with_buffer_sizes(mut self, initial_capacity: usize, growth_increment: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self.growth_increment = growth_increment;
        self
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Mutable access to the options, for the `key=value` setters.
    pub fn options_mut(&mut self) -> &mut CompressionOptions {
        &mut self.options
    }

    /// Sets the encoding used by the `encode*` family.
    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.options.set_encoding(encoding);
        self
    }

    /// Sets the encoding from an identifier, failing on unknown identifiers.
    pub fn try_set_encoding(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.options.try_set_encoding(identifier)?;
        Ok(self)
    }

    /// Sets the encoding from an identifier, using the default for unknown identifiers.
    pub fn set_encoding_or_default(&mut self, identifier: &str) -> &mut Self {
        self.options.set_encoding_or_default(identifier);
        self
    }

    /// Sets the decoding used by the `decode*` family.
    pub fn set_decoding(&mut self, decoding: Decoding) -> &mut Self {
        self.options.set_decoding(decoding);
        self
    }

    /// Sets the decoding from an identifier, failing on unknown identifiers.
    pub fn try_set_decoding(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.options.try_set_decoding(identifier)?;
        Ok(self)
    }

    /// Sets the decoding from an identifier, using the default for unknown identifiers.
    pub fn set_decoding_or_default(&mut self, identifier: &str) -> &mut Self {
        self.options.set_decoding_or_default(identifier);
        self
    }

    /// Sets the compression level.
    pub fn set_level(&mut self, level: Level) -> &mut Self {
        self.options.set_level(level);
        self
    }

    /// Sets the level from an identifier, failing on unknown or out-of-range values.
    pub fn try_set_level(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.options.try_set_level(identifier)?;
        Ok(self)
    }

    /// Sets the level from an identifier, using the default for unknown or out-of-range values.
    pub fn set_level_or_default(&mut self, identifier: &str) -> &mut Self {
        self.options.set_level_or_default(identifier);
        self
    }

    /// Compresses everything `input` yields into `output`.
    ///
    /// Returns the number of bytes consumed from `input`.
    pub fn encode<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<u64, StreamError> {
        let options = self.options;
        let buffers = self.buffers();
        encode_stream(&options, input, output, &mut buffers.input)
    }

    /// Compresses `data` into the internal output buffer and returns it.
    pub fn encode_buffer(&mut self, data: &[u8]) -> Result<&[u8], StreamError> {
        self.encode_to_buffer(data)
    }

    /// Compresses everything `input` yields into the internal output buffer and returns it.
    pub fn encode_to_buffer<R: Read>(&mut self, input: R) -> Result<&[u8], StreamError> {
        let options = self.options;
        let Buffers {
            input: scratch,
            output,
        } = self.buffers();
        output.clear();
        encode_stream(&options, input, &mut *output, scratch)?;
        Ok(output.as_slice())
    }

    /// Compresses `data` into `output`, returning the number of bytes consumed.
    pub fn encode_from_buffer<W: Write>(
        &mut self,
        data: &[u8],
        output: W,
    ) -> Result<u64, StreamError> {
        self.encode(data, output)
    }

    /// Decompresses everything `input` yields into `output`.
    ///
    /// Returns the number of decoded bytes written to `output`.
    pub fn decode<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<u64, StreamError> {
        let decoding = self.options.decoding();
        let buffers = self.buffers();
        decode_stream(decoding, input, output, &mut buffers.input)
    }

    /// Decompresses `data` into the internal output buffer and returns it.
    pub fn decode_buffer(&mut self, data: &[u8]) -> Result<&[u8], StreamError> {
        self.decode_to_buffer(data)
    }

    /// Decompresses everything `input` yields into the internal output buffer and returns it.
    pub fn decode_to_buffer<R: Read>(&mut self, input: R) -> Result<&[u8], StreamError> {
        let decoding = self.options.decoding();
        let Buffers {
            input: scratch,
            output,
        } = self.buffers();
        output.clear();
        decode_stream(decoding, input, &mut *output, scratch)?;
        Ok(output.as_slice())
    }

    /// Decompresses `data` into `output`, returning the number of decoded bytes.
    pub fn decode_from_buffer<W: Write>(
        &mut self,
        data: &[u8],
        output: W,
    ) -> Result<u64, StreamError> {
        self.decode(data, output)
    }

    /// Reports whether internal buffers are currently allocated.
    #[must_use]
    pub const fn has_buffers(&self) -> bool {
        self.buffers.is_some()
    }

    /// Releases the internal buffers; later calls allocate them again.
    pub fn close(&mut self) {
        self.buffers = None;
    }

    fn buffers(&mut self) -> &mut Buffers {
        let (initial, increment) = (self.initial_capacity, self.growth_increment);
        self.buffers
            .get_or_insert_with(|| Buffers::new(initial, increment))
    }
}

fn encode_stream<R: Read, W: Write>(
    options: &CompressionOptions,
    mut input: R,
    output: W,
    scratch: &mut GrowableBuffer,
) -> Result<u64, StreamError> {
    let block = scratch.scratch(CHUNK_SIZE).map_err(StreamError::Io)?;
    let mut writer = zlib::open_writer(output, options.encoding(), options.level());
    let mut consumed = 0u64;

    loop {
        let n = match input.read(block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::Io(e)),
        };
        writer
            .write_all(&block[..n])
            .map_err(StreamError::CompressionFailed)?;
        consumed += n as u64;
    }
    writer.finish().map_err(StreamError::CompressionFailed)?;

    #[cfg(feature = "tracing")]
    logging::trace_stream!(
        encoding = %options.encoding(),
        level = %options.level(),
        consumed,
        "encoded stream"
    );

    Ok(consumed)
}

fn decode_stream<R: Read, W: Write>(
    decoding: Decoding,
    input: R,
    output: W,
    scratch: &mut GrowableBuffer,
) -> Result<u64, StreamError> {
    let block = scratch.scratch(CHUNK_SIZE).map_err(StreamError::Io)?;
    let mut source = CountingReader::new(input);
    let mut prefix = [0u8; 2];

    let (framing, sniffed) = match decoding.framing() {
        Some(framing) => (framing, 0),
        None => {
            let n = fill_prefix(&mut source, &mut prefix).map_err(StreamError::Io)?;
            (zlib::detect_framing(&prefix[..n]), n)
        }
    };

    #[cfg(feature = "tracing")]
    logging::trace_stream!(
        decoding = %decoding,
        framing = %framing,
        "selected input framing"
    );

    let mut sink = CountingWriter::new(output);
    let mut reader = zlib::open_reader((&prefix[..sniffed]).chain(&mut source), framing);
    let result = copy_blocks(&mut reader, &mut sink, block);
    drop(reader);

    match result {
        Ok(()) => {
            #[cfg(feature = "tracing")]
            logging::trace_stream!(
                consumed = source.bytes_read(),
                produced = sink.bytes_written(),
                "decoded stream"
            );
            Ok(sink.bytes_written())
        }
        Err(Failure::Write(e)) => Err(StreamError::Io(e)),
        Err(Failure::Read(e)) if source.source_failed() => Err(StreamError::Io(e)),
        Err(Failure::Read(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(StreamError::TruncatedStream {
                consumed: source.bytes_read(),
            })
        }
        Err(Failure::Read(e)) => Err(StreamError::DecompressionFailed(e)),
    }
}

enum Failure {
    Read(io::Error),
    Write(io::Error),
}

fn copy_blocks<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    block: &mut [u8],
) -> Result<(), Failure> {
    loop {
        let n = match reader.read(block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Failure::Read(e)),
        };
        writer.write_all(&block[..n]).map_err(Failure::Write)?;
    }
    writer.flush().map_err(Failure::Write)
}

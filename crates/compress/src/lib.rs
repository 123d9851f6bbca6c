#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` implements two independent ways of wrapping compressed bytes
//! with enough metadata to be read back safely:
//!
//! - **Chunk framing**: every block of data becomes a self-describing chunk
//!   with a 16-byte header carrying its length, a CRC32, a type and the
//!   uncompressed size. Payloads are compressed with a pure-Rust LZO1X codec
//!   or stored verbatim. Chunks can be strung into sequences bracketed by a
//!   Start chunk (announcing the total) and a Stop or Null chunk.
//! - **Stream compression**: a whole byte stream becomes one zlib or gzip
//!   container, byte-compatible with the standard tools, with the container
//!   optionally sniffed on input.
//!
//! # Design
//!
//! Leaf to root:
//!
//! - [`header`] serialises, parses and verifies chunk headers.
//! - [`codec`] defines the [`RawCodec`] contract and its [`CodecError`]
//!   taxonomy; [`lzo`] implements it for LZO1X.
//! - [`chunk`] turns one buffer into one chunk and back; [`sequence`] reads
//!   and writes whole chunk sequences over [`std::io`].
//! - [`options`], [`buffer`] and [`zlib`] support [`stream`], whose
//!   [`StreamCompressor`] drives zlib/gzip encoding and decoding.
//!
//! # Invariants
//!
//! - Chunk headers use little-endian fields in a fixed order; the CRC covers
//!   the type, the uncompressed length and the payload.
//! - Decoders never write outside the caller's buffer and never return
//!   silently truncated output.
//! - Codec workspaces and compressor buffers are owned by one instance and
//!   reused across calls; instances are not shared between threads.
//!
//! # Errors
//!
//! Each layer has its own error enum: [`FrameError`], [`CodecError`],
//! [`ChunkError`], [`OptionError`] and [`StreamError`]. The ones that cross
//! an I/O boundary convert into [`std::io::Error`].
//!
//! # Examples
//!
//! ```
//! use compress::chunk::ChunkCodec;
//! use compress::stream::StreamCompressor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut chunks = ChunkCodec::new()?;
//! let chunk = chunks.compress(b"framed payload")?;
//! assert_eq!(chunks.decompress(&chunk)?, b"framed payload");
//!
//! let mut stream = StreamCompressor::new();
//! let compressed = stream.encode_buffer(b"streamed payload")?.to_vec();
//! assert_eq!(stream.decode_buffer(&compressed)?, b"streamed payload");
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod chunk;
pub mod codec;
mod common;
pub mod format;
pub mod header;
pub mod lzo;
pub mod options;
pub mod sequence;
pub mod stream;
pub mod zlib;

pub use chunk::{ChunkCodec, ChunkError};
pub use codec::{CodecError, RawCodec};
pub use common::{CountingReader, CountingSink, CountingWriter, fill_prefix};
pub use format::{Format, FormatParseError};
pub use header::{ChunkHeader, ChunkType, FrameError};
pub use lzo::Lzo;
pub use options::{CompressionOptions, Decoding, Encoding, Level, OptionError};
pub use sequence::{ChunkReader, ChunkWriter, WriterConfig, looks_chunked};
pub use stream::{StreamCompressor, StreamError};

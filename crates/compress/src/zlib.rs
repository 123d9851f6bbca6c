//! # Overview
//!
//! DEFLATE container plumbing for the stream compressor. [`open_writer`]
//! wraps a sink in a zlib or gzip encoder (or passes bytes through for
//! [`Encoding::None`]), and [`open_reader`] does the reverse for a source.
//! [`detect_framing`] sniffs the container from the first two bytes.
//!
//! # Invariants
//!
//! - A zlib stream is only accepted once the decoder reports its end; input
//!   that runs out first yields [`io::ErrorKind::UnexpectedEof`] instead of
//!   silently truncated output.
//! - A gzip stream is only accepted once its trailer checksum and length
//!   match the decoded data.
//!
//! # Examples
//!
//! ```
//! use compress::options::{Encoding, Level};
//! use compress::zlib::{compress_to_vec, decompress_to_vec, detect_framing};
//!
//! let data = b"highly compressible payload payload payload";
//! let compressed = compress_to_vec(data, Encoding::Gzip, Level::Best).unwrap();
//! assert_eq!(detect_framing(&compressed), Encoding::Gzip);
//! assert_eq!(decompress_to_vec(&compressed, Encoding::Gzip).unwrap(), data);
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};

use flate2::{
    Compression, Decompress, FlushDecompress, Status, read::GzDecoder, write::GzEncoder,
    write::ZlibEncoder,
};

use crate::options::{Encoding, Level};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const DEFLATE_METHOD: u8 = 8;

impl From<Level> for Compression {
    fn from(level: Level) -> Self {
        match level {
            Level::None => Compression::none(),
            Level::Fast => Compression::fast(),
            Level::Normal => Compression::default(),
            Level::Best => Compression::best(),
            Level::Precise(value) => Compression::new(u32::from(value.get())),
        }
    }
}

/// Identifies the container of a stream from its first bytes.
///
/// Gzip is recognised by its magic number. zlib is recognised by a header
/// naming the DEFLATE method with a window of at most 32 KiB and a valid
/// header check. Anything else, including prefixes shorter than two bytes,
/// is treated as raw data.
#[must_use]
pub fn detect_framing(prefix: &[u8]) -> Encoding {
    match prefix {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => Encoding::Gzip,
        [cmf, flg, ..]
            if cmf & 0x0f == DEFLATE_METHOD
                && cmf >> 4 <= 7
                && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0 =>
        {
            Encoding::Zlib
        }
        _ => Encoding::None,
    }
}

/// Compressing writer for one of the supported containers.
pub enum DeflateWriter<W: Write> {
    /// Bytes are forwarded unchanged.
    Plain(W),
    /// zlib container.
    Zlib(ZlibEncoder<W>),
    /// gzip container.
    Gzip(GzEncoder<W>),
}

/// Opens a compressing writer over `sink`.
pub fn open_writer<W: Write>(sink: W, encoding: Encoding, level: Level) -> DeflateWriter<W> {
    match encoding {
        Encoding::None => DeflateWriter::Plain(sink),
        Encoding::Zlib => DeflateWriter::Zlib(ZlibEncoder::new(sink, level.into())),
        Encoding::Gzip => DeflateWriter::Gzip(GzEncoder::new(sink, level.into())),
    }
}

impl<W: Write> DeflateWriter<W> {
    /// Writes any trailer and returns the sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            Self::Zlib(encoder) => encoder.finish(),
            Self::Gzip(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for DeflateWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(sink) => sink.write(buf),
            Self::Zlib(encoder) => encoder.write(buf),
            Self::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(sink) => sink.flush(),
            Self::Zlib(encoder) => encoder.flush(),
            Self::Gzip(encoder) => encoder.flush(),
        }
    }
}

/// zlib decoder that refuses streams ending before their end marker.
pub struct ZlibReader<R> {
    inner: R,
    state: Decompress,
    done: bool,
}

impl<R: BufRead> ZlibReader<R> {
    /// Wraps a buffered source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: Decompress::new(true),
            done: false,
        }
    }

    /// Compressed bytes consumed so far.
    #[must_use]
    pub fn total_in(&self) -> u64 {
        self.state.total_in()
    }

    /// Reports whether the end of the zlib stream was reached.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

impl<R: BufRead> Read for ZlibReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }
        loop {
            let input = self.inner.fill_buf()?;
            let eof = input.is_empty();
            let before_in = self.state.total_in();
            let before_out = self.state.total_out();
            let status = self
                .state
                .decompress(input, buf, FlushDecompress::None)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let consumed = (self.state.total_in() - before_in) as usize;
            let produced = (self.state.total_out() - before_out) as usize;
            self.inner.consume(consumed);

            if status == Status::StreamEnd {
                self.done = true;
                return Ok(produced);
            }
            if produced > 0 {
                return Ok(produced);
            }
            if eof {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "zlib stream ended before its end marker",
                ));
            }
        }
    }
}

/// Decompressing reader for one of the supported containers.
pub enum DeflateReader<R: Read> {
    /// Bytes are forwarded unchanged.
    Plain(R),
    /// zlib container.
    Zlib(ZlibReader<BufReader<R>>),
    /// gzip container.
    Gzip(GzDecoder<R>),
}

/// Opens a decompressing reader over `source`.
pub fn open_reader<R: Read>(source: R, framing: Encoding) -> DeflateReader<R> {
    match framing {
        Encoding::None => DeflateReader::Plain(source),
        Encoding::Zlib => DeflateReader::Zlib(ZlibReader::new(BufReader::new(source))),
        Encoding::Gzip => DeflateReader::Gzip(GzDecoder::new(source)),
    }
}

impl<R: Read> Read for DeflateReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(source) => source.read(buf),
            Self::Zlib(decoder) => decoder.read(buf),
            Self::Gzip(decoder) => decoder.read(buf),
        }
    }
}

/// Compresses `input` into a new [`Vec`].
pub fn compress_to_vec(input: &[u8], encoding: Encoding, level: Level) -> io::Result<Vec<u8>> {
    let mut writer = open_writer(Vec::new(), encoding, level);
    writer.write_all(input)?;
    writer.finish()
}

/// Decompresses `input` into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8], framing: Encoding) -> io::Result<Vec<u8>> {
    let mut reader = open_reader(input, framing);
    let mut output = Vec::new();
    reader.read_to_end(&mut output)?;
    Ok(output)
}

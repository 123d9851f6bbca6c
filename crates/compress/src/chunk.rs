//! One buffer in, one self-contained chunk out, and back.
//!
//! [`ChunkCodec`] joins the [`header`](crate::header) layout with a
//! [`RawCodec`]: the payload is compressed straight into the region after
//! the reserved header space and the header is finalised in place, so a
//! chunk is produced with a single allocation.
//!
//! # Examples
//!
//! ```
//! use compress::chunk::ChunkCodec;
//! use compress::header::{ChunkHeader, ChunkType};
//!
//! let mut codec = ChunkCodec::new().expect("codec self check");
//! let chunk = codec.compress(b"hello world").unwrap();
//!
//! let (header, _) = ChunkHeader::read(&chunk).unwrap();
//! assert_eq!(header.chunk_type(), ChunkType::Lzo1x);
//! assert_eq!(header.uncompressed_length(), 11);
//! assert_eq!(codec.decompress(&chunk).unwrap(), b"hello world");
//! ```

use std::io;

use crate::codec::{CodecError, RawCodec};
use crate::header::{ChunkHeader, ChunkType, FrameError, HEADER_SIZE};
use crate::lzo::Lzo;

/// Errors raised while building, parsing or sequencing chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The chunk structure is invalid.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The payload could not be compressed or decompressed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A chunk sequence did not begin with a Start chunk.
    #[error("chunk sequence does not begin with a start chunk (found {found})")]
    MissingStart {
        /// Type of the first chunk read.
        found: ChunkType,
    },

    /// The input ended before a Stop or Null chunk.
    #[error("chunk sequence ended without a stop chunk")]
    MissingStop,

    /// The data chunks decoded to a different size than the Start chunk announced.
    #[error("start chunk announced {declared} bytes but the sequence holds {actual}")]
    TotalLengthMismatch {
        /// Total from the Start chunk.
        declared: u64,
        /// Bytes actually decoded.
        actual: u64,
    },

    /// A payload decompressed to a different size than its header announced.
    #[error("chunk announced {declared} uncompressed bytes but produced {actual}")]
    PayloadLengthMismatch {
        /// Size from the chunk header.
        declared: usize,
        /// Bytes produced by the codec.
        actual: usize,
    },

    /// Bytes follow the terminating chunk.
    #[error("unexpected data after the stop chunk")]
    TrailingData,

    /// Reading or writing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<ChunkError> for io::Error {
    fn from(e: ChunkError) -> Self {
        match e {
            ChunkError::Io(io_err) => io_err,
            ChunkError::Codec(codec) => codec.into(),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

/// Compresses buffers into chunks and restores them.
///
/// The codec's workspace is reused across calls; use one instance per
/// thread.
#[derive(Clone, Debug)]
pub struct ChunkCodec<C = Lzo> {
    codec: C,
}

impl ChunkCodec<Lzo> {
    /// Creates a chunk codec backed by LZO1X.
    pub fn new() -> Result<Self, CodecError> {
        Ok(Self::with_codec(Lzo::new()?))
    }
}

impl<C: RawCodec> ChunkCodec<C> {
    /// Wraps an existing block codec.
    #[must_use]
    pub const fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Returns the wrapped block codec.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.codec
    }

    /// Largest chunk [`ChunkCodec::compress`] can produce for `uncompressed_length` bytes.
    #[must_use]
    pub fn max_chunk_length(&self, uncompressed_length: usize) -> usize {
        HEADER_SIZE + self.codec.max_compressed_length(uncompressed_length)
    }

    /// Compresses `data` into a new chunk.
    ///
    /// Empty input yields a minimal valid chunk with an uncompressed length of zero.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut chunk = Vec::new();
        self.compress_into(data, &mut chunk)?;
        Ok(chunk)
    }

    /// Compresses `data` into `chunk`, replacing its contents.
    ///
    /// `chunk` keeps its allocation between calls, so a caller that reuses
    /// one vector only allocates when a larger chunk is needed.
    pub fn compress_into(&mut self, data: &[u8], chunk: &mut Vec<u8>) -> Result<usize, ChunkError> {
        let uncompressed_length = payload_length(data.len())?;
        let capacity = self.max_chunk_length(data.len());

        chunk.clear();
        chunk
            .try_reserve_exact(capacity)
            .map_err(|_| CodecError::OutOfMemory)?;
        chunk.resize(capacity, 0);

        let written = self.codec.compress(data, &mut chunk[HEADER_SIZE..])?;
        chunk.truncate(HEADER_SIZE + written);

        let mut header = ChunkHeader::new(self.codec.chunk_type(), uncompressed_length);
        header.write(chunk)?;

        #[cfg(feature = "tracing")]
        logging::trace_chunk!(
            input = data.len(),
            chunk = chunk.len(),
            kind = %header.chunk_type(),
            "compressed chunk"
        );

        Ok(chunk.len())
    }

    /// Compresses `data`, or stores it verbatim when compression does not shrink it.
    ///
    /// Stored chunks carry [`ChunkType::None`] and are read back with
    /// [`ChunkCodec::decompress_any`].
    pub fn compress_or_store(&mut self, data: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let mut chunk = self.compress(data)?;
        if chunk.len() >= HEADER_SIZE + data.len() {
            let header = ChunkHeader::for_uncompressed(data)?;
            chunk.clear();
            chunk.extend_from_slice(&header);
            chunk.extend_from_slice(data);

            #[cfg(feature = "tracing")]
            logging::trace_chunk!(input = data.len(), "stored incompressible chunk");
        }
        Ok(chunk)
    }

    /// Restores the data held in a compressed chunk.
    ///
    /// Only chunks of the codec's own type are accepted; any other type fails
    /// with [`FrameError::UnexpectedChunkType`].
    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let (header, payload) = ChunkHeader::read(chunk)?;
        let expected = self.codec.chunk_type();
        if header.chunk_type() != expected {
            return Err(FrameError::UnexpectedChunkType {
                expected: expected.name(),
                found: header.chunk_type(),
            }
            .into());
        }
        self.inflate(&header, payload)
    }

    /// Restores the data held in a compressed or stored chunk.
    ///
    /// Start, Stop and Null chunks fail with [`FrameError::UnexpectedChunkType`].
    pub fn decompress_any(&mut self, chunk: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let (header, payload) = ChunkHeader::read(chunk)?;
        self.payload(&header, payload)
    }

    /// Decodes the payload of an already verified data chunk.
    pub(crate) fn payload(
        &mut self,
        header: &ChunkHeader,
        payload: &[u8],
    ) -> Result<Vec<u8>, ChunkError> {
        match header.chunk_type() {
            ChunkType::None => {
                let declared = header.uncompressed_length() as usize;
                if payload.len() != declared {
                    return Err(ChunkError::PayloadLengthMismatch {
                        declared,
                        actual: payload.len(),
                    });
                }
                Ok(payload.to_vec())
            }
            found if found == self.codec.chunk_type() => self.inflate(header, payload),
            found => Err(FrameError::UnexpectedChunkType {
                expected: "data",
                found,
            }
            .into()),
        }
    }

    fn inflate(&mut self, header: &ChunkHeader, payload: &[u8]) -> Result<Vec<u8>, ChunkError> {
        let declared = header.uncompressed_length() as usize;
        let mut output = Vec::new();
        output
            .try_reserve_exact(declared)
            .map_err(|_| CodecError::OutOfMemory)?;
        output.resize(declared, 0);

        let actual = self.codec.decompress(payload, &mut output)?;
        if actual != declared {
            return Err(ChunkError::PayloadLengthMismatch { declared, actual });
        }
        Ok(output)
    }
}

fn payload_length(len: usize) -> Result<u32, FrameError> {
    u32::try_from(len).map_err(|_| FrameError::ChunkTooLong {
        len,
        max: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::NULL_CHUNK;
    use proptest::prelude::*;

    fn codec() -> ChunkCodec {
        ChunkCodec::new().expect("codec self check")
    }

    #[test]
    fn hello_world_chunk_has_expected_header() {
        let mut codec = codec();
        let chunk = codec.compress(b"hello world").expect("compress");

        let (header, payload) = ChunkHeader::read(&chunk).expect("valid chunk");
        assert_eq!(header.uncompressed_length(), 11);
        assert_eq!(header.chunk_type(), ChunkType::Lzo1x);
        assert_eq!(header.total_length(), chunk.len());

        let lzo = Lzo::new().expect("lzo");
        let restored = lzo.decompress_to_vec(payload, 11).expect("raw decompress");
        assert_eq!(restored, b"hello world");
    }

    #[test]
    fn empty_input_produces_minimal_chunk() {
        let mut codec = codec();
        let chunk = codec.compress(b"").expect("compress");
        let (header, payload) = ChunkHeader::read(&chunk).expect("valid chunk");
        assert_eq!(header.uncompressed_length(), 0);
        assert!(!payload.is_empty(), "end marker is still present");
        assert!(codec.decompress(&chunk).expect("decompress").is_empty());
    }

    #[test]
    fn decompress_rejects_stored_chunk() {
        let mut codec = codec();
        let mut stored = ChunkHeader::for_uncompressed(b"raw").expect("header").to_vec();
        stored.extend_from_slice(b"raw");

        let err = codec.decompress(&stored).expect_err("stored chunk rejected");
        assert!(matches!(
            err,
            ChunkError::Frame(FrameError::UnexpectedChunkType {
                found: ChunkType::None,
                ..
            })
        ));
        assert_eq!(codec.decompress_any(&stored).expect("any"), b"raw");
    }

    #[test]
    fn decompress_rejects_control_chunks() {
        let mut codec = codec();
        for control in [ChunkHeader::for_start(5).to_vec(), NULL_CHUNK.to_vec()] {
            assert!(matches!(
                codec.decompress_any(&control),
                Err(ChunkError::Frame(FrameError::UnexpectedChunkType { .. }))
            ));
        }
    }

    #[test]
    fn framing_errors_propagate_unchanged() {
        let mut codec = codec();
        let mut chunk = codec.compress(b"some payload to protect").expect("compress");
        let last = chunk.len() - 1;
        chunk[last] ^= 0x40;
        assert!(matches!(
            codec.decompress(&chunk),
            Err(ChunkError::Frame(FrameError::CrcMismatch { .. }))
        ));

        assert!(matches!(
            codec.decompress(&chunk[..10]),
            Err(ChunkError::Frame(FrameError::ChunkTooShort { len: 10 }))
        ));
    }

    #[test]
    fn wrong_uncompressed_length_is_detected() {
        let mut codec = codec();
        let original = codec.compress(b"abcdefgh").expect("compress");
        let (_, payload) = ChunkHeader::read(&original).expect("valid");

        // Re-seal the same payload under a header that overstates its size.
        let mut forged = vec![0u8; HEADER_SIZE];
        forged.extend_from_slice(payload);
        ChunkHeader::new(ChunkType::Lzo1x, 9)
            .write(&mut forged)
            .expect("seal");

        assert!(matches!(
            codec.decompress(&forged),
            Err(ChunkError::PayloadLengthMismatch {
                declared: 9,
                actual: 8
            })
        ));
    }

    #[test]
    fn compress_or_store_keeps_incompressible_data_verbatim() {
        let mut codec = codec();
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let noise: Vec<u8> = (0..512)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 56) as u8
            })
            .collect();
        let chunk = codec.compress_or_store(&noise).expect("store");
        let (header, payload) = ChunkHeader::read(&chunk).expect("valid");
        assert_eq!(header.chunk_type(), ChunkType::None);
        assert_eq!(payload, noise.as_slice());
        assert_eq!(codec.decompress_any(&chunk).expect("restore"), noise);
    }

    #[test]
    fn compress_or_store_compresses_redundant_data() {
        let mut codec = codec();
        let data = vec![b'z'; 4096];
        let chunk = codec.compress_or_store(&data).expect("compress");
        let (header, _) = ChunkHeader::read(&chunk).expect("valid");
        assert_eq!(header.chunk_type(), ChunkType::Lzo1x);
        assert!(chunk.len() < data.len());
    }

    #[test]
    fn compress_into_reuses_buffer() {
        let mut codec = codec();
        let mut buffer = Vec::new();
        let first = codec.compress_into(&[1u8; 1000], &mut buffer).expect("first");
        let capacity = buffer.capacity();
        let second = codec.compress_into(&[2u8; 500], &mut buffer).expect("second");
        assert_eq!(second, buffer.len());
        assert!(first > 0);
        assert_eq!(buffer.capacity(), capacity);
        assert_eq!(codec.decompress(&buffer).expect("restore"), vec![2u8; 500]);
    }

    #[test]
    fn chunk_error_converts_to_io_error() {
        let err: io::Error = ChunkError::MissingStop.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err: io::Error = ChunkError::Io(io::ErrorKind::UnexpectedEof.into()).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    proptest! {
        #[test]
        fn chunks_round_trip(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            let mut codec = codec();
            let chunk = codec.compress(&data).expect("compress");
            prop_assert!(chunk.len() <= codec.max_chunk_length(data.len()));
            prop_assert_eq!(codec.decompress(&chunk).expect("decompress"), data);
        }

        #[test]
        fn max_chunk_length_covers_header(len in 0usize..(1 << 24)) {
            let codec = codec();
            prop_assert!(codec.max_chunk_length(len) >= len + HEADER_SIZE);
        }
    }
}

//! Fixed-layout chunk header used by the chunk framing layer.
//!
//! Every chunk starts with a 16-byte header followed by its payload:
//!
//! ```text
//! offset 0..4    chunk_length         u32 LE  bytes after this field
//! offset 4..8    crc32                u32 LE  CRC32 of bytes 8.. (header tail + payload)
//! offset 8..12   type                 i32 LE  see ChunkType
//! offset 12..16  uncompressed_length  u32 LE
//! offset 16..    payload
//! ```
//!
//! A chunk consisting of exactly four zero bytes is a *Null chunk*. It has no
//! checksum or type field and reads back as a [`ChunkType::Stop`] chunk.
//!
//! # Wire format version
//!
//! Version [`FORMAT_VERSION`] fixes the byte order to little-endian and the
//! discriminants to `Stop = 0`, `None = 1`, `Lzo1x = 2`, `Start = -1`.
//! Headers written with other discriminant tables are not readable by this
//! module; they fail with [`FrameError::CrcMismatch`] or
//! [`FrameError::UnknownChunkType`].

use std::fmt;

use checksums::Crc32;

/// Size in bytes of the serialised chunk header.
pub const HEADER_SIZE: usize = 16;

/// Size in bytes of the leading `chunk_length` field.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// The four-byte Null chunk, equivalent to a Stop chunk.
pub const NULL_CHUNK: [u8; LENGTH_FIELD_SIZE] = [0; LENGTH_FIELD_SIZE];

/// Version of the chunk wire layout implemented by this module.
pub const FORMAT_VERSION: u32 = 1;

/// Largest total chunk size representable by the `u32` length field.
pub const MAX_CHUNK_SIZE: usize = u32::MAX as usize + LENGTH_FIELD_SIZE;

/// `chunk_length` of a chunk without payload (Start and Stop chunks).
const EMPTY_CHUNK_LENGTH: u32 = (HEADER_SIZE - LENGTH_FIELD_SIZE) as u32;

/// Discriminant stored in the header's `type` field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum ChunkType {
    /// Terminates a chunk sequence. Carries no payload.
    Stop = 0,
    /// Payload is stored verbatim.
    None = 1,
    /// Payload is an LZO1X compressed block.
    Lzo1x = 2,
    /// Opens a chunk sequence and carries its total uncompressed length.
    Start = -1,
}

impl ChunkType {
    /// Returns the signed wire discriminant.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Maps a wire discriminant back to a chunk type.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Stop),
            1 => Some(Self::None),
            2 => Some(Self::Lzo1x),
            -1 => Some(Self::Start),
            _ => None,
        }
    }

    /// Returns the name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::None => "none",
            Self::Lzo1x => "lzo1x",
            Self::Start => "start",
        }
    }

    /// Reports whether chunks of this type are followed by payload bytes.
    #[must_use]
    pub const fn carries_payload(self) -> bool {
        matches!(self, Self::None | Self::Lzo1x)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for ChunkType {
    type Error = FrameError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(FrameError::UnknownChunkType(code))
    }
}

/// Structural errors detected while encoding or parsing a chunk.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// The buffer cannot hold a full header.
    #[error("chunk of {len} bytes is shorter than the {HEADER_SIZE}-byte header")]
    ChunkTooShort {
        /// Number of bytes supplied.
        len: usize,
    },

    /// The `chunk_length` field disagrees with the number of bytes present.
    #[error("chunk length field declares {declared} bytes but {actual} are present")]
    LengthMismatch {
        /// Total chunk size implied by the length field.
        declared: usize,
        /// Number of bytes supplied.
        actual: usize,
    },

    /// The stored checksum does not match the header tail and payload.
    #[error("chunk checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// Checksum read from the header.
        stored: u32,
        /// Checksum recomputed over the received bytes.
        computed: u32,
    },

    /// The chunk is valid but not of the type the caller requires.
    #[error("expected {expected} chunk, found {found} chunk")]
    UnexpectedChunkType {
        /// Description of the accepted type(s).
        expected: &'static str,
        /// Type found in the header.
        found: ChunkType,
    },

    /// A checksum-valid header carries a discriminant outside the known set.
    #[error("unknown chunk type {0}")]
    UnknownChunkType(i32),

    /// The chunk exceeds the length field range or a reader's limit.
    #[error("chunk of {len} bytes exceeds the maximum of {max} bytes")]
    ChunkTooLong {
        /// Size of the offending chunk.
        len: usize,
        /// Largest size accepted.
        max: usize,
    },
}

/// Parsed or to-be-written chunk header.
///
/// Headers are transient: one is built to encode a chunk or produced by
/// [`ChunkHeader::read`] while parsing one, and is not reused across chunks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChunkHeader {
    chunk_length: u32,
    crc32: u32,
    chunk_type: ChunkType,
    uncompressed_length: u32,
}

impl Default for ChunkHeader {
    fn default() -> Self {
        Self::new(ChunkType::Stop, 0)
    }
}

impl ChunkHeader {
    /// Creates an unwritten header of the given type.
    ///
    /// The length and checksum fields describe a payload-less chunk until
    /// [`ChunkHeader::write`] finalises them.
    #[must_use]
    pub const fn new(chunk_type: ChunkType, uncompressed_length: u32) -> Self {
        Self {
            chunk_length: EMPTY_CHUNK_LENGTH,
            crc32: 0,
            chunk_type,
            uncompressed_length,
        }
    }

    const fn null() -> Self {
        Self {
            chunk_length: 0,
            crc32: 0,
            chunk_type: ChunkType::Stop,
            uncompressed_length: 0,
        }
    }

    /// Number of bytes following the length field.
    #[must_use]
    pub const fn chunk_length(&self) -> u32 {
        self.chunk_length
    }

    /// Stored checksum.
    #[must_use]
    pub const fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Chunk discriminant.
    #[must_use]
    pub const fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// Size of the payload once decompressed, or the sequence total for Start chunks.
    #[must_use]
    pub const fn uncompressed_length(&self) -> u32 {
        self.uncompressed_length
    }

    /// Total encoded size of the chunk, header included.
    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.chunk_length as usize + LENGTH_FIELD_SIZE
    }

    /// Reports whether this header was read from a four-byte Null chunk.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.chunk_length == 0
    }

    /// Serialises the header fields in wire order.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.chunk_length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.crc32.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.chunk_type.code().to_le_bytes());
        bytes[12..16].copy_from_slice(&self.uncompressed_length.to_le_bytes());
        bytes
    }

    /// Finalises a chunk in place.
    ///
    /// The first [`HEADER_SIZE`] bytes of `chunk` are reserved for the header
    /// and the remainder already holds the payload. The length and checksum
    /// fields are computed from the buffer and the serialised header is
    /// written into the reserved region.
    pub fn write(&mut self, chunk: &mut [u8]) -> Result<(), FrameError> {
        if chunk.len() < HEADER_SIZE {
            return Err(FrameError::ChunkTooShort { len: chunk.len() });
        }
        self.chunk_length = length_field(chunk.len())?;
        self.crc32 = checksum(
            self.chunk_type,
            self.uncompressed_length,
            &chunk[HEADER_SIZE..],
        );
        chunk[..HEADER_SIZE].copy_from_slice(&self.to_bytes());
        Ok(())
    }

    /// Builds the header for a payload stored without compression.
    pub fn for_uncompressed(payload: &[u8]) -> Result<[u8; HEADER_SIZE], FrameError> {
        let uncompressed_length =
            u32::try_from(payload.len()).map_err(|_| FrameError::ChunkTooLong {
                len: payload.len(),
                max: u32::MAX as usize,
            })?;
        let header = Self {
            chunk_length: length_field(HEADER_SIZE + payload.len())?,
            crc32: checksum(ChunkType::None, uncompressed_length, payload),
            chunk_type: ChunkType::None,
            uncompressed_length,
        };
        Ok(header.to_bytes())
    }

    /// Builds a Start chunk announcing `total_uncompressed_length` bytes.
    #[must_use]
    pub fn for_start(total_uncompressed_length: u32) -> [u8; HEADER_SIZE] {
        Self::sealed(ChunkType::Start, total_uncompressed_length).to_bytes()
    }

    /// Builds a Stop chunk.
    #[must_use]
    pub fn for_stop() -> [u8; HEADER_SIZE] {
        Self::sealed(ChunkType::Stop, 0).to_bytes()
    }

    fn sealed(chunk_type: ChunkType, uncompressed_length: u32) -> Self {
        Self {
            crc32: checksum(chunk_type, uncompressed_length, &[]),
            ..Self::new(chunk_type, uncompressed_length)
        }
    }

    /// Parses and verifies a complete chunk, returning the header and a view of its payload.
    ///
    /// Checks run in a fixed order: minimum size, length field, checksum,
    /// then the type discriminant. A bit flip anywhere after the length field
    /// therefore reports [`FrameError::CrcMismatch`].
    pub fn read(chunk: &[u8]) -> Result<(Self, &[u8]), FrameError> {
        if chunk == NULL_CHUNK {
            return Ok((Self::null(), &[]));
        }
        if chunk.len() < HEADER_SIZE {
            return Err(FrameError::ChunkTooShort { len: chunk.len() });
        }

        let chunk_length = read_u32(chunk, 0);
        let declared = chunk_length as usize + LENGTH_FIELD_SIZE;
        if declared != chunk.len() {
            return Err(FrameError::LengthMismatch {
                declared,
                actual: chunk.len(),
            });
        }

        let stored = read_u32(chunk, 4);
        let computed = checksum_raw(&chunk[8..]);
        if stored != computed {
            return Err(FrameError::CrcMismatch { stored, computed });
        }

        let chunk_type = ChunkType::try_from(read_u32(chunk, 8) as i32)?;
        let header = Self {
            chunk_length,
            crc32: stored,
            chunk_type,
            uncompressed_length: read_u32(chunk, 12),
        };
        Ok((header, &chunk[HEADER_SIZE..]))
    }

    /// Parses a chunk that must open (or immediately close) a sequence.
    ///
    /// Returns the announced total uncompressed length; Stop and Null chunks
    /// announce zero bytes.
    pub fn read_start(chunk: &[u8]) -> Result<u32, FrameError> {
        let (header, _) = Self::read(chunk)?;
        match header.chunk_type {
            ChunkType::Start | ChunkType::Stop => Ok(header.uncompressed_length),
            found @ (ChunkType::None | ChunkType::Lzo1x) => Err(FrameError::UnexpectedChunkType {
                expected: "start or stop",
                found,
            }),
        }
    }

    /// Speculative form of [`ChunkHeader::read_start`].
    ///
    /// Returns `None` instead of an error, which lets callers test whether a
    /// byte stream begins with chunk framing at all.
    #[must_use]
    pub fn try_read_start(chunk: &[u8]) -> Option<Self> {
        match Self::read(chunk) {
            Ok((header, _)) if matches!(header.chunk_type, ChunkType::Start | ChunkType::Stop) => {
                Some(header)
            }
            _ => None,
        }
    }
}

/// Returns the total size of a chunk given its leading length field.
///
/// A zero length field denotes a Null chunk, whose total size is the length
/// field alone.
#[must_use]
pub const fn total_length_from_prefix(prefix: [u8; LENGTH_FIELD_SIZE]) -> usize {
    u32::from_le_bytes(prefix) as usize + LENGTH_FIELD_SIZE
}

fn length_field(total: usize) -> Result<u32, FrameError> {
    u32::try_from(total - LENGTH_FIELD_SIZE).map_err(|_| FrameError::ChunkTooLong {
        len: total,
        max: MAX_CHUNK_SIZE,
    })
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(field)
}

fn checksum(chunk_type: ChunkType, uncompressed_length: u32, payload: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(&chunk_type.code().to_le_bytes());
    hasher.update(&uncompressed_length.to_le_bytes());
    hasher.update(payload);
    hasher.finalize()
}

fn checksum_raw(tail: &[u8]) -> u32 {
    checksums::crc32(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stored_chunk(payload: &[u8]) -> Vec<u8> {
        let header = ChunkHeader::for_uncompressed(payload).expect("header");
        let mut chunk = header.to_vec();
        chunk.extend_from_slice(payload);
        chunk
    }

    #[test]
    fn header_size_matches_field_widths() {
        let widths = size_of::<u32>() + size_of::<u32>() + size_of::<i32>() + size_of::<u32>();
        assert_eq!(HEADER_SIZE, widths);
        assert_eq!(ChunkHeader::default().to_bytes().len(), HEADER_SIZE);
    }

    #[test]
    fn chunk_type_codes_are_stable() {
        assert_eq!(ChunkType::Stop.code(), 0);
        assert_eq!(ChunkType::None.code(), 1);
        assert_eq!(ChunkType::Lzo1x.code(), 2);
        assert_eq!(ChunkType::Start.code(), -1);
        for ty in [
            ChunkType::Stop,
            ChunkType::None,
            ChunkType::Lzo1x,
            ChunkType::Start,
        ] {
            assert_eq!(ChunkType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(ChunkType::from_code(-2), None);
        assert_eq!(
            ChunkType::try_from(7),
            Err(FrameError::UnknownChunkType(7))
        );
    }

    #[test]
    fn start_header_layout_is_little_endian() {
        let bytes = ChunkHeader::for_start(0x0102_0304);
        assert_eq!(&bytes[0..4], &12u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &(-1i32).to_le_bytes());
        assert_eq!(&bytes[12..16], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksums::crc32(&bytes[8..])
        );
    }

    #[test]
    fn write_fills_reserved_region() {
        let payload = b"payload bytes";
        let mut chunk = vec![0u8; HEADER_SIZE];
        chunk.extend_from_slice(payload);

        let mut header = ChunkHeader::new(ChunkType::Lzo1x, 99);
        header.write(&mut chunk).expect("write header");

        assert_eq!(header.chunk_length() as usize + 4, chunk.len());
        let (parsed, body) = ChunkHeader::read(&chunk).expect("read back");
        assert_eq!(parsed, header);
        assert_eq!(parsed.chunk_type(), ChunkType::Lzo1x);
        assert_eq!(parsed.uncompressed_length(), 99);
        assert_eq!(body, payload);
    }

    #[test]
    fn write_rejects_buffer_without_header_space() {
        let mut header = ChunkHeader::new(ChunkType::Lzo1x, 0);
        let mut short = [0u8; HEADER_SIZE - 1];
        assert_eq!(
            header.write(&mut short),
            Err(FrameError::ChunkTooShort {
                len: HEADER_SIZE - 1
            })
        );
    }

    #[test]
    fn uncompressed_chunk_round_trips() {
        let chunk = stored_chunk(b"verbatim");
        let (header, payload) = ChunkHeader::read(&chunk).expect("read");
        assert_eq!(header.chunk_type(), ChunkType::None);
        assert_eq!(header.uncompressed_length(), 8);
        assert_eq!(header.chunk_length() as usize, HEADER_SIZE - 4 + 8);
        assert_eq!(payload, b"verbatim");
    }

    #[test]
    fn null_and_stop_chunks_are_equivalent() {
        let (null, null_payload) = ChunkHeader::read(&NULL_CHUNK).expect("null chunk");
        let stop = ChunkHeader::for_stop();
        let (stop, stop_payload) = ChunkHeader::read(&stop).expect("stop chunk");

        assert!(null.is_null());
        assert!(!stop.is_null());
        assert_eq!(null.chunk_type(), ChunkType::Stop);
        assert_eq!(stop.chunk_type(), ChunkType::Stop);
        assert!(null_payload.is_empty());
        assert!(stop_payload.is_empty());
        assert_eq!(stop.uncompressed_length(), 0);
    }

    #[test]
    fn four_nonzero_bytes_are_too_short() {
        assert_eq!(
            ChunkHeader::read(&[0, 0, 0, 1]),
            Err(FrameError::ChunkTooShort { len: 4 })
        );
    }

    #[test]
    fn start_chunk_carries_total_length() {
        let start = ChunkHeader::for_start(12345);
        assert_eq!(ChunkHeader::read_start(&start), Ok(12345));
        assert_eq!(ChunkHeader::read_start(&NULL_CHUNK), Ok(0));
        assert_eq!(ChunkHeader::read_start(&ChunkHeader::for_stop()), Ok(0));
    }

    #[test]
    fn read_start_rejects_data_chunk() {
        let chunk = stored_chunk(b"x");
        assert_eq!(
            ChunkHeader::read_start(&chunk),
            Err(FrameError::UnexpectedChunkType {
                expected: "start or stop",
                found: ChunkType::None,
            })
        );
        assert!(ChunkHeader::try_read_start(&chunk).is_none());
    }

    #[test]
    fn try_read_start_reports_absence_without_error() {
        let start = ChunkHeader::for_start(7);
        let header = ChunkHeader::try_read_start(&start).expect("start detected");
        assert_eq!(header.chunk_type(), ChunkType::Start);
        assert_eq!(header.uncompressed_length(), 7);

        assert!(ChunkHeader::try_read_start(b"\x1f\x8b\x08\x00 not a chunk").is_none());
        assert!(ChunkHeader::try_read_start(&start[..10]).is_none());
    }

    #[test]
    fn crc_covers_type_field() {
        let mut chunk = stored_chunk(b"abc");
        // Rewrite the type to Lzo1x without refreshing the checksum.
        chunk[8..12].copy_from_slice(&ChunkType::Lzo1x.code().to_le_bytes());
        assert!(matches!(
            ChunkHeader::read(&chunk),
            Err(FrameError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn unknown_type_with_valid_crc_is_reported() {
        let mut chunk = vec![0u8; HEADER_SIZE];
        chunk[0..4].copy_from_slice(&12u32.to_le_bytes());
        chunk[8..12].copy_from_slice(&(-2i32).to_le_bytes());
        let crc = checksums::crc32(&chunk[8..]);
        chunk[4..8].copy_from_slice(&crc.to_le_bytes());
        assert_eq!(
            ChunkHeader::read(&chunk),
            Err(FrameError::UnknownChunkType(-2))
        );
    }

    #[test]
    fn length_field_larger_than_buffer_is_mismatch() {
        let mut chunk = stored_chunk(b"abcdef");
        chunk.push(0);
        assert_eq!(
            ChunkHeader::read(&chunk),
            Err(FrameError::LengthMismatch {
                declared: HEADER_SIZE + 6,
                actual: HEADER_SIZE + 7,
            })
        );
    }

    #[test]
    fn total_length_from_prefix_handles_null() {
        assert_eq!(total_length_from_prefix(NULL_CHUNK), 4);
        let start = ChunkHeader::for_start(1);
        let prefix = [start[0], start[1], start[2], start[3]];
        assert_eq!(total_length_from_prefix(prefix), HEADER_SIZE);
    }

    proptest! {
        #[test]
        fn any_bit_flip_after_length_field_fails_crc(
            payload in prop::collection::vec(any::<u8>(), 0..64),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut chunk = stored_chunk(&payload);
            let offset = 4 + position.index(chunk.len() - 4);
            chunk[offset] ^= 1 << bit;
            let result = ChunkHeader::read(&chunk);
            prop_assert!(
                matches!(result, Err(FrameError::CrcMismatch { .. })),
                "flip at {} gave {:?}", offset, result
            );
        }

        #[test]
        fn truncation_never_yields_payload(
            payload in prop::collection::vec(any::<u8>(), 1..64),
            cut in 1usize..16,
        ) {
            let chunk = stored_chunk(&payload);
            let cut = cut.min(chunk.len() - 1);
            let truncated = &chunk[..chunk.len() - cut];
            let result = ChunkHeader::read(truncated);
            let rejected = matches!(
                result,
                Err(FrameError::LengthMismatch { .. } | FrameError::ChunkTooShort { .. })
            );
            prop_assert!(rejected, "cut {} gave {:?}", cut, result);
        }
    }
}

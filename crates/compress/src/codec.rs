//! Contract between the chunk framing layer and the block codecs it frames.

use std::io;

use crate::header::ChunkType;

/// Block codec used by [`ChunkCodec`](crate::chunk::ChunkCodec).
///
/// Implementations compress one buffer into one caller-provided buffer and
/// back. Scratch state (hash tables and similar workspace) lives in the
/// implementor and is reused across calls, so methods take `&mut self`.
pub trait RawCodec {
    /// Chunk type written for payloads produced by this codec.
    fn chunk_type(&self) -> ChunkType;

    /// Upper bound of the compressed size of `len` input bytes.
    ///
    /// Always at least `len`: incompressible input expands.
    fn max_compressed_length(&self, len: usize) -> usize;

    /// Compresses `src` into `dst`, returning the number of bytes written.
    ///
    /// `dst` must hold at least [`RawCodec::max_compressed_length`] bytes;
    /// shorter buffers fail with [`CodecError::BufferTooSmall`].
    fn compress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError>;

    /// Decompresses `src` into `dst`, returning the number of bytes written.
    ///
    /// Intended for output sizes taken from a verified chunk header.
    fn decompress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError>;

    /// Decompresses untrusted input into `dst`.
    ///
    /// Writes past the end of `dst` are reported as
    /// [`CodecError::OutputOverrun`].
    fn decompress_safe(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        self.decompress(src, dst)
    }
}

/// Failure reported by a block codec.
///
/// The first nine variants mirror the status codes of the LZO reference
/// library; [`CodecError::code`] returns that numeric status.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Unspecified codec failure, including malformed instructions.
    #[error("codec error: malformed compressed data")]
    Error,

    /// Working memory could not be allocated.
    #[error("codec ran out of memory")]
    OutOfMemory,

    /// The input cannot be represented more compactly.
    #[error("input is not compressible")]
    NotCompressible,

    /// Compressed input ended in the middle of an instruction.
    #[error("compressed input ended unexpectedly")]
    InputOverrun,

    /// Decompressed output does not fit the destination buffer.
    #[error("decompressed output overruns the destination buffer")]
    OutputOverrun,

    /// A match refers to data before the start of the output.
    #[error("match distance reaches before the start of the output")]
    LookBehindOverrun,

    /// Compressed input ended without an end-of-stream marker.
    #[error("end-of-stream marker not found")]
    EofNotFound,

    /// Bytes remain after the end-of-stream marker.
    #[error("input not fully consumed after end-of-stream marker")]
    InputNotConsumed,

    /// The requested operation is not supported by this codec.
    #[error("operation not yet implemented")]
    NotYetImplemented,

    /// The destination buffer is smaller than the worst-case output.
    #[error("output buffer too small: need {needed}, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// The one-time codec self check failed; no codec instance can be created.
    #[error("codec self check failed; the LZO1X implementation is unusable")]
    InitFailed,
}

impl CodecError {
    /// Returns the LZO reference library status code for this error.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Error => -1,
            Self::OutOfMemory => -2,
            Self::NotCompressible => -3,
            Self::InputOverrun => -4,
            Self::OutputOverrun => -5,
            Self::LookBehindOverrun => -6,
            Self::EofNotFound => -7,
            Self::InputNotConsumed => -8,
            Self::NotYetImplemented => -9,
            Self::BufferTooSmall { .. } => -10,
            Self::InitFailed => -99,
        }
    }

    /// Maps an LZO reference library status code to an error.
    ///
    /// Returns `None` for `0` (success) and for codes without a counterpart.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Error),
            -2 => Some(Self::OutOfMemory),
            -3 => Some(Self::NotCompressible),
            -4 => Some(Self::InputOverrun),
            -5 => Some(Self::OutputOverrun),
            -6 => Some(Self::LookBehindOverrun),
            -7 => Some(Self::EofNotFound),
            -8 => Some(Self::InputNotConsumed),
            -9 => Some(Self::NotYetImplemented),
            -99 => Some(Self::InitFailed),
            _ => None,
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::OutOfMemory => io::Error::new(io::ErrorKind::OutOfMemory, e),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in (-9..=-1).chain([-99]) {
            let error = CodecError::from_code(code).expect("known status");
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn success_and_unknown_codes_have_no_error() {
        assert_eq!(CodecError::from_code(0), None);
        assert_eq!(CodecError::from_code(-42), None);
        assert_eq!(CodecError::from_code(3), None);
    }

    #[test]
    fn kinds_are_distinct() {
        let kinds: Vec<_> = (-9..=-1).filter_map(CodecError::from_code).collect();
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn converts_to_io_error() {
        let err: io::Error = CodecError::InputOverrun.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err: io::Error = CodecError::OutOfMemory.into();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
    }
}

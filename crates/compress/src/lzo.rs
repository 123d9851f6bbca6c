//! LZO1X block codec.
//!
//! [`Lzo`] owns the encoder workspace and implements [`RawCodec`] for the
//! chunk framing layer. The block format itself lives in [`raw`].
//!
//! Constructing an [`Lzo`] runs a one-time, process-wide self check through
//! [`ensure_initialized`]. Later constructions reuse the cached result.

pub mod raw;

use std::sync::OnceLock;

use crate::codec::{CodecError, RawCodec};
use crate::header::ChunkType;
use raw::Dictionary;

static SELF_CHECK: OnceLock<bool> = OnceLock::new();

/// Runs the codec self check once per process.
///
/// Returns [`CodecError::InitFailed`] on every call if the check failed.
/// Safe to call from any number of threads and constructors.
pub fn ensure_initialized() -> Result<(), CodecError> {
    if *SELF_CHECK.get_or_init(self_check) {
        Ok(())
    } else {
        Err(CodecError::InitFailed)
    }
}

fn self_check() -> bool {
    const SAMPLE: &[u8] = b"lzo1x self check: abcabcabcabcabcabc 0123456789 0123456789 end";

    let mut dict = Dictionary::new();
    let mut compressed = vec![0u8; raw::max_compressed_len(SAMPLE.len())];
    let Ok(written) = raw::compress_into(SAMPLE, &mut compressed, &mut dict) else {
        return false;
    };
    let mut restored = vec![0u8; SAMPLE.len()];
    let passed = matches!(
        raw::decompress_into(&compressed[..written], &mut restored),
        Ok(len) if len == SAMPLE.len()
    ) && restored == SAMPLE;

    #[cfg(feature = "tracing")]
    logging::trace_codec!(
        passed,
        sample = SAMPLE.len(),
        compressed = written,
        "lzo1x self check finished"
    );

    passed
}

/// LZO1X codec with a reusable hash-table workspace.
///
/// An instance is not meant to be shared between threads without external
/// locking; create one per worker instead.
///
/// # Examples
///
/// ```
/// use compress::lzo::Lzo;
///
/// let mut lzo = Lzo::new().expect("self check");
/// let compressed = lzo.compress_to_vec(b"hello hello hello hello").unwrap();
/// let restored = lzo.decompress_to_vec(&compressed, 23).unwrap();
/// assert_eq!(restored, b"hello hello hello hello");
/// ```
#[derive(Clone, Debug)]
pub struct Lzo {
    dict: Dictionary,
}

impl Lzo {
    /// Creates a codec, running the process-wide self check on first use.
    pub fn new() -> Result<Self, CodecError> {
        ensure_initialized()?;
        Ok(Self {
            dict: Dictionary::new(),
        })
    }

    /// Upper bound of the compressed size of `len` input bytes.
    #[must_use]
    pub const fn max_compressed_length(len: usize) -> usize {
        raw::max_compressed_len(len)
    }

    /// Compresses `src` into `dst`, which must hold the worst-case output.
    pub fn compress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        let needed = Self::max_compressed_length(src.len());
        if dst.len() < needed {
            return Err(CodecError::BufferTooSmall {
                needed,
                available: dst.len(),
            });
        }
        raw::compress_into(src, dst, &mut self.dict)
    }

    /// Decompresses `src` into `dst` whose size came from a verified header.
    pub fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        raw::decompress_into(src, dst)
    }

    /// Decompresses untrusted `src` into `dst`.
    ///
    /// The decoder bounds-checks every copy, so this shares the fast path's
    /// implementation; it exists so call sites state their trust level.
    pub fn decompress_safe(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        raw::decompress_into(src, dst)
    }

    /// Compresses `src` into a new [`Vec`].
    pub fn compress_to_vec(&mut self, src: &[u8]) -> Result<Vec<u8>, CodecError> {
        raw::compress_to_vec(src, &mut self.dict)
    }

    /// Decompresses `src` into a new [`Vec`] of at most `max_len` bytes.
    pub fn decompress_to_vec(&self, src: &[u8], max_len: usize) -> Result<Vec<u8>, CodecError> {
        raw::decompress_to_vec(src, max_len)
    }
}

impl RawCodec for Lzo {
    fn chunk_type(&self) -> ChunkType {
        ChunkType::Lzo1x
    }

    fn max_compressed_length(&self, len: usize) -> usize {
        Self::max_compressed_length(len)
    }

    fn compress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        Self::compress(self, src, dst)
    }

    fn decompress(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        Self::decompress(self, src, dst)
    }

    fn decompress_safe(&mut self, src: &[u8], dst: &mut [u8]) -> Result<usize, CodecError> {
        Self::decompress_safe(self, src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialisation_is_idempotent() {
        assert_eq!(ensure_initialized(), Ok(()));
        assert_eq!(ensure_initialized(), Ok(()));
        let _first = Lzo::new().expect("first codec");
        let _second = Lzo::new().expect("second codec");
    }

    #[test]
    fn initialisation_is_thread_safe() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(ensure_initialized))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread"), Ok(()));
        }
    }

    #[test]
    fn bound_is_never_below_input() {
        for len in [0, 1, 15, 16, 1000, 1 << 20] {
            assert!(Lzo::max_compressed_length(len) >= len);
        }
    }

    #[test]
    fn compress_checks_destination_size() {
        let mut lzo = Lzo::new().expect("codec");
        let mut dst = [0u8; 8];
        assert_eq!(
            lzo.compress(b"payload", &mut dst),
            Err(CodecError::BufferTooSmall {
                needed: Lzo::max_compressed_length(7),
                available: 8,
            })
        );
    }

    #[test]
    fn workspace_is_reused_across_calls() {
        let mut lzo = Lzo::new().expect("codec");
        let first = lzo.compress_to_vec(b"alpha alpha alpha alpha").expect("first");
        let second = lzo.compress_to_vec(b"alpha alpha alpha alpha").expect("second");
        assert_eq!(first, second, "stale dictionary entries must not leak");
    }

    #[test]
    fn safe_and_fast_paths_agree() {
        let mut lzo = Lzo::new().expect("codec");
        let data = b"the same bytes the same bytes the same bytes".to_vec();
        let compressed = lzo.compress_to_vec(&data).expect("compress");

        let mut fast = vec![0u8; data.len()];
        let mut safe = vec![0u8; data.len()];
        let fast_len = lzo.decompress(&compressed, &mut fast).expect("fast");
        let safe_len = lzo.decompress_safe(&compressed, &mut safe).expect("safe");
        assert_eq!(fast_len, safe_len);
        assert_eq!(fast, safe);
        assert_eq!(fast, data);

        let mut short = vec![0u8; data.len() - 1];
        assert_eq!(
            lzo.decompress_safe(&compressed, &mut short),
            Err(CodecError::OutputOverrun)
        );
    }

    #[test]
    fn raw_codec_reports_lzo_marker() {
        let lzo = Lzo::new().expect("codec");
        assert_eq!(RawCodec::chunk_type(&lzo), ChunkType::Lzo1x);
    }
}

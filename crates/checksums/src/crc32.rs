//! crates/checksums/src/crc32.rs
//!
//! IEEE CRC32 helpers backed by `crc32fast`.

/// Streaming CRC32 hasher.
///
/// # Examples
///
/// ```
/// use checksums::crc32::Crc32;
///
/// let mut hasher = Crc32::new();
/// hasher.update(b"1234");
/// hasher.update(b"56789");
/// assert_eq!(hasher.finalize(), 0xCBF4_3926);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    inner: crc32fast::Hasher,
}

impl Crc32 {
    /// Creates a hasher with the zero seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: crc32fast::Hasher::new(),
        }
    }

    /// Creates a hasher that continues from a previously finalised checksum.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            inner: crc32fast::Hasher::new_with_initial(seed),
        }
    }

    /// Feeds additional bytes into the checksum state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the checksum.
    #[must_use]
    pub fn finalize(self) -> u32 {
        self.inner.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the CRC32 of `data` with the zero seed.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Computes the CRC32 of `data`, continuing from `seed`.
///
/// Passing the checksum of a prefix as `seed` yields the checksum of the
/// concatenation, so framed data can be checksummed piecewise.
#[must_use]
pub fn crc32_seeded(seed: u32, data: &[u8]) -> u32 {
    let mut hasher = Crc32::with_seed(seed);
    hasher.update(data);
    hasher.finalize()
}

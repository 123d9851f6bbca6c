#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the integrity primitive used by the chunk framing
//! layer: the IEEE CRC32 (the same polynomial used by zlib, gzip and PNG).
//! The framing code treats it as a pure function `crc32(seed, bytes) -> u32`
//! so the header module never depends on a particular implementation.
//!
//! # Design
//!
//! The [`crc32`] module wraps [`crc32fast`](https://docs.rs/crc32fast), which
//! selects a hardware accelerated implementation at runtime and falls back to
//! a table-driven one elsewhere. Two entry points are exposed:
//!
//! - [`crc32`](crc32::crc32) / [`crc32_seeded`](crc32::crc32_seeded) for
//!   one-shot checksums, where the seed continues a previous checksum.
//! - [`Crc32`](crc32::Crc32) for incremental hashing over several slices,
//!   which lets callers checksum a header and a payload without copying them
//!   into one buffer.
//!
//! # Invariants
//!
//! - `crc32_seeded(crc32(a), b) == crc32(a ++ b)` for all byte slices.
//! - A seed of `0` is the zero-seed convenience form: `crc32_seeded(0, x) == crc32(x)`.
//!
//! # Examples
//!
//! ```
//! use checksums::crc32::{Crc32, crc32, crc32_seeded};
//!
//! let whole = crc32(b"header+payload");
//! assert_eq!(crc32_seeded(crc32(b"header"), b"+payload"), whole);
//!
//! let mut hasher = Crc32::new();
//! hasher.update(b"header");
//! hasher.update(b"+payload");
//! assert_eq!(hasher.finalize(), whole);
//! ```

pub mod crc32;

pub use crc32::{Crc32, crc32, crc32_seeded};

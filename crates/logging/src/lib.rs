#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` holds the diagnostics plumbing shared by the lzchunk crates:
//! subsystem-specific tracing macros, the mapping from `-v` counts to filter
//! directives, and (behind the `tracing` feature) installation of a stderr
//! subscriber.
//!
//! # Design
//!
//! Library crates only emit events through [`trace_chunk!`], [`trace_codec!`]
//! and [`trace_stream!`]; they never install a subscriber. The binary builds
//! a [`VerbosityConfig`] from its flags and hands it to `init_tracing`, which
//! lets `RUST_LOG` override the derived directives.
//!
//! # Invariants
//!
//! - Events are written to stderr so compressed output on stdout stays clean.
//! - Installing a subscriber twice never panics.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.filter_directives(), "warn,lzchunk=debug");
//! ```

mod config;
mod tracing_macros;

#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{TARGET_PREFIX, VerbosityConfig};

#[cfg(feature = "tracing")]
pub use tracing_bridge::{ENV_FILTER_VAR, InitError, build_filter, init_tracing, try_init_tracing};

//! Convenience macros for lzchunk-specific tracing.
//!
//! Each macro pins the target of one subsystem so filters such as
//! `lzchunk::codec=trace` select exactly that subsystem. The expansion names
//! `::tracing` directly, so the calling crate must depend on `tracing`.

/// Emit a chunk framing trace.
///
/// # Example
/// ```ignore
/// trace_chunk!(input = data.len(), output = written, "chunk written");
/// ```
#[macro_export]
macro_rules! trace_chunk {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "lzchunk::chunk", $($arg)*);
    };
}

/// Emit a raw codec trace.
///
/// # Example
/// ```ignore
/// trace_codec!(workspace = len, "codec initialised");
/// ```
#[macro_export]
macro_rules! trace_codec {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "lzchunk::codec", $($arg)*);
    };
}

/// Emit a stream compressor trace.
///
/// # Example
/// ```ignore
/// trace_stream!(framing = %encoding, "framing guessed");
/// ```
#[macro_export]
macro_rules! trace_stream {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "lzchunk::stream", $($arg)*);
    };
}

/// Emit a command-line front end trace.
///
/// # Example
/// ```ignore
/// trace_cli!(input = %path.display(), "reading input");
/// ```
#[macro_export]
macro_rules! trace_cli {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "lzchunk::cli", $($arg)*);
    };
}

//! Shared enumeration of the two container formats produced by the workspace.

use core::fmt;
use core::str::FromStr;

/// Container formats understood by the command line front-end.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Format {
    /// Checksummed LZO1X chunk sequence ([`sequence`](crate::sequence)).
    #[default]
    Chunk,
    /// Plain zlib, gzip or raw stream ([`stream`](crate::stream)).
    Stream,
}

impl Format {
    /// Returns the canonical name used in diagnostics and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Format::Chunk => "chunk",
            Format::Stream => "stream",
        }
    }

    /// Returns every supported format.
    #[must_use]
    pub const fn available() -> &'static [Format] {
        &[Format::Chunk, Format::Stream]
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when attempting to parse an unsupported format name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormatParseError {
    input: String,
}

impl FormatParseError {
    /// Creates a parse error capturing the original input.
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// Returns the invalid input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for FormatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported format '{}' (expected chunk or stream)",
            self.input
        )
    }
}

impl std::error::Error for FormatParseError {}

impl FromStr for Format {
    type Err = FormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chunk" | "chunks" | "lzo" => Ok(Format::Chunk),
            "stream" | "deflate" => Ok(Format::Stream),
            _ => Err(FormatParseError::new(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_formats_round_trip_through_names() {
        for format in Format::available() {
            assert_eq!(format.name().parse::<Format>().expect("known"), *format);
        }
    }

    #[test]
    fn parsing_accepts_aliases() {
        assert_eq!("LZO".parse::<Format>().expect("alias"), Format::Chunk);
        assert_eq!(" deflate ".parse::<Format>().expect("alias"), Format::Stream);
    }

    #[test]
    fn parsing_rejects_unknown_formats() {
        let err = "brotli".parse::<Format>().expect_err("brotli unsupported");
        assert_eq!(err.input(), "brotli");
        assert!(err.to_string().contains("brotli"));
    }
}

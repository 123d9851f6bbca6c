//! Process exit codes reported by the front end.
//!
//! Every failure maps to exactly one code so scripts can tell a bad flag
//! from a corrupt chunk or a truncated gzip stream.

use std::fmt;

/// Exit codes returned by [`run`](crate::run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion.
    Ok = 0,

    /// Invalid command line, option value or config file.
    Usage = 1,

    /// Reading the input or writing the output failed.
    Io = 2,

    /// A chunk header or chunk sequence is malformed.
    ///
    /// Covers checksum and length mismatches, missing Start or Stop chunks
    /// and inputs too large for the chunk format.
    Framing = 3,

    /// The LZO1X codec rejected its input.
    Codec = 4,

    /// A zlib or gzip stream is corrupt or truncated.
    Stream = 5,

    /// The codec self check failed at start-up.
    SelfCheck = 70,
}

impl ExitCode {
    /// Returns the numeric process status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a short description of the exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Usage => "usage error",
            Self::Io => "I/O error",
            Self::Framing => "chunk framing error",
            Self::Codec => "codec error",
            Self::Stream => "stream error",
            Self::SelfCheck => "codec self check failed",
        }
    }

    /// Looks up the exit code for a numeric status.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Ok,
            1 => Self::Usage,
            2 => Self::Io,
            3 => Self::Framing,
            4 => Self::Codec,
            5 => Self::Stream,
            70 => Self::SelfCheck,
            _ => return None,
        })
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

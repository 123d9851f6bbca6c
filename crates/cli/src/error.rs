//! Failures surfaced by the front end and their exit codes.

use std::io;
use std::path::PathBuf;

use compress::{ChunkError, CodecError, FormatParseError, OptionError, StreamError};

use crate::exit_code::ExitCode;

/// Error that aborts a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The command line is malformed.
    #[error("{0}")]
    Usage(String),

    /// An encoding, decoding or level identifier was rejected.
    #[error(transparent)]
    Option(#[from] OptionError),

    /// The `--format` value is not recognised.
    #[error(transparent)]
    Format(#[from] FormatParseError),

    /// The `--config` file is not valid JSON or has unexpected fields.
    #[error("invalid config file {}: {source}", path.display())]
    Config {
        /// Path of the config file.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// Opening, reading or writing a file failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The input does not fit the 32-bit total of a Start chunk.
    #[error("input of {len} bytes exceeds the chunk format limit of {max} bytes")]
    InputTooLarge {
        /// Input length.
        len: u64,
        /// Largest representable total.
        max: u64,
    },

    /// Chunk framing or codec failure.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Stream compressor failure.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl From<CodecError> for CliError {
    fn from(error: CodecError) -> Self {
        Self::Chunk(ChunkError::Codec(error))
    }
}

impl CliError {
    /// Wraps an I/O failure with a description of the failed action.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Classifies the error into a process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Usage(_) | Self::Option(_) | Self::Format(_) | Self::Config { .. } => {
                ExitCode::Usage
            }
            Self::Io { .. } | Self::Chunk(ChunkError::Io(_)) | Self::Stream(StreamError::Io(_)) => {
                ExitCode::Io
            }
            Self::Chunk(ChunkError::Codec(CodecError::InitFailed)) => ExitCode::SelfCheck,
            Self::Chunk(ChunkError::Codec(_)) => ExitCode::Codec,
            Self::InputTooLarge { .. } | Self::Chunk(_) => ExitCode::Framing,
            Self::Stream(_) => ExitCode::Stream,
        }
    }
}

//! Runs `compress` and `decompress` against files or standard streams.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use compress::header::HEADER_SIZE;
use compress::sequence::{ChunkReader, ChunkWriter, looks_chunked};
use compress::stream::StreamCompressor;
use compress::{ChunkCodec, ChunkError, Format, fill_prefix};

use crate::config::Settings;
use crate::error::CliError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Direction of a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    Compress,
    Decompress,
}

impl Mode {
    fn parse(operand: &OsStr) -> Result<Self, CliError> {
        match operand.to_str() {
            Some("compress" | "c") => Ok(Self::Compress),
            Some("decompress" | "d") => Ok(Self::Decompress),
            _ => Err(CliError::Usage(format!(
                "unknown command '{}' (expected compress or decompress)",
                operand.to_string_lossy()
            ))),
        }
    }
}

/// One fully specified invocation.
#[derive(Debug)]
pub(crate) struct Job {
    mode: Mode,
    input: Option<OsString>,
    output: Option<OsString>,
    settings: Settings,
}

impl Job {
    /// Splits `COMMAND [INPUT] [OUTPUT]` operands; `-` names a standard stream.
    pub(crate) fn new(operands: Vec<OsString>, settings: Settings) -> Result<Self, CliError> {
        let mut operands = operands.into_iter();
        let mode = match operands.next() {
            Some(command) => Mode::parse(&command)?,
            None => {
                return Err(CliError::Usage(
                    "missing command (expected compress or decompress)".to_owned(),
                ));
            }
        };
        let input = operands.next().filter(|path| path != "-");
        let output = operands.next().filter(|path| path != "-");
        if let Some(extra) = operands.next() {
            return Err(CliError::Usage(format!(
                "unexpected operand '{}'",
                extra.to_string_lossy()
            )));
        }
        Ok(Self {
            mode,
            input,
            output,
            settings,
        })
    }

    /// Runs the job, writing to `stdout` when no output path was given.
    pub(crate) fn run<Out: Write>(self, stdout: &mut Out) -> Result<(), CliError> {
        let (input, known_len) = open_input(self.input.as_deref())?;
        match self.output.as_deref() {
            Some(path) => {
                let display = Path::new(path).display().to_string();
                let file = File::create(path)
                    .map_err(|e| CliError::io(format!("creating {display}"), e))?;
                let mut output = BufWriter::new(file);
                self.dispatch(input, known_len, &mut output)?;
                output
                    .flush()
                    .map_err(|e| CliError::io(format!("writing {display}"), e))
            }
            None => {
                self.dispatch(input, known_len, &mut *stdout)?;
                stdout
                    .flush()
                    .map_err(|e| CliError::io("writing standard output", e))
            }
        }
    }

    /// `known_len` is the input size when it can be learned without reading,
    /// as for regular files.
    fn dispatch<R: Read, W: Write>(
        &self,
        input: R,
        known_len: Option<u64>,
        output: W,
    ) -> Result<(), CliError> {
        logging::trace_cli!(mode = ?self.mode, format = ?self.settings.format, known_len, "running");

        match (self.mode, self.settings.format) {
            (Mode::Compress, None | Some(Format::Chunk)) => match known_len {
                Some(len) => self.compress_chunks_streamed(input, len, output),
                None => self.compress_chunks(input, output),
            },
            (Mode::Compress, Some(Format::Stream)) => self.compress_stream(input, output),
            (Mode::Decompress, Some(Format::Chunk)) => self.decompress_chunks(input, output),
            (Mode::Decompress, Some(Format::Stream)) => self.decompress_stream(input, output),
            (Mode::Decompress, None) => self.decompress_detected(input, output),
        }
    }

    /// Buffers the whole input, since the Start chunk needs its length.
    fn compress_chunks<R: Read, W: Write>(&self, mut input: R, output: W) -> Result<(), CliError> {
        let mut data = Vec::new();
        input
            .read_to_end(&mut data)
            .map_err(|e| CliError::io("reading input", e))?;
        let total = u32::try_from(data.len()).map_err(|_| CliError::InputTooLarge {
            len: data.len() as u64,
            max: u64::from(u32::MAX),
        })?;

        let mut writer =
            ChunkWriter::with_config(output, ChunkCodec::new()?, total, self.settings.writer)?;
        writer.write_all(&data).map_err(ChunkError::from)?;
        writer.finish()?;
        Ok(())
    }

    /// Streams input of a known length through the chunk writer.
    ///
    /// Input that grows or shrinks while being read fails with
    /// [`ChunkError::TotalLengthMismatch`].
    fn compress_chunks_streamed<R: Read, W: Write>(
        &self,
        mut input: R,
        len: u64,
        output: W,
    ) -> Result<(), CliError> {
        let total = u32::try_from(len).map_err(|_| CliError::InputTooLarge {
            len,
            max: u64::from(u32::MAX),
        })?;

        let mut writer =
            ChunkWriter::with_config(output, ChunkCodec::new()?, total, self.settings.writer)?;
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        loop {
            let read = match input.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CliError::io("reading input", e)),
            };
            writer
                .write_all(&buffer[..read])
                .map_err(ChunkError::from)?;
        }
        writer.finish()?;
        Ok(())
    }

    fn decompress_chunks<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<(), CliError> {
        let mut reader = ChunkReader::new(input)?;
        while let Some(block) = reader.next_chunk()? {
            output
                .write_all(&block)
                .map_err(|e| CliError::io("writing output", e))?;
        }
        let mut rest = reader.into_inner();
        let mut extra = [0u8; 1];
        if fill_prefix(&mut rest, &mut extra).map_err(ChunkError::from)? != 0 {
            return Err(ChunkError::TrailingData.into());
        }
        Ok(())
    }

    fn compress_stream<R: Read, W: Write>(&self, input: R, output: W) -> Result<(), CliError> {
        let mut compressor = StreamCompressor::with_options(self.settings.options);
        compressor.encode(input, output)?;
        Ok(())
    }

    fn decompress_stream<R: Read, W: Write>(&self, input: R, output: W) -> Result<(), CliError> {
        let mut compressor = StreamCompressor::with_options(self.settings.options);
        compressor.decode(input, output)?;
        Ok(())
    }

    /// Treats input opening with a Start chunk as a chunk sequence and
    /// anything else as a stream.
    fn decompress_detected<R: Read, W: Write>(&self, mut input: R, output: W) -> Result<(), CliError> {
        let mut prefix = [0u8; HEADER_SIZE];
        let filled =
            fill_prefix(&mut input, &mut prefix).map_err(|e| CliError::io("reading input", e))?;
        let chunked = looks_chunked(&prefix[..filled]);

        logging::trace_cli!(chunked, "detected input format");

        let source = (&prefix[..filled]).chain(input);
        if chunked {
            self.decompress_chunks(source, output)
        } else {
            self.decompress_stream(source, output)
        }
    }
}

/// Opens the input, reporting its length when it is a regular file.
fn open_input(path: Option<&OsStr>) -> Result<(Box<dyn Read>, Option<u64>), CliError> {
    match path {
        Some(path) => {
            let display = Path::new(path).display();
            let file = File::open(path).map_err(|e| CliError::io(format!("opening {display}"), e))?;
            let metadata = file
                .metadata()
                .map_err(|e| CliError::io(format!("inspecting {display}"), e))?;
            let len = metadata.is_file().then(|| metadata.len());
            Ok((Box::new(BufReader::new(file)), len))
        }
        None => Ok((Box::new(io::stdin().lock()), None)),
    }
}

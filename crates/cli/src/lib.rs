#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `lzchunk` command-line front end. It compresses and
//! decompresses files or standard streams either as checksummed LZO1X chunk
//! sequences or as zlib/gzip streams, delegating all format work to the
//! [`compress`] crate.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error, so the binary and the tests drive the same
//! code path. A `clap` builder command parses flags; settings from an
//! optional JSON `--config` file are merged underneath them; the resulting
//! job reads its input, writes its output and returns an [`ExitCode`].
//!
//! # Invariants
//!
//! - `run` never panics; every failure becomes a diagnostic on stderr and a
//!   non-zero exit code.
//! - Diagnostics and tracing output go to stderr only, so compressed bytes
//!   written to stdout are never interleaved with text.
//! - `decompress` without `--format` treats input that opens with a Start
//!   chunk as a chunk sequence and anything else as a stream whose
//!   container is guessed.
//!
//! # Errors
//!
//! See [`ExitCode`] for the mapping from failure kinds to exit codes.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["lzchunk", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("lzchunk "));
//! assert!(stderr.is_empty());
//! ```

use std::ffi::OsString;
use std::io::Write;

use compress::header::FORMAT_VERSION;
use logging::VerbosityConfig;

mod args;
mod config;
mod error;
mod execute;
mod exit_code;

pub use error::CliError;
pub use exit_code::ExitCode;

use args::parse_args;
use config::Settings;
use execute::Job;

/// Help text describing the supported commands and options.
const HELP_TEXT: &str = concat!(
    "Usage: lzchunk [OPTIONS] <compress|decompress> [INPUT] [OUTPUT]\n",
    "\n",
    "Compresses or decompresses INPUT into OUTPUT. A missing operand or '-'\n",
    "selects standard input or standard output.\n",
    "\n",
    "Options:\n",
    "  -f, --format FORMAT     chunk (default) or stream. When decompressing\n",
    "                          without --format the input is sniffed.\n",
    "  -b, --block-size BYTES  Raw bytes per chunk (default 65536).\n",
    "      --null-terminator   End chunk sequences with a Null chunk.\n",
    "  -e, --encoding ENC      Stream container: zlib (default), gzip or none.\n",
    "  -d, --decoding DEC      Stream container: guess (default), zlib, gzip or none.\n",
    "  -l, --level LEVEL       none, fast, normal (default), best or -1..9.\n",
    "      --accept-invalid    Use defaults for unrecognised option values.\n",
    "  -c, --config FILE       Read settings from a JSON file; flags override it.\n",
    "  -v, --verbose           Increase diagnostics on stderr (repeatable).\n",
    "  -V, --version           Output version information and exit.\n",
    "  -h, --help              Show this help message and exit.\n",
    "\n",
    "Exit status: 0 success, 1 usage, 2 I/O, 3 framing, 4 codec, 5 stream,\n",
    "70 codec self check failure.\n",
);

/// Renders the help text.
fn render_help() -> String {
    HELP_TEXT.to_string()
}

/// Renders the version banner.
fn render_version() -> String {
    format!(
        "lzchunk {}\nchunk format version {FORMAT_VERSION}\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit code that should be used by the caller.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return ExitCode::Usage.as_i32();
        }
    };

    if parsed.show_help {
        return write_or_io_error(stdout, &render_help());
    }
    if parsed.show_version {
        return write_or_io_error(stdout, &render_version());
    }

    logging::init_tracing(&VerbosityConfig::from_verbose_level(parsed.verbose));

    let result = Settings::resolve(&parsed)
        .and_then(|settings| Job::new(parsed.operands, settings))
        .and_then(|job| job.run(stdout));

    match result {
        Ok(()) => ExitCode::Ok.as_i32(),
        Err(error) => {
            let code = error.exit_code();
            logging::trace_cli!(%code, "command failed");
            let _ = writeln!(stderr, "lzchunk: {error}");
            code.as_i32()
        }
    }
}

fn write_or_io_error<W: Write>(sink: &mut W, text: &str) -> i32 {
    match sink.write_all(text.as_bytes()).and_then(|()| sink.flush()) {
        Ok(()) => ExitCode::Ok.as_i32(),
        Err(_) => ExitCode::Io.as_i32(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_with_args<I, S>(args: I) -> (i32, Vec<u8>, Vec<u8>)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(args, &mut stdout, &mut stderr);
        (code, stdout, stderr)
    }

    #[test]
    fn help_flag_renders_help_text() {
        let (code, stdout, stderr) = run_with_args(["lzchunk", "--help"]);
        assert_eq!(code, 0);
        assert!(stderr.is_empty());
        assert_eq!(stdout, render_help().into_bytes());
    }

    #[test]
    fn version_flag_renders_banner() {
        let (code, stdout, _) = run_with_args(["lzchunk", "-V"]);
        assert_eq!(code, 0);
        let banner = String::from_utf8(stdout).expect("utf-8");
        assert!(banner.contains("chunk format version 1"));
    }

    #[test]
    fn unknown_flag_exits_with_usage() {
        let (code, stdout, stderr) = run_with_args(["lzchunk", "--frobnicate"]);
        assert_eq!(code, 1);
        assert!(stdout.is_empty());
        assert!(!stderr.is_empty());
    }

    #[test]
    fn missing_command_exits_with_usage() {
        let (code, _, stderr) = run_with_args(["lzchunk"]);
        assert_eq!(code, 1);
        assert!(String::from_utf8_lossy(&stderr).contains("missing command"));
    }

    #[test]
    fn invalid_level_exits_with_usage() {
        let (code, _, stderr) = run_with_args(["lzchunk", "compress", "--level", "11", "/nonexistent"]);
        assert_eq!(code, 1);
        assert!(String::from_utf8_lossy(&stderr).contains("invalid compression level"));
    }

    #[test]
    fn missing_input_exits_with_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.bin");
        let (code, _, stderr) = run_with_args([
            OsString::from("lzchunk"),
            OsString::from("compress"),
            missing.into_os_string(),
        ]);
        assert_eq!(code, 2);
        assert!(String::from_utf8_lossy(&stderr).contains("absent.bin"));
    }

    #[test]
    fn file_round_trip_in_both_formats() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("original.txt");
        let packed = dir.path().join("packed.bin");
        let restored = dir.path().join("restored.txt");
        let data = b"file based round trip ".repeat(1000);
        fs::write(&original, &data).expect("write original");

        for format in ["chunk", "stream"] {
            let (code, _, stderr) = run_with_args([
                OsString::from("lzchunk"),
                "compress".into(),
                "--format".into(),
                format.into(),
                original.clone().into_os_string(),
                packed.clone().into_os_string(),
            ]);
            assert_eq!(code, 0, "{}", String::from_utf8_lossy(&stderr));

            let (code, _, stderr) = run_with_args([
                OsString::from("lzchunk"),
                "decompress".into(),
                packed.clone().into_os_string(),
                restored.clone().into_os_string(),
            ]);
            assert_eq!(code, 0, "{}", String::from_utf8_lossy(&stderr));
            assert_eq!(fs::read(&restored).expect("read restored"), data, "{format}");
        }
    }

    #[test]
    fn output_defaults_to_stdout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("in.txt");
        fs::write(&original, b"to stdout").expect("write");

        let (code, stdout, _) = run_with_args([
            OsString::from("lzchunk"),
            "compress".into(),
            "--format=stream".into(),
            "--encoding=none".into(),
            original.into_os_string(),
        ]);
        assert_eq!(code, 0);
        assert_eq!(stdout, b"to stdout");
    }

    #[test]
    fn config_file_errors_exit_with_usage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("config.json");
        fs::write(&config, "{ not json").expect("write");

        let (code, _, stderr) = run_with_args([
            OsString::from("lzchunk"),
            "--config".into(),
            config.into_os_string(),
            "compress".into(),
        ]);
        assert_eq!(code, 1);
        assert!(String::from_utf8_lossy(&stderr).contains("invalid config file"));
    }
}

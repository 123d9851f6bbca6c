//! Settings merged from `--config FILE` and command-line flags.
//!
//! The file is a JSON object:
//!
//! ```json
//! {
//!   "format": "stream",
//!   "block_size": 65536,
//!   "null_terminator": false,
//!   "stream": { "encoding": "gzip", "decoding": "guess", "level": 9 }
//! }
//! ```
//!
//! Flags given on the command line override values from the file.

use std::fs;
use std::path::{Path, PathBuf};

use compress::options::CompressionOptions;
use compress::{Format, WriterConfig};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::args::ParsedArgs;
use crate::error::CliError;

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    format: Option<String>,
    block_size: Option<u32>,
    null_terminator: Option<bool>,
    stream: Map<String, Value>,
}

impl ConfigFile {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("reading config {}", path.display()), e))?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, CliError> {
        serde_json::from_str(text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings for one command.
#[derive(Debug, Default)]
pub(crate) struct Settings {
    /// Explicit format; `None` lets decompression detect the input format.
    pub(crate) format: Option<Format>,
    pub(crate) writer: WriterConfig,
    pub(crate) options: CompressionOptions,
}

impl Settings {
    /// Merges the optional config file with the parsed flags.
    pub(crate) fn resolve(parsed: &ParsedArgs) -> Result<Self, CliError> {
        let file = match &parsed.config {
            Some(path) => ConfigFile::load(&PathBuf::from(path))?,
            None => ConfigFile::default(),
        };
        Self::merge(file, parsed)
    }

    fn merge(file: ConfigFile, parsed: &ParsedArgs) -> Result<Self, CliError> {
        let mut settings = Self::default();
        let accept_invalid = parsed.accept_invalid;

        let format = parsed.format.as_deref().or(file.format.as_deref());
        settings.format = format.map(str::parse::<Format>).transpose()?;

        if let Some(block_size) = parsed.block_size.or(file.block_size) {
            settings.writer = settings.writer.with_block_size(block_size as usize);
        }
        settings.writer = settings
            .writer
            .with_null_terminator(parsed.null_terminator || file.null_terminator.unwrap_or(false));

        for (key, value) in &file.stream {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            apply(&mut settings.options, key, &value, accept_invalid)?;
        }
        let flags = [
            ("encoding", &parsed.encoding),
            ("decoding", &parsed.decoding),
            ("level", &parsed.level),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                apply(&mut settings.options, key, value, accept_invalid)?;
            }
        }

        Ok(settings)
    }
}

fn apply(
    options: &mut CompressionOptions,
    key: &str,
    value: &str,
    accept_invalid: bool,
) -> Result<(), CliError> {
    if accept_invalid {
        options.set_or_default(key, value)?;
    } else {
        options.set(key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compress::options::{Decoding, Encoding, Level, OptionError};

    fn parse(text: &str) -> ConfigFile {
        ConfigFile::parse(text, Path::new("test.json")).expect("valid config")
    }

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::merge(parse("{}"), &ParsedArgs::default()).expect("merge");
        assert_eq!(settings.format, None);
        assert_eq!(settings.options, CompressionOptions::default());
        assert_eq!(settings.writer, WriterConfig::default());
    }

    #[test]
    fn config_values_are_applied() {
        let file = parse(
            r#"{"format":"stream","block_size":512,"null_terminator":true,
                "stream":{"encoding":"gzip","decoding":"zlib","level":9}}"#,
        );
        let settings = Settings::merge(file, &ParsedArgs::default()).expect("merge");
        assert_eq!(settings.format, Some(Format::Stream));
        assert_eq!(
            settings.writer,
            WriterConfig::default()
                .with_block_size(512)
                .with_null_terminator(true)
        );
        assert_eq!(settings.options.encoding(), Encoding::Gzip);
        assert_eq!(settings.options.decoding(), Decoding::Zlib);
        assert_eq!(settings.options.level(), Level::Best);
    }

    #[test]
    fn flags_override_config() {
        let file = parse(r#"{"format":"stream","stream":{"encoding":"gzip"}}"#);
        let parsed = ParsedArgs {
            format: Some("chunk".into()),
            encoding: Some("none".into()),
            ..ParsedArgs::default()
        };
        let settings = Settings::merge(file, &parsed).expect("merge");
        assert_eq!(settings.format, Some(Format::Chunk));
        assert_eq!(settings.options.encoding(), Encoding::None);
    }

    #[test]
    fn invalid_values_fail_unless_accepted() {
        let parsed = ParsedArgs {
            level: Some("bogus".into()),
            ..ParsedArgs::default()
        };
        let err = Settings::merge(ConfigFile::default(), &parsed).expect_err("rejected");
        assert!(matches!(
            err,
            CliError::Option(OptionError::InvalidLevel(ref level)) if level == "bogus"
        ));

        let lenient = ParsedArgs {
            accept_invalid: true,
            ..parsed
        };
        let settings = Settings::merge(ConfigFile::default(), &lenient).expect("defaulted");
        assert_eq!(settings.options.level(), Level::default());
    }

    #[test]
    fn unknown_stream_key_is_rejected_even_when_lenient() {
        let file = parse(r#"{"stream":{"window":15}}"#);
        let parsed = ParsedArgs {
            accept_invalid: true,
            ..ParsedArgs::default()
        };
        assert!(matches!(
            Settings::merge(file, &parsed),
            Err(CliError::Option(OptionError::UnknownIdentifier(_)))
        ));
    }

    #[test]
    fn unknown_top_level_field_is_a_config_error() {
        let err = ConfigFile::parse(r#"{"colour":"blue"}"#, Path::new("bad.json"))
            .expect_err("rejected");
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn bad_format_name_is_reported() {
        let parsed = ParsedArgs {
            format: Some("zip".into()),
            ..ParsedArgs::default()
        };
        assert!(matches!(
            Settings::merge(ConfigFile::default(), &parsed),
            Err(CliError::Format(_))
        ));
    }
}

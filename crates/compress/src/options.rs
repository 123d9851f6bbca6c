//! Option model for [`StreamCompressor`](crate::stream::StreamCompressor).
//!
//! Three independent settings control a stream compressor:
//!
//! - [`Encoding`]: the container written when compressing.
//! - [`Decoding`]: the container expected when decompressing, or
//!   [`Decoding::Guess`] to sniff it from the leading bytes.
//! - [`Level`]: the DEFLATE effort, `-1..=9` in zlib terms.
//!
//! Each setting can be supplied as a typed value, a numeric code, or a
//! case-sensitive string identifier. String setters come in two forms: the
//! `try_set_*` form fails with an [`OptionError`], the `*_or_default` form
//! falls back to the setting's default. An empty identifier always selects
//! the default.
//!
//! # Examples
//!
//! ```
//! use compress::options::{CompressionOptions, Decoding, Encoding, Level};
//!
//! let mut options = CompressionOptions::default();
//! options.try_set_encoding("gzip").unwrap().try_set_level("9").unwrap();
//! assert_eq!(options.encoding(), Encoding::Gzip);
//! assert_eq!(options.level(), Level::Best);
//!
//! options.set_decoding_or_default("bogus");
//! assert_eq!(options.decoding(), Decoding::Guess);
//! ```

use std::fmt;
use std::num::NonZeroU8;
use std::str::FromStr;

/// Failure to interpret an option identifier.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum OptionError {
    /// The encoding identifier or code is not recognised.
    #[error("invalid encoding '{0}' (expected zlib, gzip or none)")]
    InvalidEncoding(String),

    /// The decoding identifier or code is not recognised.
    #[error("invalid decoding '{0}' (expected guess, zlib, gzip or none)")]
    InvalidDecoding(String),

    /// The level identifier is not recognised or out of range.
    #[error("invalid compression level '{0}' (expected none, fast, normal, best or -1..9)")]
    InvalidLevel(String),

    /// The option name itself is not recognised.
    #[error("unknown option '{0}' (expected encoding, decoding or level)")]
    UnknownIdentifier(String),
}

/// Container written when compressing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Encoding {
    /// Pass bytes through unchanged.
    None,
    /// zlib container (RFC 1950).
    #[default]
    Zlib,
    /// gzip container (RFC 1952).
    Gzip,
}

impl Encoding {
    /// Canonical identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Gzip => "gzip",
        }
    }

    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
            Self::Gzip => 2,
        }
    }

    /// Parses an identifier; the empty string selects the default.
    pub fn from_identifier(identifier: &str) -> Result<Self, OptionError> {
        match identifier {
            "" => Ok(Self::default()),
            "zlib" => Ok(Self::Zlib),
            "gzip" => Ok(Self::Gzip),
            "none" | "off" | "no" | "disabled" => Ok(Self::None),
            other => Err(OptionError::InvalidEncoding(other.to_owned())),
        }
    }
}

/// Container expected when decompressing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Decoding {
    /// Input is passed through unchanged.
    None,
    /// Input is a zlib stream.
    Zlib,
    /// Input is a gzip stream.
    Gzip,
    /// Detect gzip, zlib or raw input from the leading bytes.
    ///
    /// Detection only looks at the first two bytes, so raw data that happens
    /// to start with a well-formed zlib header (`"x^"`, `"x\u{1}"` and others)
    /// is decoded as zlib and fails. Use [`Decoding::None`] when the input is
    /// known to be uncompressed.
    #[default]
    Guess,
}

impl Decoding {
    /// Canonical identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Gzip => "gzip",
            Self::Guess => "guess",
        }
    }

    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
            Self::Gzip => 2,
            Self::Guess => 3,
        }
    }

    /// The fixed container this setting names, or `None` for [`Decoding::Guess`].
    #[must_use]
    pub const fn framing(self) -> Option<Encoding> {
        match self {
            Self::None => Some(Encoding::None),
            Self::Zlib => Some(Encoding::Zlib),
            Self::Gzip => Some(Encoding::Gzip),
            Self::Guess => None,
        }
    }

    /// Parses an identifier; the empty string selects the default.
    pub fn from_identifier(identifier: &str) -> Result<Self, OptionError> {
        match identifier {
            "" => Ok(Self::default()),
            "guess" | "auto" => Ok(Self::Guess),
            "zlib" => Ok(Self::Zlib),
            "gzip" => Ok(Self::Gzip),
            "none" | "off" | "no" | "disabled" => Ok(Self::None),
            other => Err(OptionError::InvalidDecoding(other.to_owned())),
        }
    }
}

/// DEFLATE compression effort.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "LevelRepr", into = "String")
)]
pub enum Level {
    /// Store without compressing (zlib level 0).
    None,
    /// Favour speed (zlib level 1).
    Fast,
    /// zlib's default trade-off (level 6, requested as -1).
    #[default]
    Normal,
    /// Favour ratio (zlib level 9).
    Best,
    /// An explicit zlib level in `2..=8`.
    Precise(NonZeroU8),
}

impl Level {
    /// Maps a zlib-style numeric level in `-1..=9`.
    pub fn from_numeric(level: i32) -> Result<Self, OptionError> {
        match level {
            -1 => Ok(Self::Normal),
            0 => Ok(Self::None),
            1 => Ok(Self::Fast),
            9 => Ok(Self::Best),
            2..=8 => NonZeroU8::new(level as u8)
                .map(Self::Precise)
                .ok_or_else(|| OptionError::InvalidLevel(level.to_string())),
            _ => Err(OptionError::InvalidLevel(level.to_string())),
        }
    }

    /// Numeric form, `-1` for [`Level::Normal`].
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Fast => 1,
            Self::Normal => -1,
            Self::Best => 9,
            Self::Precise(level) => level.get() as i32,
        }
    }

    /// Effective zlib level in `0..=9`.
    #[must_use]
    pub const fn zlib_level(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Fast => 1,
            Self::Normal => 6,
            Self::Best => 9,
            Self::Precise(level) => level.get() as u32,
        }
    }

    /// Parses a keyword or a numeric string; the empty string selects the default.
    pub fn from_identifier(identifier: &str) -> Result<Self, OptionError> {
        match identifier {
            "" => Ok(Self::default()),
            "none" | "off" | "no" | "disabled" => Ok(Self::None),
            "fast" => Ok(Self::Fast),
            "normal" | "default" => Ok(Self::Normal),
            "best" => Ok(Self::Best),
            numeric => numeric
                .parse::<i32>()
                .map_err(|_| OptionError::InvalidLevel(numeric.to_owned()))
                .and_then(Self::from_numeric),
        }
    }
}

macro_rules! keyword_conversions {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = OptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_identifier(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = OptionError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_identifier(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.name().to_owned()
            }
        }
    };
}

keyword_conversions!(Encoding);
keyword_conversions!(Decoding);

impl TryFrom<i32> for Encoding {
    type Error = OptionError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            2 => Ok(Self::Gzip),
            _ => Err(OptionError::InvalidEncoding(code.to_string())),
        }
    }
}

impl TryFrom<i32> for Decoding {
    type Error = OptionError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            2 => Ok(Self::Gzip),
            3 => Ok(Self::Guess),
            _ => Err(OptionError::InvalidDecoding(code.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Fast => f.write_str("fast"),
            Self::Normal => f.write_str("normal"),
            Self::Best => f.write_str("best"),
            Self::Precise(level) => write!(f, "{level}"),
        }
    }
}

impl FromStr for Level {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s)
    }
}

impl TryFrom<i32> for Level {
    type Error = OptionError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Self::from_numeric(level)
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.to_string()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Numeric(i32),
    Named(String),
}

#[cfg(feature = "serde")]
impl TryFrom<LevelRepr> for Level {
    type Error = OptionError;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Numeric(level) => Self::from_numeric(level),
            LevelRepr::Named(name) => Self::from_identifier(&name),
        }
    }
}

/// Settings read by a stream compressor at the start of every call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct CompressionOptions {
    encoding: Encoding,
    decoding: Decoding,
    level: Level,
}

impl CompressionOptions {
    /// Creates options from typed values.
    #[must_use]
    pub const fn new(encoding: Encoding, decoding: Decoding, level: Level) -> Self {
        Self {
            encoding,
            decoding,
            level,
        }
    }

    /// Builds options from `key=value` style pairs, starting from the defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, OptionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Container written when compressing.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Container expected when decompressing.
    #[must_use]
    pub const fn decoding(&self) -> Decoding {
        self.decoding
    }

    /// Compression effort.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Sets the encoding.
    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    /// Sets the encoding from an identifier, failing on unknown identifiers.
    pub fn try_set_encoding(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.encoding = Encoding::from_identifier(identifier)?;
        Ok(self)
    }

    /// Sets the encoding from an identifier, using the default for unknown identifiers.
    pub fn set_encoding_or_default(&mut self, identifier: &str) -> &mut Self {
        self.encoding = Encoding::from_identifier(identifier).unwrap_or_default();
        self
    }

    /// Sets the decoding.
    pub fn set_decoding(&mut self, decoding: Decoding) -> &mut Self {
        self.decoding = decoding;
        self
    }

    /// Sets the decoding from an identifier, failing on unknown identifiers.
    pub fn try_set_decoding(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.decoding = Decoding::from_identifier(identifier)?;
        Ok(self)
    }

    /// Sets the decoding from an identifier, using the default for unknown identifiers.
    pub fn set_decoding_or_default(&mut self, identifier: &str) -> &mut Self {
        self.decoding = Decoding::from_identifier(identifier).unwrap_or_default();
        self
    }

    /// Sets the level.
    pub fn set_level(&mut self, level: Level) -> &mut Self {
        self.level = level;
        self
    }

    /// Sets the level from an identifier, failing on unknown or out-of-range values.
    pub fn try_set_level(&mut self, identifier: &str) -> Result<&mut Self, OptionError> {
        self.level = Level::from_identifier(identifier)?;
        Ok(self)
    }

    /// Sets the level from an identifier, using the default for unknown or out-of-range values.
    pub fn set_level_or_default(&mut self, identifier: &str) -> &mut Self {
        self.level = Level::from_identifier(identifier).unwrap_or_default();
        self
    }

    /// Applies one named setting.
    ///
    /// `key` is one of `encoding`, `decoding` or `level`; anything else fails
    /// with [`OptionError::UnknownIdentifier`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<&mut Self, OptionError> {
        match key {
            "encoding" => self.try_set_encoding(value),
            "decoding" => self.try_set_decoding(value),
            "level" => self.try_set_level(value),
            other => Err(OptionError::UnknownIdentifier(other.to_owned())),
        }
    }

    /// Applies one named setting, using the default for unrecognised values.
    ///
    /// Unknown keys still fail with [`OptionError::UnknownIdentifier`].
    pub fn set_or_default(&mut self, key: &str, value: &str) -> Result<&mut Self, OptionError> {
        match key {
            "encoding" => Ok(self.set_encoding_or_default(value)),
            "decoding" => Ok(self.set_decoding_or_default(value)),
            "level" => Ok(self.set_level_or_default(value)),
            other => Err(OptionError::UnknownIdentifier(other.to_owned())),
        }
    }
}

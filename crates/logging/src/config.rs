//! Verbosity configuration mapped onto tracing filter directives.

/// Tracing target prefix shared by every lzchunk subsystem.
pub const TARGET_PREFIX: &str = "lzchunk";

/// Verbosity selected on the command line, optionally overridden by explicit
/// filter directives.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Number of `-v` flags seen.
    pub level: u8,
    /// Directives that replace the level-derived filter when present.
    #[cfg_attr(feature = "serde", serde(default))]
    pub directives: Option<String>,
}

impl VerbosityConfig {
    /// Creates a configuration from a `-v` count.
    pub fn from_verbose_level(level: u8) -> Self {
        Self {
            level,
            directives: None,
        }
    }

    /// Replaces the level-derived filter with `directives`.
    ///
    /// Empty or whitespace-only directives are ignored.
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        let directives = directives.into();
        self.directives = if directives.trim().is_empty() {
            None
        } else {
            Some(directives)
        };
        self
    }

    /// Returns the filter directives in `EnvFilter` syntax.
    ///
    /// | level | directives |
    /// |-------|------------|
    /// | 0 | `warn` |
    /// | 1 | `info` |
    /// | 2 | `warn,lzchunk=debug` |
    /// | 3+ | `trace` |
    pub fn filter_directives(&self) -> String {
        if let Some(directives) = &self.directives {
            return directives.clone();
        }
        match self.level {
            0 => "warn".to_owned(),
            1 => "info".to_owned(),
            2 => format!("warn,{TARGET_PREFIX}=debug"),
            _ => "trace".to_owned(),
        }
    }

    /// Returns `true` when debug events from lzchunk targets pass the filter.
    pub const fn shows_debug(&self) -> bool {
        self.level >= 2
    }
}

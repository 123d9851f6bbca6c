//! Command-line parsing built on the `clap` builder API.

use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};

/// Parsed command produced by [`parse_args`].
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) verbose: u8,
    pub(crate) format: Option<String>,
    pub(crate) block_size: Option<u32>,
    pub(crate) null_terminator: bool,
    pub(crate) encoding: Option<String>,
    pub(crate) decoding: Option<String>,
    pub(crate) level: Option<String>,
    pub(crate) accept_invalid: bool,
    pub(crate) config: Option<OsString>,
    pub(crate) operands: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("lzchunk")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("block-size")
                .long("block-size")
                .short('b')
                .value_name("BYTES")
                .value_parser(value_parser!(u32).range(1..))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("null-terminator")
                .long("null-terminator")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("encoding")
                .long("encoding")
                .short('e')
                .value_name("ENCODING")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("decoding")
                .long("decoding")
                .short('d')
                .value_name("DECODING")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .short('l')
                .value_name("LEVEL")
                .allow_negative_numbers(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("accept-invalid")
                .long("accept-invalid")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .value_parser(OsStringValueParser::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("operands")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from("lzchunk"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        verbose: matches.get_count("verbose"),
        format: matches.remove_one::<String>("format"),
        block_size: matches.remove_one::<u32>("block-size"),
        null_terminator: matches.get_flag("null-terminator"),
        encoding: matches.remove_one::<String>("encoding"),
        decoding: matches.remove_one::<String>("decoding"),
        level: matches.remove_one::<String>("level"),
        accept_invalid: matches.get_flag("accept-invalid"),
        config: matches.remove_one::<OsString>("config"),
        operands: matches
            .remove_many::<OsString>("operands")
            .map(Iterator::collect)
            .unwrap_or_default(),
    })
}

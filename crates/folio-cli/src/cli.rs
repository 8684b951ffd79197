//! Command line definition

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Directory reports are written to unless `--output-dir` says otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// The `folio` command tree
#[must_use]
pub fn command() -> Command {
    Command::new("folio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Section-by-section analysis reports over a folder of documents")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("run")
                .about("Analyze a folder and write the JSON and HTML report")
                .arg(folder_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("max-review-loops")
                        .long("max-review-loops")
                        .env("FOLIO_MAX_REVIEW_LOOPS")
                        .value_parser(value_parser!(u32))
                        .help("Rewrite cycles allowed per section"),
                )
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .default_value(DEFAULT_OUTPUT_DIR)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for the report files"),
                )
                .arg(
                    Arg::new("no-html")
                        .long("no-html")
                        .action(ArgAction::SetTrue)
                        .help("Write only the JSON report"),
                ),
        )
        .subcommand(
            Command::new("ingest")
                .about("List the documents a run would analyze")
                .arg(folder_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("sections")
                .about("Print the configured section list as TOML")
                .arg(config_arg()),
        )
}

fn folder_arg() -> Arg {
    Arg::new("folder")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Folder of documents to analyze")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("TOML config file (defaults apply when omitted)")
}

/// Whether `--verbose` was given anywhere on the command line
#[must_use]
pub fn verbose(matches: &ArgMatches) -> bool {
    matches.get_flag("verbose")
        || matches
            .subcommand()
            .is_some_and(|(_, sub)| sub.get_flag("verbose"))
}

/// Arguments of `folio run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub folder: PathBuf,
    pub config: Option<PathBuf>,
    pub max_review_loops: Option<u32>,
    pub output_dir: PathBuf,
    pub html: bool,
}

impl RunOptions {
    /// Read from the `run` subcommand's matches
    ///
    /// # Errors
    /// Fails when the folder argument is missing.
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        Ok(Self {
            folder: folder(args)?,
            config: args.get_one::<PathBuf>("config").cloned(),
            max_review_loops: args.get_one::<u32>("max-review-loops").copied(),
            output_dir: args
                .get_one::<PathBuf>("output-dir")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            html: !args.get_flag("no-html"),
        })
    }
}

/// Arguments of `folio ingest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    pub folder: PathBuf,
    pub json: bool,
}

impl IngestOptions {
    /// Read from the `ingest` subcommand's matches
    ///
    /// # Errors
    /// Fails when the folder argument is missing.
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        Ok(Self {
            folder: folder(args)?,
            json: args.get_flag("json"),
        })
    }
}

fn folder(args: &ArgMatches) -> Result<PathBuf> {
    args.get_one::<PathBuf>("folder")
        .cloned()
        .context("missing document folder")
}

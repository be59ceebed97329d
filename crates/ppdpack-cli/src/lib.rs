//! ppdpack - build self-extracting PPD archives
#![allow(clippy::missing_errors_doc)]
//!
//! Packs every PPD under a directory into one executable script that can
//! list and extract them again with nothing but a Python 3 interpreter.
//!
//! ```text
//! ppdpack /usr/share/ppd -o my-ppds     # build
//! ./my-ppds list                        # "my-ppds:0/hp/laser.ppd" en "HP" ...
//! ./my-ppds cat my-ppds:0/hp/laser.ppd  # original bytes
//! ```
//!
//! `--list` and `--cat` do the same from Rust, without running the script.

pub mod cmd;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{ArgAction, ArgGroup, Parser};
use ppdpack_core::{ArchiveError, BuildOptions};
use ppdpack_schema::BEST_LEVEL;
use tracing_subscriber::EnvFilter;

/// Default artifact name, matching the runtime's conventional name.
pub const DEFAULT_OUTPUT: &str = "pyppd-ppdfile";

/// Exit status for "no PPDs found" (ENOENT) and for a root that is not a
/// directory, which clap would also report with 2.
pub const EXIT_NO_PPDS: u8 = 2;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "ppdpack")]
#[command(version = env!("PPDPACK_VERSION"))]
#[command(
    about = "Compress a directory of PPD files into a self-extracting archive",
    long_about = None
)]
#[command(group(
    ArgGroup::new("mode")
        .args(["directory", "list", "cat"])
        .required(true)
))]
pub struct Cli {
    /// Directory to search recursively for *.ppd and *.ppd.gz files
    #[arg(value_name = "PPDS_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Where to write the archive
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = DEFAULT_OUTPUT,
        env = "PPDPACK_OUTPUT"
    )]
    pub output: PathBuf,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// zlib level for the archived PPDs and the index
    #[arg(
        long,
        value_name = "N",
        default_value_t = BEST_LEVEL,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub compression_level: u32,

    /// List the records in an existing archive
    #[arg(long, value_name = "ARTIFACT")]
    pub list: Option<PathBuf>,

    /// Print one PPD from an existing archive
    #[arg(long, num_args = 2, value_names = ["ARTIFACT", "IDENTIFIER"])]
    pub cat: Option<Vec<String>>,
}

impl Cli {
    /// Library-side options derived from the flags.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            compression_level: self.compression_level,
        }
    }
}

/// Install the global subscriber: bare messages on stdout.
///
/// `verbose` picks the default level; `RUST_LOG` takes precedence.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(std::io::stdout().is_terminal())
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}

/// Dispatch on the selected mode.
pub fn run(cli: &Cli) -> Result<()> {
    if let Some(artifact) = &cli.list {
        return cmd::inspect::list(artifact);
    }
    if let Some([artifact, identifier]) = cli.cat.as_deref() {
        return cmd::inspect::cat(artifact.as_ref(), identifier);
    }
    match &cli.directory {
        Some(directory) => cmd::build::build(directory, &cli.output, cli.build_options()),
        None => bail!("no PPD directory given"),
    }
}

/// Process exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ArchiveError>() {
        Some(ArchiveError::EmptyResult(_) | ArchiveError::InvalidInput(_)) => EXIT_NO_PPDS,
        _ => 1,
    }
}

//! ppdpack - build self-extracting PPD archives

use std::process::ExitCode;

use clap::Parser;

use ppdpack_cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    ppdpack_cli::init_logging(cli.verbose);

    match ppdpack_cli::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(ppdpack_cli::exit_code(&err))
        }
    }
}

//! maskpair command-line entry point.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    cli::run(cli::CliArgs::parse())
}

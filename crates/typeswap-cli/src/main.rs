//! Binary entry point for the `typeswap` command.

use std::process::ExitCode;

mod cli;

fn main() -> eyre::Result<ExitCode> {
    env_logger::init();
    cli::run()
}

//! EasyTP console - Entry Point
//!
//! Command-line client for the EasyTP remote desktop dashboard.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

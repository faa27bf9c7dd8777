//! gitops-provider: declarative GitOps repository orchestration on top of igc.
//!
//! This is the main entry point for the `gitops-provider` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod cli;
mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod kube;
pub mod logging;
pub mod mutex;
pub mod plan;
pub mod provider;
pub mod resources;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}

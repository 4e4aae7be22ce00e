//! `teplo` - inspect the JSON profiles the PGO pipeline consumes.

mod cli;
mod commands;

#[cfg(test)]
mod commands_tests;

use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = cli::build_cli().get_matches();
    let result = match matches.subcommand() {
        Some(("stats", sub)) => commands::stats(sub),
        Some(("lines", sub)) => commands::lines(sub),
        _ => unreachable!("subcommand is required"),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("teplo: {err}");
            ExitCode::FAILURE
        }
    }
}

//! Command-line definition for the `teplo` dev tool.

use std::path::PathBuf;

use clap::{value_parser, Arg, Command};

/// Profile file (positional).
fn profile_arg() -> Arg {
    Arg::new("profile")
        .value_name("PROFILE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON CPU profile")
}

/// Function link name (positional).
fn function_arg() -> Arg {
    Arg::new("function")
        .value_name("FUNCTION")
        .required(true)
        .help("Function link name, e.g. pkg.hotLoop")
}

/// Build the complete CLI.
pub fn build_cli() -> Command {
    Command::new("teplo")
        .about("Inspect CPU profiles consumed by the Teplo PGO pipeline")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("stats")
                .about("Per-function sample totals")
                .arg(profile_arg()),
        )
        .subcommand(
            Command::new("lines")
                .about("Line-level sample buckets for one function")
                .arg(profile_arg())
                .arg(function_arg()),
        )
}

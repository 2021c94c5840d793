// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `stepgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepgraph",
    version,
    about = "Validate and resolve entrypoint task graphs against a plugin registry.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the entrypoint manifest (TOML).
    #[arg(long, value_name = "PATH", default_value = "Entrypoint.toml", global = true)]
    pub manifest: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEPGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the task graph over every possible swap choice.
    Validate {
        /// Print the response body as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve the graph for one set of swap choices.
    Resolve {
        /// Swap choice, repeatable.
        #[arg(long = "choice", value_name = "KEY=LABEL", value_parser = parse_choice)]
        choices: Vec<(String, String)>,

        /// Print the resolved workflow as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print steps, swaps and parameters without validating anything.
    Show,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_choice(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, label)) if !key.trim().is_empty() && !label.trim().is_empty() => {
            Ok((key.trim().to_string(), label.trim().to_string()))
        }
        _ => Err(format!("expected KEY=LABEL, got {raw:?}")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

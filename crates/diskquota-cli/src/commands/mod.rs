//! CLI command definitions and dispatch.

pub mod apply;
pub mod check;
pub mod config;
pub mod resolve;
pub mod serve;

use clap::{Parser, Subcommand, ValueEnum};

/// diskquota — per-container disk quotas on XFS project quotas.
#[derive(Parser, Debug)]
#[command(name = "diskquota", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "DISKQUOTA_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe the host for project quota support.
    Check(check::CheckArgs),
    /// Show the overlay snapshot and project id behind a container.
    Resolve(resolve::ResolveArgs),
    /// Apply a disk quota to a container directly.
    Apply(apply::ApplyArgs),
    /// Dispatch JSON-lines lifecycle events to the quota engine.
    Serve(serve::ServeArgs),
    /// Print the effective host configuration.
    Config(config::ConfigArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => check::execute(args),
        Command::Resolve(args) => resolve::execute(args),
        Command::Apply(args) => apply::execute(args),
        Command::Serve(args) => serve::execute(args),
        Command::Config(args) => config::execute(args),
    }
}

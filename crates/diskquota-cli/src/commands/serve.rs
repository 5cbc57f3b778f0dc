//! `diskquota serve` — Dispatch JSON-lines lifecycle events to the engine.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use diskquota_common::config::DiskQuotaConfig;
use diskquota_runtime::dispatcher::Dispatcher;
use diskquota_runtime::manager::DiskManager;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Read events from a file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Worker threads handling container events.
    #[arg(short, long, default_value_t = 4)]
    pub workers: usize,
}

/// Executes the `serve` command.
///
/// Registers the disk manager when the host supports project quotas and
/// feeds it every event until end of input. On hosts without support the
/// stream is still consumed but no handler is registered.
///
/// # Errors
///
/// Returns an error if the input cannot be opened or read.
pub fn execute(args: ServeArgs) -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::new();
    if let Some(manager) = DiskManager::new(DiskQuotaConfig::default()) {
        dispatcher.register(manager)?;
    }

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let stats = dispatcher.run_stream(reader, args.workers)?;
    tracing::info!(
        dispatched = stats.dispatched,
        malformed = stats.malformed,
        failed = stats.failed,
        handlers = ?dispatcher.handler_names(),
        "event stream finished"
    );
    Ok(())
}

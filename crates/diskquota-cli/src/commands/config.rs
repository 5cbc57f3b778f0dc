//! `diskquota config` — Print the effective host configuration.

use clap::Args;
use diskquota_common::config::DiskQuotaConfig;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {}

/// Executes the `config` command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn execute(_args: ConfigArgs) -> anyhow::Result<()> {
    let config = DiskQuotaConfig::default();
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

//! `diskquota apply` — Apply a disk quota to a container directly.

use anyhow::Context;
use clap::Args;
use diskquota_common::config::DiskQuotaConfig;
use diskquota_common::types::{ContainerId, QuotaLimit};
use diskquota_runtime::manager::{DiskManager, LimitSource};

use crate::output;

/// Arguments for the `apply` command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Container ID as assigned by containerd.
    pub container_id: String,

    /// Hard limit in megabytes.
    #[arg(short, long)]
    pub limit: u64,
}

/// Executes the `apply` command.
///
/// Runs the full provisioning sequence for one container, bypassing the
/// annotation lookup.
///
/// # Errors
///
/// Returns an error if the host lacks project quotas, the limit is zero,
/// the container cannot be resolved, or a quota step fails.
pub fn execute(args: ApplyArgs) -> anyhow::Result<()> {
    let limit = QuotaLimit::from_megabytes(args.limit)
        .context("limit must be a positive number of megabytes")?;
    let config = DiskQuotaConfig::default();
    let root = config.quota_root.clone();
    let Some(manager) = DiskManager::new(config) else {
        anyhow::bail!("project quota is not enabled on {}", root.display());
    };

    let container_id = ContainerId::new(args.container_id);
    let applied = manager
        .apply_quota(&container_id, limit, LimitSource::Explicit)
        .with_context(|| format!("applying disk quota to container {container_id}"))?;

    println!("{}", output::describe_applied(&applied));
    Ok(())
}

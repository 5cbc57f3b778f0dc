//! `diskquota resolve` — Show the overlay snapshot behind a container.

use anyhow::Context;
use clap::Args;
use diskquota_common::config::DiskQuotaConfig;
use diskquota_common::types::ContainerId;
use diskquota_core::filesystem::resolve_overlay;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Container ID as assigned by containerd.
    pub container_id: String,
}

/// Executes the `resolve` command.
///
/// # Errors
///
/// Returns an error if the container's rootfs is not an overlay mount with
/// a numbered snapshot directory.
pub fn execute(args: ResolveArgs) -> anyhow::Result<()> {
    let config = DiskQuotaConfig::default();
    let container_id = ContainerId::new(args.container_id);
    let rootfs = config.rootfs_path(&container_id);
    let location = resolve_overlay(&config.mountinfo_path, &rootfs)
        .with_context(|| format!("resolving overlay for container {container_id}"))?;

    println!("{:<12} {}", "rootfs", rootfs.display());
    println!("{:<12} {}", "project id", location.project_id);
    println!("{:<12} {}", "upper dir", location.upper_dir.display());
    println!("{:<12} {}", "work dir", location.work_dir().display());
    Ok(())
}

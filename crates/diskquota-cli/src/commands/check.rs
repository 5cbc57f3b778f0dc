//! `diskquota check` — Probe the host for project quota support.

use clap::Args;
use diskquota_common::config::DiskQuotaConfig;
use diskquota_core::capability;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {}

/// Executes the `check` command.
///
/// Reports the `prjquota` mount option of the quota root, whether the
/// quota tool is installed, and whether the process runs as root.
///
/// # Errors
///
/// Returns an error if project quota accounting is not enabled.
pub fn execute(_args: CheckArgs) -> anyhow::Result<()> {
    let config = DiskQuotaConfig::default();
    let report = capability::probe(&config);
    let is_root = nix::unistd::geteuid().is_root();

    println!("{:<24} {}", "quota root", config.quota_root.display());
    println!(
        "{:<24} {}",
        "prjquota",
        if report.project_quota { "enabled" } else { "disabled" }
    );
    println!(
        "{:<24} {}",
        config.quota_command,
        report
            .quota_tool
            .as_ref()
            .map_or_else(|| "not found".to_owned(), |p| p.display().to_string())
    );
    println!("{:<24} {}", "root", if is_root { "yes" } else { "no" });

    if !is_root {
        tracing::warn!("quota commands require root privileges");
    }
    if !report.enabled() {
        anyhow::bail!(
            "project quota is not enabled on {}; mount it with -o prjquota",
            config.quota_root.display()
        );
    }
    Ok(())
}

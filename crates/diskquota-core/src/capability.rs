//! Project-quota capability probe.
//!
//! Quotas can only be enforced when the quota-managed root is mounted with
//! project accounting. The probe runs once at engine construction; a host
//! that fails it never gets a registered engine.

use std::path::{Path, PathBuf};

use diskquota_common::config::DiskQuotaConfig;
use diskquota_common::constants::PRJQUOTA_OPTION;

/// Outcome of probing the host for quota enforcement support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityReport {
    /// Whether the quota root is mounted with project quota accounting.
    pub project_quota: bool,
    /// Resolved location of the quota command, if it is on `PATH`.
    pub quota_tool: Option<PathBuf>,
}

impl CapabilityReport {
    /// Whether the engine should be enabled on this host.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.project_quota
    }
}

/// Probes the host described by `config`.
#[must_use]
pub fn probe(config: &DiskQuotaConfig) -> CapabilityReport {
    CapabilityReport {
        project_quota: project_quota_enabled(&config.mounts_path, &config.quota_root),
        quota_tool: which::which(&config.quota_command).ok(),
    }
}

/// Reports whether `mount_point` carries the `prjquota` option in the mount table.
///
/// An unreadable table counts as "not enabled".
#[must_use]
pub fn project_quota_enabled(mounts_path: &Path, mount_point: &Path) -> bool {
    let table = match std::fs::read(mounts_path) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(path = %mounts_path.display(), error = %e, "cannot read mount table");
            return false;
        }
    };
    mount_options(&table, &mount_point.to_string_lossy()).is_some_and(has_project_quota)
}

/// Returns the option field of the first entry mounted at `mount_point`.
///
/// Lines that are not valid UTF-8 are skipped.
#[must_use]
pub fn mount_options<'a>(table: &'a [u8], mount_point: &str) -> Option<&'a str> {
    table
        .split(|&b| b == b'\n')
        .filter_map(|raw| std::str::from_utf8(raw).ok())
        .find_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            (fields.len() >= 4 && fields[1] == mount_point).then(|| fields[3])
        })
}

/// Whether a comma-separated option list contains the project quota marker.
///
/// Only the XFS spelling is recognized; ext4's `pquota` is not.
#[must_use]
pub fn has_project_quota(options: &str) -> bool {
    options.split(',').any(|opt| opt == PRJQUOTA_OPTION)
}

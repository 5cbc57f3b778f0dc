//! Host configuration model for the quota engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{DiskQuotaError, Result};
use crate::types::ContainerId;

/// Host surface the engine reads from and writes to.
///
/// Production hosts use [`DiskQuotaConfig::default`]; the fields exist so
/// the engine can be pointed at fixture tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskQuotaConfig {
    /// Full-system mount metadata table (`mountinfo` format).
    pub mountinfo_path: PathBuf,
    /// Mount table used for the capability probe (`/proc/mounts` format).
    pub mounts_path: PathBuf,
    /// Quota-managed root mount every quota command is scoped to.
    pub quota_root: PathBuf,
    /// Base path of the runtime's per-container task bundles.
    pub runtime_base: PathBuf,
    /// Pod and namespace annotation key holding the megabyte limit.
    pub annotation_key: String,
    /// Project-quota management command.
    pub quota_command: String,
}

impl Default for DiskQuotaConfig {
    fn default() -> Self {
        Self {
            mountinfo_path: PathBuf::from(constants::SYSTEM_MOUNTINFO_FILE),
            mounts_path: PathBuf::from(constants::PROC_MOUNTS_FILE),
            quota_root: PathBuf::from(constants::CONTAINERD_ROOT_PATH),
            runtime_base: PathBuf::from(constants::CONTAINERD_BASE_PATH),
            annotation_key: constants::DISK_ANNOTATION.to_owned(),
            quota_command: constants::QUOTA_COMMAND.to_owned(),
        }
    }
}

impl DiskQuotaConfig {
    /// Returns the logical rootfs mount point of a container.
    ///
    /// Leading slashes in the id are dropped so the result always stays
    /// under `runtime_base`.
    #[must_use]
    pub fn rootfs_path(&self, container_id: &ContainerId) -> PathBuf {
        self.runtime_base
            .join(container_id.as_str().trim_start_matches('/'))
            .join(constants::ROOTFS_DIR)
    }

    /// Checks that every path is absolute and every name non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`DiskQuotaError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, path) in [
            ("mountinfo_path", &self.mountinfo_path),
            ("mounts_path", &self.mounts_path),
            ("quota_root", &self.quota_root),
            ("runtime_base", &self.runtime_base),
        ] {
            require_absolute(field, path)?;
        }
        if self.annotation_key.trim().is_empty() {
            return Err(DiskQuotaError::Config {
                message: "annotation_key must not be empty".into(),
            });
        }
        if self.quota_command.trim().is_empty() {
            return Err(DiskQuotaError::Config {
                message: "quota_command must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn require_absolute(field: &str, path: &Path) -> Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(DiskQuotaError::Config {
            message: format!("{field} must be absolute, got {}", path.display()),
        })
    }
}

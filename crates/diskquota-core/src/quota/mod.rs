//! XFS project-quota provisioning.
//!
//! A container's quota is established in four ordered steps against the
//! quota-managed root mount:
//!
//! 1. clear any previous project registration of the data directory
//!    (best effort),
//! 2. register the data directory under the project id,
//! 3. register the overlay work directory under the same id,
//! 4. set the hard block limit for the id.
//!
//! Steps 2 to 4 stop at the first failure. Nothing is rolled back, so a
//! failure at step 3 or 4 leaves the project registered with no limit or
//! with its previous one.

pub mod xfs;

use std::fmt;
use std::path::{Path, PathBuf};

use diskquota_common::error::Result;
use diskquota_common::types::{ProjectId, QuotaLimit};

use crate::filesystem::overlayfs::compute_work_dir;

pub use self::xfs::XfsQuotaRunner;

/// A single quota-subsystem operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaCommand {
    /// Remove the project registration of a directory tree.
    ClearProject {
        /// Directory whose registration is cleared.
        path: PathBuf,
        /// Project the directory was registered under.
        project_id: ProjectId,
    },
    /// Register a directory tree under a project.
    SetupProject {
        /// Directory to register.
        path: PathBuf,
        /// Project to register it under.
        project_id: ProjectId,
    },
    /// Set the hard block limit of a project.
    LimitBlocks {
        /// Project whose limit is set.
        project_id: ProjectId,
        /// Hard limit in megabytes.
        limit: QuotaLimit,
    },
}

impl QuotaCommand {
    /// Renders the command in `xfs_quota -c` syntax.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::ClearProject { path, project_id } => {
                format!("project -C -p {} {project_id}", path.display())
            }
            Self::SetupProject { path, project_id } => {
                format!("project -s -p {} {project_id}", path.display())
            }
            Self::LimitBlocks { project_id, limit } => {
                format!("limit -p bhard={}m {project_id}", limit.megabytes())
            }
        }
    }
}

impl fmt::Display for QuotaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Executes quota commands against a quota-managed mount.
///
/// Implementations must be callable from concurrent event handlers.
pub trait QuotaCommandRunner: Send + Sync {
    /// Runs one command scoped to `quota_root`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskQuotaError::Command`](diskquota_common::error::DiskQuotaError::Command)
    /// if the command exits unsuccessfully, or
    /// [`DiskQuotaError::Io`](diskquota_common::error::DiskQuotaError::Io)
    /// if it cannot be spawned.
    fn run(&self, quota_root: &Path, command: &QuotaCommand) -> Result<()>;
}

/// Drives the provisioning protocol for one quota-managed root.
#[derive(Debug)]
pub struct QuotaDriver<R = XfsQuotaRunner> {
    runner: R,
    quota_root: PathBuf,
}

impl<R: QuotaCommandRunner> QuotaDriver<R> {
    /// Creates a driver issuing commands through `runner` against `quota_root`.
    pub fn new(runner: R, quota_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            quota_root: quota_root.into(),
        }
    }

    /// Returns the underlying command runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Registers `data_dir` and its work directory under `project_id` and
    /// sets the hard limit.
    ///
    /// Re-running with identical arguments converges on the same state.
    ///
    /// # Errors
    ///
    /// Returns the first error from the registration or limit steps. A
    /// failure to clear a previous registration is logged and ignored.
    pub fn apply(&self, project_id: ProjectId, data_dir: &Path, limit: QuotaLimit) -> Result<()> {
        let clear = QuotaCommand::ClearProject {
            path: data_dir.to_path_buf(),
            project_id,
        };
        if let Err(e) = self.run(&clear) {
            tracing::debug!(%project_id, error = %e, "no previous project registration cleared");
        }

        self.run(&QuotaCommand::SetupProject {
            path: data_dir.to_path_buf(),
            project_id,
        })?;
        self.run(&QuotaCommand::SetupProject {
            path: compute_work_dir(data_dir),
            project_id,
        })?;
        self.run(&QuotaCommand::LimitBlocks { project_id, limit })?;

        tracing::debug!(%project_id, limit_mb = limit.megabytes(), "project quota provisioned");
        Ok(())
    }

    fn run(&self, command: &QuotaCommand) -> Result<()> {
        tracing::debug!(root = %self.quota_root.display(), command = %command, "issuing quota command");
        self.runner.run(&self.quota_root, command)
    }
}

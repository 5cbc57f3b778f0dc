//! Overlay snapshot layout: upper directory, work directory, project id.
//!
//! containerd's overlay snapshotter stores each snapshot under a numeric
//! directory, `snapshots/<n>/fs` for the writable data and
//! `snapshots/<n>/work` for the overlay's private bookkeeping. The number
//! doubles as the project-quota identifier.

use std::path::{Component, Path, PathBuf};

use diskquota_common::constants::{OVERLAY_WORK_DIR, SNAPSHOT_DATA_DIR};
use diskquota_common::error::{DiskQuotaError, Result};
use diskquota_common::types::ProjectId;

/// Physical location of a container's writable overlay layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLocation {
    /// Project identifier derived from the snapshot directory name.
    pub project_id: ProjectId,
    /// Cleaned upper directory backing the container's writable layer.
    pub upper_dir: PathBuf,
}

impl OverlayLocation {
    /// Builds a location from a raw `upperdir=` value.
    ///
    /// # Errors
    ///
    /// Returns [`DiskQuotaError::Parse`] if the snapshot directory name is
    /// not a positive integer.
    pub fn from_upper_dir(raw: &Path) -> Result<Self> {
        let upper_dir = clean_path(raw);
        let project_id = project_id_for(&upper_dir)?;
        Ok(Self {
            project_id,
            upper_dir,
        })
    }

    /// Returns the overlay work directory paired with this upper directory.
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        compute_work_dir(&self.upper_dir)
    }
}

/// Derives the overlay work directory from a data directory.
///
/// A trailing `fs` segment is replaced with `work`; otherwise `work` is
/// appended.
#[must_use]
pub fn compute_work_dir(data_dir: &Path) -> PathBuf {
    snapshot_root(data_dir).join(OVERLAY_WORK_DIR)
}

/// Parses the project identifier out of a cleaned upper directory.
///
/// # Errors
///
/// Returns [`DiskQuotaError::Parse`] when the snapshot directory name is
/// missing, not a decimal `u64`, or zero.
pub fn project_id_for(upper_dir: &Path) -> Result<ProjectId> {
    let root = snapshot_root(upper_dir);
    let name = root
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DiskQuotaError::parse(format!(
                "no snapshot directory name in {}",
                upper_dir.display()
            ))
        })?;
    let id = name.parse::<u64>().map_err(|e| {
        DiskQuotaError::parse(format!(
            "snapshot directory `{name}` in {} is not a project id: {e}",
            upper_dir.display()
        ))
    })?;
    if id == 0 {
        return Err(DiskQuotaError::parse(format!(
            "snapshot directory in {} maps to the default project 0",
            upper_dir.display()
        )));
    }
    Ok(ProjectId::new(id))
}

/// Strips a trailing data-directory segment, yielding the snapshot root.
fn snapshot_root(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if path.file_name().is_some_and(|n| n == SNAPSHOT_DATA_DIR) => parent,
        _ => path,
    }
}

/// Lexically normalizes a path.
///
/// Drops `.` segments and redundant separators and resolves `..` against
/// the preceding segment. `..` at the root of an absolute path is dropped;
/// leading `..` segments of a relative path are kept.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    let _ = out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            _ => out.push(component),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

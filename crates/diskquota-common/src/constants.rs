//! Host paths, annotation keys, and quota-tool names.
//!
//! These describe a containerd host whose state root sits on an XFS
//! filesystem mounted with project quota accounting.

/// Annotation key carrying a decimal megabyte limit, on pods and namespaces.
pub const DISK_ANNOTATION: &str = "size.disk.kcorw.io";

/// Base path under which containerd exposes each task's bundle.
///
/// A container's root filesystem is mounted at `<base>/<container-id>/rootfs`.
pub const CONTAINERD_BASE_PATH: &str = "/run/containerd/io.containerd.runtime.v2.task/k8s.io/";

/// Quota-managed root mount holding the overlay snapshots.
pub const CONTAINERD_ROOT_PATH: &str = "/var/lib/containerd";

/// Mount metadata table of the host's init process.
pub const SYSTEM_MOUNTINFO_FILE: &str = "/proc/1/mountinfo";

/// Mount table used for the project-quota capability probe.
pub const PROC_MOUNTS_FILE: &str = "/proc/mounts";

/// Project-quota management command.
pub const QUOTA_COMMAND: &str = "xfs_quota";

/// Mount option marking project quota accounting as enabled.
pub const PRJQUOTA_OPTION: &str = "prjquota";

/// Name under which the engine registers with the lifecycle dispatcher.
pub const HANDLER_NAME: &str = "disk";

/// Directory name of a container's rootfs under its task bundle.
pub const ROOTFS_DIR: &str = "rootfs";

/// Trailing data-directory segment used by some snapshot layouts.
pub const SNAPSHOT_DATA_DIR: &str = "fs";

/// Overlay work directory name, sibling to the data directory.
pub const OVERLAY_WORK_DIR: &str = "work";

/// Option prefix naming the overlay upper directory in mount metadata.
pub const UPPERDIR_OPTION_PREFIX: &str = "upperdir=";


//! Formatted output helpers for CLI commands.

use diskquota_runtime::manager::AppliedQuota;

/// Formats a megabyte count the way `xfs_quota` interprets it (binary units).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_megabytes(megabytes: u64) -> String {
    const GIB: u64 = 1024;
    const TIB: u64 = GIB * 1024;

    if megabytes >= TIB {
        format!("{:.1} TiB", megabytes as f64 / TIB as f64)
    } else if megabytes >= GIB {
        format!("{:.1} GiB", megabytes as f64 / GIB as f64)
    } else {
        format!("{megabytes} MiB")
    }
}

/// Renders an applied quota as a short multi-line report.
#[must_use]
pub fn describe_applied(applied: &AppliedQuota) -> String {
    format!(
        "{:<12} {}\n{:<12} {}\n{:<12} {}\n{:<12} {}\n{:<12} {} ({})",
        "container",
        applied.container_id,
        "project id",
        applied.location.project_id,
        "upper dir",
        applied.location.upper_dir.display(),
        "work dir",
        applied.work_dir.display(),
        "limit",
        format_megabytes(applied.limit.megabytes()),
        applied.source,
    )
}

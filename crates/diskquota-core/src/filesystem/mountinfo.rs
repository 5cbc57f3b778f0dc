//! Overlay upper-directory lookup in the kernel mount metadata table.
//!
//! Each `mountinfo` line has the shape
//!
//! ```text
//! 36 35 98:0 / /mnt1 rw,noatime master:1 - overlay overlay rw,lowerdir=..,upperdir=..,workdir=..
//! ```
//!
//! The fifth field before the ` - ` separator is the mount point and the
//! third field after it holds the filesystem-specific options.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use diskquota_common::constants::UPPERDIR_OPTION_PREFIX;
use diskquota_common::error::{DiskQuotaError, Result};

use super::overlayfs::OverlayLocation;

const FIELD_SEPARATOR: &str = " - ";
const MOUNT_POINT_FIELD: usize = 4;
const SUPER_OPTIONS_FIELD: usize = 2;

/// Resolves the overlay location behind a container rootfs mount point.
///
/// # Errors
///
/// - [`DiskQuotaError::Io`] if the table cannot be opened or read.
/// - [`DiskQuotaError::NotFound`] if no overlay entry is mounted there.
/// - [`DiskQuotaError::Parse`] if the upper directory does not carry a
///   numeric snapshot name.
pub fn resolve_overlay(mountinfo_path: &Path, mount_point: &Path) -> Result<OverlayLocation> {
    let file = File::open(mountinfo_path).map_err(|e| DiskQuotaError::Io {
        path: mountinfo_path.to_path_buf(),
        source: e,
    })?;
    let upper_dir = find_upper_dir(BufReader::new(file), mount_point)
        .map_err(|e| DiskQuotaError::Io {
            path: mountinfo_path.to_path_buf(),
            source: e,
        })?
        .ok_or_else(|| DiskQuotaError::NotFound {
            kind: "overlay mount",
            id: mount_point.display().to_string(),
        })?;
    tracing::debug!(
        mount_point = %mount_point.display(),
        upper_dir = %upper_dir.display(),
        "found overlay upper directory"
    );
    OverlayLocation::from_upper_dir(&upper_dir)
}

/// Scans a mount table for the `upperdir` of the entry mounted at `mount_point`.
///
/// Lines that are malformed, not valid UTF-8, or mounted elsewhere are
/// skipped.
///
/// # Errors
///
/// Returns the underlying error if reading from `reader` fails.
pub fn find_upper_dir<R: BufRead>(reader: R, mount_point: &Path) -> std::io::Result<Option<PathBuf>> {
    let target = mount_point.to_string_lossy();
    for raw in reader.split(b'\n') {
        let raw = raw?;
        let Ok(line) = std::str::from_utf8(&raw) else {
            tracing::trace!("skipping non-UTF-8 mountinfo line");
            continue;
        };
        if !line.contains(&*target) {
            continue;
        }
        if let Some(upper) = upper_dir_from_line(line, &target) {
            return Ok(Some(PathBuf::from(upper)));
        }
    }
    Ok(None)
}

/// Extracts the `upperdir` option of a single line mounted exactly at `target`.
///
/// Returns `None` for lines that are mounted elsewhere, lack either half of
/// the format, or carry no `upperdir` option.
#[must_use]
pub fn upper_dir_from_line<'a>(line: &'a str, target: &str) -> Option<&'a str> {
    let (mount, super_block) = line.split_once(FIELD_SEPARATOR)?;
    let mount_point = mount.split_whitespace().nth(MOUNT_POINT_FIELD)?;
    if mount_point != target {
        return None;
    }
    super_block
        .split_whitespace()
        .nth(SUPER_OPTIONS_FIELD)?
        .split(',')
        .find_map(|opt| opt.strip_prefix(UPPERDIR_OPTION_PREFIX))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const ROOTFS: &str = "/run/containerd/io.containerd.runtime.v2.task/k8s.io/abc123/rootfs";

    fn overlay_line(mount_point: &str, upper: &str) -> String {
        format!(
            "1520 1422 0:312 / {mount_point} rw,relatime - overlay overlay \
             rw,lowerdir=/var/lib/containerd/snapshots/76/fs,upperdir={upper},workdir=/w"
        )
    }

    #[test]
    fn line_yields_upperdir_for_exact_mount_point() {
        let line = overlay_line(ROOTFS, "/var/lib/containerd/snapshots/77/fs");
        assert_eq!(
            upper_dir_from_line(&line, ROOTFS),
            Some("/var/lib/containerd/snapshots/77/fs")
        );
    }

    #[test]
    fn line_skips_prefix_match() {
        let line = overlay_line(&format!("{ROOTFS}/proc"), "/snap/1/fs");
        assert_eq!(upper_dir_from_line(&line, ROOTFS), None);
    }

    #[test]
    fn line_without_separator_is_skipped() {
        let line = format!("1520 1422 0:312 / {ROOTFS} rw,relatime overlay overlay rw");
        assert_eq!(upper_dir_from_line(&line, ROOTFS), None);
    }

    #[test]
    fn line_with_short_halves_is_skipped() {
        assert_eq!(upper_dir_from_line(&format!("1 2 {ROOTFS} - overlay"), ROOTFS), None);
        let line = format!("1 2 0:3 / {ROOTFS} rw - overlay overlay");
        assert_eq!(upper_dir_from_line(&line, ROOTFS), None);
    }

    #[test]
    fn line_without_upperdir_is_skipped() {
        let line = format!("1 2 0:3 / {ROOTFS} rw - tmpfs tmpfs rw,size=64k");
        assert_eq!(upper_dir_from_line(&line, ROOTFS), None);
    }

    #[test]
    fn scan_continues_past_noise() {
        let table = [
            "garbage".to_owned(),
            format!("1 2 {ROOTFS}"),
            overlay_line(&format!("{ROOTFS}-other"), "/snap/5/fs"),
            overlay_line(ROOTFS, "/snap/6/fs"),
        ]
        .join("\n");
        let found = find_upper_dir(Cursor::new(table), Path::new(ROOTFS)).unwrap();
        assert_eq!(found, Some(PathBuf::from("/snap/6/fs")));
    }

    #[test]
    fn scan_skips_lines_that_are_not_utf8() {
        let mut table = b"40 1 8:1 / /mnt/caf\xe9 rw - ext4 /dev/sdc rw\n".to_vec();
        table.extend_from_slice(overlay_line(ROOTFS, "/snap/6/fs").as_bytes());
        let found = find_upper_dir(Cursor::new(table), Path::new(ROOTFS)).unwrap();
        assert_eq!(found, Some(PathBuf::from("/snap/6/fs")));
    }

    #[test]
    fn scan_returns_none_when_absent() {
        let table = overlay_line("/somewhere/else", "/snap/6/fs");
        let found = find_upper_dir(Cursor::new(table), Path::new(ROOTFS)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn resolve_reads_table_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = dir.path().join("mountinfo");
        std::fs::write(&table, overlay_line(ROOTFS, "/var/lib/containerd/snapshots/77/fs"))
            .unwrap();

        let loc = resolve_overlay(&table, Path::new(ROOTFS)).unwrap();
        assert_eq!(loc.project_id.get(), 77);
        assert_eq!(loc.upper_dir, Path::new("/var/lib/containerd/snapshots/77/fs"));
    }

    #[test]
    fn resolve_tolerates_non_utf8_mount_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = dir.path().join("mountinfo");
        let mut bytes = b"40 1 8:1 / /mnt/caf\xe9 rw - ext4 /dev/sdc rw\n".to_vec();
        bytes.extend_from_slice(
            overlay_line(ROOTFS, "/var/lib/containerd/snapshots/77/fs").as_bytes(),
        );
        std::fs::write(&table, bytes).unwrap();

        let loc = resolve_overlay(&table, Path::new(ROOTFS)).unwrap();
        assert_eq!(loc.project_id.get(), 77);
    }

    #[test]
    fn resolve_reports_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = dir.path().join("mountinfo");
        std::fs::write(&table, overlay_line("/elsewhere", "/snap/1/fs")).unwrap();

        let err = resolve_overlay(&table, Path::new(ROOTFS)).unwrap_err();
        assert!(matches!(err, DiskQuotaError::NotFound { .. }));
    }

    #[test]
    fn resolve_reports_missing_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = resolve_overlay(&dir.path().join("absent"), Path::new(ROOTFS)).unwrap_err();
        assert!(matches!(err, DiskQuotaError::Io { .. }));
    }

    #[test]
    fn resolve_fails_hard_on_unnumbered_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table = dir.path().join("mountinfo");
        std::fs::write(&table, overlay_line(ROOTFS, "/snap/latest/fs")).unwrap();

        let err = resolve_overlay(&table, Path::new(ROOTFS)).unwrap_err();
        assert!(matches!(err, DiskQuotaError::Parse { .. }));
    }
}

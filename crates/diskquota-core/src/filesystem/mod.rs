//! Filesystem inspection for container quota placement.
//!
//! Recovers the physical overlay directories behind a container's logical
//! rootfs mount point.

pub mod mountinfo;
pub mod overlayfs;

pub use self::mountinfo::resolve_overlay;
pub use self::overlayfs::OverlayLocation;

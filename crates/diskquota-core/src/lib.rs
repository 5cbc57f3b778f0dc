//! # diskquota-core
//!
//! Host-facing primitives for enforcing per-container disk quotas on an
//! overlay filesystem backed by XFS project quotas.
//!
//! This crate provides:
//! - **Filesystem**: overlay upper-directory resolution from the mount
//!   metadata table and derivation of the project identifier.
//! - **Capability**: the startup probe for project-quota accounting.
//! - **Quota**: the ordered `xfs_quota` provisioning protocol.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod capability;
pub mod filesystem;
pub mod quota;

//! Container lifecycle integration for per-container disk quotas.
//!
//! The [`manager::DiskManager`] reacts to container-start events by
//! resolving the effective limit (pod annotation, then namespace default),
//! locating the container's overlay snapshot, and provisioning an XFS
//! project quota for it. Namespace events keep the [`policy::PolicyStore`]
//! of namespace defaults current.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod dispatcher;
pub mod event;
pub mod handler;
pub mod manager;
pub mod policy;

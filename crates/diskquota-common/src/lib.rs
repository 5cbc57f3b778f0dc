//! # diskquota-common
//!
//! Shared types, error definitions, configuration model, and host
//! constants used across the diskquota workspace.
//!
//! This crate is the leaf of the dependency graph. It performs no I/O of
//! its own; the host-facing primitives live in `diskquota-core`.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

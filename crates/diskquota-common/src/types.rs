//! Domain primitive types used across the diskquota workspace.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Identifier of a container as assigned by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kernel project-quota identifier.
///
/// Derived from the numeric name of an overlay snapshot directory. Project
/// zero is the filesystem's default project and is never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Wraps a raw project number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw project number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hard disk limit in megabytes. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaLimit(NonZeroU64);

impl QuotaLimit {
    /// Creates a limit from a megabyte count, rejecting zero.
    #[must_use]
    pub const fn from_megabytes(megabytes: u64) -> Option<Self> {
        match NonZeroU64::new(megabytes) {
            Some(mb) => Some(Self(mb)),
            None => None,
        }
    }

    /// Parses an annotation value.
    ///
    /// Only a positive decimal integer yields a limit. Negative, zero,
    /// empty, and non-numeric values all return `None`, which callers
    /// treat the same as an absent annotation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>().ok().and_then(Self::from_megabytes)
    }

    /// Returns the limit in megabytes.
    #[must_use]
    pub const fn megabytes(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for QuotaLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}MB", self.0)
    }
}

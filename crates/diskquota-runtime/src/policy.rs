//! Namespace-level default quota limits.
//!
//! Written by namespace events, read on every container start. Values are
//! stored raw and parsed at use time.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Concurrent map from namespace name to its raw limit annotation.
///
/// Lookups share the lock; updates take it exclusively. `parking_lot`'s
/// lock is eventually fair, so a stream of updates cannot starve lookups.
#[derive(Debug, Default)]
pub struct PolicyStore {
    namespaces: RwLock<HashMap<String, String>>,
}

impl PolicyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `raw` as the namespace's default, or removes the entry when
    /// `raw` is empty.
    pub fn set_or_clear(&self, namespace: &str, raw: &str) {
        let mut namespaces = self.namespaces.write();
        if raw.is_empty() {
            if namespaces.remove(namespace).is_some() {
                tracing::info!(namespace, "namespace disk quota cleared");
            }
        } else {
            let _ = namespaces.insert(namespace.to_owned(), raw.to_owned());
            tracing::info!(namespace, limit = raw, "namespace disk quota set");
        }
    }

    /// Returns the raw default limit of a namespace, if any.
    #[must_use]
    pub fn lookup(&self, namespace: &str) -> Option<String> {
        self.namespaces.read().get(namespace).cloned()
    }

    /// Number of namespaces carrying a default.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.read().len()
    }

    /// Whether no namespace carries a default.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.read().is_empty()
    }
}

//! The capability set a lifecycle dispatcher expects from a handler.

use diskquota_common::error::Result;

use crate::event::{Container, NamespaceEvent, PodSandbox, ProcessItem};

/// A named handler invoked by the lifecycle dispatcher.
///
/// Handlers are shared across the dispatcher's event threads.
pub trait LifecycleHandler: Send + Sync {
    /// Name the handler registers under.
    fn name(&self) -> &'static str;

    /// Generic per-item processing hook.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be processed.
    fn process(&self, item: &ProcessItem) -> Result<()>;

    /// Called when a container is about to start.
    ///
    /// # Errors
    ///
    /// Returns an error only if the container must not start.
    fn start(&self, pod: &PodSandbox, container: &Container) -> Result<()>;

    /// Called on namespace add, update, and delete.
    fn namespace_update(&self, event: &NamespaceEvent);
}

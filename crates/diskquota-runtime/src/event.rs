//! Lifecycle events delivered by the node plugin dispatcher.
//!
//! Events are plain data. They serialize as JSON objects tagged by an
//! `event` field so a dispatcher can be driven from a line stream:
//!
//! ```json
//! {"event":"namespace","kind":"add","namespace":{"name":"team-a","annotations":{"size.disk.kcorw.io":"1024"}}}
//! {"event":"start","pod":{"name":"web-0","namespace":"team-a"},"container":{"id":"abc123","name":"web"}}
//! ```

use std::collections::HashMap;

use diskquota_common::types::ContainerId;
use serde::{Deserialize, Serialize};

/// The pod sandbox owning a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSandbox {
    /// Pod name.
    pub name: String,
    /// Namespace the pod belongs to.
    pub namespace: String,
    /// Pod annotations.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// A container about to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Runtime-assigned container identifier.
    pub id: ContainerId,
    /// Container name within its pod.
    #[serde(default)]
    pub name: String,
}

/// Kind of change observed on a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceEventKind {
    /// Namespace created or first observed.
    Add,
    /// Namespace metadata changed.
    Update,
    /// Namespace deleted.
    Delete,
}

/// Namespace metadata carried by namespace events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace name.
    pub name: String,
    /// Namespace annotations.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// A namespace add, update, or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceEvent {
    /// What happened to the namespace.
    pub kind: NamespaceEventKind,
    /// The namespace as last observed.
    pub namespace: Namespace,
}

/// A generic per-container item offered to every handler before creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessItem {
    /// Container the item belongs to.
    pub container_id: ContainerId,
    /// Annotations attached to the item.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// Any event the dispatcher routes to its handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A container is about to start.
    Start {
        /// Owning pod.
        pod: PodSandbox,
        /// The container.
        container: Container,
    },
    /// Generic per-item processing.
    Process {
        /// The item.
        item: ProcessItem,
    },
    /// A namespace changed.
    Namespace(NamespaceEvent),
}

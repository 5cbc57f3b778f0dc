//! The disk quota lifecycle hook.
//!
//! On every container start the manager picks the effective limit, locates
//! the container's overlay snapshot through the host mount metadata, and
//! provisions an XFS project quota for it. Quota enforcement is best
//! effort: a failure is logged and the container starts regardless.

use std::fmt;
use std::path::PathBuf;

use diskquota_common::config::DiskQuotaConfig;
use diskquota_common::constants::HANDLER_NAME;
use diskquota_common::error::Result;
use diskquota_common::types::{ContainerId, QuotaLimit};
use diskquota_core::capability;
use diskquota_core::filesystem::{OverlayLocation, resolve_overlay};
use diskquota_core::quota::{QuotaCommandRunner, QuotaDriver, XfsQuotaRunner};

use crate::event::{Container, NamespaceEvent, NamespaceEventKind, PodSandbox, ProcessItem};
use crate::handler::LifecycleHandler;
use crate::policy::PolicyStore;

/// Where an effective limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSource {
    /// The pod's own annotation.
    PodAnnotation,
    /// The default of the pod's namespace.
    NamespaceDefault,
    /// Requested directly by an operator.
    Explicit,
}

impl fmt::Display for LimitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PodAnnotation => write!(f, "pod annotation"),
            Self::NamespaceDefault => write!(f, "namespace default"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

/// A quota that was successfully provisioned for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedQuota {
    /// Container the quota applies to.
    pub container_id: ContainerId,
    /// Resolved overlay snapshot.
    pub location: OverlayLocation,
    /// Overlay work directory registered alongside the data directory.
    pub work_dir: PathBuf,
    /// Hard limit that was set.
    pub limit: QuotaLimit,
    /// Where the limit came from.
    pub source: LimitSource,
}

/// Per-container disk quota manager.
#[derive(Debug)]
pub struct DiskManager<R = XfsQuotaRunner> {
    config: DiskQuotaConfig,
    policies: PolicyStore,
    driver: QuotaDriver<R>,
}

impl DiskManager<XfsQuotaRunner> {
    /// Creates a manager driving the configured `xfs_quota` binary.
    ///
    /// Returns `None` when the quota root lacks project quota accounting;
    /// the caller must then skip registering it with the dispatcher.
    #[must_use]
    pub fn new(config: DiskQuotaConfig) -> Option<Self> {
        let runner = XfsQuotaRunner::new(config.quota_command.clone());
        Self::gated(config, runner)
    }
}

impl<R: QuotaCommandRunner> DiskManager<R> {
    /// Creates a manager with a custom runner, subject to the capability probe.
    #[must_use]
    pub fn gated(config: DiskQuotaConfig, runner: R) -> Option<Self> {
        if !capability::project_quota_enabled(&config.mounts_path, &config.quota_root) {
            tracing::warn!(
                root = %config.quota_root.display(),
                "prjquota is not enabled on the quota root, disk quota manager disabled"
            );
            return None;
        }
        Some(Self::with_runner(config, runner))
    }

    /// Creates a manager with a custom runner, skipping the capability probe.
    pub fn with_runner(config: DiskQuotaConfig, runner: R) -> Self {
        let driver = QuotaDriver::new(runner, config.quota_root.clone());
        Self {
            config,
            policies: PolicyStore::new(),
            driver,
        }
    }

    /// Returns the namespace default store.
    #[must_use]
    pub const fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    /// Returns the quota driver.
    #[must_use]
    pub const fn driver(&self) -> &QuotaDriver<R> {
        &self.driver
    }

    /// Picks the effective limit for a pod.
    ///
    /// The pod annotation wins over the namespace default. A value that is
    /// not a positive integer counts as absent at either level.
    #[must_use]
    pub fn resolve_limit(&self, pod: &PodSandbox) -> Option<(QuotaLimit, LimitSource)> {
        let key = self.config.annotation_key.as_str();
        if let Some(raw) = pod.annotations.get(key) {
            match QuotaLimit::parse(raw) {
                Some(limit) => return Some((limit, LimitSource::PodAnnotation)),
                None => tracing::warn!(
                    pod = %pod.name,
                    namespace = %pod.namespace,
                    value = %raw,
                    "invalid pod disk quota annotation, falling back to namespace default"
                ),
            }
        }

        let raw = self.policies.lookup(&pod.namespace)?;
        if let Some(limit) = QuotaLimit::parse(&raw) {
            return Some((limit, LimitSource::NamespaceDefault));
        }
        tracing::warn!(
            pod = %pod.name,
            namespace = %pod.namespace,
            value = %raw,
            "invalid namespace disk quota annotation, no quota applied"
        );
        None
    }

    /// Resolves the overlay snapshot behind a container's rootfs.
    ///
    /// # Errors
    ///
    /// Propagates mount table read, lookup, and identifier parse failures.
    pub fn locate(&self, container_id: &ContainerId) -> Result<OverlayLocation> {
        let rootfs = self.config.rootfs_path(container_id);
        resolve_overlay(&self.config.mountinfo_path, &rootfs)
    }

    /// Locates a container's snapshot and provisions `limit` for it.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the first failing quota step.
    pub fn apply_quota(
        &self,
        container_id: &ContainerId,
        limit: QuotaLimit,
        source: LimitSource,
    ) -> Result<AppliedQuota> {
        let location = self.locate(container_id)?;
        tracing::debug!(
            %container_id,
            project_id = %location.project_id,
            upper_dir = %location.upper_dir.display(),
            "resolved overlay snapshot"
        );
        self.driver
            .apply(location.project_id, &location.upper_dir, limit)?;
        Ok(AppliedQuota {
            container_id: container_id.clone(),
            work_dir: location.work_dir(),
            location,
            limit,
            source,
        })
    }

    /// Runs the full start-time decision for one container.
    ///
    /// Returns `Ok(None)` when no limit applies to the container.
    ///
    /// # Errors
    ///
    /// Returns the resolution or provisioning error.
    pub fn enforce(&self, pod: &PodSandbox, container: &Container) -> Result<Option<AppliedQuota>> {
        let Some((limit, source)) = self.resolve_limit(pod) else {
            return Ok(None);
        };
        tracing::debug!(
            container = %container.name,
            container_id = %container.id,
            limit_mb = limit.megabytes(),
            %source,
            "applying disk quota"
        );
        self.apply_quota(&container.id, limit, source).map(Some)
    }
}

impl<R: QuotaCommandRunner> LifecycleHandler for DiskManager<R> {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn process(&self, _item: &ProcessItem) -> Result<()> {
        Ok(())
    }

    fn start(&self, pod: &PodSandbox, container: &Container) -> Result<()> {
        match self.enforce(pod, container) {
            Ok(Some(applied)) => tracing::info!(
                container_id = %applied.container_id,
                project_id = %applied.location.project_id,
                upper_dir = %applied.location.upper_dir.display(),
                limit_mb = applied.limit.megabytes(),
                source = %applied.source,
                "disk quota applied"
            ),
            Ok(None) => {}
            Err(e) => tracing::error!(
                pod = %pod.name,
                container_id = %container.id,
                error = %e,
                "failed to apply disk quota"
            ),
        }
        Ok(())
    }

    fn namespace_update(&self, event: &NamespaceEvent) {
        let name = event.namespace.name.as_str();
        match event.kind {
            NamespaceEventKind::Add | NamespaceEventKind::Update => {
                let raw = event
                    .namespace
                    .annotations
                    .get(&self.config.annotation_key)
                    .map_or("", String::as_str);
                self.policies.set_or_clear(name, raw);
            }
            NamespaceEventKind::Delete => self.policies.set_or_clear(name, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use diskquota_common::constants::DISK_ANNOTATION;
    use diskquota_core::quota::QuotaCommand;
    use parking_lot::Mutex;

    use super::*;
    use crate::event::Namespace;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<QuotaCommand>>);

    impl QuotaCommandRunner for Recorder {
        fn run(&self, _quota_root: &Path, command: &QuotaCommand) -> Result<()> {
            self.0.lock().push(command.clone());
            Ok(())
        }
    }

    fn manager() -> DiskManager<Recorder> {
        DiskManager::with_runner(DiskQuotaConfig::default(), Recorder::default())
    }

    fn pod(namespace: &str, annotation: Option<&str>) -> PodSandbox {
        PodSandbox {
            name: "web-0".into(),
            namespace: namespace.into(),
            annotations: annotation
                .map(|v| HashMap::from([(DISK_ANNOTATION.to_owned(), v.to_owned())]))
                .unwrap_or_default(),
        }
    }

    fn ns_event(kind: NamespaceEventKind, name: &str, annotation: Option<&str>) -> NamespaceEvent {
        NamespaceEvent {
            kind,
            namespace: Namespace {
                name: name.into(),
                annotations: annotation
                    .map(|v| HashMap::from([(DISK_ANNOTATION.to_owned(), v.to_owned())]))
                    .unwrap_or_default(),
            },
        }
    }

    #[test]
    fn pod_annotation_beats_namespace_default() {
        let m = manager();
        m.policies().set_or_clear("team-a", "1024");
        let (limit, source) = m.resolve_limit(&pod("team-a", Some("512"))).unwrap();
        assert_eq!(limit.megabytes(), 512);
        assert_eq!(source, LimitSource::PodAnnotation);
    }

    #[test]
    fn namespace_default_applies_without_pod_annotation() {
        let m = manager();
        m.policies().set_or_clear("team-a", "1024");
        let (limit, source) = m.resolve_limit(&pod("team-a", None)).unwrap();
        assert_eq!(limit.megabytes(), 1024);
        assert_eq!(source, LimitSource::NamespaceDefault);
    }

    #[test]
    fn no_annotation_anywhere_means_no_quota() {
        assert_eq!(manager().resolve_limit(&pod("team-a", None)), None);
    }

    #[test]
    fn invalid_pod_annotation_falls_through() {
        let m = manager();
        m.policies().set_or_clear("team-a", "1024");
        for bad in ["-5", "abc", "0"] {
            let (limit, source) = m.resolve_limit(&pod("team-a", Some(bad))).unwrap();
            assert_eq!(limit.megabytes(), 1024);
            assert_eq!(source, LimitSource::NamespaceDefault);
        }
    }

    #[test]
    fn invalid_values_at_both_levels_mean_no_quota() {
        let m = manager();
        m.policies().set_or_clear("team-a", "lots");
        assert_eq!(m.resolve_limit(&pod("team-a", Some("-5"))), None);
    }

    #[test]
    fn namespace_events_maintain_policy_store() {
        let m = manager();
        m.namespace_update(&ns_event(NamespaceEventKind::Add, "team-a", Some("256")));
        assert_eq!(m.policies().lookup("team-a").as_deref(), Some("256"));

        m.namespace_update(&ns_event(NamespaceEventKind::Update, "team-a", None));
        assert_eq!(m.policies().lookup("team-a"), None);

        m.namespace_update(&ns_event(NamespaceEventKind::Add, "team-b", Some("64")));
        m.namespace_update(&ns_event(NamespaceEventKind::Delete, "team-b", Some("64")));
        assert_eq!(m.policies().lookup("team-b"), None);
    }

    #[test]
    fn start_without_limit_issues_nothing() {
        let m = manager();
        let container = Container {
            id: ContainerId::new("abc123"),
            name: "web".into(),
        };
        m.start(&pod("team-a", None), &container).unwrap();
        assert!(m.driver().runner().0.lock().is_empty());
    }

    #[test]
    fn start_with_unresolvable_rootfs_still_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mountinfo = dir.path().join("mountinfo");
        std::fs::write(&mountinfo, "").unwrap();
        let config = DiskQuotaConfig {
            mountinfo_path: mountinfo,
            ..DiskQuotaConfig::default()
        };
        let m = DiskManager::with_runner(config, Recorder::default());
        let container = Container {
            id: ContainerId::new("abc123"),
            name: "web".into(),
        };

        m.start(&pod("team-a", Some("300")), &container).unwrap();
        assert!(m.driver().runner().0.lock().is_empty());
    }

    #[test]
    fn process_is_a_noop() {
        let m = manager();
        let item = ProcessItem {
            container_id: ContainerId::new("abc123"),
            annotations: HashMap::new(),
        };
        m.process(&item).unwrap();
        assert_eq!(m.name(), "disk");
    }

    #[test]
    fn gate_disables_without_prjquota() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mounts = dir.path().join("mounts");
        std::fs::write(&mounts, "/dev/sdb1 /var/lib/containerd xfs rw,relatime 0 0\n").unwrap();
        let config = DiskQuotaConfig {
            mounts_path: mounts,
            ..DiskQuotaConfig::default()
        };
        assert!(DiskManager::gated(config, Recorder::default()).is_none());
    }

    #[test]
    fn gate_enables_with_prjquota() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mounts = dir.path().join("mounts");
        std::fs::write(
            &mounts,
            "/dev/sdb1 /var/lib/containerd xfs rw,prjquota,relatime 0 0\n",
        )
        .unwrap();
        let config = DiskQuotaConfig {
            mounts_path: mounts,
            ..DiskQuotaConfig::default()
        };
        assert!(DiskManager::gated(config, Recorder::default()).is_some());
    }
}

//! Routes lifecycle events to registered handlers.
//!
//! The dispatcher is generic over a single handler type, so every call is
//! statically dispatched. Namespace events are applied on the reading
//! thread before any later event is queued; start and process events are
//! fanned out to a pool of worker threads with no ordering between them.

use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use diskquota_common::error::{DiskQuotaError, Result};
use parking_lot::Mutex;

use crate::event::LifecycleEvent;
use crate::handler::LifecycleHandler;

/// Counters describing one processed event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Events decoded and handed to handlers.
    pub dispatched: usize,
    /// Lines that were not valid events.
    pub malformed: usize,
    /// Events for which some handler returned an error.
    pub failed: usize,
}

/// Registry of named lifecycle handlers.
#[derive(Debug)]
pub struct Dispatcher<H> {
    handlers: Vec<H>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<H: LifecycleHandler> Dispatcher<H> {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its name.
    ///
    /// # Errors
    ///
    /// Returns [`DiskQuotaError::Config`] if the name is already taken.
    pub fn register(&mut self, handler: H) -> Result<()> {
        let name = handler.name();
        if self.handlers.iter().any(|h| h.name() == name) {
            return Err(DiskQuotaError::Config {
                message: format!("handler `{name}` is already registered"),
            });
        }
        tracing::info!(handler = name, "handler registered");
        self.handlers.push(handler);
        Ok(())
    }

    /// Names of the registered handlers, in registration order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(LifecycleHandler::name).collect()
    }

    /// Registered handlers, in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[H] {
        &self.handlers
    }

    /// Delivers one event to every handler.
    ///
    /// # Errors
    ///
    /// Returns the first handler error. Remaining handlers still run.
    pub fn dispatch(&self, event: &LifecycleEvent) -> Result<()> {
        let mut first_err = None;
        for handler in &self.handlers {
            let outcome = match event {
                LifecycleEvent::Start { pod, container } => handler.start(pod, container),
                LifecycleEvent::Process { item } => handler.process(item),
                LifecycleEvent::Namespace(ns) => {
                    handler.namespace_update(ns);
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                tracing::warn!(handler = handler.name(), error = %e, "handler failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Processes a stream of JSON-lines events until end of input.
    ///
    /// Blank lines are ignored and malformed lines are logged and counted.
    ///
    /// # Errors
    ///
    /// Returns [`DiskQuotaError::Io`] if reading the stream fails.
    pub fn run_stream<B: BufRead>(&self, reader: B, workers: usize) -> Result<StreamStats> {
        let (tx, rx) = mpsc::channel::<LifecycleEvent>();
        let rx = Mutex::new(rx);
        let dispatched = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let malformed = std::thread::scope(|scope| -> Result<usize> {
            for _ in 0..workers.max(1) {
                let _ = scope.spawn(|| {
                    loop {
                        let next = rx.lock().recv();
                        let Ok(event) = next else { break };
                        self.record(&event, &dispatched, &failed);
                    }
                });
            }

            let mut malformed = 0;
            for (idx, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| DiskQuotaError::Io {
                    path: "<event stream>".into(),
                    source: e,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LifecycleEvent>(&line) {
                    Ok(event @ LifecycleEvent::Namespace(_)) => {
                        self.record(&event, &dispatched, &failed);
                    }
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        malformed += 1;
                        tracing::warn!(line = idx + 1, error = %e, "skipping malformed event");
                    }
                }
            }
            drop(tx);
            Ok(malformed)
        })?;

        Ok(StreamStats {
            dispatched: dispatched.into_inner(),
            malformed,
            failed: failed.into_inner(),
        })
    }

    fn record(&self, event: &LifecycleEvent, dispatched: &AtomicUsize, failed: &AtomicUsize) {
        let _ = dispatched.fetch_add(1, Ordering::Relaxed);
        if self.dispatch(event).is_err() {
            let _ = failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use diskquota_common::types::ContainerId;

    use super::*;
    use crate::event::{Container, NamespaceEvent, PodSandbox, ProcessItem};

    #[derive(Default)]
    struct Probe {
        name: &'static str,
        starts: Mutex<Vec<String>>,
        processed: Mutex<Vec<String>>,
        namespaces: Mutex<Vec<String>>,
        fail_starts: bool,
    }

    impl Probe {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                ..Self::default()
            }
        }
    }

    impl LifecycleHandler for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process(&self, item: &ProcessItem) -> Result<()> {
            self.processed.lock().push(item.container_id.to_string());
            Ok(())
        }

        fn start(&self, _pod: &PodSandbox, container: &Container) -> Result<()> {
            self.starts.lock().push(container.id.to_string());
            if self.fail_starts {
                return Err(DiskQuotaError::Config {
                    message: "refused".into(),
                });
            }
            Ok(())
        }

        fn namespace_update(&self, event: &NamespaceEvent) {
            self.namespaces.lock().push(event.namespace.name.clone());
        }
    }

    fn start_line(id: &str) -> String {
        format!(
            r#"{{"event":"start","pod":{{"name":"p","namespace":"ns"}},"container":{{"id":"{id}"}}}}"#
        )
    }

    #[test]
    fn duplicate_names_are_refused() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Probe::named("disk")).unwrap();
        assert!(dispatcher.register(Probe::named("disk")).is_err());
        assert_eq!(dispatcher.handler_names(), vec!["disk"]);
    }

    #[test]
    fn dispatch_routes_start_events() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Probe::named("disk")).unwrap();
        dispatcher
            .dispatch(&LifecycleEvent::Start {
                pod: PodSandbox::default(),
                container: Container {
                    id: ContainerId::new("c1"),
                    name: String::new(),
                },
            })
            .unwrap();
        assert_eq!(*dispatcher.handlers[0].starts.lock(), vec!["c1"]);
    }

    #[test]
    fn stream_routes_process_events() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Probe::named("disk")).unwrap();
        let input = [
            r#"{"event":"process","item":{"container_id":"c1"}}"#.to_owned(),
            start_line("c2"),
            r#"{"event":"process","item":{"container_id":"c3","annotations":{"k":"v"}}}"#
                .to_owned(),
        ]
        .join("\n");

        let stats = dispatcher.run_stream(Cursor::new(input), 2).unwrap();
        assert_eq!(stats.dispatched, 3);
        let mut processed = dispatcher.handlers[0].processed.lock().clone();
        processed.sort();
        assert_eq!(processed, vec!["c1", "c3"]);
        assert_eq!(*dispatcher.handlers[0].starts.lock(), vec!["c2"]);
    }

    #[test]
    fn stream_counts_events_and_skips_malformed_lines() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Probe::named("disk")).unwrap();
        let input = [
            r#"{"event":"namespace","kind":"add","namespace":{"name":"ns"}}"#.to_owned(),
            String::new(),
            start_line("c1"),
            "garbage".to_owned(),
            start_line("c2"),
            start_line("c3"),
        ]
        .join("\n");

        let stats = dispatcher.run_stream(Cursor::new(input), 3).unwrap();
        assert_eq!(
            stats,
            StreamStats {
                dispatched: 4,
                malformed: 1,
                failed: 0,
            }
        );
        let mut starts = dispatcher.handlers[0].starts.lock().clone();
        starts.sort();
        assert_eq!(starts, vec!["c1", "c2", "c3"]);
        assert_eq!(*dispatcher.handlers[0].namespaces.lock(), vec!["ns"]);
    }

    #[test]
    fn stream_counts_handler_failures() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(Probe {
                fail_starts: true,
                ..Probe::named("disk")
            })
            .unwrap();
        let stats = dispatcher
            .run_stream(Cursor::new(start_line("c1")), 1)
            .unwrap();
        assert_eq!(stats.failed, 1);
    }
}

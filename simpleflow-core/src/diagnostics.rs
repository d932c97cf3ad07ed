//! Structured, non-fatal warnings raised while building or running graphs.
//!
//! Diagnostics never change control flow. They are delivered to a
//! [`DiagnosticSink`] injected into the [`crate::graph::Graph`]; the flow
//! built from that graph reports to the same sink. [`TracingSink`] is the
//! default and logs at `warn`; [`RecordingSink`] keeps events in memory so
//! tests can assert on them.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;
use tracing::warn;

use crate::action::Action;

/// When a diagnostic was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// While wiring the graph.
    Construction,
    /// While executing nodes.
    Traversal,
}

/// A warning event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// An edge label was registered twice on one node; the last target wins.
    SuccessorOverwritten {
        /// Source node name
        node: String,
        /// Label that was overwritten
        action: Action,
    },
    /// A node returned an action with no matching edge; the run ends there.
    DeadEnd {
        /// Node that returned the action
        node: String,
        /// Returned action
        action: Action,
        /// Labels defined on the node, sorted
        defined: Vec<String>,
    },
    /// A node with successors was run standalone; its edges were not followed.
    SuccessorsIgnored {
        /// Node name
        node: String,
        /// Labels defined on the node, sorted
        defined: Vec<String>,
    },
}

impl Diagnostic {
    /// Phase that produced the diagnostic.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::SuccessorOverwritten { .. } => DiagnosticKind::Construction,
            Self::DeadEnd { .. } | Self::SuccessorsIgnored { .. } => DiagnosticKind::Traversal,
        }
    }

    /// Name of the node the diagnostic is about.
    pub fn node(&self) -> &str {
        match self {
            Self::SuccessorOverwritten { node, .. }
            | Self::DeadEnd { node, .. }
            | Self::SuccessorsIgnored { node, .. } => node,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuccessorOverwritten { node, action } => {
                write!(f, "overwriting successor of '{node}' for action '{action}'")
            }
            Self::DeadEnd {
                node,
                action,
                defined,
            } => write!(
                f,
                "flow ends: action '{action}' of '{node}' not found among defined edges {defined:?}"
            ),
            Self::SuccessorsIgnored { node, defined } => write!(
                f,
                "node '{node}' won't run its successors {defined:?}; run it through a flow"
            ),
        }
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    /// Handle one diagnostic.
    fn emit(&self, diagnostic: Diagnostic);
}

/// Logs every diagnostic through `tracing` at `warn` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        warn!(
            kind = ?diagnostic.kind(),
            node = diagnostic.node(),
            "{diagnostic}"
        );
    }
}

/// Collects diagnostics in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.buffer().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.buffer())
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    // A panic elsewhere must not cost the recorded events.
    fn buffer(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.buffer().push(diagnostic);
    }
}

/// Sink handle stored by graphs and flows.
pub(crate) type SharedSink = Arc<dyn DiagnosticSink>;

pub(crate) fn default_sink() -> SharedSink {
    Arc::new(TracingSink)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn dead_end() -> Diagnostic {
        Diagnostic::DeadEnd {
            node: "router".to_string(),
            action: Action::new("route_c"),
            defined: vec!["route_a".to_string(), "route_b".to_string()],
        }
    }

    #[test]
    fn kinds_follow_the_phase() {
        let overwritten = Diagnostic::SuccessorOverwritten {
            node: "a".to_string(),
            action: Action::default(),
        };
        assert_eq!(overwritten.kind(), DiagnosticKind::Construction);
        assert_eq!(dead_end().kind(), DiagnosticKind::Traversal);
        assert_eq!(overwritten.to_string(), "overwriting successor of 'a' for action 'default'");
    }

    #[test]
    fn recording_sink_survives_a_poisoned_lock() {
        let sink = RecordingSink::new();
        sink.emit(dead_end());

        let poisoner = sink.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.events.lock().unwrap();
            panic!("poison the buffer");
        })
        .join();
        assert!(joined.is_err());
        assert!(sink.events.is_poisoned());

        sink.emit(dead_end());
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn recording_sink_shares_buffer_between_clones() {
        let sink = RecordingSink::new();
        let handle = sink.clone();
        handle.emit(dead_end());

        assert_eq!(sink.events(), vec![dead_end()]);
        assert_eq!(sink.take().len(), 1);
        assert!(handle.is_empty());
    }

    #[test]
    #[traced_test]
    fn tracing_sink_logs_warnings() {
        TracingSink.emit(dead_end());
        assert!(logs_contain("flow ends: action 'route_c'"));
    }
}

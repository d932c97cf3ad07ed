//! Error types for SimpleFlow.

use thiserror::Error;

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Error types that can occur while building or running a flow.
///
/// Warnings (overwritten edges, dead ends, ignored successors) are not
/// errors; they are reported through [`crate::diagnostics::DiagnosticSink`].
#[derive(Error, Debug)]
pub enum FlowError {
    /// Context manipulation error.
    #[error("Context error: {0}")]
    Context(String),

    /// Graph construction error.
    #[error("Construction error: {0}")]
    Construction(String),

    /// A node id that does not belong to the graph.
    #[error("Unknown node: #{index}")]
    UnknownNode {
        /// Index of the missing node
        index: usize,
    },

    /// The optional step guard of a flow was hit.
    #[error("Flow '{flow}' exceeded maximum steps ({limit})")]
    StepLimitExceeded {
        /// Flow name
        flow: String,
        /// Configured limit
        limit: usize,
    },

    /// A node failed while executing.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Serialization/Deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Arbitrary failure raised by a node implementation.
    #[error("Node error: {0}")]
    Node(#[from] eyre::Report),
}

impl FlowError {
    /// Create a new context error.
    pub fn context(msg: impl Into<String>) -> Self {
        Self::Context(msg.into())
    }

    /// Create a new construction error.
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Create an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Wrap any error type as a node failure, keeping it downcastable.
    pub fn node<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Node(eyre::Report::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct Boom;

    #[test]
    fn node_errors_stay_downcastable() {
        let err = FlowError::node(Boom);
        match err {
            FlowError::Node(report) => assert!(report.downcast_ref::<Boom>().is_some()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn messages_name_the_flow() {
        let err = FlowError::StepLimitExceeded {
            flow: "loop".to_string(),
            limit: 3,
        };
        assert_eq!(err.to_string(), "Flow 'loop' exceeded maximum steps (3)");
        assert_eq!(
            FlowError::UnknownNode { index: 7 }.to_string(),
            "Unknown node: #7"
        );
    }
}

//! Graph construction: nodes, action-labelled successor edges and the edge
//! builder used to wire conditional transitions.
//!
//! Nodes live in an arena and are addressed by [`NodeId`], so cycles
//! (including a node looping onto itself) need no reference cycles. A graph
//! is only mutable until it is moved into a [`crate::flow::Flow`]; from then
//! on its topology is frozen and may be traversed by any number of
//! concurrent runs.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::{
    action::Action,
    context::Context,
    diagnostics::{Diagnostic, DiagnosticSink, SharedSink, default_sink},
    error::{FlowError, Result},
    node::Node,
};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// Handle of a node inside a [`Graph`].
///
/// A handle only resolves in the graph that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    graph: u64,
    index: usize,
}

impl NodeId {
    /// Position of the node in its graph.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.index.serialize(serializer)
    }
}

/// A node together with its outgoing edges.
#[derive(Debug)]
pub(crate) struct Vertex {
    pub(crate) node: Arc<dyn Node>,
    /// Keyed by resolved label, so `""` and `"default"` share one slot.
    pub(crate) successors: BTreeMap<String, NodeId>,
}

impl Vertex {
    pub(crate) fn labels(&self) -> Vec<String> {
        self.successors.keys().cloned().collect()
    }

    pub(crate) fn successor(&self, action: &Action) -> Option<NodeId> {
        self.successors.get(action.edge_key()).copied()
    }
}

/// Mutable graph of nodes and labelled edges.
#[derive(Debug)]
pub struct Graph {
    id: u64,
    vertices: Vec<Vertex>,
    sink: SharedSink,
    /// Edge sources that did not belong to this graph.
    dangling: Vec<NodeId>,
}

impl Graph {
    /// Create an empty graph reporting diagnostics through `tracing`.
    pub fn new() -> Self {
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            vertices: Vec::new(),
            sink: default_sink(),
            dangling: Vec::new(),
        }
    }

    /// Create an empty graph reporting diagnostics to `sink`.
    pub fn with_diagnostics(sink: impl DiagnosticSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
            ..Self::new()
        }
    }

    /// Add a node and return its handle.
    pub fn add_node(&mut self, node: impl Node + 'static) -> NodeId {
        self.add_shared(Arc::new(node))
    }

    /// Add a node that may also be registered in other graphs.
    pub fn add_shared(&mut self, node: Arc<dyn Node>) -> NodeId {
        let id = NodeId {
            graph: self.id,
            index: self.vertices.len(),
        };
        self.vertices.push(Vertex {
            node,
            successors: BTreeMap::new(),
        });
        id
    }

    /// Register `target` as the successor of `source` for `action`.
    ///
    /// A second registration for the same label replaces the first and emits
    /// [`Diagnostic::SuccessorOverwritten`]. Returns `target` so construction
    /// can continue from the node just connected.
    pub fn add_successor(
        &mut self,
        source: NodeId,
        target: NodeId,
        action: impl Into<Action>,
    ) -> NodeId {
        let action = action.into();
        if source.graph != self.id {
            self.dangling.push(source);
            return target;
        }
        let Some(vertex) = self.vertices.get_mut(source.index) else {
            self.dangling.push(source);
            return target;
        };

        let key = action.edge_key().to_string();
        debug!(source = %source, target = %target, action = %key, "adding successor");
        if vertex.successors.insert(key.clone(), target).is_some() {
            let node = vertex.node.name();
            self.sink.emit(Diagnostic::SuccessorOverwritten {
                node,
                action: Action::new(key),
            });
        }
        target
    }

    /// Register `target` on the default edge of `source`.
    pub fn connect_default(&mut self, source: NodeId, target: NodeId) -> NodeId {
        self.add_successor(source, target, Action::default_edge())
    }

    /// Start a conditional edge from `source` on `action`; complete it with
    /// [`EdgeBuilder::connect`].
    pub fn begin_conditional(
        &mut self,
        source: NodeId,
        action: impl Into<Action>,
    ) -> EdgeBuilder<'_> {
        EdgeBuilder {
            graph: self,
            source,
            action: action.into(),
        }
    }

    /// Target registered on `source` for `action`, if any.
    pub fn successor(&self, source: NodeId, action: impl Into<Action>) -> Option<NodeId> {
        self.vertex(source)
            .and_then(|vertex| vertex.successor(&action.into()))
    }

    /// Sorted edge labels defined on `source`.
    pub fn edges(&self, source: NodeId) -> Vec<String> {
        self.vertex(source).map(Vertex::labels).unwrap_or_default()
    }

    /// Name of the node behind `id`.
    pub fn node_name(&self, id: NodeId) -> Option<String> {
        self.vertex(id).map(|vertex| vertex.node.name())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if no node was added.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check if `id` belongs to this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.graph == self.id && id.index < self.vertices.len()
    }

    /// Execute a single node without following any edge.
    ///
    /// If the node has successors, [`Diagnostic::SuccessorsIgnored`] is
    /// emitted first: standalone execution never consults the edge map, so
    /// this is usually a node that should have been run through its flow.
    pub async fn run_node(&self, id: NodeId, context: Context) -> Result<Context> {
        let vertex = self
            .vertex(id)
            .ok_or(FlowError::UnknownNode { index: id.index })?;

        if !vertex.successors.is_empty() {
            self.sink.emit(Diagnostic::SuccessorsIgnored {
                node: vertex.node.name(),
                defined: vertex.labels(),
            });
        }

        let (context, _) = vertex.node.execute(context).await?;
        Ok(context)
    }

    pub(crate) fn vertex(&self, id: NodeId) -> Option<&Vertex> {
        if id.graph != self.id {
            return None;
        }
        self.vertices.get(id.index)
    }

    pub(crate) fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Check that `start` and every edge refer to nodes of this graph.
    pub(crate) fn validate(&self, start: NodeId) -> Result<()> {
        if self.vertices.is_empty() {
            return Err(FlowError::construction("No nodes added to graph"));
        }
        if !self.contains(start) {
            return Err(FlowError::construction(format!(
                "start node {start} is not part of the graph"
            )));
        }
        if let Some(source) = self.dangling.first() {
            return Err(FlowError::construction(format!(
                "edge source {source} is not part of the graph"
            )));
        }
        for vertex in &self.vertices {
            for (label, target) in &vertex.successors {
                if !self.contains(*target) {
                    return Err(FlowError::construction(format!(
                        "edge '{label}' of '{}' points to unknown node {target}",
                        vertex.node.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending edge `(source, action)` waiting for its target.
///
/// The source node is untouched until [`EdgeBuilder::connect`] is called.
#[must_use = "an edge is only registered once `connect` is called"]
pub struct EdgeBuilder<'g> {
    graph: &'g mut Graph,
    source: NodeId,
    action: Action,
}

impl EdgeBuilder<'_> {
    /// Complete the edge and return `target`.
    pub fn connect(self, target: NodeId) -> NodeId {
        self.graph.add_successor(self.source, target, self.action)
    }
}

impl fmt::Debug for EdgeBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeBuilder")
            .field("source", &self.source)
            .field("action", &self.action)
            .finish()
    }
}

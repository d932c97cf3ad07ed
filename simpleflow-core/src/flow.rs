//! Flow orchestration: traversal of a frozen graph from its start node.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    action::Action,
    context::Context,
    diagnostics::{Diagnostic, DiagnosticSink, SharedSink},
    error::{FlowError, Result},
    graph::{Graph, NodeId, Vertex},
    node::Node,
};

/// Action a flow reports when it is executed as a node of another flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExitAction {
    /// Follow the default edge of the outer graph.
    #[default]
    Default,
    /// Always return this label.
    Fixed(Action),
    /// Return the action of the last node executed inside the flow.
    Propagate,
}

/// One executed step of a traced run.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based position in the run.
    pub step: usize,
    /// Executed node.
    pub node: NodeId,
    /// Name of the executed node.
    pub node_name: String,
    /// Action returned by the node.
    pub action: Action,
    /// Node selected by the action, if any.
    pub next: Option<NodeId>,
    /// Time spent in `execute`.
    pub duration: Duration,
    /// When the node finished.
    pub timestamp: DateTime<Utc>,
}

/// Result of [`Flow::run_traced`].
#[derive(Debug, Clone)]
pub struct FlowRun {
    /// Final context.
    pub context: Context,
    /// Action returned by the last executed node.
    pub last_action: Action,
    /// Executed steps in order.
    pub trace: Vec<StepRecord>,
    /// Total execution time.
    pub duration: Duration,
}

impl FlowRun {
    /// Names of the executed nodes in visit order.
    pub fn visited(&self) -> Vec<&str> {
        self.trace.iter().map(|step| step.node_name.as_str()).collect()
    }

    /// Number of executed steps.
    pub fn steps(&self) -> usize {
        self.trace.len()
    }
}

/// Working handle over a template vertex for one step of a run.
///
/// Cursors borrow the frozen topology; nothing is copied or mutated per
/// step, which is what makes concurrent runs of one flow safe.
struct Cursor<'g> {
    id: NodeId,
    vertex: &'g Vertex,
}

/// Traversal engine over a frozen [`Graph`].
///
/// A flow is itself a [`Node`]: registered in another graph, its whole
/// traversal counts as a single step of the outer flow, after which the
/// outer flow follows the flow's [`ExitAction`].
#[derive(Clone, Debug)]
pub struct Flow {
    graph: Arc<Graph>,
    start: NodeId,
    name: String,
    max_steps: Option<usize>,
    exit: ExitAction,
    sink: SharedSink,
}

impl Flow {
    /// Freeze `graph` into a flow starting at `start`.
    pub fn new(graph: Graph, start: NodeId) -> Result<Self> {
        Self::builder(graph).start(start).build()
    }

    /// Create a new flow builder.
    pub fn builder(graph: Graph) -> FlowBuilder {
        FlowBuilder::new(graph)
    }

    /// Run the graph to completion and return the final context.
    ///
    /// Nodes execute strictly one after another. A node error aborts the
    /// run and is returned unchanged.
    pub async fn run(&self, context: Context) -> Result<Context> {
        let (context, _) = self.traverse(context, None).await?;
        Ok(context)
    }

    /// Like [`Flow::run`], also returning the per-step trace.
    pub async fn run_traced(&self, context: Context) -> Result<FlowRun> {
        let started = Instant::now();
        let mut trace = Vec::new();
        let (context, last_action) = self.traverse(context, Some(&mut trace)).await?;
        Ok(FlowRun {
            context,
            last_action,
            trace,
            duration: started.elapsed(),
        })
    }

    /// Get the flow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start node.
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The frozen graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    async fn traverse(
        &self,
        mut context: Context,
        mut trace: Option<&mut Vec<StepRecord>>,
    ) -> Result<(Context, Action)> {
        let mut cursor = self.cursor(self.start)?;
        let mut steps = 0usize;

        loop {
            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return Err(FlowError::StepLimitExceeded {
                        flow: self.name.clone(),
                        limit,
                    });
                }
            }
            steps += 1;

            let node_name = cursor.vertex.node.name();
            debug!(flow = %self.name, step = steps, node = %node_name, "executing node");

            let started = Instant::now();
            let (next_context, action) = cursor.vertex.node.execute(context).await?;
            context = next_context;

            #[cfg(feature = "metrics")]
            metrics::counter!("simpleflow_steps_total").increment(1);

            let next = self.next_node(&cursor, &node_name, &action);

            if let Some(trace) = trace.as_mut() {
                trace.push(StepRecord {
                    step: steps,
                    node: cursor.id,
                    node_name,
                    action: action.clone(),
                    next,
                    duration: started.elapsed(),
                    timestamp: Utc::now(),
                });
            }

            match next {
                Some(id) => cursor = self.cursor(id)?,
                None => {
                    info!(flow = %self.name, steps, last_action = %action, "flow completed");
                    return Ok((context, action));
                }
            }
        }
    }

    fn cursor(&self, id: NodeId) -> Result<Cursor<'_>> {
        self.graph
            .vertex(id)
            .map(|vertex| Cursor { id, vertex })
            .ok_or(FlowError::UnknownNode { index: id.index() })
    }

    /// Edge selected by `action`; an empty label means the default edge.
    fn next_node(&self, cursor: &Cursor<'_>, node_name: &str, action: &Action) -> Option<NodeId> {
        let next = cursor.vertex.successor(action);
        if next.is_none() && !cursor.vertex.successors.is_empty() {
            #[cfg(feature = "metrics")]
            metrics::counter!("simpleflow_dead_ends_total").increment(1);

            self.sink.emit(Diagnostic::DeadEnd {
                node: node_name.to_string(),
                action: action.clone(),
                defined: cursor.vertex.labels(),
            });
        }
        next
    }
}

#[async_trait]
impl Node for Flow {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let (context, last_action) = self.traverse(context, None).await?;
        let action = match &self.exit {
            ExitAction::Default => Action::default(),
            ExitAction::Fixed(action) => action.clone(),
            ExitAction::Propagate => last_action,
        };
        Ok((context, action))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Builder for [`Flow`].
pub struct FlowBuilder {
    graph: Graph,
    start: Option<NodeId>,
    name: String,
    max_steps: Option<usize>,
    exit: ExitAction,
    sink: Option<SharedSink>,
}

impl FlowBuilder {
    /// Create a new flow builder over `graph`.
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            start: None,
            name: "flow".to_string(),
            max_steps: None,
            exit: ExitAction::Default,
            sink: None,
        }
    }

    /// Set the flow name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the start node.
    pub fn start(mut self, start: NodeId) -> Self {
        self.start = Some(start);
        self
    }

    /// Abort runs that would execute more than `max_steps` nodes.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Action reported when the flow runs nested inside another flow.
    pub fn exit_action(mut self, exit: ExitAction) -> Self {
        self.exit = exit;
        self
    }

    /// Report traversal diagnostics to `sink` instead of the graph's sink.
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Build the flow.
    pub fn build(self) -> Result<Flow> {
        let start = self
            .start
            .ok_or_else(|| FlowError::construction("Start node not set"))?;
        self.graph.validate(start)?;

        let sink = self.sink.unwrap_or_else(|| self.graph.sink().clone());
        Ok(Flow {
            graph: Arc::new(self.graph),
            start,
            name: self.name,
            max_steps: self.max_steps,
            exit: self.exit,
            sink,
        })
    }
}

//! # SimpleFlow
//!
//! A minimal asynchronous directed-graph orchestration engine.
//!
//! ## Core Concepts
//!
//! - **Node**: an async unit of work that receives the context and returns it
//!   together with an [`Action`](action::Action) label
//! - **Graph**: nodes plus labelled successor edges, built once up front
//! - **Flow**: runs a graph from its start node, following the edge selected
//!   by each returned action until none matches; a flow is itself a node
//! - **Context**: shared key/value data threaded through every node
//!
//! ## Quick Start
//!
//! ```rust
//! use simpleflow_core::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let mut graph = Graph::new();
//! let check = graph.add_node(helpers::conditional(
//!     "check",
//!     |ctx: &Context| ctx.get::<i64>("x").ok().flatten().unwrap_or(0) > 0,
//!     "route_a",
//!     "route_b",
//! ));
//! let a = graph.add_node(helpers::fn_node("a", |mut ctx: Context| async move {
//!     ctx.set("picked", "a")?;
//!     Ok((ctx, Action::default()))
//! }));
//! let b = graph.add_node(helpers::fn_node("b", |mut ctx: Context| async move {
//!     ctx.set("picked", "b")?;
//!     Ok((ctx, Action::default()))
//! }));
//! graph.begin_conditional(check, "route_a").connect(a);
//! graph.begin_conditional(check, "route_b").connect(b);
//!
//! let flow = Flow::new(graph, check)?;
//! let mut context = Context::new();
//! context.set("x", 1)?;
//! let context = flow.run(context).await?;
//! assert_eq!(context.get::<String>("picked")?, Some("a".to_string()));
//! # Ok::<(), FlowError>(())
//! # }).unwrap();
//! ```

pub mod action;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod graph;
pub mod node;

/// Convenient re-exports for common use.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use eyre;
    pub use serde::{Deserialize, Serialize};
    pub use tokio;

    pub use crate::{
        action::Action,
        context::{Context, ContextBuilder},
        diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, TracingSink},
        error::{FlowError, Result},
        flow::{ExitAction, Flow, FlowBuilder, FlowRun, StepRecord},
        graph::{EdgeBuilder, Graph, NodeId},
        node::{ConditionalNode, FnNode, Node, PassthroughNode, helpers},
    };
}

//! Node abstraction for SimpleFlow graphs.

use std::fmt::Debug;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::{action::Action, context::Context, error::Result};

/// Trait for graph nodes.
///
/// A node is a unit of asynchronous work. It receives the context, performs
/// its side effects on it and hands it back together with the [`Action`]
/// that selects the outgoing edge. Returning `Err` is a fault: the enclosing
/// run aborts and the error reaches the caller unchanged. To route around a
/// recoverable problem, return a sentinel action (e.g. `"invalid_input"`)
/// and wire an edge for it instead.
#[async_trait]
pub trait Node: Send + Sync + Debug {
    /// Execute the node's logic.
    async fn execute(&self, context: Context) -> Result<(Context, Action)>;

    /// Get the name of this node for diagnostics and traces.
    fn name(&self) -> String {
        format!("{self:?}")
    }
}

/// Boxed future returned by [`FnNode`] closures.
pub type NodeFuture = BoxFuture<'static, Result<(Context, Action)>>;

/// A node that wraps an async closure.
pub struct FnNode<F>
where
    F: Fn(Context) -> NodeFuture + Send + Sync,
{
    func: F,
    name: String,
}

impl<F> Debug for FnNode<F>
where
    F: Fn(Context) -> NodeFuture + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnNode").field("name", &self.name).finish()
    }
}

impl<F> FnNode<F>
where
    F: Fn(Context) -> NodeFuture + Send + Sync,
{
    /// Create a new functional node.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            func,
            name: name.into(),
        }
    }
}

#[async_trait]
impl<F> Node for FnNode<F>
where
    F: Fn(Context) -> NodeFuture + Send + Sync,
{
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        (self.func)(context).await
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// A no-op node that always returns the same action.
#[derive(Debug, Clone)]
pub struct PassthroughNode {
    action: Action,
    name: String,
}

impl PassthroughNode {
    /// Create a new passthrough node.
    pub fn new(name: impl Into<String>, action: impl Into<Action>) -> Self {
        Self {
            action: action.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl Node for PassthroughNode {
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        Ok((context, self.action.clone()))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Picks one of two actions based on a predicate over the context.
pub struct ConditionalNode<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    condition: F,
    when_true: Action,
    when_false: Action,
    name: String,
}

impl<F> Debug for ConditionalNode<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalNode")
            .field("name", &self.name)
            .field("when_true", &self.when_true)
            .field("when_false", &self.when_false)
            .finish()
    }
}

impl<F> ConditionalNode<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    /// Create a new conditional node.
    pub fn new(
        name: impl Into<String>,
        condition: F,
        when_true: impl Into<Action>,
        when_false: impl Into<Action>,
    ) -> Self {
        Self {
            condition,
            when_true: when_true.into(),
            when_false: when_false.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl<F> Node for ConditionalNode<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    async fn execute(&self, context: Context) -> Result<(Context, Action)> {
        let action = if (self.condition)(&context) {
            self.when_true.clone()
        } else {
            self.when_false.clone()
        };
        Ok((context, action))
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Helper functions for creating common node types.
pub mod helpers {
    use super::*;

    /// Create a functional node from an async closure.
    pub fn fn_node<F, Fut>(
        name: impl Into<String>,
        f: F,
    ) -> FnNode<impl Fn(Context) -> NodeFuture + Send + Sync>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(Context, Action)>> + Send + 'static,
    {
        FnNode::new(name, move |ctx| -> NodeFuture { Box::pin(f(ctx)) })
    }

    /// Create a passthrough node that always returns `action`.
    pub fn passthrough(name: impl Into<String>, action: impl Into<Action>) -> PassthroughNode {
        PassthroughNode::new(name, action)
    }

    /// Create a conditional node.
    pub fn conditional<F>(
        name: impl Into<String>,
        condition: F,
        when_true: impl Into<Action>,
        when_false: impl Into<Action>,
    ) -> ConditionalNode<F>
    where
        F: Fn(&Context) -> bool + Send + Sync,
    {
        ConditionalNode::new(name, condition, when_true, when_false)
    }
}

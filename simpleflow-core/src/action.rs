//! Action labels returned by nodes to select the next edge.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Label returned by [`crate::node::Node::execute`] to pick an outgoing edge.
///
/// An empty label and the literal `"default"` are equivalent: both resolve to
/// the default edge. `Action::default()` is the empty label.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Label of the default edge.
    pub const DEFAULT: &'static str = "default";

    /// Create an action from a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The explicit `"default"` action.
    pub fn default_edge() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// The label exactly as returned by the node.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the node returned no label at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if this action selects the default edge.
    pub fn is_default(&self) -> bool {
        self.edge_key() == Self::DEFAULT
    }

    /// Key used for successor lookup.
    pub fn edge_key(&self) -> &str {
        if self.0.is_empty() {
            Self::DEFAULT
        } else {
            &self.0
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.edge_key())
    }
}

impl From<&str> for Action {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for Action {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl From<Option<String>> for Action {
    fn from(label: Option<String>) -> Self {
        label.map(Self).unwrap_or_default()
    }
}

impl PartialEq<str> for Action {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Action {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

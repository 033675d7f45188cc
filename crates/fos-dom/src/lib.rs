//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree with selector matching and event dispatch.
//! This is the native surface that `fos-prototypes` builds its
//! convenience methods on.

mod node;
mod tree;
mod document;
mod events;
pub mod selector;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Ancestors, Descendants};
pub use document::Document;
pub use events::{
    Event, EventInit, EventPhase, EventContext, Listener, ListenerOptions, ListenerRegistry,
};
pub use selector::{SelectorMatcher, CssMatcher};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for a missing link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Whether this ID refers to a node slot (not the sentinel)
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn to_option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Selector could not be parsed (SyntaxError)
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    /// Node ID does not belong to this document
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Reference node is not a child of the given parent
    #[error("Node is not a child")]
    NotAChild,
    /// Operation not valid for this node type
    #[error("Invalid node type")]
    InvalidNodeType,
}

impl DomError {
    pub(crate) fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

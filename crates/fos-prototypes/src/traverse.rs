//! Ancestor search and removal

use fos_dom::{Document, NodeId};

use crate::Result;

pub trait Traverse {
    /// Nearest ancestor (excluding `node`) matching `selector`
    fn find_parent(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>>;

    /// Detach `node` from its parent and hand it back.
    ///
    /// Removing a node that is already detached does nothing.
    fn remove(&mut self, node: NodeId) -> Result<NodeId>;
}

impl Traverse for Document {
    fn find_parent(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        self.tree().node(node)?;
        self.validate_selector(selector)?;
        for ancestor in self.tree().ancestors(node) {
            if self.matches(ancestor, selector)? {
                return Ok(Some(ancestor));
            }
        }
        Ok(None)
    }

    fn remove(&mut self, node: NodeId) -> Result<NodeId> {
        self.tree().node(node)?;
        match self.parent_node(node) {
            Some(parent) => {
                self.remove_child(parent, node)?;
                tracing::debug!("Removed {} from {}", node, parent);
            }
            None => tracing::trace!("{} already detached", node),
        }
        Ok(node)
    }
}

//! Query façade

use fos_dom::{Document, NodeId};

use crate::{NodeList, Result};

/// Selector queries scoped to a node.
///
/// Pass [`Document::root`] as the scope to search the whole document.
pub trait Query {
    /// First matching descendant of `scope`, in document order
    fn find(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>>;

    /// Every matching descendant of `scope`, in document order
    fn find_all(&self, scope: NodeId, selector: &str) -> Result<NodeList>;
}

impl Query for Document {
    fn find(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector(scope, selector)?)
    }

    fn find_all(&self, scope: NodeId, selector: &str) -> Result<NodeList> {
        Ok(self.query_selector_all(scope, selector)?.into())
    }
}

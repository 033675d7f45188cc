//! fOS Prototypes
//!
//! Convenience methods layered on the native [`fos_dom::Document`] API:
//!
//! - [`Query`]: `find` / `find_all` from the document node or any element
//! - [`Traverse`]: `find_parent` and chainable `remove`
//! - [`Events`]: `bind` / `unbind` / `once` over whitespace-separated event
//!   names, `delegate`, and `trigger`
//! - [`NodeList`]: the non-live result of `find_all`
//!
//! Every method is a thin wrapper; selector matching, tree walking and
//! dispatch all happen in `fos-dom`.
//!
//! ```
//! use fos_prototypes::prelude::*;
//! use fos_prototypes::{Document, Listener};
//!
//! let mut doc = Document::new("about:blank");
//! let link = doc.create_element("a");
//! doc.append_child(doc.body(), link)?;
//!
//! let found = doc.find(doc.root(), "a")?;
//! assert_eq!(found, Some(link));
//! assert_eq!(doc.find_parent(link, "body")?, Some(doc.body()));
//!
//! let listener = Listener::new(|ctx| assert_eq!(ctx.event().event_type(), "click"));
//! doc.bind(link, "click", &listener)?;
//! doc.trigger(link, "click")?;
//! # Ok::<(), fos_prototypes::Error>(())
//! ```

mod delegate;
mod events;
mod names;
mod node_list;
mod query;
mod traverse;

pub use events::Events;
pub use node_list::NodeList;
pub use query::Query;
pub use traverse::Traverse;

pub use fos_dom::{
    Document, DomError, Event, EventContext, EventInit, Listener, ListenerOptions, NodeId,
};

/// The extension traits, for glob import
pub mod prelude {
    pub use crate::{Events, Query, Traverse};
}

/// Errors from the convenience layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Error raised by the underlying document (bad selector, unknown node, ...)
    #[error(transparent)]
    Dom(#[from] DomError),
    /// An event-name list contained no names
    #[error("No event names given")]
    NoEventNames,
}

pub type Result<T> = std::result::Result<T, Error>;

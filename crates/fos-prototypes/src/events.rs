//! Listener registry sugar
//!
//! Every method takes a whitespace-separated list of event names. Each name
//! is its own registration, so unbinding one name leaves the others alone
//! even when they share the listener.

use fos_dom::{Document, Event, EventInit, Listener, ListenerOptions, NodeId};

use crate::delegate::delegated_listener;
use crate::names::event_names;
use crate::Result;

pub trait Events {
    /// Register `listener` for each name in `names`
    fn bind(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()>;

    /// Remove `listener` from each name in `names`; unknown pairs are ignored
    fn unbind(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()>;

    /// Like [`bind`](Events::bind), but each name's registration is dropped
    /// the first time that name fires
    fn once(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()>;

    /// Register one listener per name on `container` that forwards events
    /// whose target (or an ancestor of it, up to `container`) matches
    /// `child_selector`.
    ///
    /// `listener` sees the matched element as [`EventContext::this`].
    /// Matching happens at dispatch time, so elements added later are
    /// covered. The returned wrapper can be passed to
    /// [`unbind`](Events::unbind) to stop delegating.
    ///
    /// [`EventContext::this`]: fos_dom::EventContext::this
    fn delegate(
        &mut self,
        container: NodeId,
        names: &str,
        child_selector: &str,
        listener: &Listener,
    ) -> Result<Listener>;

    /// Dispatch a bubbling, cancelable event for each name in turn.
    ///
    /// Returns `false` if any of them had its default prevented.
    fn trigger(&mut self, node: NodeId, names: &str) -> Result<bool>;
}

fn register(
    doc: &mut Document,
    node: NodeId,
    names: &str,
    listener: &Listener,
    options: ListenerOptions,
) -> Result<()> {
    for name in event_names(names)? {
        doc.add_event_listener(node, name, listener.clone(), options)?;
    }
    tracing::debug!("Bound {:?} on {} (once: {})", names, node, options.once);
    Ok(())
}

impl Events for Document {
    fn bind(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()> {
        register(self, node, names, listener, ListenerOptions::default())
    }

    fn unbind(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()> {
        for name in event_names(names)? {
            self.remove_event_listener(node, name, listener, false)?;
        }
        tracing::debug!("Unbound {:?} on {}", names, node);
        Ok(())
    }

    fn once(&mut self, node: NodeId, names: &str, listener: &Listener) -> Result<()> {
        register(self, node, names, listener, ListenerOptions::once())
    }

    fn delegate(
        &mut self,
        container: NodeId,
        names: &str,
        child_selector: &str,
        listener: &Listener,
    ) -> Result<Listener> {
        self.validate_selector(child_selector)?;
        let wrapper = delegated_listener(child_selector, listener);
        register(self, container, names, &wrapper, ListenerOptions::default())?;
        tracing::debug!("Delegating {:?} on {} to {:?}", names, container, child_selector);
        Ok(wrapper)
    }

    fn trigger(&mut self, node: NodeId, names: &str) -> Result<bool> {
        let mut not_prevented = true;
        for name in event_names(names)? {
            not_prevented &= self.dispatch_event(node, Event::new(name, EventInit::bubbling()))?;
        }
        Ok(not_prevented)
    }
}

//! DOM Events
//!
//! Event objects, listener handles and the per-node listener registry used
//! by [`Document::dispatch_event`](crate::Document::dispatch_event).

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Document, NodeId};

/// Event construction options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
}

impl EventInit {
    /// Bubbling, cancelable event (what user input produces)
    pub fn bubbling() -> Self {
        Self { bubbles: true, cancelable: true }
    }
}

/// Current dispatch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub(crate) target: NodeId,
    pub(crate) current_target: NodeId,
    pub(crate) phase: EventPhase,
    default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl Event {
    /// Create an undispatched event
    pub fn new(event_type: &str, init: EventInit) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            target: NodeId::NONE,
            current_target: NodeId::NONE,
            phase: EventPhase::None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    /// Event name, e.g. `click`
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Node the event was dispatched to
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    pub fn phase(&self) -> EventPhase {
        self.phase
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation after the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip the remaining listeners on the current node
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// What a listener sees while it runs.
///
/// Listeners get the whole document mutably, so they can change the tree,
/// bind or unbind, or dispatch further events.
pub struct EventContext<'a> {
    document: &'a mut Document,
    event: &'a mut Event,
    this: NodeId,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(document: &'a mut Document, event: &'a mut Event, this: NodeId) -> Self {
        Self { document, event, this }
    }

    pub fn document(&self) -> &Document {
        &*self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.document
    }

    pub fn event(&self) -> &Event {
        &*self.event
    }

    pub fn event_mut(&mut self) -> &mut Event {
        &mut *self.event
    }

    /// Shorthand for `event().target()`
    pub fn target(&self) -> NodeId {
        self.event.target
    }

    /// Shorthand for `event().current_target()`
    pub fn current_target(&self) -> NodeId {
        self.event.current_target
    }

    /// The listener's subject. This is the current target unless a wrapper
    /// (such as a delegated listener) re-targets it.
    pub fn this(&self) -> NodeId {
        self.this
    }

    /// Run `f` with a context whose subject is `this`
    pub fn with_this<R>(&mut self, this: NodeId, f: impl FnOnce(&mut EventContext<'_>) -> R) -> R {
        let mut ctx = EventContext {
            document: &mut *self.document,
            event: &mut *self.event,
            this,
        };
        f(&mut ctx)
    }
}

type Callback = dyn Fn(&mut EventContext<'_>);

/// Event listener handle.
///
/// Clones share identity; two listeners compare equal only if they are
/// clones of the same `Listener::new` call.
#[derive(Clone)]
pub struct Listener(Rc<Callback>);

impl Listener {
    pub fn new(callback: impl Fn(&mut EventContext<'_>) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invoke the callback
    pub fn call(&self, ctx: &mut EventContext<'_>) {
        (self.0)(ctx)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    /// Remove the registration before its first invocation
    pub once: bool,
}

impl ListenerOptions {
    pub fn once() -> Self {
        Self { once: true, ..Self::default() }
    }

    pub fn capture() -> Self {
        Self { capture: true, ..Self::default() }
    }
}

/// Registered listener with a stable registration ID
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub id: u64,
    pub listener: Listener,
    pub options: ListenerOptions,
}

/// Listeners by target node and event type, in registration order
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    handlers: HashMap<NodeId, HashMap<String, Vec<Registration>>>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    ///
    /// Returns `false` if the same listener is already registered for this
    /// target, type and capture flag.
    pub fn add(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> bool {
        let list = self
            .handlers
            .entry(target)
            .or_default()
            .entry(event_type.to_string())
            .or_default();

        if list
            .iter()
            .any(|r| r.listener == listener && r.options.capture == options.capture)
        {
            return false;
        }

        self.next_id += 1;
        list.push(Registration { id: self.next_id, listener, options });
        true
    }

    /// Remove a listener. Returns whether anything was removed.
    pub fn remove(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: &Listener,
        capture: bool,
    ) -> bool {
        self.remove_where(target, event_type, |r| {
            r.listener == *listener && r.options.capture == capture
        })
    }

    pub(crate) fn remove_by_id(&mut self, target: NodeId, event_type: &str, id: u64) -> bool {
        self.remove_where(target, event_type, |r| r.id == id)
    }

    fn remove_where(
        &mut self,
        target: NodeId,
        event_type: &str,
        pred: impl Fn(&Registration) -> bool,
    ) -> bool {
        let Some(by_type) = self.handlers.get_mut(&target) else {
            return false;
        };
        let Some(list) = by_type.get_mut(event_type) else {
            return false;
        };

        let before = list.len();
        list.retain(|r| !pred(r));
        let removed = list.len() < before;

        if list.is_empty() {
            by_type.remove(event_type);
            if by_type.is_empty() {
                self.handlers.remove(&target);
            }
        }
        removed
    }

    pub(crate) fn snapshot(&self, target: NodeId, event_type: &str) -> Vec<Registration> {
        self.handlers
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn is_registered(&self, target: NodeId, event_type: &str, id: u64) -> bool {
        self.handlers
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .is_some_and(|list| list.iter().any(|r| r.id == id))
    }

    /// Number of listeners for a target and type
    pub fn count(&self, target: NodeId, event_type: &str) -> usize {
        self.handlers
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .map_or(0, Vec::len)
    }

    /// Whether `listener` is registered for a target and type
    pub fn contains(&self, target: NodeId, event_type: &str, listener: &Listener) -> bool {
        self.handlers
            .get(&target)
            .and_then(|by_type| by_type.get(event_type))
            .is_some_and(|list| list.iter().any(|r| r.listener == *listener))
    }

    /// Total registrations across all targets
    pub fn total(&self) -> usize {
        self.handlers
            .values()
            .flat_map(|by_type| by_type.values())
            .map(Vec::len)
            .sum()
    }
}

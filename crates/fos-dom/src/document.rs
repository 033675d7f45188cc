//! Document - High-level document API
//!
//! Owns the tree, the listener registry and the selector matcher, and
//! exposes the native operations (querying, mutation, listeners, dispatch).

use std::fmt;

use crate::events::Registration;
use crate::{
    CssMatcher, DomResult, DomTree, Event, EventContext, EventPhase, Listener, ListenerOptions,
    ListenerRegistry, NodeId, SelectorMatcher,
};

/// HTML Document
pub struct Document {
    /// The DOM tree
    tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    listeners: ListenerRegistry,
    matcher: Box<dyn SelectorMatcher>,
}

impl Document {
    /// Create a document with an `html > head + body` skeleton
    pub fn new(url: &str) -> Self {
        Self::with_matcher(url, CssMatcher::new())
    }

    /// Create a skeleton document that answers selectors with `matcher`
    pub fn with_matcher(url: &str, matcher: impl SelectorMatcher + 'static) -> Self {
        let mut doc = Self::bare(url, Box::new(matcher));
        let (tree, [html, head, body]) = DomTree::with_skeleton();
        doc.tree = tree;
        doc.html_element = html;
        doc.head_element = head;
        doc.body_element = body;
        tracing::debug!("Created document: {}", url);
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self::bare(url, Box::new(CssMatcher::new()))
    }

    fn bare(url: &str, matcher: Box<dyn SelectorMatcher>) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            listeners: ListenerRegistry::new(),
            matcher,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Registered listeners
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    // ---- Tree mutation ----

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(tag_name)
    }

    pub fn create_text_node(&mut self, content: &str) -> NodeId {
        self.tree.create_text(content)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.tree.append_child(parent, child)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.tree.insert_before(parent, new_child, ref_child)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.tree.remove_child(parent, child)
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.tree.replace_child(parent, new_child, old_child)
    }

    /// Clone a node. Listeners are not copied to the clone.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        self.tree.clone_node(node, deep)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.tree.set_attribute(node, name, value)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.get_attribute(node, name)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.tree.text_content(node)
    }

    // ---- Traversal and selectors ----

    /// Parent of any type (the document node included)
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    /// Parent if it is an element
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node).filter(|&p| self.tree.is_element(p))
    }

    /// Check `selector` for syntax errors
    pub fn validate_selector(&self, selector: &str) -> DomResult<()> {
        self.matcher.validate(selector)
    }

    /// Whether `node` matches `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        self.tree.node(node)?;
        self.matcher.matches(&self.tree, node, selector)
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, node: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        self.tree.node(node)?;
        self.matcher.validate(selector)?;
        for candidate in std::iter::once(node).chain(self.tree.ancestors(node)) {
            if self.matcher.matches(&self.tree, candidate, selector)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// First descendant of `scope` matching `selector`, in document order
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        self.tree.node(scope)?;
        self.matcher.validate(selector)?;
        for node in self.tree.descendants(scope) {
            if self.matcher.matches(&self.tree, node, selector)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// All descendants of `scope` matching `selector`, in document order
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        self.tree.node(scope)?;
        self.matcher.validate(selector)?;
        let mut found = Vec::new();
        for node in self.tree.descendants(scope) {
            if self.matcher.matches(&self.tree, node, selector)? {
                found.push(node);
            }
        }
        Ok(found)
    }

    // ---- Events ----

    /// Register a listener. Returns `false` for a duplicate registration.
    pub fn add_event_listener(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> DomResult<bool> {
        self.tree.node(target)?;
        let added = self.listeners.add(target, event_type, listener, options);
        tracing::trace!("addEventListener {} on {} (added: {})", event_type, target, added);
        Ok(added)
    }

    /// Remove a listener. Returns whether one was registered.
    pub fn remove_event_listener(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: &Listener,
        capture: bool,
    ) -> DomResult<bool> {
        self.tree.node(target)?;
        let removed = self.listeners.remove(target, event_type, listener, capture);
        tracing::trace!("removeEventListener {} on {} (removed: {})", event_type, target, removed);
        Ok(removed)
    }

    /// Dispatch `event` at `target`.
    ///
    /// The propagation path is fixed before any listener runs. Returns
    /// `false` if a listener called `prevent_default` on a cancelable event.
    pub fn dispatch_event(&mut self, target: NodeId, mut event: Event) -> DomResult<bool> {
        self.tree.node(target)?;
        let path: Vec<NodeId> = self.tree.ancestors(target).collect();
        tracing::trace!(
            "Dispatching {} at {} ({} ancestors)",
            event.event_type(),
            target,
            path.len()
        );

        event.target = target;
        event.propagation_stopped = false;
        event.immediate_propagation_stopped = false;

        for &node in path.iter().rev() {
            if event.propagation_stopped {
                break;
            }
            self.invoke(node, &mut event, EventPhase::Capturing);
        }
        if !event.propagation_stopped {
            self.invoke(target, &mut event, EventPhase::AtTarget);
        }
        if event.bubbles {
            for &node in &path {
                if event.propagation_stopped {
                    break;
                }
                self.invoke(node, &mut event, EventPhase::Bubbling);
            }
        }

        event.phase = EventPhase::None;
        event.current_target = NodeId::NONE;
        Ok(!event.is_default_prevented())
    }

    fn invoke(&mut self, node: NodeId, event: &mut Event, phase: EventPhase) {
        event.phase = phase;
        event.current_target = node;
        let event_type = event.event_type().to_string();

        for Registration { id, listener, options } in self.listeners.snapshot(node, &event_type) {
            if event.immediate_propagation_stopped {
                break;
            }
            let wanted = match phase {
                EventPhase::Capturing => options.capture,
                EventPhase::Bubbling => !options.capture,
                _ => true,
            };
            // Skip listeners removed earlier in this dispatch
            if !wanted || !self.listeners.is_registered(node, &event_type, id) {
                continue;
            }
            if options.once {
                self.listeners.remove_by_id(node, &event_type, id);
            }

            let mut ctx = EventContext::new(self, event, node);
            listener.call(&mut ctx);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url)
            .field("nodes", &self.tree.len())
            .field("listeners", &self.listeners.total())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DomError, EventInit};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &str) -> Listener {
        let log = Rc::clone(log);
        let label = label.to_string();
        Listener::new(move |ctx| {
            log.borrow_mut().push(format!("{label}:{:?}", ctx.event().phase()));
        })
    }

    #[test]
    fn test_skeleton() {
        let doc = Document::new("about:blank");
        assert_eq!(doc.tree().tag_name(doc.document_element()), Some("html"));
        assert_eq!(doc.parent_node(doc.body()), Some(doc.document_element()));
        assert_eq!(doc.parent_element(doc.document_element()), None);
        assert_eq!(doc.url(), "about:blank");

        let heads: Vec<_> = doc.tree().children(doc.document_element()).map(|(id, _)| id).collect();
        assert_eq!(heads, vec![doc.head(), doc.body()]);

        let empty = Document::empty("about:blank");
        assert_eq!(empty.tree().len(), 1);
        assert!(!empty.body().is_valid());
    }

    #[test]
    fn test_query_selector_scoping() {
        let mut doc = Document::default();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert_eq!(doc.query_selector(doc.root(), "div").unwrap(), Some(outer));
        // The scope itself is not a candidate
        assert_eq!(doc.query_selector(outer, "div").unwrap(), Some(inner));
        assert_eq!(doc.query_selector(inner, "div").unwrap(), None);
        // Selectors are matched against the whole document
        assert_eq!(doc.query_selector_all(outer, "body div").unwrap(), vec![inner]);
    }

    #[test]
    fn test_invalid_selector_without_candidates() {
        let mut doc = Document::default();
        let leaf = doc.create_element("p");
        assert!(matches!(
            doc.query_selector_all(leaf, "p[").unwrap_err(),
            DomError::InvalidSelector { .. }
        ));
        assert!(doc.closest(leaf, ">").is_err());
    }

    #[test]
    fn test_closest_is_inclusive() {
        let doc = Document::default();
        assert_eq!(doc.closest(doc.body(), "body").unwrap(), Some(doc.body()));
        assert_eq!(doc.closest(doc.body(), "html").unwrap(), Some(doc.document_element()));
        assert_eq!(doc.closest(doc.body(), "section").unwrap(), None);
    }

    #[test]
    fn test_replace_child_returns_old_child() {
        let mut doc = Document::default();
        let old = doc.create_element("p");
        let new = doc.create_element("div");
        doc.append_child(doc.body(), old).unwrap();

        assert_eq!(doc.replace_child(doc.body(), new, old), Ok(old));
        assert_eq!(doc.parent_node(old), None);
        assert_eq!(doc.parent_node(new), Some(doc.body()));
    }

    #[test]
    fn test_dispatch_phases() {
        let mut doc = Document::default();
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let body = doc.body();
        doc.add_event_listener(body, "click", recorder(&log, "body-capture"), ListenerOptions::capture())
            .unwrap();
        doc.add_event_listener(body, "click", recorder(&log, "body"), ListenerOptions::default())
            .unwrap();
        doc.add_event_listener(button, "click", recorder(&log, "button"), ListenerOptions::default())
            .unwrap();

        doc.dispatch_event(button, Event::new("click", EventInit::bubbling())).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["body-capture:Capturing", "button:AtTarget", "body:Bubbling"]
        );

        log.borrow_mut().clear();
        doc.dispatch_event(button, Event::new("click", EventInit::default())).unwrap();
        assert_eq!(*log.borrow(), vec!["body-capture:Capturing", "button:AtTarget"]);
    }

    #[test]
    fn test_once_listener_removed_before_call() {
        let mut doc = Document::default();
        let body = doc.body();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let listener = Listener::new(move |_| *c.borrow_mut() += 1);
        doc.add_event_listener(body, "click", listener, ListenerOptions::once()).unwrap();

        for _ in 0..3 {
            doc.dispatch_event(body, Event::new("click", EventInit::bubbling())).unwrap();
        }
        assert_eq!(*count.borrow(), 1);
        assert_eq!(doc.listeners().count(body, "click"), 0);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let mut doc = Document::default();
        let body = doc.body();
        let log = Rc::new(RefCell::new(Vec::new()));
        let second = recorder(&log, "second");

        let victim = second.clone();
        let remover = Listener::new(move |ctx| {
            let target = ctx.current_target();
            ctx.document_mut()
                .remove_event_listener(target, "click", &victim, false)
                .unwrap();
        });
        doc.add_event_listener(body, "click", remover, ListenerOptions::default()).unwrap();
        doc.add_event_listener(body, "click", second, ListenerOptions::default()).unwrap();

        doc.dispatch_event(body, Event::new("click", EventInit::bubbling())).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let mut doc = Document::default();
        let button = doc.create_element("button");
        doc.append_child(doc.body(), button).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));

        let stopper = Listener::new(|ctx| {
            ctx.event_mut().prevent_default();
            ctx.event_mut().stop_immediate_propagation();
        });
        doc.add_event_listener(button, "click", stopper, ListenerOptions::default()).unwrap();
        doc.add_event_listener(button, "click", recorder(&log, "same-node"), ListenerOptions::default())
            .unwrap();
        let body = doc.body();
        doc.add_event_listener(body, "click", recorder(&log, "body"), ListenerOptions::default())
            .unwrap();

        let not_prevented = doc
            .dispatch_event(button, Event::new("click", EventInit::bubbling()))
            .unwrap();
        assert!(!not_prevented);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let mut doc = Document::default();
        let other = Document::default();
        let foreign = NodeId(other.tree().len() as u32 + 100);
        assert_eq!(
            doc.dispatch_event(foreign, Event::new("click", EventInit::bubbling())),
            Err(DomError::NodeNotFound(foreign))
        );
    }
}

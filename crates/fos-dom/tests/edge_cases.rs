//! Edge case tests for fos-dom
//!
//! Boundary conditions for the tree, selector injection and dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fos_dom::{
    Document, DomError, DomResult, DomTree, Event, EventInit, EventPhase, Listener,
    ListenerOptions, NodeId, SelectorMatcher,
};

// ============================================================================
// TREE EDGE CASES
// ============================================================================

#[test]
fn test_deep_tree_ancestors() {
    let mut doc = Document::default();
    let mut parent = doc.body();
    for _ in 0..500 {
        let child = doc.create_element("div");
        doc.append_child(parent, child).unwrap();
        parent = child;
    }
    let leaf = parent;

    // div x 499 above the leaf, then body, html, document
    assert_eq!(doc.tree().ancestors(leaf).count(), 502);
    assert_eq!(doc.closest(leaf, "body").unwrap(), Some(doc.body()));
}

#[test]
fn test_text_nodes_never_match() {
    let mut doc = Document::default();
    let text = doc.create_text_node("hello");
    doc.append_child(doc.body(), text).unwrap();
    assert!(!doc.matches(text, "*").unwrap());
    assert_eq!(doc.query_selector_all(doc.root(), "*").unwrap().len(), 3);
}

#[test]
fn test_cannot_append_document_node() {
    let mut doc = Document::default();
    let root = doc.root();
    let body = doc.body();
    assert_eq!(doc.append_child(body, root), Err(DomError::HierarchyRequest));
}

// ============================================================================
// SELECTOR INJECTION
// ============================================================================

/// Matches on tag name only and counts how often it is asked
struct TagOnly {
    calls: Rc<Cell<usize>>,
}

impl SelectorMatcher for TagOnly {
    fn matches(&self, tree: &DomTree, node: NodeId, selector: &str) -> DomResult<bool> {
        self.calls.set(self.calls.get() + 1);
        if selector.is_empty() {
            return Err(DomError::InvalidSelector {
                selector: selector.to_string(),
                reason: "empty".to_string(),
            });
        }
        Ok(tree.tag_name(node) == Some(selector))
    }
}

#[test]
fn test_custom_matcher_is_used() {
    let calls = Rc::new(Cell::new(0));
    let mut doc = Document::with_matcher("about:blank", TagOnly { calls: Rc::clone(&calls) });
    let p = doc.create_element("p");
    doc.append_child(doc.body(), p).unwrap();

    assert_eq!(doc.query_selector(doc.root(), "p").unwrap(), Some(p));
    // The bundled CSS syntax means nothing to this matcher
    assert_eq!(doc.query_selector(doc.root(), "body > p").unwrap(), None);
    assert!(calls.get() > 0);

    // The default `validate` goes through `matches`
    assert!(doc.validate_selector("").is_err());
}

// ============================================================================
// DISPATCH EDGE CASES
// ============================================================================

#[test]
fn test_listener_added_during_dispatch_waits_for_next_dispatch() {
    let mut doc = Document::default();
    let body = doc.body();
    let count = Rc::new(Cell::new(0));

    let c = Rc::clone(&count);
    let late = Listener::new(move |_| c.set(c.get() + 1));
    let adder = Listener::new(move |ctx| {
        let target = ctx.current_target();
        ctx.document_mut()
            .add_event_listener(target, "click", late.clone(), ListenerOptions::default())
            .unwrap();
    });
    doc.add_event_listener(body, "click", adder, ListenerOptions::default()).unwrap();

    doc.dispatch_event(body, Event::new("click", EventInit::bubbling())).unwrap();
    assert_eq!(count.get(), 0);
    doc.dispatch_event(body, Event::new("click", EventInit::bubbling())).unwrap();
    assert_eq!(count.get(), 1);
}

#[test]
fn test_nested_dispatch() {
    let mut doc = Document::default();
    let button = doc.create_element("button");
    doc.append_child(doc.body(), button).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    let on_focus = Listener::new(move |ctx| {
        l.borrow_mut().push(format!("focus@{}", ctx.current_target()));
    });
    let l = Rc::clone(&log);
    let on_click = Listener::new(move |ctx| {
        l.borrow_mut().push("click".to_string());
        let target = ctx.target();
        ctx.document_mut()
            .dispatch_event(target, Event::new("focus", EventInit::default()))
            .unwrap();
    });
    doc.add_event_listener(button, "click", on_click, ListenerOptions::default()).unwrap();
    doc.add_event_listener(button, "focus", on_focus, ListenerOptions::default()).unwrap();

    doc.dispatch_event(button, Event::new("click", EventInit::bubbling())).unwrap();
    assert_eq!(*log.borrow(), vec!["click".to_string(), format!("focus@{button}")]);
}

#[test]
fn test_path_is_fixed_before_dispatch() {
    let mut doc = Document::default();
    let outer = doc.create_element("div");
    let inner = doc.create_element("span");
    doc.append_child(doc.body(), outer).unwrap();
    doc.append_child(outer, inner).unwrap();

    let reached = Rc::new(Cell::new(false));
    let detach = Listener::new(|ctx| {
        let target = ctx.target();
        ctx.document_mut().tree_mut().remove(target).unwrap();
    });
    let r = Rc::clone(&reached);
    let on_outer = Listener::new(move |ctx| {
        assert_eq!(ctx.event().phase(), EventPhase::Bubbling);
        r.set(true);
    });
    doc.add_event_listener(inner, "click", detach, ListenerOptions::default()).unwrap();
    doc.add_event_listener(outer, "click", on_outer, ListenerOptions::default()).unwrap();

    doc.dispatch_event(inner, Event::new("click", EventInit::bubbling())).unwrap();
    assert!(reached.get());
    assert_eq!(doc.parent_node(inner), None);
}

#[test]
fn test_event_state_after_dispatch() {
    let mut doc = Document::default();
    let body = doc.body();
    let seen = Rc::new(Cell::new(NodeId::NONE));
    let s = Rc::clone(&seen);
    let listener = Listener::new(move |ctx| s.set(ctx.event().target()));
    doc.add_event_listener(body, "custom", listener, ListenerOptions::default()).unwrap();

    assert!(doc.dispatch_event(body, Event::new("custom", EventInit::default())).unwrap());
    assert_eq!(seen.get(), body);
}

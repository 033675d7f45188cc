//! Event delegation

use fos_dom::{Document, Listener, NodeId};

/// Wrap `listener` so it only runs for events whose path from the target up
/// to the current target passes an element matching `selector`.
pub(crate) fn delegated_listener(selector: &str, listener: &Listener) -> Listener {
    let selector = selector.to_string();
    let inner = listener.clone();

    Listener::new(move |ctx| {
        let container = ctx.current_target();
        if let Some(matched) = delegated_match(ctx.document(), ctx.target(), container, &selector) {
            ctx.with_this(matched, |ctx| inner.call(ctx));
        }
    })
}

/// Walk from `target` up to and including `container`, returning the first
/// element that matches `selector`.
fn delegated_match(
    doc: &Document,
    target: NodeId,
    container: NodeId,
    selector: &str,
) -> Option<NodeId> {
    // The target may have been moved out of the container mid-dispatch
    if !doc.tree().is_inclusive_ancestor(container, target) {
        return None;
    }

    let mut node = target;
    loop {
        match doc.matches(node, selector) {
            Ok(true) => return Some(node),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("Delegated selector {:?} failed: {}", selector, err);
                return None;
            }
        }
        if node == container {
            return None;
        }
        node = doc.parent_node(node)?;
    }
}

//! Event Targets
//!
//! Native listener storage: `addEventListener` / `removeEventListener`.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Document, DomResult, DomTree, Event, NodeId};

/// Callback invoked by the dispatcher
pub type ListenerCallback = Rc<dyn Fn(&Document, &mut Event)>;

/// Handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
    pub once: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self { capture: true, ..Self::default() }
    }
}

pub(crate) struct NativeListener {
    pub(crate) id: ListenerId,
    pub(crate) options: ListenerOptions,
    pub(crate) callback: ListenerCallback,
    removed: Cell<bool>,
}

impl NativeListener {
    pub(crate) fn is_removed(&self) -> bool {
        self.removed.get()
    }
}

/// Listeners of one node, by event type, in registration order
#[derive(Default)]
pub(crate) struct ListenerMap {
    by_type: HashMap<String, Vec<Rc<NativeListener>>>,
}

impl ListenerMap {
    fn remove(&mut self, event_type: &str, id: ListenerId) -> bool {
        let Some(list) = self.by_type.get_mut(event_type) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.id == id) else {
            return false;
        };
        list.remove(pos).removed.set(true);
        if list.is_empty() {
            self.by_type.remove(event_type);
        }
        true
    }

    pub(crate) fn clear(&mut self) {
        for listener in self.by_type.values().flatten() {
            listener.removed.set(true);
        }
        self.by_type.clear();
    }

    fn count(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for ListenerMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event_type, list) in &self.by_type {
            map.entry(event_type, &list.len());
        }
        map.finish()
    }
}

impl DomTree {
    /// Register a native listener on a node
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        options: ListenerOptions,
        callback: ListenerCallback,
    ) -> DomResult<ListenerId> {
        let id = ListenerId(self.next_listener_id);
        let target = self.node_mut(node)?;
        target
            .listeners
            .by_type
            .entry(event_type.to_string())
            .or_default()
            .push(Rc::new(NativeListener {
                id,
                options,
                callback,
                removed: Cell::new(false),
            }));
        self.next_listener_id += 1;
        tracing::trace!("listener {:?} added for {} on {:?}", id, event_type, node);
        Ok(id)
    }

    /// Remove a native listener, returning whether it was registered
    pub fn remove_event_listener(&mut self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        let removed = self
            .get_mut(node)
            .is_some_and(|n| n.listeners.remove(event_type, id));
        if removed {
            tracing::trace!("listener {:?} removed for {} on {:?}", id, event_type, node);
        }
        removed
    }

    /// Number of native listeners for a node and event type
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.get(node).map_or(0, |n| n.listeners.count(event_type))
    }

    /// Snapshot of listeners, so dispatch survives mutation by the callbacks
    pub(crate) fn listeners_snapshot(&self, node: NodeId, event_type: &str) -> Vec<Rc<NativeListener>> {
        self.get(node)
            .and_then(|n| n.listeners.by_type.get(event_type))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ListenerCallback {
        Rc::new(|_: &Document, _: &mut Event| {})
    }

    #[test]
    fn test_add_remove_listener() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");

        let a = tree.add_event_listener(div, "click", ListenerOptions::default(), noop()).unwrap();
        let b = tree.add_event_listener(div, "click", ListenerOptions::capture(), noop()).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.listener_count(div, "click"), 2);

        assert!(tree.remove_event_listener(div, "click", a));
        assert!(!tree.remove_event_listener(div, "click", a));
        assert!(!tree.remove_event_listener(div, "keyup", b));
        assert_eq!(tree.listener_count(div, "click"), 1);
    }

    #[test]
    fn test_snapshot_sees_removal_flag() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let id = tree.add_event_listener(div, "click", ListenerOptions::default(), noop()).unwrap();

        let snapshot = tree.listeners_snapshot(div, "click");
        tree.remove_event_listener(div, "click", id);
        assert!(snapshot[0].is_removed());
    }

    #[test]
    fn test_listener_on_missing_node() {
        let mut tree = DomTree::new();
        assert!(tree
            .add_event_listener(NodeId(42), "click", ListenerOptions::default(), noop())
            .is_err());
        assert_eq!(tree.listener_count(NodeId(42), "click"), 0);
    }
}

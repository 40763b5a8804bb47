//! Document - High-level document API
//!
//! `Document` is a cheap, cloneable handle over the tree. Listeners receive it
//! during dispatch and may mutate the tree, add or remove listeners, or
//! dispatch nested events; no borrow of the tree is held while they run.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::event_target::ListenerCallback;
use crate::{
    DomResult, DomTree, ElementQuery, Event, EventPhase, ListenerId, ListenerOptions, NodeId,
    SelectorList,
};

#[derive(Debug)]
struct DocumentInner {
    tree: DomTree,
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    active_element: Option<NodeId>,
    history: Vec<String>,
}

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

/// Non-owning document handle, for listeners that need to keep one around
#[derive(Debug, Clone)]
pub struct WeakDocument {
    inner: Weak<RefCell<DocumentInner>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Document {
    /// Create a document with `<html>`, `<head>` and `<body>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes with a live parent cannot violate the hierarchy.
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self::from_parts(tree, url, html, head, body)
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self::from_parts(DomTree::new(), url, NodeId::NONE, NodeId::NONE, NodeId::NONE)
    }

    fn from_parts(tree: DomTree, url: &str, html: NodeId, head: NodeId, body: NodeId) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                tree,
                url: url.to_string(),
                html_element: html,
                head_element: head,
                body_element: body,
                active_element: None,
                history: Vec::new(),
            })),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same document
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.inner.borrow().html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.inner.borrow().head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body_element
    }

    /// Current document URL (updated by link activation)
    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    /// URLs navigated to through link activation, oldest first
    pub fn history(&self) -> Vec<String> {
        self.inner.borrow().history.clone()
    }

    /// Focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.inner.borrow().active_element
    }

    /// Borrow the tree for reading.
    ///
    /// The guard must be dropped before dispatching or mutating.
    pub fn tree(&self) -> Ref<'_, DomTree> {
        Ref::map(self.inner.borrow(), |inner| &inner.tree)
    }

    /// Borrow the tree for writing; same caveat as [`Document::tree`]
    pub fn tree_mut(&self) -> RefMut<'_, DomTree> {
        RefMut::map(self.inner.borrow_mut(), |inner| &mut inner.tree)
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree_mut().create_element(tag)
    }

    pub fn create_text(&self, content: &str) -> NodeId {
        self.tree_mut().create_text(content)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.tree_mut().append_child(parent, child)
    }

    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<NodeId> {
        self.tree_mut().insert_before(parent, child, reference)
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.tree_mut().remove_child(parent, child)
    }

    /// Destroy a node and its subtree, dropping their listeners and node data
    pub fn destroy(&self, node: NodeId) -> DomResult<usize> {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.tree.destroy(node)?;
        if inner.active_element.is_some_and(|a| inner.tree.get(a).is_none()) {
            inner.active_element = None;
        }
        Ok(removed)
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.tree_mut().set_attribute(node, name, value)
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree().get_attribute(node, name).map(str::to_string)
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) -> DomResult<bool> {
        self.tree_mut().remove_attribute(node, name)
    }

    /// Whether the node exists and has not been destroyed
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.tree().get(node).is_some()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree().parent(node)
    }

    /// Inclusive containment, as in `Node.contains`
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.tree().contains(ancestor, node)
    }

    pub fn matches(&self, element: NodeId, selector: &str) -> bool {
        self.tree().matches(element, selector)
    }

    pub fn matches_selector(&self, element: NodeId, selector: &SelectorList) -> bool {
        selector.matches(&self.tree(), element)
    }

    pub fn closest(&self, element: NodeId, selector: &str) -> Option<NodeId> {
        self.tree().closest(element, selector)
    }

    pub fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        self.tree().query_selector(root, selector)
    }

    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        self.tree().query_selector_all(root, selector)
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let tree = self.tree();
        tree.descendants(tree.root())
            .into_iter()
            .find(|&n| tree.element(n).is_some_and(|e| e.id.as_deref() == Some(id)))
    }

    /// Read typed node data. The closure must not call back into the document.
    pub fn with_node_data<T: 'static, R>(&self, node: NodeId, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.tree().node_data::<T>(node).map(f)
    }

    /// Mutate typed node data if present. The closure must not call back into the document.
    pub fn update_node_data<T: 'static, R>(&self, node: NodeId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.tree_mut().node_data_mut::<T>(node).map(f)
    }

    /// Mutate typed node data, creating it on first use
    pub fn with_node_data_or_default<T: Default + 'static, R>(
        &self,
        node: NodeId,
        f: impl FnOnce(&mut T) -> R,
    ) -> DomResult<R> {
        let mut tree = self.tree_mut();
        Ok(f(tree.node_data_or_default::<T>(node)?))
    }

    pub fn take_node_data<T: 'static>(&self, node: NodeId) -> Option<T> {
        self.tree_mut().take_node_data::<T>(node)
    }

    /// Register a native listener
    pub fn add_event_listener(
        &self,
        node: NodeId,
        event_type: &str,
        options: ListenerOptions,
        callback: impl Fn(&Document, &mut Event) + 'static,
    ) -> DomResult<ListenerId> {
        let callback: ListenerCallback = Rc::new(callback);
        self.tree_mut().add_event_listener(node, event_type, options, callback)
    }

    /// Remove a native listener, returning whether it was registered
    pub fn remove_event_listener(&self, node: NodeId, event_type: &str, id: ListenerId) -> bool {
        self.tree_mut().remove_event_listener(node, event_type, id)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.tree().listener_count(node, event_type)
    }

    /// Dispatch an event, as in `EventTarget.dispatchEvent`.
    ///
    /// Returns `false` when a listener cancelled the event.
    pub fn dispatch_event(&self, target: NodeId, event: Event) -> bool {
        !self.dispatch(target, event).is_default_prevented()
    }

    /// Dispatch an event through capture, target and bubble phases, then run
    /// the default action unless cancelled. Returns the event after dispatch.
    pub fn dispatch(&self, target: NodeId, mut event: Event) -> Event {
        let path: Vec<NodeId> = self.tree().ancestors(target).collect();
        if path.is_empty() {
            tracing::debug!("dropping {} dispatched to dead node {:?}", event.event_type(), target);
            return event;
        }
        event.target = target;
        tracing::trace!("dispatch {} to {:?} (path of {})", event.event_type(), target, path.len());

        let ancestors = &path[1..];
        for &node in ancestors.iter().rev() {
            event.phase = EventPhase::Capturing;
            self.invoke_listeners(node, &mut event, true);
            if event.is_propagation_stopped() {
                break;
            }
        }

        if !event.is_propagation_stopped() {
            event.phase = EventPhase::AtTarget;
            self.invoke_listeners(target, &mut event, true);
            if !event.is_propagation_stopped() {
                self.invoke_listeners(target, &mut event, false);
            }
        }

        if event.bubbles {
            for &node in ancestors {
                if event.is_propagation_stopped() {
                    break;
                }
                event.phase = EventPhase::Bubbling;
                self.invoke_listeners(node, &mut event, false);
            }
        }

        event.phase = EventPhase::None;
        event.current_target = None;

        if event.is_default_prevented() {
            tracing::trace!("{} on {:?} cancelled", event.event_type(), target);
        } else {
            self.run_default_action(target, &event);
        }
        event
    }

    /// Run the listeners of one node whose capture flag equals `capture`
    fn invoke_listeners(&self, node: NodeId, event: &mut Event, capture: bool) {
        let listeners = self.tree().listeners_snapshot(node, event.event_type());
        event.current_target = Some(node);
        for listener in listeners {
            if listener.is_removed() || listener.options.capture != capture {
                continue;
            }
            if listener.options.once {
                self.remove_event_listener(node, event.event_type(), listener.id);
            }
            event.set_passive(listener.options.passive);
            (listener.callback)(self, event);
            event.set_passive(false);
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
    }

    fn run_default_action(&self, target: NodeId, event: &Event) {
        match event.event_type() {
            "click" => {
                let href = {
                    let tree = self.tree();
                    tree.ancestors(target)
                        .find(|&n| tree.element(n).is_some_and(|e| e.tag_name == "a"))
                        .and_then(|a| tree.get_attribute(a, "href").map(str::to_string))
                };
                if let Some(href) = href {
                    tracing::debug!("navigating to {}", href);
                    let mut inner = self.inner.borrow_mut();
                    inner.url = href.clone();
                    inner.history.push(href);
                }
            }
            "focus" => {
                if self.tree().is_element(target) {
                    self.inner.borrow_mut().active_element = Some(target);
                }
            }
            "blur" => {
                let mut inner = self.inner.borrow_mut();
                if inner.active_element == Some(target) {
                    inner.active_element = None;
                }
            }
            _ => {}
        }
    }

    /// Simulate a user click, as in `HTMLElement.click()`
    pub fn click(&self, target: NodeId) -> bool {
        self.dispatch_event(target, Event::mouse("click", None))
    }

    /// Move keyboard focus to an element, firing `blur` on the previous one
    pub fn focus(&self, target: NodeId) {
        if let Some(previous) = self.active_element() {
            if previous == target {
                return;
            }
            self.dispatch(previous, Event::new("blur").with_related_target(target));
        }
        let mut focus = Event::new("focus");
        focus.is_trusted = true;
        self.dispatch(target, focus);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

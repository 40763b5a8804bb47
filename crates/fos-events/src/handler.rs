//! Handlers and handler records

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use fos_dom::{Document, Event, NodeId, SelectorList};

use crate::EventSpec;
use crate::store;

type Callback = dyn Fn(&Document, &mut Event);

/// A registered callback.
///
/// Identity is the shared allocation: clones of one `Handler` are equal,
/// two `Handler::new` calls never are.
#[derive(Clone)]
pub struct Handler(Rc<Callback>);

impl Handler {
    pub fn new(callback: impl Fn(&Document, &mut Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Same underlying callback
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    fn call(&self, document: &Document, event: &mut Event) {
        (self.0)(document, event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// One stored registration
pub(crate) struct HandlerRecord {
    pub(crate) uid: u64,
    pub(crate) handler: Handler,
    /// Semantic type: `mouseenter` even though it is stored under `mouseover`
    pub(crate) event_type: String,
    pub(crate) native_type: String,
    pub(crate) namespaces: BTreeSet<String>,
    pub(crate) selector: Option<Rc<SelectorList>>,
    pub(crate) one_off: bool,
    wrapped: Rc<Callback>,
    removed: Cell<bool>,
}

impl HandlerRecord {
    pub(crate) fn new(
        uid: u64,
        element: NodeId,
        spec: &EventSpec,
        selector: Option<SelectorList>,
        handler: Handler,
        one_off: bool,
    ) -> Self {
        let selector = selector.map(Rc::new);
        let wrapped = wrap(
            uid,
            element,
            spec,
            selector.clone(),
            handler.clone(),
            one_off,
        );
        Self {
            uid,
            handler,
            event_type: spec.event_type().to_string(),
            native_type: spec.dispatch_type().to_string(),
            namespaces: spec.namespaces().clone(),
            selector,
            one_off,
            wrapped,
            removed: Cell::new(false),
        }
    }

    pub(crate) fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub(crate) fn mark_removed(&self) {
        self.removed.set(true);
    }

    pub(crate) fn selector_source(&self) -> Option<&str> {
        self.selector.as_deref().map(SelectorList::source)
    }

    pub(crate) fn invoke(&self, document: &Document, event: &mut Event) {
        (self.wrapped)(document, event)
    }
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("uid", &self.uid)
            .field("event_type", &self.event_type)
            .field("native_type", &self.native_type)
            .field("namespaces", &self.namespaces)
            .field("selector", &self.selector_source())
            .field("one_off", &self.one_off)
            .field("removed", &self.removed.get())
            .finish()
    }
}

/// Build the callback the native listener runs for one record: resolve the
/// delegate target, apply the enter/leave filter, drop one-shot records, then
/// call the user's handler.
fn wrap(
    uid: u64,
    element: NodeId,
    spec: &EventSpec,
    selector: Option<Rc<SelectorList>>,
    handler: Handler,
    one_off: bool,
) -> Rc<Callback> {
    let enter_leave = spec.is_enter_leave();
    let native_type = spec.dispatch_type().to_string();

    Rc::new(move |document: &Document, event: &mut Event| {
        let delegate = match &selector {
            Some(selector) => match find_delegate(document, element, event.target, selector) {
                Some(node) => node,
                None => return,
            },
            None => element,
        };

        if enter_leave && !crosses_boundary(document, delegate, event.related_target) {
            tracing::trace!("{} stayed inside {:?}, skipping", event.event_type(), delegate);
            return;
        }

        event.delegate_target = Some(delegate);
        if one_off {
            store::remove_record(document, element, &native_type, uid);
        }
        handler.call(document, event);
    })
}

/// Closest node matching `selector` on the path from `target` up to and
/// including `element`
fn find_delegate(
    document: &Document,
    element: NodeId,
    target: NodeId,
    selector: &SelectorList,
) -> Option<NodeId> {
    let tree = document.tree();
    let mut found = None;
    for node in tree.ancestors(target) {
        if found.is_none() && selector.matches(&tree, node) {
            found = Some(node);
        }
        if node == element {
            return found;
        }
    }
    None
}

/// Whether the pointer moved across the boundary of `node`
fn crosses_boundary(document: &Document, node: NodeId, related: Option<NodeId>) -> bool {
    match related {
        None => true,
        Some(related) => !document.contains(node, related),
    }
}

/// Removal / counting criteria. `None` fields match anything.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordFilter {
    pub(crate) event_type: Option<String>,
    pub(crate) namespaces: BTreeSet<String>,
    pub(crate) selector: Option<String>,
    pub(crate) handler: Option<Handler>,
}

impl RecordFilter {
    pub(crate) fn from_spec(spec: &EventSpec) -> Self {
        Self {
            event_type: (!spec.is_namespace_only()).then(|| spec.event_type().to_string()),
            namespaces: spec.namespaces().clone(),
            ..Self::default()
        }
    }

    pub(crate) fn with_selector(mut self, selector: Option<&str>) -> Self {
        self.selector = selector.map(|s| s.trim().to_string());
        self
    }

    pub(crate) fn with_handler(mut self, handler: Option<&Handler>) -> Self {
        self.handler = handler.cloned();
        self
    }

    pub(crate) fn matches(&self, record: &HandlerRecord) -> bool {
        if let Some(event_type) = &self.event_type {
            if record.event_type != *event_type {
                return false;
            }
        }
        if !self.namespaces.is_subset(&record.namespaces) {
            return false;
        }
        if let Some(selector) = &self.selector {
            if record.selector_source() != Some(selector.as_str()) {
                return false;
            }
        }
        if let Some(handler) = &self.handler {
            if !record.handler.ptr_eq(handler) {
                return false;
            }
        }
        true
    }
}

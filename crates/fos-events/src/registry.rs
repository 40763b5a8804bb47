//! Event Registry
//!
//! `on` / `one` / `off` / `trigger` over a [`Document`].

use std::cell::Cell;
use std::rc::Rc;

use fos_dom::{Document, Event, EventPhase, NodeId, SelectorList, WeakDocument};
use serde_json::{Map, Value};

use crate::handler::{HandlerRecord, RecordFilter};
use crate::{EventSpec, EventTable, Handler, RegistryConfig, store};

/// Extra state copied onto a triggered event
#[derive(Debug, Clone, Default)]
pub struct EventArgs {
    pub related_target: Option<NodeId>,
    pub detail: Map<String, Value>,
}

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn related_target(mut self, node: NodeId) -> Self {
        self.related_target = Some(node);
        self
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    fn apply(self, event: &mut Event) {
        if self.related_target.is_some() {
            event.related_target = self.related_target;
        }
        event.detail.extend(self.detail);
    }
}

/// Event registry bound to one document.
///
/// Cheap to clone. Holds the document weakly, so handlers may capture a
/// registry without keeping the document alive. Every call on a dropped
/// document, a dead node or an invalid spec is a logged no-op.
#[derive(Clone)]
pub struct EventRegistry {
    inner: Rc<RegistryInner>,
}

struct RegistryInner {
    document: WeakDocument,
    table: EventTable,
    next_uid: Cell<u64>,
}

impl EventRegistry {
    pub fn new(document: &Document) -> Self {
        Self::with_config(document, RegistryConfig::default())
    }

    pub fn with_config(document: &Document, config: RegistryConfig) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                document: document.downgrade(),
                table: EventTable::from_config(&config),
                next_uid: Cell::new(1),
            }),
        }
    }

    pub fn document(&self) -> Option<Document> {
        self.inner.document.upgrade()
    }

    pub fn table(&self) -> &EventTable {
        &self.inner.table
    }

    // ---- registration ----

    /// Attach `handler` directly to `element`
    pub fn on(&self, element: impl Into<Option<NodeId>>, spec: &str, handler: &Handler) {
        self.add(element.into(), spec, None, handler, false);
    }

    /// Attach `handler` to `element` for descendants matching `selector`
    pub fn on_delegated(
        &self,
        element: impl Into<Option<NodeId>>,
        spec: &str,
        selector: &str,
        handler: &Handler,
    ) {
        self.add(element.into(), spec, Some(selector), handler, false);
    }

    /// Like [`on`](Self::on), but the handler runs at most once
    pub fn one(&self, element: impl Into<Option<NodeId>>, spec: &str, handler: &Handler) {
        self.add(element.into(), spec, None, handler, true);
    }

    pub fn one_delegated(
        &self,
        element: impl Into<Option<NodeId>>,
        spec: &str,
        selector: &str,
        handler: &Handler,
    ) {
        self.add(element.into(), spec, Some(selector), handler, true);
    }

    fn add(
        &self,
        element: Option<NodeId>,
        raw: &str,
        selector: Option<&str>,
        handler: &Handler,
        one_off: bool,
    ) {
        let Some((document, element)) = self.resolve(element, "on") else {
            return;
        };
        let Some(spec) = self.parse(raw, "on") else {
            return;
        };
        if spec.is_namespace_only() {
            tracing::debug!("on: {:?} names no event type, ignoring", raw);
            return;
        }
        let selector = match selector.map(SelectorList::parse).transpose() {
            Ok(selector) => selector,
            Err(err) => {
                tracing::warn!("on: bad delegation selector for {:?}: {}", raw, err);
                return;
            }
        };

        let uid = self.next_uid();
        let record = HandlerRecord::new(uid, element, &spec, selector, handler.clone(), one_off);
        tracing::trace!("registering {:?} on {:?}", record, element);
        if let Err(err) = store::add_record(&document, element, record, || self.next_uid()) {
            tracing::debug!("on: {}", err);
        }
    }

    // ---- removal ----

    /// Remove every handler on `element`
    pub fn off_all(&self, element: impl Into<Option<NodeId>>) {
        self.remove(element.into(), None, None, None);
    }

    /// Remove handlers matching `spec`: a type, `type.ns`, or `.ns`
    pub fn off(&self, element: impl Into<Option<NodeId>>, spec: &str) {
        self.remove(element.into(), Some(spec), None, None);
    }

    /// Remove the registrations of one handler under `spec`
    pub fn off_handler(&self, element: impl Into<Option<NodeId>>, spec: &str, handler: &Handler) {
        self.remove(element.into(), Some(spec), None, Some(handler));
    }

    /// Remove delegated registrations for `selector`, optionally only those of
    /// one handler
    pub fn off_delegated(
        &self,
        element: impl Into<Option<NodeId>>,
        spec: &str,
        selector: &str,
        handler: Option<&Handler>,
    ) {
        self.remove(element.into(), Some(spec), Some(selector), handler);
    }

    /// General removal. Every `None` filter matches anything.
    pub fn off_with(
        &self,
        element: impl Into<Option<NodeId>>,
        spec: Option<&str>,
        selector: Option<&str>,
        handler: Option<&Handler>,
    ) {
        self.remove(element.into(), spec, selector, handler);
    }

    fn remove(
        &self,
        element: Option<NodeId>,
        spec: Option<&str>,
        selector: Option<&str>,
        handler: Option<&Handler>,
    ) {
        let Some((document, element)) = self.resolve(element, "off") else {
            return;
        };
        let Some(filter) = self.filter(spec, "off") else {
            return;
        };
        let filter = filter.with_selector(selector).with_handler(handler);
        let removed = store::remove_records(&document, element, |record| filter.matches(record));
        tracing::trace!("off({:?}, {:?}) removed {} records", element, spec, removed);
    }

    // ---- triggering ----

    /// Fire `spec` on `element`. Returns whether a handler prevented the
    /// default.
    pub fn trigger(&self, element: impl Into<Option<NodeId>>, spec: &str) -> bool {
        self.trigger_with(element, spec, EventArgs::default())
            .is_some_and(|event| event.is_default_prevented())
    }

    /// Fire `spec` on `element` with extra event state, returning the event
    /// after dispatch.
    ///
    /// Native types go through the document's dispatch, so plain listeners
    /// and default actions run. Custom types only reach registry handlers on
    /// the target and its ancestors.
    pub fn trigger_with(
        &self,
        element: impl Into<Option<NodeId>>,
        spec: &str,
        args: EventArgs,
    ) -> Option<Event> {
        let (document, element) = self.resolve(element.into(), "trigger")?;
        let spec = self.parse(spec, "trigger")?;
        if spec.is_namespace_only() {
            tracing::debug!("trigger: namespace-only spec, ignoring");
            return None;
        }

        let mut event = Event::new(spec.dispatch_type())
            .with_bubbles(true)
            .with_cancelable(true);
        args.apply(&mut event);

        if spec.is_native() {
            return Some(document.dispatch(element, event));
        }

        let path: Vec<NodeId> = document.tree().ancestors(element).collect();
        event.target = element;
        for (depth, &node) in path.iter().enumerate() {
            event.phase = if depth == 0 {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            };
            event.current_target = Some(node);
            store::dispatch_records(&document, node, spec.dispatch_type(), &mut event);
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.phase = EventPhase::None;
        event.current_target = None;
        Some(event)
    }

    // ---- introspection ----

    /// Number of records on `element` matching `spec` (all when `None`)
    pub fn handler_count(&self, element: impl Into<Option<NodeId>>, spec: Option<&str>) -> usize {
        let Some((document, element)) = self.resolve(element.into(), "handler_count") else {
            return 0;
        };
        let Some(filter) = self.filter(spec, "handler_count") else {
            return 0;
        };
        store::records(&document, element)
            .iter()
            .filter(|record| filter.matches(record))
            .count()
    }

    pub fn has_handlers(&self, element: impl Into<Option<NodeId>>) -> bool {
        self.handler_count(element, None) > 0
    }

    /// Registry uid of `element`, assigned on its first registration and kept
    /// for the element's lifetime
    pub fn element_uid(&self, element: NodeId) -> Option<u64> {
        let document = self.document()?;
        store::element_uid(&document, element)
    }

    // ---- helpers ----

    fn next_uid(&self) -> u64 {
        let uid = self.inner.next_uid.get();
        self.inner.next_uid.set(uid + 1);
        uid
    }

    fn resolve(&self, element: Option<NodeId>, op: &str) -> Option<(Document, NodeId)> {
        let Some(element) = element else {
            tracing::debug!("{}: no element", op);
            return None;
        };
        let Some(document) = self.document() else {
            tracing::debug!("{}: document dropped", op);
            return None;
        };
        if !document.is_alive(element) {
            tracing::debug!("{}: {:?} is not a live node", op, element);
            return None;
        }
        Some((document, element))
    }

    fn parse(&self, raw: &str, op: &str) -> Option<EventSpec> {
        match EventSpec::parse(raw, &self.inner.table) {
            Ok(spec) => Some(spec),
            Err(err) => {
                tracing::debug!("{}: {}", op, err);
                None
            }
        }
    }

    fn filter(&self, spec: Option<&str>, op: &str) -> Option<RecordFilter> {
        match spec {
            None => Some(RecordFilter::default()),
            Some(raw) => self.parse(raw, op).map(|spec| RecordFilter::from_spec(&spec)),
        }
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("next_uid", &self.inner.next_uid.get())
            .field("table", &self.inner.table)
            .finish()
    }
}

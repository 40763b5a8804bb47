//! Per-element event stores
//!
//! Each element with registrations carries an [`EventStore`] in its node data
//! slot. The store owns the records for every native type and the id of the
//! single native listener installed for that type.

use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::{Document, DomResult, Event, ListenerId, ListenerOptions, NodeId};

use crate::handler::HandlerRecord;

#[derive(Debug, Default)]
struct TypeEntry {
    listener: Option<ListenerId>,
    records: Vec<Rc<HandlerRecord>>,
}

/// Records of one element keyed by native event type, plus the element's uid.
///
/// Lives until the element is destroyed, even once every record is gone.
#[derive(Debug, Default)]
pub(crate) struct EventStore {
    uid: u64,
    types: HashMap<String, TypeEntry>,
}

impl EventStore {
    fn snapshot(&self, native_type: &str) -> Vec<Rc<HandlerRecord>> {
        self.types
            .get(native_type)
            .map(|entry| entry.records.clone())
            .unwrap_or_default()
    }

    /// Drop matching records. Returns how many went and the listeners of the
    /// types left empty.
    fn remove_where(
        &mut self,
        mut predicate: impl FnMut(&HandlerRecord) -> bool,
    ) -> (usize, Vec<(String, ListenerId)>) {
        let mut removed = 0;
        for entry in self.types.values_mut() {
            entry.records.retain(|record| {
                if predicate(record) {
                    record.mark_removed();
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }

        let empty: Vec<String> = self
            .types
            .iter()
            .filter(|(_, entry)| entry.records.is_empty())
            .map(|(native_type, _)| native_type.clone())
            .collect();
        let mut listeners = Vec::new();
        for native_type in empty {
            if let Some(TypeEntry {
                listener: Some(id), ..
            }) = self.types.remove(&native_type)
            {
                listeners.push((native_type, id));
            }
        }
        (removed, listeners)
    }
}

/// Store a record on `element`, installing the native listener on the first
/// record of its type
pub(crate) fn add_record(
    document: &Document,
    element: NodeId,
    record: HandlerRecord,
    next_uid: impl FnOnce() -> u64,
) -> DomResult<()> {
    let native_type = record.native_type.clone();
    let needs_listener = document.with_node_data_or_default::<EventStore, _>(element, |store| {
        if store.uid == 0 {
            store.uid = next_uid();
        }
        let entry = store.types.entry(native_type.clone()).or_default();
        entry.records.push(Rc::new(record));
        entry.listener.is_none()
    })?;

    if needs_listener {
        let key = native_type.clone();
        let id = document.add_event_listener(
            element,
            &native_type,
            ListenerOptions::default(),
            move |document, event| dispatch_records(document, element, &key, event),
        )?;
        document.update_node_data::<EventStore, _>(element, |store| {
            if let Some(entry) = store.types.get_mut(&native_type) {
                entry.listener = Some(id);
            }
        });
        tracing::debug!("installed {} listener on {:?}", native_type, element);
    }
    Ok(())
}

/// Run the records stored on `element` for `native_type`, in registration order
pub(crate) fn dispatch_records(document: &Document, element: NodeId, native_type: &str, event: &mut Event) {
    let records = document
        .with_node_data::<EventStore, _>(element, |store| store.snapshot(native_type))
        .unwrap_or_default();
    tracing::trace!("{} on {:?}: {} records", native_type, element, records.len());

    for record in records {
        if record.is_removed() {
            continue;
        }
        let outer = event.delegate_target;
        record.invoke(document, event);
        event.delegate_target = outer;
        if event.is_immediate_propagation_stopped() {
            break;
        }
    }
}

/// Remove every record of `element` matching `predicate`, uninstalling native
/// listeners left without records. The store itself stays so the element
/// keeps its uid.
pub(crate) fn remove_records(
    document: &Document,
    element: NodeId,
    predicate: impl FnMut(&HandlerRecord) -> bool,
) -> usize {
    let Some((removed, emptied)) =
        document.update_node_data::<EventStore, _>(element, |store| store.remove_where(predicate))
    else {
        return 0;
    };

    for (native_type, id) in emptied {
        document.remove_event_listener(element, &native_type, id);
        tracing::debug!("removed {} listener from {:?}", native_type, element);
    }
    removed
}

/// Remove a single record by uid
pub(crate) fn remove_record(document: &Document, element: NodeId, native_type: &str, uid: u64) {
    remove_records(document, element, |record| {
        record.uid == uid && record.native_type == native_type
    });
}

/// Every live record of `element`, in no particular type order
pub(crate) fn records(document: &Document, element: NodeId) -> Vec<Rc<HandlerRecord>> {
    document
        .with_node_data::<EventStore, _>(element, |store| {
            store
                .types
                .values()
                .flat_map(|entry| entry.records.iter().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// The uid of `element`'s store, if it has one
pub(crate) fn element_uid(document: &Document, element: NodeId) -> Option<u64> {
    document.with_node_data::<EventStore, _>(element, |store| store.uid)
}

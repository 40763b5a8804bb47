//! Edge case tests for fos-dom
//!
//! Tree mutation, selector matching and dispatch boundary conditions.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{DomError, Document, ElementQuery, Event, EventPhase, ListenerOptions, NodeId, SelectorList};

// ============================================================================
// TREE EDGE CASES
// ============================================================================

#[test]
fn test_cannot_append_ancestor() {
    let doc = Document::default();
    let outer = doc.create_element("div");
    let inner = doc.create_element("div");
    doc.append_child(doc.body(), outer).unwrap();
    doc.append_child(outer, inner).unwrap();

    assert_eq!(
        doc.append_child(inner, outer),
        Err(DomError::HierarchyRequest { parent: inner, child: outer })
    );
    assert_eq!(
        doc.append_child(outer, outer),
        Err(DomError::HierarchyRequest { parent: outer, child: outer })
    );
}

#[test]
fn test_destroyed_nodes_reject_operations() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    doc.destroy(div).unwrap();

    assert!(!doc.is_alive(div));
    assert_eq!(doc.set_attribute(div, "id", "x"), Err(DomError::NotFound(div)));
    assert!(doc.add_event_listener(div, "click", ListenerOptions::default(), |_, _| {}).is_err());
    assert_eq!(doc.destroy(NodeId::ROOT), Err(DomError::InvalidNodeType(NodeId::ROOT)));
    assert!(!doc.is_alive(NodeId::NONE));
}

#[test]
fn test_reparenting_moves_subtree() {
    let doc = Document::default();
    let a = doc.create_element("section");
    let b = doc.create_element("section");
    let item = doc.create_element("p");
    doc.append_child(doc.body(), a).unwrap();
    doc.append_child(doc.body(), b).unwrap();
    doc.append_child(a, item).unwrap();
    doc.append_child(b, item).unwrap();

    assert_eq!(doc.parent(item), Some(b));
    assert!(!doc.contains(a, item));
    assert!(doc.contains(b, item));
}

// ============================================================================
// SELECTOR EDGE CASES
// ============================================================================

#[test]
fn test_selector_whitespace_is_trimmed() {
    let list = SelectorList::parse("  .btn  ,  a  ").unwrap();
    assert_eq!(list.source(), ".btn  ,  a");
    assert_eq!(list.len(), 2);
}

#[test]
fn test_selector_rejects_garbage() {
    for bad in ["", "   ", ">", "a >", "[", "[href", "a[href='x]", ":hover", ".", "#"] {
        assert!(SelectorList::parse(bad).is_err(), "{:?} parsed", bad);
    }
}

#[test]
fn test_selector_against_document_node() {
    let doc = Document::default();
    assert!(!doc.matches(doc.root(), "*"));
    assert!(doc.matches(doc.body(), "html > body"));
    assert!(doc.matches(doc.document_element(), ":root"));
}

#[test]
fn test_query_after_attribute_change() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    assert_eq!(doc.query_selector(doc.root(), ".late"), None);

    doc.set_attribute(div, "class", "early late").unwrap();
    assert_eq!(doc.query_selector(doc.root(), ".late"), Some(div));
    doc.remove_attribute(div, "class").unwrap();
    assert!(doc.tree().query_selector_all(doc.root(), ".early").is_empty());
}

// ============================================================================
// DISPATCH EDGE CASES
// ============================================================================

#[test]
fn test_listener_on_destroyed_ancestor_never_runs() {
    let doc = Document::default();
    let outer = doc.create_element("div");
    let inner = doc.create_element("span");
    doc.append_child(doc.body(), outer).unwrap();
    doc.append_child(outer, inner).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    doc.add_event_listener(doc.body(), "click", ListenerOptions::default(), move |_, e| {
        l.borrow_mut().push(e.target)
    })
    .unwrap();

    doc.destroy(outer).unwrap();
    assert!(doc.click(inner));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_listener_removing_later_sibling() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    let second_id = Rc::new(RefCell::new(None));
    let (l, s) = (log.clone(), second_id.clone());
    doc.add_event_listener(div, "click", ListenerOptions::default(), move |d, e| {
        l.borrow_mut().push("first");
        if let Some(id) = *s.borrow() {
            d.remove_event_listener(e.target, "click", id);
        }
    })
    .unwrap();
    let l = log.clone();
    let id = doc
        .add_event_listener(div, "click", ListenerOptions::default(), move |_, _| {
            l.borrow_mut().push("second")
        })
        .unwrap();
    *second_id.borrow_mut() = Some(id);

    doc.click(div);
    doc.click(div);
    assert_eq!(*log.borrow(), vec!["first", "first"]);
}

#[test]
fn test_passive_listener_cannot_cancel() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    let passive = ListenerOptions { passive: true, ..ListenerOptions::default() };
    doc.add_event_listener(div, "touchstart", passive, |_, e| e.prevent_default())
        .unwrap();

    let event = Event::new("touchstart").with_bubbles(true).with_cancelable(true);
    assert!(doc.dispatch_event(div, event));
}

#[test]
fn test_phase_seen_by_capture_listener_on_target() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.append_child(doc.body(), div).unwrap();
    let phases = Rc::new(RefCell::new(Vec::new()));

    for options in [ListenerOptions::default(), ListenerOptions::capture()] {
        let p = phases.clone();
        doc.add_event_listener(div, "click", options, move |_, e| p.borrow_mut().push(e.phase))
            .unwrap();
    }
    doc.click(div);
    assert_eq!(*phases.borrow(), vec![EventPhase::AtTarget, EventPhase::AtTarget]);
}

#[test]
fn test_dispatch_to_dead_node_is_dropped() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.destroy(div).unwrap();
    let event = doc.dispatch(div, Event::new("click"));
    assert_eq!(event.target, NodeId::NONE);
    assert_eq!(event.phase, EventPhase::None);
}

#[test]
fn test_detail_survives_dispatch() {
    let doc = Document::default();
    let div = doc.create_element("div");
    doc.add_event_listener(div, "ping", ListenerOptions::default(), |_, e| {
        e.detail.insert("pong".into(), serde_json::Value::Bool(true));
    })
    .unwrap();

    let event = doc.dispatch(div, Event::new("ping").with_detail("n", 1));
    assert_eq!(event.detail.get("n"), Some(&serde_json::json!(1)));
    assert_eq!(event.detail.get("pong"), Some(&serde_json::json!(true)));
}

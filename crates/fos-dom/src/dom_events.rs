//! DOM Events
//!
//! The event object handed to listeners during dispatch.

use serde_json::{Map, Value};

use crate::NodeId;

/// Dispatch phase, as in `Event.eventPhase`
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
    /// Node the event was dispatched to
    pub target: NodeId,
    /// Node whose listeners are currently running
    pub current_target: Option<NodeId>,
    /// Secondary target of pointer boundary events
    pub related_target: Option<NodeId>,
    /// Node a delegating listener resolved the event to
    pub delegate_target: Option<NodeId>,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the event came from the user agent rather than a script
    pub is_trusted: bool,
    /// Free-form payload, as in `CustomEvent.detail`
    pub detail: Map<String, Value>,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    in_passive_listener: bool,
}

impl Event {
    /// Create a non-bubbling, non-cancelable, untrusted event
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: NodeId::NONE,
            current_target: None,
            related_target: None,
            delegate_target: None,
            phase: EventPhase::None,
            bubbles: false,
            cancelable: false,
            is_trusted: false,
            detail: Map::new(),
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            in_passive_listener: false,
        }
    }

    /// Create a user-agent pointer event (`click`, `mouseover`, ...)
    pub fn mouse(event_type: impl Into<String>, related_target: Option<NodeId>) -> Self {
        Self {
            related_target,
            bubbles: true,
            cancelable: true,
            is_trusted: true,
            ..Self::new(event_type)
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_related_target(mut self, related_target: NodeId) -> Self {
        self.related_target = Some(related_target);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    /// Event type name
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Prevent default action (ignored for non-cancelable events and inside passive listeners)
    pub fn prevent_default(&mut self) {
        if self.cancelable && !self.in_passive_listener {
            self.default_prevented = true;
        }
    }

    /// Stop propagation to further nodes
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation, including remaining listeners on the current node
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

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    pub(crate) fn set_passive(&mut self, passive: bool) {
        self.in_passive_listener = passive;
    }
}

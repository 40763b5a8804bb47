//! Event specs
//!
//! `type[.ns1.ns2...]` strings as accepted by `on`, `off` and `trigger`.

use std::collections::{BTreeSet, HashSet};

use crate::RegistryConfig;

/// Event names dispatched by the host itself
pub const NATIVE_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "mouseup",
    "mousedown",
    "contextmenu",
    "mousewheel",
    "DOMMouseScroll",
    "mouseover",
    "mouseout",
    "mousemove",
    "selectstart",
    "selectend",
    "keydown",
    "keypress",
    "keyup",
    "orientationchange",
    "touchstart",
    "touchmove",
    "touchend",
    "touchcancel",
    "pointerdown",
    "pointermove",
    "pointerup",
    "pointerleave",
    "pointercancel",
    "gesturestart",
    "gesturechange",
    "gestureend",
    "focus",
    "blur",
    "change",
    "reset",
    "select",
    "submit",
    "focusin",
    "focusout",
    "load",
    "unload",
    "beforeunload",
    "resize",
    "move",
    "DOMContentLoaded",
    "readystatechange",
    "error",
    "abort",
    "scroll",
];

/// Emulated event → native event it is built on
const ENTER_LEAVE: &[(&str, &str)] = &[("mouseenter", "mouseover"), ("mouseleave", "mouseout")];

/// Event spec parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("empty event spec")]
    Empty,
}

/// Which names count as native, and whether enter/leave is emulated
#[derive(Debug, Clone)]
pub struct EventTable {
    native: HashSet<String>,
    emulate_enter_leave: bool,
}

impl EventTable {
    pub fn from_config(config: &RegistryConfig) -> Self {
        let native = NATIVE_EVENTS
            .iter()
            .map(|s| s.to_string())
            .chain(config.extra_native_events.iter().cloned())
            .collect();
        Self {
            native,
            emulate_enter_leave: config.emulate_enter_leave,
        }
    }

    pub fn is_native(&self, name: &str) -> bool {
        self.native.contains(name)
    }

    fn enter_leave_base(&self, name: &str) -> Option<&'static str> {
        if !self.emulate_enter_leave {
            return None;
        }
        ENTER_LEAVE
            .iter()
            .find(|(emulated, _)| *emulated == name)
            .map(|(_, native)| *native)
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

/// A parsed event spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    event_type: String,
    dispatch_type: String,
    namespaces: BTreeSet<String>,
    native: bool,
    enter_leave: bool,
}

impl EventSpec {
    /// Parse a spec against an event table.
    ///
    /// Native names dispatch under their own name. Any other non-empty string
    /// is a custom event whose type is the whole spec (`show.bs.modal`), with
    /// the dotted tail still usable as namespaces for removal. Empty dot
    /// segments are skipped.
    pub fn parse(raw: &str, table: &EventTable) -> Result<Self, SpecError> {
        if raw.is_empty() {
            return Err(SpecError::Empty);
        }

        let mut parts = raw.split('.');
        let base = parts.next().unwrap_or_default();
        let namespaces: BTreeSet<String> = parts
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .collect();

        let spec = if base.is_empty() && !namespaces.is_empty() {
            Self {
                event_type: String::new(),
                dispatch_type: String::new(),
                namespaces,
                native: false,
                enter_leave: false,
            }
        } else if let Some(native) = table.enter_leave_base(base) {
            Self {
                event_type: base.to_string(),
                dispatch_type: native.to_string(),
                namespaces,
                native: true,
                enter_leave: true,
            }
        } else if table.is_native(base) {
            Self {
                event_type: base.to_string(),
                dispatch_type: base.to_string(),
                namespaces,
                native: true,
                enter_leave: false,
            }
        } else {
            Self {
                event_type: raw.to_string(),
                dispatch_type: raw.to_string(),
                namespaces,
                native: false,
                enter_leave: false,
            }
        };
        Ok(spec)
    }

    /// `.ns` form: names namespaces but no event type
    pub fn is_namespace_only(&self) -> bool {
        self.event_type.is_empty()
    }

    /// Type handlers are registered and removed under
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Event name actually dispatched and listened for
    pub fn dispatch_type(&self) -> &str {
        &self.dispatch_type
    }

    pub fn namespaces(&self) -> &BTreeSet<String> {
        &self.namespaces
    }

    pub fn is_native(&self) -> bool {
        self.native
    }

    /// `mouseenter` / `mouseleave` emulated over `mouseover` / `mouseout`
    pub fn is_enter_leave(&self) -> bool {
        self.enter_leave
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<EventSpec, SpecError> {
        EventSpec::parse(raw, &EventTable::default())
    }

    fn ns(spec: &EventSpec) -> Vec<&str> {
        spec.namespaces().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_native_with_namespaces() {
        let spec = parse("click.bs.button").unwrap();
        assert_eq!(spec.event_type(), "click");
        assert_eq!(spec.dispatch_type(), "click");
        assert_eq!(ns(&spec), ["bs", "button"]);
        assert!(spec.is_native());
    }

    #[test]
    fn test_custom_type_keeps_full_name() {
        let spec = parse("show.bs.modal").unwrap();
        assert_eq!(spec.event_type(), "show.bs.modal");
        assert_eq!(spec.dispatch_type(), "show.bs.modal");
        assert_eq!(ns(&spec), ["bs", "modal"]);
        assert!(!spec.is_native());
    }

    #[test]
    fn test_enter_leave_mapping() {
        let enter = parse("mouseenter.tooltip").unwrap();
        assert_eq!(enter.event_type(), "mouseenter");
        assert_eq!(enter.dispatch_type(), "mouseover");
        assert!(enter.is_enter_leave());

        let leave = parse("mouseleave").unwrap();
        assert_eq!(leave.dispatch_type(), "mouseout");
    }

    #[test]
    fn test_enter_leave_disabled() {
        let config = RegistryConfig {
            emulate_enter_leave: false,
            ..RegistryConfig::default()
        };
        let spec = EventSpec::parse("mouseenter", &EventTable::from_config(&config)).unwrap();
        assert!(!spec.is_enter_leave());
        assert!(!spec.is_native());
        assert_eq!(spec.dispatch_type(), "mouseenter");
    }

    #[test]
    fn test_extra_native_events() {
        let config = RegistryConfig {
            extra_native_events: vec!["transitionend".into()],
            ..RegistryConfig::default()
        };
        let table = EventTable::from_config(&config);
        let spec = EventSpec::parse("transitionend.bs", &table).unwrap();
        assert!(spec.is_native());
        assert_eq!(spec.dispatch_type(), "transitionend");
    }

    #[test]
    fn test_namespace_only() {
        let spec = parse(".namespace").unwrap();
        assert!(spec.is_namespace_only());
        assert_eq!(ns(&spec), ["namespace"]);
    }

    #[test]
    fn test_only_empty_is_rejected() {
        assert_eq!(parse(""), Err(SpecError::Empty));

        let spaced = parse("my event").unwrap();
        assert_eq!(spaced.event_type(), "my event");
        assert!(!spaced.is_native());

        let trailing = parse("foo.").unwrap();
        assert_eq!(trailing.event_type(), "foo.");
        assert!(trailing.namespaces().is_empty());

        let dot = parse(".").unwrap();
        assert!(!dot.is_namespace_only());
        assert_eq!(dot.dispatch_type(), ".");
    }

    #[test]
    fn test_empty_namespace_segments_skipped() {
        let spec = parse("click..x").unwrap();
        assert!(spec.is_native());
        assert_eq!(spec.dispatch_type(), "click");
        assert_eq!(ns(&spec), ["x"]);

        let padded = parse("click ").unwrap();
        assert!(!padded.is_native());
        assert_eq!(padded.dispatch_type(), "click ");
    }
}

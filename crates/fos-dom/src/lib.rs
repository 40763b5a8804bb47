//! fOS DOM - Document Object Model
//!
//! Arena-based DOM tree with selector matching and event dispatch.
//!
//! The crate is the host side of event handling: it stores native listeners
//! per node and runs the capture / target / bubble algorithm. Higher layers
//! can keep their own per-node state in typed node data slots, which are
//! dropped when the node is destroyed.

mod attributes;
mod document;
mod dom_events;
mod element;
mod event_target;
mod node;
mod operations;
mod selector;
mod tree;

pub use attributes::{Attr, NamedNodeMap};
pub use document::{Document, WeakDocument};
pub use dom_events::{Event, EventPhase};
pub use element::ElementQuery;
pub use event_target::{ListenerCallback, ListenerId, ListenerOptions};
pub use node::{ElementData, Node, NodeData};
pub use operations::{DomError, DomResult};
pub use selector::{
    AttributeMatcher, AttributeSelector, Combinator, ComplexSelector, CompoundSelector,
    PseudoClass, SelectorComponent, SelectorError, SelectorList,
};
pub use tree::{Ancestors, Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Invalid/null node
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check that this is not `NONE`
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

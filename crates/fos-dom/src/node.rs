//! DOM Node - arena representation
//!
//! Nodes link to each other through `NodeId` indices instead of pointers, so
//! the whole tree lives in one `Vec` and handles stay `Copy`.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::NodeId;
use crate::attributes::NamedNodeMap;
use crate::event_target::ListenerMap;

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
    /// Native event listeners attached to this node
    pub(crate) listeners: ListenerMap,
    /// Per-node data owned on behalf of higher layers
    pub(crate) extensions: NodeExtensions,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
            listeners: ListenerMap::default(),
            extensions: NodeExtensions::default(),
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(content.into()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Whether the node was destroyed and only its arena slot remains
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        matches!(self.data, NodeData::Destroyed)
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Tombstone left in the arena by `DomTree::destroy`
    Destroyed,
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag_name: String,
    /// Attributes in insertion order
    pub attrs: NamedNodeMap,
    /// Cached id attribute (very common lookup)
    pub id: Option<String>,
    /// Cached class list
    pub classes: Vec<String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_ascii_lowercase(),
            attrs: NamedNodeMap::new(),
            id: None,
            classes: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attribute(name)
    }

    /// Set an attribute, keeping the id and class caches in sync
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match name {
            "id" => self.id = Some(value.to_string()),
            "class" => {
                self.classes = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {}
        }
        self.attrs.set_attribute(name, value);
    }

    /// Remove an attribute, returning whether it existed
    pub fn remove_attr(&mut self, name: &str) -> bool {
        match name {
            "id" => self.id = None,
            "class" => self.classes.clear(),
            _ => {}
        }
        self.attrs.remove_named_item(name).is_some()
    }

    /// Check the cached class list
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Typed per-node storage, one value per type.
///
/// Lets layers above the DOM keep state on a node without a side table, so
/// that state is dropped together with the node.
#[derive(Default)]
pub(crate) struct NodeExtensions {
    slots: Option<Box<HashMap<TypeId, Box<dyn Any>>>>,
}

impl NodeExtensions {
    pub(crate) fn get<T: 'static>(&self) -> Option<&T> {
        self.slots
            .as_ref()?
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<T>())
    }

    pub(crate) fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.slots
            .as_mut()?
            .get_mut(&TypeId::of::<T>())
            .and_then(|b| b.downcast_mut::<T>())
    }

    pub(crate) fn get_or_default<T: Default + 'static>(&mut self) -> &mut T {
        self.slots
            .get_or_insert_with(Default::default)
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .expect("slot keyed by TypeId holds that type")
    }

    pub(crate) fn take<T: 'static>(&mut self) -> Option<T> {
        let slots = self.slots.as_mut()?;
        let value = slots.remove(&TypeId::of::<T>())?;
        if slots.is_empty() {
            self.slots = None;
        }
        value.downcast::<T>().ok().map(|b| *b)
    }

    pub(crate) fn clear(&mut self) {
        self.slots = None;
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.as_ref().map_or(0, |s| s.len())
    }
}

impl std::fmt::Debug for NodeExtensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeExtensions").field("slots", &self.len()).finish()
    }
}

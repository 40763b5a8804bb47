//! DOM Tree (arena-based allocation)

use crate::{DomError, DomResult, ElementData, Node, NodeId};

/// Arena-based DOM tree
///
/// Slot 0 is always the document node. Destroyed nodes leave a tombstone so
/// outstanding `NodeId`s never alias a newer node.
#[derive(Debug)]
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) next_listener_id: u64,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            next_listener_id: 1,
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a live node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|n| !n.is_destroyed())
    }

    /// Get a mutable live node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).filter(|n| !n.is_destroyed())
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Number of arena slots (including tombstones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but the document
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Element data of a node, if it is a live element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Whether the node is a live element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate over the direct children of a node
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next }
    }

    /// Iterate from a node up to the root, starting with the node itself
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        let next = if self.get(id).is_some() { id } else { NodeId::NONE };
        Ancestors { tree: self, next }
    }

    /// Inclusive containment, as in `Node.contains`
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether the node is connected to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors(id).last() == Some(NodeId::ROOT)
    }

    /// Pre-order walk of the subtree below `root` (excluding `root`)
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    /// Get an attribute value
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        elem.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute, returning whether it existed
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType(id))?;
        Ok(elem.remove_attr(name))
    }

    /// Read typed per-node data
    pub fn node_data<T: 'static>(&self, id: NodeId) -> Option<&T> {
        self.get(id)?.extensions.get::<T>()
    }

    /// Mutate typed per-node data, if present
    pub fn node_data_mut<T: 'static>(&mut self, id: NodeId) -> Option<&mut T> {
        self.get_mut(id)?.extensions.get_mut::<T>()
    }

    /// Mutate typed per-node data, creating it on first use
    pub fn node_data_or_default<T: Default + 'static>(&mut self, id: NodeId) -> DomResult<&mut T> {
        Ok(self.node_mut(id)?.extensions.get_or_default::<T>())
    }

    /// Remove typed per-node data
    pub fn take_node_data<T: 'static>(&mut self, id: NodeId) -> Option<T> {
        self.get_mut(id)?.extensions.take::<T>()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some(id)
    }
}

/// Inclusive ancestor iterator
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        let text = tree.create_text("hi");
        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, span).unwrap();
        tree.append_child(span, text).unwrap();
        (tree, div, span, text)
    }

    #[test]
    fn test_ancestors_are_inclusive() {
        let (tree, div, span, text) = sample();
        let chain: Vec<_> = tree.ancestors(text).collect();
        assert_eq!(chain, vec![text, span, div, NodeId::ROOT]);
    }

    #[test]
    fn test_contains() {
        let (tree, div, span, _) = sample();
        assert!(tree.contains(div, span));
        assert!(tree.contains(span, span));
        assert!(!tree.contains(span, div));
        assert!(!tree.contains(div, NodeId::NONE));
    }

    #[test]
    fn test_descendants_preorder() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        let d = tree.create_element("d");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(b, c).unwrap();
        tree.append_child(a, d).unwrap();

        assert_eq!(tree.descendants(tree.root()), vec![a, b, c, d]);
    }

    #[test]
    fn test_attribute_on_text_node_fails() {
        let (mut tree, _, _, text) = sample();
        assert_eq!(
            tree.set_attribute(text, "id", "x"),
            Err(DomError::InvalidNodeType(text))
        );
    }
}

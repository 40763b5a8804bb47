//! DOM Node Operations
//!
//! Core node manipulation: appendChild, insertBefore, removeChild, destroy.

use crate::{DomTree, NodeData, NodeId};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found (never created or destroyed)
    #[error("node {0:?} not found")]
    NotFound(NodeId),
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("hierarchy request error: cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    /// Operation not valid for this kind of node
    #[error("invalid node type for {0:?}")]
    InvalidNodeType(NodeId),
    /// Node is not a child of the given parent
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}

impl DomTree {
    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;
        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_))
            || matches!(child_node.data, NodeData::Document)
            || self.contains(child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Append a child node, moving it out of its current parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert before a reference child (or append when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.check_insert(parent, child)?;
        if let Some(r) = reference {
            if self.node(r)?.parent != parent {
                return Err(DomError::NotAChild { parent, child: r });
            }
            if r == child {
                return Ok(child);
            }
        }

        self.unlink(child);

        let (prev, next) = match reference {
            Some(r) => (self.nodes[r.index()].prev_sibling, r),
            None => (self.nodes[parent.index()].last_child, NodeId::NONE),
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
        Ok(child)
    }

    /// Remove a child node from its parent, leaving it detached but alive
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.node(parent)?;
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild { parent, child });
        }
        self.unlink(child);
        Ok(child)
    }

    /// Detach a node from wherever it currently is
    pub fn detach(&mut self, id: NodeId) -> DomResult<NodeId> {
        self.node(id)?;
        self.unlink(id);
        Ok(id)
    }

    /// Detach and destroy a node and its whole subtree.
    ///
    /// Listeners and per-node data of every destroyed node are dropped; the
    /// ids become permanently invalid.
    pub fn destroy(&mut self, id: NodeId) -> DomResult<usize> {
        if id == NodeId::ROOT {
            return Err(DomError::InvalidNodeType(id));
        }
        self.node(id)?;
        self.unlink(id);

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for &node_id in &doomed {
            let node = &mut self.nodes[node_id.index()];
            node.listeners.clear();
            node.extensions.clear();
            node.data = NodeData::Destroyed;
            node.parent = NodeId::NONE;
            node.first_child = NodeId::NONE;
            node.last_child = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
        tracing::trace!("destroyed {} nodes under {:?}", doomed.len(), id);
        Ok(doomed.len())
    }

    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }
}

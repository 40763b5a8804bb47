//! Element Query and Methods
//!
//! querySelector, getElementsByClassName, closest, matches.

use crate::{DomTree, NodeId, SelectorList};

/// Element query trait
///
/// String selectors that fail to parse match nothing.
pub trait ElementQuery {
    /// Query single element by CSS selector
    fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId>;

    /// Query all elements by CSS selector
    fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId>;

    /// Get elements by class name
    fn get_elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId>;

    /// Find closest inclusive ancestor matching selector
    fn closest(&self, element: NodeId, selector: &str) -> Option<NodeId>;

    /// Check if element matches selector
    fn matches(&self, element: NodeId, selector: &str) -> bool;
}

impl DomTree {
    /// `closest` with a pre-parsed selector
    pub fn closest_matching(&self, element: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.ancestors(element).find(|&id| selector.matches(self, id))
    }
}

impl ElementQuery for DomTree {
    fn query_selector(&self, root: NodeId, selector: &str) -> Option<NodeId> {
        let list = SelectorList::parse(selector).ok()?;
        self.descendants(root)
            .into_iter()
            .find(|&id| list.matches(self, id))
    }

    fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Ok(list) = SelectorList::parse(selector) else {
            return Vec::new();
        };
        self.descendants(root)
            .into_iter()
            .filter(|&id| list.matches(self, id))
            .collect()
    }

    fn get_elements_by_class_name(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.element(id).is_some_and(|e| e.has_class(class)))
            .collect()
    }

    fn closest(&self, element: NodeId, selector: &str) -> Option<NodeId> {
        let list = SelectorList::parse(selector).ok()?;
        self.closest_matching(element, &list)
    }

    fn matches(&self, element: NodeId, selector: &str) -> bool {
        SelectorList::parse(selector).is_ok_and(|list| list.matches(self, element))
    }
}

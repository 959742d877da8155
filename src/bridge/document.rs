//! A small retained node tree standing in for the page the shell is hosted
//! in.  Widgets own a root node and get attached under container nodes.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Default)]
pub struct Document {
    labels: HashMap<NodeId, String>,
    parents: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Document {
    pub fn create_node(&mut self, label: impl Into<String>) -> NodeId {
        let id = NodeId::new();
        self.labels.insert(id, label.into());
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.labels.contains_key(&node)
    }

    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.labels.get(&node).map(String::as_str)
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).copied()
    }

    pub fn children(&self, container: NodeId) -> &[NodeId] {
        self.children.get(&container).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_child(&self, container: NodeId) -> Option<NodeId> {
        self.children(container).first().copied()
    }

    /// Make `node` the first child of `container`, moving it out of any
    /// previous parent.
    pub fn insert_first(&mut self, container: NodeId, node: NodeId) {
        if let Some(previous) = self.parents.remove(&node)
            && let Some(siblings) = self.children.get_mut(&previous)
        {
            siblings.retain(|child| *child != node);
        }
        self.children.entry(container).or_default().insert(0, node);
        self.parents.insert(node, container);
    }

    /// Detach `node` only if `container` is its current parent.
    pub fn remove_child(&mut self, container: NodeId, node: NodeId) -> bool {
        if self.parent_of(node) != Some(container) {
            return false;
        }
        self.parents.remove(&node);
        if let Some(siblings) = self.children.get_mut(&container) {
            siblings.retain(|child| *child != node);
        }
        true
    }

    /// Drop a node and everything below it.
    pub fn remove_node(&mut self, node: NodeId) {
        if let Some(parent) = self.parent_of(node) {
            self.remove_child(parent, node);
        }
        for child in self.children.remove(&node).unwrap_or_default() {
            self.parents.remove(&child);
            self.remove_node(child);
        }
        self.labels.remove(&node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_first_reparents() {
        let mut doc = Document::default();
        let a = doc.create_node("a");
        let b = doc.create_node("b");
        let x = doc.create_node("x");
        let y = doc.create_node("y");

        doc.insert_first(a, x);
        doc.insert_first(a, y);
        assert_eq!(doc.children(a), [y, x]);

        doc.insert_first(b, x);
        assert_eq!(doc.children(a), [y]);
        assert_eq!(doc.parent_of(x), Some(b));
    }

    #[test]
    fn test_remove_child_checks_parent() {
        let mut doc = Document::default();
        let old = doc.create_node("old");
        let new = doc.create_node("new");
        let node = doc.create_node("node");

        doc.insert_first(new, node);
        assert!(!doc.remove_child(old, node));
        assert_eq!(doc.parent_of(node), Some(new));
        assert!(doc.remove_child(new, node));
        assert!(!doc.remove_child(new, node));
        assert!(doc.contains(node));
    }

    #[test]
    fn test_remove_node_drops_subtree() {
        let mut doc = Document::default();
        let root = doc.create_node("root");
        let child = doc.create_node("child");
        doc.insert_first(root, child);
        doc.remove_node(root);
        assert!(!doc.contains(root));
        assert!(!doc.contains(child));
    }
}

//! `ModuleTree` (spec §4.6): the append-only directed graph of all
//! instantiations in a run. Root node has id 0 and represents the initial
//! caller.

use parking_lot::RwLock;
use pulsar_types::{ModuleInfo, PulsarError, Result};

use crate::node::ModuleTreeNode;

/// Id allocation lives in `pulsar_core::ModuleManager` (spec §4.6: "the
/// tree's `add` takes the already-allocated id"); the tree itself only
/// serializes node insertion and linking.
pub struct ModuleTree {
    nodes: RwLock<Vec<ModuleTreeNode>>,
}

impl Default for ModuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleTree {
    /// A fresh tree, pre-seeded with the root node (id 0, representing the
    /// initial caller, per spec §3).
    pub fn new() -> Self {
        let root = ModuleTreeNode::new(0, "", ModuleInfo::new("root", "root", "", ""), 0);
        ModuleTree {
            nodes: RwLock::new(vec![root]),
        }
    }

    /// Allocates a new node at `id`, links it as a child of `parent_id`.
    /// Fails `UnknownKey` (spec's `UnknownNode`) if `parent_id` is absent.
    /// Caller has already allocated `id` atomically (§4.6, §4.7).
    pub fn add(
        &self,
        id: u64,
        parent_id: u64,
        modulekey: impl Into<String>,
        info: ModuleInfo,
    ) -> Result<()> {
        let mut nodes = self.nodes.write();
        if nodes.iter().all(|n| n.id != parent_id) {
            return Err(PulsarError::unknown_key(format!("tree node {parent_id}")));
        }
        nodes.push(ModuleTreeNode::new(id, modulekey, info, parent_id));
        if let Some(parent) = nodes.iter().find(|n| n.id == parent_id) {
            parent.push_child(id);
        }
        Ok(())
    }

    /// Returns a read-locked view of the node for inspection. The guard
    /// must not be held across another `ModuleTree` call (it would
    /// deadlock on `add`/`mark_free`).
    pub fn with_node<T>(&self, id: u64, f: impl FnOnce(&ModuleTreeNode) -> T) -> Result<T> {
        let nodes = self.nodes.read();
        let node = nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| PulsarError::unknown_key(format!("tree node {id}")))?;
        Ok(f(node))
    }

    pub fn mark_free(&self, id: u64) {
        let nodes = self.nodes.read();
        if let Some(node) = nodes.iter().find(|n| n.id == id) {
            node.mark_free();
        }
    }

    pub fn append_output(&self, id: u64, chunk: &str) {
        let nodes = self.nodes.read();
        if let Some(node) = nodes.iter().find(|n| n.id == id) {
            node.append_output(chunk);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        false // root node always present
    }

    /// Graphviz `digraph` text: node labels `id\nkey\nname vVersion`, edges
    /// parent -> child (spec §6 "Dot graph format").
    pub fn dot(&self) -> String {
        let nodes = self.nodes.read();
        let mut out = String::from("digraph pulsar {\n");
        for node in nodes.iter() {
            out.push_str(&format!(
                "  {} [label=\"{}\\n{}\\n{} v{}\"];\n",
                node.id, node.id, node.modulekey, node.info.name, node.info.version
            ));
        }
        for node in nodes.iter() {
            for child in node.children_ids() {
                out.push_str(&format!("  {} -> {};\n", node.id, child));
            }
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_node_exists_at_zero() {
        let tree = ModuleTree::new();
        assert!(tree.with_node(0, |n| n.id).is_ok());
    }

    #[test]
    fn add_links_parent_and_child() {
        let tree = ModuleTree::new();
        tree.add(1, 0, "echo", ModuleInfo::new("Echo", "T", "", "1.0"))
            .unwrap();
        tree.with_node(0, |n| assert_eq!(n.children_ids(), vec![1]))
            .unwrap();
        tree.with_node(1, |n| assert_eq!(n.parent_id, 0)).unwrap();
    }

    #[test]
    fn add_with_unknown_parent_fails() {
        let tree = ModuleTree::new();
        let err = tree.add(1, 99, "x", ModuleInfo::new("X", "T", "", "1.0"));
        assert!(matches!(err, Err(PulsarError::UnknownKey { .. })));
    }

    #[test]
    fn mark_free_only_affects_target_node() {
        let tree = ModuleTree::new();
        tree.add(1, 0, "a", ModuleInfo::new("A", "T", "", "1.0"))
            .unwrap();
        tree.add(2, 0, "b", ModuleInfo::new("B", "T", "", "1.0"))
            .unwrap();
        tree.mark_free(1);
        tree.with_node(1, |n| assert!(!n.in_use())).unwrap();
        tree.with_node(2, |n| assert!(n.in_use())).unwrap();
    }

    #[test]
    fn dot_contains_edge_and_labels() {
        let tree = ModuleTree::new();
        tree.add(1, 0, "echo", ModuleInfo::new("Echo", "T", "", "1.0"))
            .unwrap();
        let dot = tree.dot();
        assert!(dot.starts_with("digraph pulsar {"));
        assert!(dot.contains("0 -> 1;"));
        assert!(dot.contains("Echo"));
    }
}

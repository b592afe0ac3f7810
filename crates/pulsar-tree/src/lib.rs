//! Append-only directed graph of module instantiations (spec §4.6):
//! `ModuleTree` and `ModuleTreeNode`.

pub mod node;
pub mod tree;

pub use node::ModuleTreeNode;
pub use tree::ModuleTree;

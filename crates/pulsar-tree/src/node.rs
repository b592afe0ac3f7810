//! `ModuleTreeNode` (spec §3): one instantiation record. Nodes are never
//! mutated except to append to `output`/`children_ids` and to flip
//! `in_use` on handle drop.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use pulsar_types::{ModuleInfo, OptionMap};

/// One node in the [`crate::tree::ModuleTree`]. `output` and `children_ids`
/// grow by append only; a node is never removed once added (spec §3
/// invariant).
///
/// `info` is the descriptive snapshot taken at instantiation time (spec
/// §3: "info... with the effective option map at instantiation time").
/// `options` is the *live* `OptionMap` the running module actually reads
/// and mutates through `ModuleBase::options()` (spec §4.8: "a mutable
/// reference to this instance's effective OptionMap, which lives in the
/// tree node") — kept as a separate interior-mutable field rather than
/// inside `info` so later reads of `info` (e.g. for the dot graph or a
/// cache's `producer_info`) still reflect the declaration-time snapshot.
pub struct ModuleTreeNode {
    pub id: u64,
    pub modulekey: String,
    pub info: ModuleInfo,
    pub parent_id: u64,
    options: Mutex<OptionMap>,
    children_ids: Mutex<Vec<u64>>,
    output: Mutex<String>,
    in_use: AtomicBool,
}

impl ModuleTreeNode {
    pub fn new(id: u64, modulekey: impl Into<String>, info: ModuleInfo, parent_id: u64) -> Self {
        let options = info.options.clone();
        ModuleTreeNode {
            id,
            modulekey: modulekey.into(),
            info,
            parent_id,
            options: Mutex::new(options),
            children_ids: Mutex::new(Vec::new()),
            output: Mutex::new(String::new()),
            in_use: AtomicBool::new(true),
        }
    }

    /// Locked access to the live, mutable `OptionMap` for this instance.
    pub fn with_options<T>(&self, f: impl FnOnce(&mut OptionMap) -> T) -> T {
        let mut guard = self.options.lock();
        f(&mut guard)
    }

    pub fn options_snapshot(&self) -> OptionMap {
        self.options.lock().clone()
    }

    pub fn children_ids(&self) -> Vec<u64> {
        self.children_ids.lock().clone()
    }

    pub(crate) fn push_child(&self, child_id: u64) {
        self.children_ids.lock().push(child_id);
    }

    pub fn output(&self) -> String {
        self.output.lock().clone()
    }

    /// Append a chunk to this node's output transcript. Called by the
    /// owning module's output-sink tee (`pulsar_core::output::TeeWriter`).
    pub fn append_output(&self, chunk: &str) {
        self.output.lock().push_str(chunk);
    }

    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_free(&self) {
        self.in_use.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ModuleTreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleTreeNode")
            .field("id", &self.id)
            .field("modulekey", &self.modulekey)
            .field("parent_id", &self.parent_id)
            .field("children_ids", &self.children_ids())
            .field("in_use", &self.in_use())
            .finish()
    }
}

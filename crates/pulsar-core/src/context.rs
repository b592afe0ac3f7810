//! `ModuleContext`: the Rust realization of `ModuleBase` (spec
//! §4.8). Rust has no inheritance, so rather than an abstract base class
//! every loaded module derives from, every module instance is handed one
//! of these by value (reachable through [`crate::handle::ModuleHandle`]),
//! giving it identity, options access, the output sink, child-creation,
//! and its module-class's cache — without owning the manager that created
//! it (DESIGN NOTES §9: "modules hold a non-owning reference").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use pulsar_cache::CacheData;
use pulsar_loader::ScriptedObject;
use pulsar_tree::ModuleTree;
use pulsar_types::{FromValue, OptionMap, PulsarError, Result};

use crate::handle::ModuleHandle;
use crate::manager::ModuleManager;
use crate::output::TeeWriter;

/// Cheap to clone: every field is an `Arc`/`Weak`/`Copy` handle, never an
/// owned copy of the tree or the manager.
#[derive(Clone)]
pub struct ModuleContext {
    id: u64,
    key: Arc<str>,
    manager: Weak<ModuleManager>,
    tree: Arc<ModuleTree>,
    cache: Arc<CacheData>,
    debug_enabled: Arc<AtomicBool>,
}

impl ModuleContext {
    pub(crate) fn new(id: u64, key: impl Into<Arc<str>>, manager: Weak<ModuleManager>, tree: Arc<ModuleTree>, cache: Arc<CacheData>) -> Self {
        ModuleContext {
            id,
            key: key.into(),
            manager,
            tree,
            cache,
            debug_enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> String {
        self.key.to_string()
    }

    pub fn name(&self) -> Result<String> {
        self.tree.with_node(self.id, |n| n.info.name.clone())
    }

    pub fn version(&self) -> Result<String> {
        self.tree.with_node(self.id, |n| n.info.version.clone())
    }

    pub fn module_type(&self) -> Result<String> {
        self.tree.with_node(self.id, |n| n.info.module_type.clone())
    }

    /// `[<id>] (<key>) <name> v<version>`, the identity tag every wrapped
    /// error carries as its `from` context value (spec §8 scenario 6).
    pub fn identity_tag(&self) -> String {
        let (name, version) = self
            .tree
            .with_node(self.id, |n| (n.info.name.clone(), n.info.version.clone()))
            .unwrap_or_else(|_| ("<unknown>".to_string(), "?".to_string()));
        format!("[{}] ({}) {} v{}", self.id, self.key, name, version)
    }

    /// Locked access to this instance's live, mutable `OptionMap` — "a
    /// mutable reference to this instance's effective OptionMap, which
    /// lives in the tree node" (spec §4.8 `options()`).
    pub fn with_options<T>(&self, f: impl FnOnce(&mut OptionMap) -> T) -> T {
        self.tree
            .with_node(self.id, |n| n.with_options(f))
            .expect("a module's own tree node always exists for the lifetime of its context")
    }

    pub fn get_option<T: FromValue>(&self, key: &str) -> Result<T> {
        self.with_options(|opts| opts.get::<T>(key))
    }

    /// A write-only stream sink tee'd to process output and this
    /// instance's tree-node transcript (spec §4.8 `output`).
    pub fn output(&self) -> TeeWriter {
        TeeWriter::new(self.tree.clone(), self.id)
    }

    pub fn enable_debug(&self, enabled: bool) {
        self.debug_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::SeqCst)
    }

    /// Reference to this module-class's shared cache (spec §4.8 `cache()`).
    pub fn cache(&self) -> &CacheData {
        &self.cache
    }

    /// The owning manager, if it has not already been torn down (spec
    /// §4.8 `manager()`). A non-owning `Weak` so modules never keep the
    /// manager alive past its own drop (DESIGN NOTES §9).
    pub fn manager(&self) -> Result<Arc<ModuleManager>> {
        self.manager
            .upgrade()
            .ok_or_else(|| PulsarError::module_execution_error("owning ModuleManager has already been torn down"))
    }

    /// `manager().get_module::<T>(userkey, self.id())` (spec §4.8
    /// `create_child<T>`).
    pub fn create_child<T: 'static>(&self, userkey: &str) -> Result<ModuleHandle<T>> {
        self.manager()?.get_module(userkey, self.id)
    }

    /// Same, but `userkey` is read from a declared string option (spec
    /// §4.8 `create_child_from_option`).
    pub fn create_child_from_option<T: 'static>(&self, optkey: &str) -> Result<ModuleHandle<T>> {
        let userkey: String = self.get_option(optkey)?;
        self.create_child(&userkey)
    }

    /// Invoke a named operation on a scripted module's trampoline,
    /// wrapped by [`crate::dispatch::call_wrapped`] (spec §4.8 "a parallel
    /// dispatcher locates and invokes the corresponding method on an
    /// underlying scripted object").
    pub fn call_scripted(&self, scripted: &dyn ScriptedObject, op: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        crate::dispatch::call_wrapped(self, op, || scripted.call_method(op, args.clone()))
    }
}

//! `ModuleManager` (spec §4.7): the top-level façade. Registers
//! supermodules, binds user-visible keys to module-class names,
//! instantiates modules, injects per-instance collaborators, and owns the
//! cache store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use pulsar_cache::CacheData;
use pulsar_loader::{ModuleCreators, ModuleObject, NativeLoader};
use pulsar_tree::ModuleTree;
use pulsar_types::{ModuleInfo, PulsarError, Result, Value};

use crate::context::ModuleContext;
use crate::handle::ModuleHandle;

struct StoreEntry {
    /// Mutated in place by `change_option` — every user-key that resolves
    /// to this module-class, including aliases created by `duplicate_key`,
    /// shares this one `ModuleInfo`'s `OptionMap` (DESIGN NOTES §9 "Key
    /// aliasing": Pulsar's resolution is share-by-reference).
    info: ModuleInfo,
    creators: ModuleCreators,
}

#[derive(Default)]
struct State {
    /// module-class name -> its default info + the creators table it came
    /// from.
    store: HashMap<String, StoreEntry>,
    /// user-visible key -> module-class name.
    keymap: HashMap<String, String>,
    /// `"{class_name}_{version}"` -> shared cache (spec §9 "CacheData
    /// teardown": keyed by module-class name + version, exactly as spec
    /// §4.7 describes).
    caches: HashMap<String, Arc<CacheData>>,
}

/// The orchestrator. See module docs; construct with [`ModuleManager::new`],
/// which always returns an `Arc` — every live module holds a `Weak`
/// back-pointer into it (DESIGN NOTES §9), so the manager must be shared.
pub struct ModuleManager {
    native_loader: NativeLoader,
    #[cfg(feature = "scripting")]
    scripted_loader: pulsar_script::ScriptedLoader,
    tree: Arc<ModuleTree>,
    next_id: AtomicU64,
    state: Mutex<State>,
}

impl ModuleManager {
    pub fn new() -> Arc<Self> {
        Arc::new(ModuleManager {
            native_loader: NativeLoader::new(),
            #[cfg(feature = "scripting")]
            scripted_loader: pulsar_script::ScriptedLoader::new(),
            tree: Arc::new(ModuleTree::new()),
            // id 0 is the root (spec §3); the first real instance gets 1.
            next_id: AtomicU64::new(1),
            state: Mutex::new(State::default()),
        })
    }

    pub fn tree(&self) -> &Arc<ModuleTree> {
        &self.tree
    }

    /// Graphviz text for the whole call graph (spec §4.7 `dot_graph`).
    pub fn dot_graph(&self) -> String {
        self.tree.dot()
    }

    fn ingest(&self, creators: ModuleCreators) -> Result<Vec<String>> {
        let names = creators.names();
        let mut state = self.state.lock();
        // Check every name before inserting any of them, so a collision
        // leaves the store exactly as it was (spec §5 exception safety).
        for name in &names {
            if state.store.contains_key(name) {
                return Err(PulsarError::duplicate_key(name.clone()));
            }
        }
        for name in &names {
            let info = creators.info(name)?;
            state.store.insert(
                name.clone(),
                StoreEntry {
                    info,
                    creators: creators.clone(),
                },
            );
        }
        Ok(names)
    }

    /// Opens `path` with whichever loader variant its shape calls for —
    /// a file with a native shared-object suffix uses [`NativeLoader`], a
    /// directory uses the scripted loader — and records every module-class
    /// the returned creators table names (spec §4.7 `load_supermodule`).
    pub fn load_supermodule(&self, path: &Path) -> Result<Vec<String>> {
        let creators = if is_native_suffix(path) {
            info!(path = %path.display(), "loading native supermodule");
            self.native_loader.load(path)?
        } else {
            #[cfg(feature = "scripting")]
            {
                info!(path = %path.display(), "loading scripted supermodule");
                self.scripted_loader.load(path)?
            }
            #[cfg(not(feature = "scripting"))]
            {
                return Err(PulsarError::supermodule_load_error(format!(
                    "'{}' does not look like a native supermodule and the 'scripting' feature is disabled",
                    path.display()
                )));
            }
        };
        self.ingest(creators)
    }

    /// Registers a single native module-class without going through a
    /// shared-object load — a convenience for modules compiled directly
    /// into the host binary, which real plugin-hosting systems commonly
    /// support alongside dynamic loading (documented in DESIGN.md).
    pub fn register_native<F, T>(&self, name: impl Into<String>, info: ModuleInfo, make: F) -> Result<()>
    where
        F: Fn(u64) -> T + Send + Sync + 'static,
        T: ModuleObject + 'static,
    {
        let creators = ModuleCreators::new();
        creators.add_native(name, info, make)?;
        self.ingest(creators)?;
        Ok(())
    }

    /// The scripted counterpart of [`ModuleManager::register_native`].
    pub fn register_scripted(&self, name: impl Into<String>, info: ModuleInfo, factory: pulsar_loader::ScriptedFactory) -> Result<()> {
        let creators = ModuleCreators::new();
        creators.add_scripted(name, info, factory)?;
        self.ingest(creators)?;
        Ok(())
    }

    /// Binds `userkey` to `modulename`; fails if `userkey` is already
    /// bound (spec §4.7 `enable_key`).
    pub fn enable_key(&self, userkey: impl Into<String>, modulename: impl Into<String>) -> Result<()> {
        let userkey = userkey.into();
        let modulename = modulename.into();
        let mut state = self.state.lock();
        if !state.store.contains_key(&modulename) {
            return Err(PulsarError::unknown_key(modulename));
        }
        if state.keymap.contains_key(&userkey) {
            return Err(PulsarError::duplicate_key(userkey));
        }
        state.keymap.insert(userkey, modulename);
        Ok(())
    }

    /// Add-or-overwrite variant of `enable_key` (spec §4.7 `replace_key`).
    pub fn replace_key(&self, userkey: impl Into<String>, modulename: impl Into<String>) -> Result<()> {
        let userkey = userkey.into();
        let modulename = modulename.into();
        let mut state = self.state.lock();
        if !state.store.contains_key(&modulename) {
            return Err(PulsarError::unknown_key(modulename));
        }
        state.keymap.insert(userkey, modulename);
        Ok(())
    }

    /// Aliases `existingkey` under `newkey`; both resolve to the same
    /// module-class and therefore share the same effective `OptionMap`
    /// (spec §4.7 `duplicate_key`; DESIGN NOTES §9 Open Question,
    /// resolved: share by reference).
    pub fn duplicate_key(&self, existingkey: &str, newkey: impl Into<String>) -> Result<()> {
        let newkey = newkey.into();
        let mut state = self.state.lock();
        let modulename = state
            .keymap
            .get(existingkey)
            .cloned()
            .ok_or_else(|| PulsarError::unknown_key(existingkey))?;
        if state.keymap.contains_key(&newkey) {
            return Err(PulsarError::duplicate_key(newkey));
        }
        state.keymap.insert(newkey, modulename);
        Ok(())
    }

    /// Mutates the stored default for subsequent instantiations under
    /// `userkey` (and every key aliased to the same module-class, per
    /// `duplicate_key`'s sharing semantics) (spec §4.7 `change_option`).
    pub fn change_option(&self, userkey: &str, optkey: &str, value: impl Into<Value>) -> Result<()> {
        let mut state = self.state.lock();
        let modulename = state
            .keymap
            .get(userkey)
            .cloned()
            .ok_or_else(|| PulsarError::unknown_key(userkey))?;
        let entry = state
            .store
            .get_mut(&modulename)
            .expect("keymap and store are always kept consistent");
        entry.info.options.set(optkey, value)
    }

    fn cache_for(&self, class_name: &str, version: &str) -> Arc<CacheData> {
        let cache_key = format!("{class_name}_{version}");
        let mut state = self.state.lock();
        state.caches.entry(cache_key).or_insert_with(|| Arc::new(CacheData::new())).clone()
    }

    /// Resolves `userkey`, instantiates a fresh instance with the next
    /// id, and verifies it satisfies `T` before any tree node or cache
    /// handle is created — a failed call leaves no trace (spec §4.7
    /// `get_module`, §5 exception safety).
    pub fn get_module<T: 'static>(self: &Arc<Self>, userkey: &str, parent_id: u64) -> Result<ModuleHandle<T>> {
        let (class_name, creators, info_snapshot) = {
            let state = self.state.lock();
            let class_name = state
                .keymap
                .get(userkey)
                .cloned()
                .ok_or_else(|| PulsarError::unknown_key(userkey))?;
            let entry = state.store.get(&class_name).expect("keymap and store are always kept consistent");
            (class_name, entry.creators.clone(), entry.info.clone())
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let holder = creators.create(&class_name, id)?;
        if !holder.is_type::<T>() {
            return Err(PulsarError::module_type_mismatch(format!(
                "module-class '{class_name}' does not satisfy the requested interface"
            )));
        }

        debug!(id, %userkey, %class_name, parent_id, "instantiating module");
        self.tree.add(id, parent_id, userkey, info_snapshot.clone())?;
        let cache = self.cache_for(&class_name, &info_snapshot.version);
        let ctx = ModuleContext::new(id, userkey, Arc::downgrade(self), self.tree.clone(), cache);
        Ok(ModuleHandle::new(holder, ctx))
    }

    /// For every registered user-key, instantiate and immediately drop —
    /// a smoke test that every enabled key actually resolves and
    /// constructs (spec §4.7 `test_all`).
    pub fn test_all(self: &Arc<Self>) -> Result<()> {
        let userkeys: Vec<String> = { self.state.lock().keymap.keys().cloned().collect() };
        for userkey in userkeys {
            let (class_name, creators, info_snapshot) = {
                let state = self.state.lock();
                let class_name = state
                    .keymap
                    .get(&userkey)
                    .cloned()
                    .ok_or_else(|| PulsarError::unknown_key(userkey.clone()))?;
                let entry = state.store.get(&class_name).expect("keymap and store are always kept consistent");
                (class_name, entry.creators.clone(), entry.info.clone())
            };
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let holder = creators.create(&class_name, id)?;
            self.tree.add(id, 0, &userkey, info_snapshot.clone())?;
            let _cache = self.cache_for(&class_name, &info_snapshot.version);
            drop(holder);
            self.tree.mark_free(id);
        }
        Ok(())
    }
}

impl Drop for ModuleManager {
    fn drop(&mut self) {
        self.native_loader.teardown();
        #[cfg(feature = "scripting")]
        self.scripted_loader.teardown();
    }
}

fn is_native_suffix(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("so") | Some("dylib") | Some("dll")
    )
}

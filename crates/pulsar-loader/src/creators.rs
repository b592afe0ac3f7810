//! `ModuleCreators` (spec §4.5): a map from module-class-name to factory
//! closure, shared by every holder of the same supermodule load.
//!
//! Each entry also carries the [`ModuleInfo`] the class was registered
//! with: spec §4.7 has `ModuleManager::load_supermodule` record `(name →
//! (ModuleInfo default, factory))` straight out of "the returned creators
//! table", which only typechecks if the table itself pairs info with each
//! factory — the on-wire ABI (spec §6) returns `ModuleCreators` by value
//! from `insert_supermodule()`, so the supermodule author is the one who
//! knows each class's description, version, and default options, and
//! hands them over at registration time via `add_native`/`add_scripted`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pulsar_types::{ModuleInfo, PulsarError, Result};

use crate::module::{Creator, ModuleHolder, ModuleObject, NativeFactory, ScriptedFactory, ScriptedObject};

struct Entry {
    info: ModuleInfo,
    creator: Creator,
}

/// Backed by `Arc<RwLock<HashMap<..>>>` rather than a bare `HashMap` so
/// that cloning a `ModuleCreators` shares the same underlying table —
/// this is what makes `SupermoduleLoader::load` idempotent "by pointer
/// identity" (spec §8 "Loader idempotence"): a second `load()` call on an
/// already-loaded path returns a `ModuleCreators` whose clone points at
/// the exact same registry.
#[derive(Clone, Default)]
pub struct ModuleCreators {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl ModuleCreators {
    pub fn new() -> Self {
        ModuleCreators::default()
    }

    /// Compile-time bind: `make` constructs a concrete native module type
    /// given its id (spec §4.5 `add_native<T>`). `info` is the class's
    /// static description, including its default `OptionMap`.
    pub fn add_native<F, T>(&self, name: impl Into<String>, info: ModuleInfo, make: F) -> Result<()>
    where
        F: Fn(u64) -> T + Send + Sync + 'static,
        T: ModuleObject + 'static,
    {
        let name = name.into();
        let mut inner = self.inner.write();
        if inner.contains_key(&name) {
            return Err(PulsarError::duplicate_key(name));
        }
        let factory: NativeFactory = Arc::new(move |id| Box::new(make(id)) as Box<dyn ModuleObject>);
        inner.insert(
            name,
            Entry {
                info,
                creator: Creator::Native(factory),
            },
        );
        Ok(())
    }

    /// Runtime bind: `factory` constructs a fresh scripted wrapper given
    /// its id (spec §4.5 `add_scripted`).
    pub fn add_scripted(&self, name: impl Into<String>, info: ModuleInfo, factory: ScriptedFactory) -> Result<()> {
        let name = name.into();
        let mut inner = self.inner.write();
        if inner.contains_key(&name) {
            return Err(PulsarError::duplicate_key(name));
        }
        inner.insert(
            name,
            Entry {
                info,
                creator: Creator::Scripted(factory),
            },
        );
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// The `ModuleInfo` a class was registered with (spec §4.7: harvested
    /// straight from the creators table at `load_supermodule` time).
    pub fn info(&self, name: &str) -> Result<ModuleInfo> {
        self.inner
            .read()
            .get(name)
            .map(|e| e.info.clone())
            .ok_or_else(|| PulsarError::module_load_error(format!("no module-class '{name}' in this supermodule")))
    }

    /// Invoke the named factory to produce a fresh implementation holder
    /// (spec §4.4: "a supermodule whose creators table does not contain
    /// the module-class requested at instantiation time fails
    /// `ModuleLoadError`").
    pub fn create(&self, name: &str, id: u64) -> Result<ModuleHolder> {
        let creator = self
            .inner
            .read()
            .get(name)
            .map(|e| e.creator.clone())
            .ok_or_else(|| PulsarError::module_load_error(format!("no module-class '{name}' in this supermodule")))?;
        match creator {
            Creator::Native(f) => Ok(ModuleHolder::Native(f(id))),
            Creator::Scripted(f) => Ok(ModuleHolder::Scripted(f(id)?)),
        }
    }

    /// Clears the table. Must happen before the containing supermodule
    /// handle is released, since factory closures may hold references into
    /// the supermodule's code (spec §4.5).
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        #[allow(dead_code)]
        id: u64,
    }

    fn echo_info() -> ModuleInfo {
        ModuleInfo::new("Echo", "EnergyMethod", "/dev/null", "1.0")
    }

    #[test]
    fn add_native_then_create_roundtrips() {
        let creators = ModuleCreators::new();
        creators.add_native("Echo", echo_info(), |id| Echo { id }).unwrap();
        assert!(creators.has("Echo"));
        assert_eq!(creators.info("Echo").unwrap().name, "Echo");
        let holder = creators.create("Echo", 7).unwrap();
        assert!(holder.is_type::<Echo>());
        assert_eq!(holder.downcast_ref::<Echo>().unwrap().id, 7);
    }

    #[test]
    fn duplicate_add_native_fails() {
        let creators = ModuleCreators::new();
        creators.add_native("Echo", echo_info(), |id| Echo { id }).unwrap();
        assert!(matches!(
            creators.add_native("Echo", echo_info(), |id| Echo { id }),
            Err(PulsarError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn clone_shares_underlying_registry() {
        let creators = ModuleCreators::new();
        let clone = creators.clone();
        creators.add_native("Echo", echo_info(), |id| Echo { id }).unwrap();
        assert!(clone.has("Echo"));
    }

    #[test]
    fn unknown_name_fails_module_load_error() {
        let creators = ModuleCreators::new();
        assert!(matches!(
            creators.create("Nope", 1),
            Err(PulsarError::ModuleLoadError { .. })
        ));
    }

    #[test]
    fn clear_empties_table() {
        let creators = ModuleCreators::new();
        creators.add_native("Echo", echo_info(), |id| Echo { id }).unwrap();
        creators.clear();
        assert!(creators.is_empty());
    }
}

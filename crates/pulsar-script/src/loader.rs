//! The scripted variant of `SupermoduleLoader` (spec §4.4): imports a
//! Python package directory as a supermodule and harvests its creators
//! table, mirroring the native variant's contract one-for-one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use tracing::{debug, info, warn};

use pulsar_loader::{LoaderHandle, ModuleCreators, ScriptedHandle, ScriptedFactory, SupermoduleRecord};
use pulsar_types::{ModuleInfo, PulsarError, Result};

use crate::bridge::ScriptedModule;
use crate::types::py_to_value;

/// Builds the `ModuleInfo` for one scripted class from optional class
/// attributes, falling back to sensible defaults when a class omits them
/// (spec §3 `ModuleInfo`; spec §6 "Scripted supermodule ABI" does not
/// mandate any of these, so a minimal scripted class — like the `Echo`
/// fixture — need only define `__init__` and its operations).
fn scripted_module_info(name: &str, class_obj: &Bound<'_, PyAny>, path: &str) -> Result<ModuleInfo> {
    let str_attr = |attr: &str, default: &str| -> String {
        class_obj
            .getattr(attr)
            .and_then(|v| v.extract::<String>())
            .unwrap_or_else(|_| default.to_string())
    };
    let str_list_attr = |attr: &str| -> Vec<String> {
        class_obj
            .getattr(attr)
            .and_then(|v| v.extract::<Vec<String>>())
            .unwrap_or_default()
    };

    let mut info = ModuleInfo::new(name, str_attr("MODULE_TYPE", "Module"), path, str_attr("VERSION", "0.0"));
    info.description = str_attr("DESCRIPTION", "");
    info.authors = str_list_attr("AUTHORS");
    info.refs = str_list_attr("REFS");

    if let Ok(options) = class_obj.getattr("DEFAULT_OPTIONS") {
        if let Ok(options) = options.downcast::<PyDict>() {
            for (key, spec) in options.iter() {
                let key: String = key
                    .extract()
                    .map_err(|e| PulsarError::supermodule_load_error(e.to_string()))?;
                let (default_value, required, help): (Bound<'_, PyAny>, bool, String) = spec
                    .extract()
                    .map_err(|e| PulsarError::supermodule_load_error(format!("bad DEFAULT_OPTIONS entry for '{key}': {e}")))?;
                let default_value = py_to_value(&default_value)
                    .map_err(|e| PulsarError::supermodule_load_error(format!("option '{key}' default: {e}")))?;
                info.options.declare(key, default_value, required, help, None)?;
            }
        }
    }
    Ok(info)
}

/// Scripted counterpart of `pulsar_loader::NativeLoader`. Canonicalizes
/// the containing directory before touching `sys.path`, per DESIGN NOTES
/// §9's resolution of the "scripted supermodule path normalization" open
/// question.
#[derive(Default)]
pub struct ScriptedLoader {
    records: RwLock<HashMap<PathBuf, Arc<SupermoduleRecord>>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        ScriptedLoader::default()
    }

    /// `path` is a package directory, e.g. `/opt/pulsar/modules/echo_scripted`;
    /// it is split into (containing directory, package name) per spec §4.4.
    pub fn load(&self, path: &Path) -> Result<ModuleCreators> {
        let canonical = std::fs::canonicalize(path).map_err(|e| {
            PulsarError::supermodule_load_error(format!("cannot canonicalize '{}': {e}", path.display()))
        })?;

        if let Some(existing) = self.records.read().get(&canonical) {
            debug!(path = %canonical.display(), "scripted supermodule already loaded");
            return Ok(existing.creators.clone());
        }

        let parent = canonical
            .parent()
            .ok_or_else(|| PulsarError::supermodule_load_error("scripted supermodule path has no parent directory"))?;
        let package_name = canonical
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PulsarError::supermodule_load_error("scripted supermodule path has no file name"))?
            .to_string();

        info!(path = %canonical.display(), package = %package_name, "importing scripted supermodule");

        let creators = ModuleCreators::new();
        let py_module = Python::with_gil(|py| -> Result<Py<PyModule>> {
            let sys = py
                .import_bound("sys")
                .map_err(|e| PulsarError::supermodule_load_error(format!("cannot import sys: {e}")))?;
            let sys_path = sys
                .getattr("path")
                .map_err(|e| PulsarError::supermodule_load_error(e.to_string()))?;
            let sys_path = sys_path
                .downcast::<PyList>()
                .map_err(|e| PulsarError::supermodule_load_error(e.to_string()))?;
            let parent_str = parent.to_string_lossy().to_string();
            sys_path
                .insert(0, &parent_str)
                .map_err(|e| PulsarError::supermodule_load_error(e.to_string()))?;

            let import_result = py.import_bound(package_name.as_str());

            // Restore the search path regardless of import outcome (spec
            // §4.4: "temporarily prepend... restore the search path").
            if let Ok(index) = sys_path
                .call_method1("index", (&parent_str,))
                .and_then(|v| v.extract::<usize>())
            {
                let _ = sys_path.call_method1("pop", (index,));
            }

            let module = import_result
                .map_err(|e| PulsarError::supermodule_load_error(format!("import '{package_name}' failed: {e}")))?;

            if let Ok(init) = module.getattr("initialize_supermodule") {
                init.call0()
                    .map_err(|e| PulsarError::supermodule_load_error(format!("initialize_supermodule failed: {e}")))?;
            }

            let insert = module.getattr("insert_supermodule").map_err(|_| {
                PulsarError::supermodule_load_error(format!("'{package_name}' does not define insert_supermodule"))
            })?;
            let table = insert
                .call0()
                .map_err(|e| PulsarError::supermodule_load_error(format!("insert_supermodule() failed: {e}")))?;
            let table = table
                .downcast::<PyDict>()
                .map_err(|_| PulsarError::supermodule_load_error("insert_supermodule() must return a dict"))?;

            for (key, value) in table.iter() {
                let name: String = key
                    .extract()
                    .map_err(|e| PulsarError::supermodule_load_error(e.to_string()))?;
                let info = scripted_module_info(&name, &value, &canonical.to_string_lossy())?;
                let class_obj: Py<PyAny> = value.unbind();
                let factory: ScriptedFactory = Arc::new(move |id| {
                    Python::with_gil(|py| {
                        let wrapped = ScriptedModule::instantiate(py, &class_obj, id)?;
                        Ok(Box::new(wrapped) as Box<dyn pulsar_loader::ScriptedObject>)
                    })
                });
                creators.add_scripted(name, info, factory)?;
            }

            Ok(module.unbind())
        })?;

        let record = Arc::new(SupermoduleRecord {
            path: canonical.clone(),
            handle: LoaderHandle::Scripted(ScriptedHandle(Box::new(py_module))),
            creators: creators.clone(),
        });
        self.records.write().insert(canonical, record);
        Ok(creators)
    }

    /// Calls `finalize_supermodule` if defined, then drops the reference
    /// to the imported package (spec §4.4 scripted teardown).
    pub fn teardown(&self) {
        let mut records = self.records.write();
        let paths: Vec<PathBuf> = records.keys().cloned().collect();
        for path in paths {
            if let Some(record) = records.remove(&path) {
                record.creators.clear();
                if let LoaderHandle::Scripted(handle) = &record.handle {
                    if let Some(module) = handle.0.downcast_ref::<Py<PyModule>>() {
                        Python::with_gil(|py| {
                            let bound = module.bind(py);
                            if let Ok(fini) = bound.getattr("finalize_supermodule") {
                                if let Err(e) = fini.call0() {
                                    warn!(path = %path.display(), error = %e, "finalize_supermodule failed");
                                }
                            }
                        });
                    }
                }
            }
        }
    }
}

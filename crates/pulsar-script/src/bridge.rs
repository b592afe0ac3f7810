//! `ScriptedModule`: the trampoline wrapper around a Python object instance
//! that satisfies [`pulsar_loader::ScriptedObject`] (spec §4.10). Every
//! virtual `ModuleBase` defines has a parallel dispatcher that locates and
//! invokes the corresponding method on this object by name.

use std::any::Any;

use pyo3::prelude::*;
use pulsar_loader::ScriptedObject;
use pulsar_types::{PulsarError, Result};

use crate::types::{json_to_py, py_to_json};

/// Holds a `Py<PyAny>` instance produced by calling a scripted class with
/// its id (mirrors `NativeFactory`'s `Fn(u64) -> Box<dyn ModuleObject>`,
/// but on the Python side of the boundary).
pub struct ScriptedModule {
    class_name: String,
    instance: Py<PyAny>,
}

impl ScriptedModule {
    /// Instantiate `class_obj(id)` and wrap the result.
    pub fn instantiate(py: Python<'_>, class_obj: &Py<PyAny>, id: u64) -> Result<Self> {
        let bound = class_obj.bind(py);
        let class_name = bound
            .getattr("__name__")
            .and_then(|n| n.extract::<String>())
            .unwrap_or_else(|_| "<scripted>".to_string());
        let instance = bound
            .call1((id,))
            .map_err(|e| PulsarError::module_load_error(format!("failed to instantiate scripted class: {e}")))?
            .unbind();
        Ok(ScriptedModule { class_name, instance })
    }
}

impl ScriptedObject for ScriptedModule {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The trampoline call: look up `method` on the scripted instance by
    /// name and invoke it with JSON-shaped arguments, converting the
    /// return value back across the boundary (spec §4.8, §4.10).
    fn call_method(&self, method: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        Python::with_gil(|py| {
            let instance = self.instance.bind(py);
            let py_args = json_to_py(py, args)
                .map_err(|e| PulsarError::module_execution_error(format!("argument conversion failed: {e}")))?;
            let result = instance
                .call_method1(method, (py_args,))
                .map_err(|e| PulsarError::module_execution_error(e.to_string()))?;
            py_to_json(&result)
                .map_err(|e| PulsarError::module_execution_error(format!("return conversion failed: {e}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_and_call_round_trip() {
        Python::with_gil(|py| {
            let module = PyModule::from_code_bound(
                py,
                r#"
class Echo:
    def __init__(self, id):
        self.id = id
    def run(self, payload):
        return {"echo": payload, "id": self.id}
"#,
                "echo.py",
                "echo",
            )
            .unwrap();
            let class_obj: Py<PyAny> = module.getattr("Echo").unwrap().unbind();
            let instance = ScriptedModule::instantiate(py, &class_obj, 5).unwrap();
            assert_eq!(instance.class_name(), "Echo");
            let result = instance
                .call_method("run", serde_json::json!("hello"))
                .unwrap();
            assert_eq!(result["echo"], serde_json::json!("hello"));
            assert_eq!(result["id"], serde_json::json!(5));
        });
    }
}

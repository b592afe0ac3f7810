//! Embedded-Python scripted-module bridge (spec §4.10): lets modules be
//! written in Python with identical semantics to a native module, via a
//! trampoline shim and a reversible value conversion (spec §6).

pub mod bridge;
pub mod loader;
pub mod types;

pub use bridge::ScriptedModule;
pub use loader::ScriptedLoader;
pub use types::{json_to_py, py_to_json, py_to_value, value_to_py};

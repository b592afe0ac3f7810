//! `ModuleInfo`: the static description of a module class harvested from
//! its supermodule (spec §3).

use crate::option::OptionMap;

/// Not `Serialize`/`Deserialize` directly — see [`crate::option::OptionMap`]'s
/// docs. Use [`crate::wire::ModuleInfoWire`] to move a `ModuleInfo` across
/// a serialization boundary.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub module_type: String,
    pub path: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub refs: Vec<String>,
    pub options: OptionMap,
}

impl ModuleInfo {
    pub fn new(
        name: impl Into<String>,
        module_type: impl Into<String>,
        path: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ModuleInfo {
            name: name.into(),
            module_type: module_type.into(),
            path: path.into(),
            version: version.into(),
            description: String::new(),
            authors: Vec::new(),
            refs: Vec::new(),
            options: OptionMap::new(),
        }
    }
}

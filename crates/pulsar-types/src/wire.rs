//! On-wire layouts (spec §6): the serializable shadow of [`crate::info::ModuleInfo`]
//! and [`crate::option::OptionMap`], used when a host constructs a `ModuleInfo`
//! from a serialized form (e.g. a manifest shipped alongside a supermodule).
//!
//! Field order for `ModuleInfoWire` matches spec §6 exactly: `key, name,
//! type, path, version, description, authors, refs, options`, with
//! `options` an ordered sequence of `(key, default_value, required, help)`
//! tuples. Validators and the currently-set `value`/`validated` state do
//! not round-trip — the wire form only ever carries *defaults*.

use serde::{Deserialize, Serialize};

use crate::info::ModuleInfo;
use crate::option::OptionMap;
use crate::value::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionEntryWire {
    pub key: String,
    pub default_value: Value,
    pub required: bool,
    pub help: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfoWire {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    pub path: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub refs: Vec<String>,
    pub options: Vec<OptionEntryWire>,
}

impl ModuleInfoWire {
    /// Build the wire form of a `ModuleInfo` as it would be addressed by
    /// `user_key` (spec §6 field order begins with `key`, the user-visible
    /// key — distinct from `ModuleInfo::name`, the module-class name).
    pub fn from_info(user_key: &str, info: &ModuleInfo) -> Self {
        ModuleInfoWire {
            key: user_key.to_string(),
            name: info.name.clone(),
            module_type: info.module_type.clone(),
            path: info.path.clone(),
            version: info.version.clone(),
            description: info.description.clone(),
            authors: info.authors.clone(),
            refs: info.refs.clone(),
            options: info
                .options
                .iter()
                .map(|e| OptionEntryWire {
                    key: e.key.clone(),
                    default_value: e.default_value.clone(),
                    required: e.required,
                    help: e.help.clone(),
                })
                .collect(),
        }
    }

    /// Reconstruct a `ModuleInfo` from its wire form. Validators are not
    /// part of the wire format and are always `None` on the rebuilt
    /// `OptionMap`; a host that needs validation must re-declare the
    /// validator after loading.
    pub fn to_info(&self) -> crate::error::Result<ModuleInfo> {
        let mut options = OptionMap::new();
        for entry in &self.options {
            options.declare(
                entry.key.clone(),
                entry.default_value.clone(),
                entry.required,
                entry.help.clone(),
                None,
            )?;
        }
        Ok(ModuleInfo {
            name: self.name.clone(),
            module_type: self.module_type.clone(),
            path: self.path.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            authors: self.authors.clone(),
            refs: self.refs.clone(),
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut info = ModuleInfo::new("Echo", "EnergyMethod", "/path/to/lib.so", "1.0");
        info.options
            .declare("message", "hello", false, "a greeting", None)
            .unwrap();
        let wire = ModuleInfoWire::from_info("echo", &info);
        let json = serde_json::to_string(&wire).unwrap();
        let back: ModuleInfoWire = serde_json::from_str(&json).unwrap();
        let rebuilt = back.to_info().unwrap();
        assert_eq!(rebuilt.name, "Echo");
        assert_eq!(
            rebuilt.options.get::<String>("message").unwrap(),
            "hello"
        );
    }
}

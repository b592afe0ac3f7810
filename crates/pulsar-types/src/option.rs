//! Typed, validated, named-parameter bundle attached to each module
//! configuration (spec §4.3). Layered on [`crate::property::PropertyBag`]
//! plus per-key metadata: default, required flag, help string, and an
//! optional validator.

use std::sync::Arc;

use pulsar_hash::{Hash, HashableArchive};
use serde::{Deserialize, Serialize};

use crate::error::{PulsarError, Result};
use crate::property::FromValue;
use crate::value::Value;

/// A bound validator: a callable over the whole map, returning either
/// success or a list of `(key, message)` failures (spec §6 "Option
/// validator protocol"). Validators may not mutate the `OptionMap` — the
/// signature takes `&OptionMap`, not `&mut`.
pub type Validator = Arc<dyn Fn(&OptionMap) -> std::result::Result<(), Vec<(String, String)>> + Send + Sync>;

/// One declared option: its default, whether a value has been explicitly
/// set, whether it is required, help text, and whether the current value
/// has passed its bound validator (spec §3 `OptionEntry`).
#[derive(Clone)]
pub struct OptionEntry {
    pub key: String,
    pub default_value: Value,
    pub value: Option<Value>,
    pub required: bool,
    pub help: String,
    pub validated: bool,
    pub validator: Option<Validator>,
}

impl std::fmt::Debug for OptionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionEntry")
            .field("key", &self.key)
            .field("default_value", &self.default_value)
            .field("value", &self.value)
            .field("required", &self.required)
            .field("help", &self.help)
            .field("validated", &self.validated)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl OptionEntry {
    /// The effective value: the set value if any, else the default (spec
    /// §4.3 `get<T>`).
    pub fn effective(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default_value)
    }

    /// A required option with no explicit value is invalid (spec §3
    /// invariant): that invariant only marks an entry invalid when there is
    /// genuinely no value at all, so a
    /// required option is satisfied the moment either `value` or
    /// `default_value` is present; both always exist once declared, so in
    /// practice `required` only matters when a host wants to force the
    /// caller to have explicitly called `set`.
    pub fn is_satisfied(&self) -> bool {
        !self.required || self.value.is_some()
    }
}

/// A bag of declared options with per-key metadata (spec §4.3).
///
/// Not `Serialize`/`Deserialize`: a declared option may carry a bound
/// validator closure, which has no wire representation. Hosts that need an
/// on-wire `OptionMap` use [`crate::wire::ModuleInfoWire`] instead, which
/// carries exactly the `(key, default_value, required, help)` tuples spec
/// §6 specifies and drops validators on reconstruction.
#[derive(Clone, Default)]
pub struct OptionMap {
    entries: std::collections::BTreeMap<String, OptionEntry>,
}

impl std::fmt::Debug for OptionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

/// A serializable snapshot of an `OptionMap`'s declared keys and their
/// *effective* values — what gets stored as `producer_info`/`option_snapshot`
/// in cache entries and tree nodes. Validators and `required`/`help`
/// metadata do not round-trip through this snapshot; only shape matters for
/// comparison and hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSnapshot {
    pub values: std::collections::BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct OptionValidationReport {
    pub failures: Vec<(String, String)>,
}

impl OptionValidationReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

impl OptionMap {
    pub fn new() -> Self {
        OptionMap::default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Declares an allowed option (spec §4.3 `declare`).
    pub fn declare(
        &mut self,
        key: impl Into<String>,
        default_value: impl Into<Value>,
        required: bool,
        help: impl Into<String>,
        validator: Option<Validator>,
    ) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(PulsarError::duplicate_key(key));
        }
        self.entries.insert(
            key.clone(),
            OptionEntry {
                key,
                default_value: default_value.into(),
                value: None,
                required,
                help: help.into(),
                validated: false,
                validator,
            },
        );
        Ok(())
    }

    /// Sets a value for a declared key; fails `UnknownKey`/`TypeMismatch`
    /// and resets `validated` to false (spec §3 invariant, §4.3 `set`).
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| PulsarError::unknown_key(key))?;
        if entry.default_value.tag() != value.tag() {
            return Err(PulsarError::type_mismatch(format!(
                "option '{key}' is {} but value is {}",
                entry.default_value.tag().name(),
                value.tag().name()
            )));
        }
        entry.value = Some(value);
        entry.validated = false;
        Ok(())
    }

    /// Effective value (set value if any, else default) (spec §4.3 `get<T>`).
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| PulsarError::unknown_key(key))?;
        T::from_value(entry.effective())
    }

    pub fn get_value(&self, key: &str) -> Result<Value> {
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| PulsarError::unknown_key(key))?;
        Ok(entry.effective().clone())
    }

    pub fn entry(&self, key: &str) -> Result<&OptionEntry> {
        self.entries
            .get(key)
            .ok_or_else(|| PulsarError::unknown_key(key))
    }

    /// Declared entries in key-sorted order, for wire-format export.
    pub fn iter(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.values()
    }

    /// Runs every bound validator and collects all failures (spec §4.3
    /// `validate`). Marks each validated entry's `validated` flag true on
    /// success, independent of the others.
    pub fn validate(&mut self) -> OptionValidationReport {
        let mut failures = Vec::new();
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.validator.is_some())
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            let validator = self.entries[key].validator.clone().unwrap();
            match validator(self) {
                Ok(()) => {
                    self.entries.get_mut(key).unwrap().validated = true;
                }
                Err(mut fails) => failures.append(&mut fails),
            }
        }
        for entry in self.entries.values() {
            if !entry.is_satisfied() {
                failures.push((
                    entry.key.clone(),
                    "required option has no value".to_string(),
                ));
            }
        }
        OptionValidationReport { failures }
    }

    /// Equal iff both declare identical key sets and every effective value
    /// matches (spec §4.3 `compare`).
    pub fn compare(&self, other: &OptionMap) -> bool {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        let mut other_keys: Vec<&String> = other.entries.keys().collect();
        keys.sort();
        other_keys.sort();
        if keys != other_keys {
            return false;
        }
        self.entries
            .keys()
            .all(|k| self.entries[k].effective() == other.entries[k].effective())
    }

    /// Equal restricted to the given key subset (spec §4.3
    /// `compare_selected`). Keys absent from either side are skipped for
    /// the purposes of this restricted comparison, matching CacheData's
    /// "caller declares significance" contract (§4.9): a caller who asks
    /// about a key neither map declares gets no vote either way.
    pub fn compare_selected(&self, other: &OptionMap, keys: &[String]) -> bool {
        keys.iter().all(|k| {
            match (self.entries.get(k), other.entries.get(k)) {
                (Some(a), Some(b)) => a.effective() == b.effective(),
                (None, None) => true,
                _ => false,
            }
        })
    }

    /// 128-bit fingerprint covering declared keys and effective values in
    /// key-sorted order (spec §4.3 `hash`).
    pub fn hash(&self) -> Hash {
        let mut archive = HashableArchive::new();
        for key in self.entries.keys() {
            let entry = &self.entries[key];
            archive.feed_str(key);
            entry.effective().feed(&mut archive);
        }
        archive.finish()
    }

    /// A serializable snapshot of declared keys and effective values, used
    /// as `option_snapshot` in cache entries and as the `info` stored in
    /// tree nodes.
    pub fn snapshot(&self) -> OptionSnapshot {
        OptionSnapshot {
            values: self
                .entries
                .iter()
                .map(|(k, e)| (k.clone(), e.effective().clone()))
                .collect(),
        }
    }
}

impl OptionSnapshot {
    pub fn compare_selected(&self, other: &OptionSnapshot, keys: &[String]) -> bool {
        keys.iter().all(|k| match (self.values.get(k), other.values.get(k)) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsar_hash::Hashable;

    #[test]
    fn get_falls_back_to_default() {
        let mut m = OptionMap::new();
        m.declare("message", "hello", false, "a greeting", None).unwrap();
        assert_eq!(m.get::<String>("message").unwrap(), "hello");
    }

    #[test]
    fn set_resets_validated() {
        let mut m = OptionMap::new();
        m.declare(
            "tol",
            1e-6,
            false,
            "tolerance",
            Some(Arc::new(|_: &OptionMap| Ok(()))),
        )
        .unwrap();
        m.validate();
        assert!(m.entry("tol").unwrap().validated);
        m.set("tol", 1e-8).unwrap();
        assert!(!m.entry("tol").unwrap().validated);
    }

    #[test]
    fn set_type_mismatch_rejected() {
        let mut m = OptionMap::new();
        m.declare("message", "hello", false, "help", None).unwrap();
        assert!(matches!(
            m.set("message", 42i64),
            Err(PulsarError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn required_without_value_fails_validation() {
        let mut m = OptionMap::new();
        m.declare("basis", "sto-3g", true, "basis set", None).unwrap();
        let report = m.validate();
        assert!(!report.is_ok());
        m.set("basis", "cc-pvdz").unwrap();
        let report = m.validate();
        assert!(report.is_ok());
    }

    #[test]
    fn compare_selected_ignores_other_keys() {
        let mut a = OptionMap::new();
        a.declare("tol", 1e-6, false, "", None).unwrap();
        a.declare("screening", true, false, "", None).unwrap();
        let mut b = a.clone();
        b.set("screening", false).unwrap();
        assert!(!a.compare(&b));
        assert!(a.compare_selected(&b, &["tol".to_string()]));
    }

    #[test]
    fn hash_is_order_independent_of_declaration() {
        let mut a = OptionMap::new();
        a.declare("b", 2i64, false, "", None).unwrap();
        a.declare("a", 1i64, false, "", None).unwrap();
        let mut c = OptionMap::new();
        c.declare("a", 1i64, false, "", None).unwrap();
        c.declare("b", 2i64, false, "", None).unwrap();
        assert_eq!(a.hash(), c.hash());
    }

    #[test]
    fn snapshot_round_trips_through_serde() {
        let mut m = OptionMap::new();
        m.declare("tol", 1e-6, false, "", None).unwrap();
        let snap = m.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: OptionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }

    #[test]
    fn hashable_value_is_accessible_via_trait() {
        // sanity: Value must implement Hashable for OptionMap::hash to compile
        let v = Value::Int(1);
        let mut archive = HashableArchive::new();
        v.feed(&mut archive);
        let _ = archive.finish();
    }
}

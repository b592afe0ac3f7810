//! Type-erased heterogeneous keyed container (spec §4.2), underlying both
//! [`crate::option::OptionMap`] and per-call scratch data. Keys are unique;
//! copies are always deep.

use std::collections::BTreeMap;

use crate::error::{PulsarError, Result};
use crate::value::{Value, ValueTag};

/// One stored entry: the live value plus its shape tag. The tag is
/// redundant with `Value::tag()` but kept explicit per DESIGN NOTES §9 —
/// an entry's "runtime type" is a first-class, inspectable field rather
/// than something recovered by matching on the value every time.
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    pub value: Value,
}

impl PropertyEntry {
    pub fn new(value: Value) -> Self {
        PropertyEntry { value }
    }

    pub fn tag(&self) -> ValueTag {
        self.value.tag()
    }
}

impl PartialEq for PropertyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// A map from string keys to type-erased [`PropertyEntry`] values.
///
/// Internally a [`BTreeMap`] rather than a literal insertion-ordered map:
/// spec §4.2 says insertion order is irrelevant for lookup, but `keys()`
/// must still return *some* deterministic order. The original `PropertyMap`
/// is a `std::map` (key-sorted iteration); Pulsar follows that rather than
/// tracking insertion order separately (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyEntry>,
}

impl PropertyBag {
    pub fn new() -> Self {
        PropertyBag::default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Keys in sorted order (see struct docs for why this is not literal
    /// insertion order).
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(PulsarError::duplicate_key(key));
        }
        self.entries.insert(key, PropertyEntry::new(value.into()));
        Ok(())
    }

    pub fn replace(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| PulsarError::unknown_key(key))?;
        if entry.tag() != value.tag() {
            return Err(PulsarError::type_mismatch(format!(
                "key '{key}' holds {} but replacement is {}",
                entry.tag().name(),
                value.tag().name()
            )));
        }
        entry.value = value;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .map(|e| &e.value)
            .ok_or_else(|| PulsarError::unknown_key(key))
    }

    pub fn erase(&mut self, key: &str) -> usize {
        if self.entries.remove(key).is_some() {
            1
        } else {
            0
        }
    }
}

/// Extract a concrete Rust type out of a [`Value`]. Implemented for every
/// supported scalar/sequence shape; extending the set of storable shapes
/// only requires a new `impl` here, per DESIGN NOTES §9.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
    fn expected_tag() -> ValueTag;
}

macro_rules! impl_from_value {
    ($t:ty, $variant:ident, $tag:ident) => {
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(PulsarError::type_mismatch(format!(
                        "expected {}, found {}",
                        ValueTag::$tag.name(),
                        other.tag().name()
                    ))),
                }
            }
            fn expected_tag() -> ValueTag {
                ValueTag::$tag
            }
        }
    };
}

impl_from_value!(bool, Bool, Bool);
impl_from_value!(i64, Int, Int);
impl_from_value!(f64, Float, Float);
impl_from_value!(String, Str, Str);
impl_from_value!(Vec<bool>, BoolSeq, BoolSeq);
impl_from_value!(Vec<i64>, IntSeq, IntSeq);
impl_from_value!(Vec<f64>, FloatSeq, FloatSeq);
impl_from_value!(Vec<String>, StrSeq, StrSeq);

impl PropertyBag {
    /// Typed accessor returning a deep copy (spec §4.2 `get_as<T>`).
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T> {
        let value = self.get(key)?;
        T::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_as_round_trips() {
        let mut bag = PropertyBag::new();
        bag.insert("message", "hello").unwrap();
        bag.insert("count", 3i64).unwrap();
        assert_eq!(bag.get_as::<String>("message").unwrap(), "hello");
        assert_eq!(bag.get_as::<i64>("count").unwrap(), 3);
    }

    #[test]
    fn duplicate_insert_fails() {
        let mut bag = PropertyBag::new();
        bag.insert("x", 1i64).unwrap();
        assert!(matches!(
            bag.insert("x", 2i64),
            Err(PulsarError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn replace_requires_matching_shape() {
        let mut bag = PropertyBag::new();
        bag.insert("x", 1i64).unwrap();
        assert!(matches!(
            bag.replace("x", "oops"),
            Err(PulsarError::TypeMismatch { .. })
        ));
        bag.replace("x", 2i64).unwrap();
        assert_eq!(bag.get_as::<i64>("x").unwrap(), 2);
    }

    #[test]
    fn unknown_key_errors_on_get_and_replace() {
        let bag = PropertyBag::new();
        assert!(matches!(
            bag.get_as::<i64>("missing"),
            Err(PulsarError::UnknownKey { .. })
        ));
    }

    #[test]
    fn erase_reports_count() {
        let mut bag = PropertyBag::new();
        bag.insert("x", 1i64).unwrap();
        assert_eq!(bag.erase("x"), 1);
        assert_eq!(bag.erase("x"), 0);
    }

    #[test]
    fn keys_are_sorted() {
        let mut bag = PropertyBag::new();
        bag.insert("zeta", 1i64).unwrap();
        bag.insert("alpha", 2i64).unwrap();
        assert_eq!(bag.keys(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn deep_clone_does_not_alias() {
        let mut bag = PropertyBag::new();
        bag.insert("x", 1i64).unwrap();
        let mut clone = bag.clone();
        clone.replace("x", 2i64).unwrap();
        assert_eq!(bag.get_as::<i64>("x").unwrap(), 1);
        assert_eq!(clone.get_as::<i64>("x").unwrap(), 2);
    }
}

//! The explicit value-tag enumeration backing [`crate::property::PropertyBag`]
//! and [`crate::option::OptionMap`]. Per DESIGN NOTES §9 this replaces any
//! reliance on compiler-emitted RTTI names: every supported shape is a named
//! variant, and hashing/cloning/equality fall out of plain `derive`s.

use pulsar_hash::{Hashable, HashableArchive};
use serde::{Deserialize, Serialize};

/// A scalar or ordered-sequence value of one of the shapes the module
/// runtime understands natively. Additional shapes are out of scope for the
/// core (spec §1): a host that needs to cache an opaque domain artifact
/// hashes it through its own `Hashable` impl and stores a reference/
/// identifier here rather than the core inventing a type-erased escape hatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    BoolSeq(Vec<bool>),
    IntSeq(Vec<i64>),
    FloatSeq(Vec<f64>),
    StrSeq(Vec<String>),
}

/// The shape of a [`Value`], independent of its payload. Used to check that
/// a newly set value matches a declared default's shape (spec §3 invariant:
/// `value.tag == default_value.tag` always).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Bool,
    Int,
    Float,
    Str,
    BoolSeq,
    IntSeq,
    FloatSeq,
    StrSeq,
}

impl ValueTag {
    pub fn name(&self) -> &'static str {
        match self {
            ValueTag::Bool => "bool",
            ValueTag::Int => "i64",
            ValueTag::Float => "f64",
            ValueTag::Str => "string",
            ValueTag::BoolSeq => "bool[]",
            ValueTag::IntSeq => "i64[]",
            ValueTag::FloatSeq => "f64[]",
            ValueTag::StrSeq => "string[]",
        }
    }
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Bool(_) => ValueTag::Bool,
            Value::Int(_) => ValueTag::Int,
            Value::Float(_) => ValueTag::Float,
            Value::Str(_) => ValueTag::Str,
            Value::BoolSeq(_) => ValueTag::BoolSeq,
            Value::IntSeq(_) => ValueTag::IntSeq,
            Value::FloatSeq(_) => ValueTag::FloatSeq,
            Value::StrSeq(_) => ValueTag::StrSeq,
        }
    }
}

/// Value equality is by-payload, not by identity. Floats compare bit-for-bit
/// via their hash feed below, but for ordinary equality we fall back to
/// `PartialEq` on the payload — NaN-bearing option values are not a case
/// this runtime needs to treat specially.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::BoolSeq(a), Value::BoolSeq(b)) => a == b,
            (Value::IntSeq(a), Value::IntSeq(b)) => a == b,
            (Value::FloatSeq(a), Value::FloatSeq(b)) => a == b,
            (Value::StrSeq(a), Value::StrSeq(b)) => a == b,
            _ => false,
        }
    }
}

impl Hashable for Value {
    fn feed(&self, archive: &mut HashableArchive) {
        // Feed a leading tag discriminant so that e.g. an empty IntSeq and
        // an empty StrSeq never collide.
        archive.feed_u64(self.tag() as u64);
        match self {
            Value::Bool(v) => archive.feed_bool(*v),
            Value::Int(v) => archive.feed_i64(*v),
            Value::Float(v) => archive.feed_f64(*v),
            Value::Str(v) => archive.feed_str(v),
            Value::BoolSeq(v) => {
                archive.feed_u64(v.len() as u64);
                for b in v {
                    archive.feed_bool(*b);
                }
            }
            Value::IntSeq(v) => archive.feed_seq(v),
            Value::FloatSeq(v) => {
                archive.feed_u64(v.len() as u64);
                for f in v {
                    archive.feed_f64(*f);
                }
            }
            Value::StrSeq(v) => archive.feed_seq(v),
        }
    }
}

macro_rules! from_scalar {
    ($t:ty, $variant:ident) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        }
    };
}

from_scalar!(bool, Bool);
from_scalar!(i64, Int);
from_scalar!(f64, Float);
from_scalar!(String, Str);
from_scalar!(Vec<bool>, BoolSeq);
from_scalar!(Vec<i64>, IntSeq);
from_scalar!(Vec<f64>, FloatSeq);
from_scalar!(Vec<String>, StrSeq);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_shape() {
        assert_eq!(Value::from(true).tag(), ValueTag::Bool);
        assert_eq!(Value::from(1i64).tag(), ValueTag::Int);
        assert_eq!(Value::from(vec![1i64, 2]).tag(), ValueTag::IntSeq);
    }

    #[test]
    fn distinct_shapes_hash_differently_even_when_empty() {
        let empty_int: Value = Value::IntSeq(vec![]);
        let empty_str: Value = Value::StrSeq(vec![]);
        let mut a = HashableArchive::new();
        empty_int.feed(&mut a);
        let mut b = HashableArchive::new();
        empty_str.feed(&mut b);
        assert_ne!(a.finish(), b.finish());
    }
}

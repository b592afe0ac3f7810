//! Shared data model for the Pulsar module runtime: the value-tag
//! enumeration, `PropertyBag`, `OptionMap`, `ModuleInfo`, their wire
//! layouts, and the crate-wide error taxonomy.

pub mod error;
pub mod info;
pub mod option;
pub mod property;
pub mod value;
pub mod wire;

pub use error::{PulsarError, Result};
pub use info::ModuleInfo;
pub use option::{OptionEntry, OptionMap, OptionSnapshot, OptionValidationReport, Validator};
pub use property::{FromValue, PropertyBag, PropertyEntry};
pub use value::{Value, ValueTag};

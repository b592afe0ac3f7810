use std::fmt;

/// Raised when a value cannot be fed into a [`crate::HashableArchive`] —
/// a programmer error (an attempt to hash an unserializable shape), not an
/// expected runtime outcome.
#[derive(Debug, Clone)]
pub struct SerializationError {
    pub what: String,
}

impl SerializationError {
    pub fn new(what: impl Into<String>) -> Self {
        SerializationError { what: what.into() }
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialization error: {}", self.what)
    }
}

impl std::error::Error for SerializationError {}

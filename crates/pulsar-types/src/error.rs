//! The crate-wide error taxonomy (spec §7), mirroring `BPModuleException`'s
//! append-only context list (`original_source/BPModule/core/Exception.hpp`).
//! Every variant carries `context: Vec<(String, String)>`; framework code
//! appends to it as an error propagates up through [`crate::dispatch`]-style
//! wrapping points, rather than constructing a fresh error at each layer.

use thiserror::Error;

/// One `(key, value)` context pair, rendered as an indented line under the
/// short message (spec §7 "User-visible behavior").
pub type ContextPairs = Vec<(String, String)>;

#[derive(Debug, Error)]
pub enum PulsarError {
    #[error("unknown key: {key}")]
    UnknownKey { key: String, context: ContextPairs },

    #[error("duplicate key: {key}")]
    DuplicateKey { key: String, context: ContextPairs },

    #[error("type mismatch: {message}")]
    TypeMismatch {
        message: String,
        context: ContextPairs,
    },

    #[error("module type mismatch: {message}")]
    ModuleTypeMismatch {
        message: String,
        context: ContextPairs,
    },

    #[error("supermodule load error: {message}")]
    SupermoduleLoadError {
        message: String,
        context: ContextPairs,
    },

    #[error("module load error: {message}")]
    ModuleLoadError {
        message: String,
        context: ContextPairs,
    },

    #[error("module execution error: {message}")]
    ModuleExecutionError {
        message: String,
        context: ContextPairs,
    },

    #[error("serialization error: {message}")]
    SerializationError {
        message: String,
        context: ContextPairs,
    },

    #[error("not found: {key}")]
    NotFound { key: String, context: ContextPairs },

    #[error("option validation failed: {failures:?}")]
    OptionValidationError {
        failures: Vec<(String, String)>,
        context: ContextPairs,
    },
}

impl PulsarError {
    pub fn unknown_key(key: impl Into<String>) -> Self {
        PulsarError::UnknownKey {
            key: key.into(),
            context: Vec::new(),
        }
    }

    pub fn duplicate_key(key: impl Into<String>) -> Self {
        PulsarError::DuplicateKey {
            key: key.into(),
            context: Vec::new(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        PulsarError::TypeMismatch {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn module_type_mismatch(message: impl Into<String>) -> Self {
        PulsarError::ModuleTypeMismatch {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn supermodule_load_error(message: impl Into<String>) -> Self {
        PulsarError::SupermoduleLoadError {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn module_load_error(message: impl Into<String>) -> Self {
        PulsarError::ModuleLoadError {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn module_execution_error(message: impl Into<String>) -> Self {
        PulsarError::ModuleExecutionError {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn serialization_error(message: impl Into<String>) -> Self {
        PulsarError::SerializationError {
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        PulsarError::NotFound {
            key: key.into(),
            context: Vec::new(),
        }
    }

    pub fn option_validation_error(failures: Vec<(String, String)>) -> Self {
        PulsarError::OptionValidationError {
            failures,
            context: Vec::new(),
        }
    }

    /// Mutable access to this error's context list, for appending
    /// `(key, value)` pairs as the error is rethrown up the call stack.
    pub fn context_mut(&mut self) -> &mut ContextPairs {
        match self {
            PulsarError::UnknownKey { context, .. }
            | PulsarError::DuplicateKey { context, .. }
            | PulsarError::TypeMismatch { context, .. }
            | PulsarError::ModuleTypeMismatch { context, .. }
            | PulsarError::SupermoduleLoadError { context, .. }
            | PulsarError::ModuleLoadError { context, .. }
            | PulsarError::ModuleExecutionError { context, .. }
            | PulsarError::SerializationError { context, .. }
            | PulsarError::NotFound { context, .. }
            | PulsarError::OptionValidationError { context, .. } => context,
        }
    }

    pub fn context(&self) -> &[(String, String)] {
        match self {
            PulsarError::UnknownKey { context, .. }
            | PulsarError::DuplicateKey { context, .. }
            | PulsarError::TypeMismatch { context, .. }
            | PulsarError::ModuleTypeMismatch { context, .. }
            | PulsarError::SupermoduleLoadError { context, .. }
            | PulsarError::ModuleLoadError { context, .. }
            | PulsarError::ModuleExecutionError { context, .. }
            | PulsarError::SerializationError { context, .. }
            | PulsarError::NotFound { context, .. }
            | PulsarError::OptionValidationError { context, .. } => context,
        }
    }

    /// Append one `(key, value)` context pair and return `self`, for
    /// fluent use at a `.map_err(|e| e.with_context(...))` call site.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().push((key.into(), value.into()));
        self
    }

    /// The full rendered form: short message, then one indented `key: value`
    /// line per context pair (spec §7 "User-visible behavior").
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        for (k, v) in self.context() {
            out.push_str(&format!("\n    {k}: {v}"));
        }
        out
    }
}

impl From<pulsar_hash::SerializationError> for PulsarError {
    fn from(e: pulsar_hash::SerializationError) -> Self {
        PulsarError::serialization_error(e.what)
    }
}

pub type Result<T> = std::result::Result<T, PulsarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_indents_context_pairs() {
        let e = PulsarError::unknown_key("foo")
            .with_context("id", "3")
            .with_context("name", "Echo");
        let rendered = e.render();
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "unknown key: foo");
        assert_eq!(lines.next().unwrap(), "    id: 3");
        assert_eq!(lines.next().unwrap(), "    name: Echo");
    }
}

//! The implementation-holder abstraction (spec §4.10): every instance a
//! factory produces is wrapped in one of two shapes, native or scripted,
//! behind one uniform interface.

use std::any::Any;
use std::sync::Arc;

/// The minimal uniform surface the runtime itself needs from a native
/// module instance: the ability to downcast to whatever concrete
/// interface (`EnergyMethod`, etc.) a caller requested. Domain-specific
/// virtuals live entirely on the concrete type implementing this trait —
/// they are out of scope for the core (spec §1).
pub trait ModuleObject: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Blanket impl so any `Any + Send` type can be used as a native module
/// instance without writing the boilerplate twice.
impl<T: Any + Send> ModuleObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The scripted-side counterpart. `pulsar-script` provides the concrete
/// implementation (a trampoline wrapping a `Py<PyAny>`); `pulsar-loader`
/// only needs the downcast/identity surface to keep this crate free of a
/// hard `pyo3` dependency (DESIGN NOTES §9: "a pair of tagged variants
/// behind one interface").
pub trait ScriptedObject: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn class_name(&self) -> &str;
    /// Invoke a named method on the underlying scripted object with
    /// JSON-shaped arguments, returning a JSON-shaped result. This is the
    /// trampoline call surface `ModuleBase`'s dispatcher uses (spec §4.8,
    /// §4.10).
    fn call_method(&self, method: &str, args: serde_json::Value) -> pulsar_types::Result<serde_json::Value>;
}

/// A factory that produces a fresh native module instance given its id
/// (spec §4.5: "given an unsigned 64-bit id, produce a fresh module
/// instance wrapped in an implementation holder").
pub type NativeFactory = Arc<dyn Fn(u64) -> Box<dyn ModuleObject> + Send + Sync>;

/// A factory that produces a fresh scripted module instance given its id.
/// Fallible: a scripted class whose `__init__` raises must surface as a
/// `ModuleLoadError`/`ModuleExecutionError`, not a panic.
pub type ScriptedFactory = Arc<dyn Fn(u64) -> pulsar_types::Result<Box<dyn ScriptedObject>> + Send + Sync>;

/// One entry in a [`crate::creators::ModuleCreators`] table: either a
/// compile-time-bound native factory or a runtime-bound scripted class.
#[derive(Clone)]
pub enum Creator {
    Native(NativeFactory),
    Scripted(ScriptedFactory),
}

/// The uniform wrapper produced by invoking a [`Creator`] (spec §4.10).
pub enum ModuleHolder {
    Native(Box<dyn ModuleObject>),
    Scripted(Box<dyn ScriptedObject>),
}

impl ModuleHolder {
    pub fn native_pointer(&self) -> Option<&dyn ModuleObject> {
        match self {
            ModuleHolder::Native(obj) => Some(obj.as_ref()),
            ModuleHolder::Scripted(_) => None,
        }
    }

    pub fn native_pointer_mut(&mut self) -> Option<&mut dyn ModuleObject> {
        match self {
            ModuleHolder::Native(obj) => Some(obj.as_mut()),
            ModuleHolder::Scripted(_) => None,
        }
    }

    pub fn scripted_object(&self) -> Option<&dyn ScriptedObject> {
        match self {
            ModuleHolder::Scripted(obj) => Some(obj.as_ref()),
            ModuleHolder::Native(_) => None,
        }
    }

    /// Dynamic check that the held instance satisfies interface `T` (spec
    /// §4.10 `is_type<T>`). Scripted instances satisfy any `T` that the
    /// trampoline is willing to answer for; since the core does not know
    /// domain interfaces, Pulsar treats every scripted holder as
    /// satisfying every `T` and leaves real type safety to the trampoline
    /// raising `ModuleExecutionError` on an unsupported call — this is the
    /// documented tradeoff of crossing the script boundary (see DESIGN.md).
    pub fn is_type<T: 'static>(&self) -> bool {
        match self {
            ModuleHolder::Native(obj) => obj.as_any().is::<T>(),
            ModuleHolder::Scripted(_) => true,
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.native_pointer().and_then(|o| o.as_any().downcast_ref::<T>())
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.native_pointer_mut()
            .and_then(|o| o.as_any_mut().downcast_mut::<T>())
    }
}

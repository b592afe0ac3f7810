//! Native supermodule loading, the module-class creator registry, and the
//! implementation-holder abstraction shared with scripted modules (spec
//! §4.4, §4.5, §4.10). The scripted loader variant lives in `pulsar-script`
//! (it needs `pyo3`); `pulsar-core`'s `ModuleManager` assembles both
//! loaders behind one facade, selecting by path suffix (spec §4.4).

pub mod creators;
pub mod module;
pub mod native;
pub mod record;

pub use creators::ModuleCreators;
pub use module::{Creator, ModuleHolder, ModuleObject, NativeFactory, ScriptedFactory, ScriptedObject};
pub use native::NativeLoader;
pub use record::{LoaderHandle, ScriptedHandle, SupermoduleRecord};

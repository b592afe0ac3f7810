//! `SupermoduleRecord` (spec §3): one loaded supermodule — its canonical
//! path, opaque loader handle, and creators table.

use std::path::PathBuf;

use crate::creators::ModuleCreators;

/// The opaque token returned by whichever loader opened this supermodule.
/// A native `libloading::Library` must stay alive for as long as any
/// factory closure resolved from it might still be called — dropping it
/// early would dangle every `NativeFactory` in the associated
/// `ModuleCreators` (spec §4.4 teardown ordering).
pub enum LoaderHandle {
    Native(libloading::Library),
    Scripted(ScriptedHandle),
}

/// A type-erased handle to an imported scripted package. `pulsar-script`
/// owns the concrete representation (a `Py<PyModule>`); this crate only
/// needs to keep it alive and drop it on teardown.
pub struct ScriptedHandle(pub Box<dyn std::any::Any + Send>);

pub struct SupermoduleRecord {
    pub path: PathBuf,
    pub handle: LoaderHandle,
    pub creators: ModuleCreators,
}

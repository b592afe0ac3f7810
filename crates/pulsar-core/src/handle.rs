//! `ModuleHandle<T>` (spec §4.7 `get_module`): the smart handle returned
//! by instantiation. On drop it marks its tree node free for reuse but
//! leaves the node — and its output transcript — in the tree (spec §2
//! "Data flow").

use std::marker::PhantomData;

use pulsar_loader::{ModuleHolder, ScriptedObject};
use pulsar_types::Result;

use crate::context::ModuleContext;

/// `T` is the concrete native module type the caller expects (spec §4.10
/// `is_type<T>`: Rust realizes "satisfies interface T" as "the underlying
/// concrete type downcasts to T" — there is no dynamic trait-object
/// downcast in safe Rust, so `T` names a struct, not a `dyn Trait`).
/// A handle produced from a scripted class always passes the `is_type`
/// check (pulsar-loader's documented tradeoff, see DESIGN.md); such a
/// handle's [`ModuleHandle::native`] is `None` and callers reach the
/// instance through [`ModuleHandle::scripted`] instead.
pub struct ModuleHandle<T: 'static> {
    holder: ModuleHolder,
    ctx: ModuleContext,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ModuleHandle<T> {
    pub(crate) fn new(holder: ModuleHolder, ctx: ModuleContext) -> Self {
        ModuleHandle {
            holder,
            ctx,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> u64 {
        self.ctx.id()
    }

    pub fn key(&self) -> String {
        self.ctx.key()
    }

    pub fn ctx(&self) -> &ModuleContext {
        &self.ctx
    }

    pub fn native(&self) -> Option<&T> {
        self.holder.downcast_ref::<T>()
    }

    pub fn native_mut(&mut self) -> Option<&mut T> {
        self.holder.downcast_mut::<T>()
    }

    pub fn scripted(&self) -> Option<&dyn ScriptedObject> {
        self.holder.scripted_object()
    }

    /// Invoke `op` on a scripted instance through its trampoline,
    /// error-wrapped with this module's identity (spec §4.8, §4.10). Not
    /// meaningful for a native handle — returns `NotFound` there, since a
    /// native module's operations are typed methods reached via
    /// [`ModuleHandle::native_mut`], not a by-name call surface.
    pub fn call(&self, op: &str, args: serde_json::Value) -> Result<serde_json::Value> {
        match self.scripted() {
            Some(scripted) => self.ctx.call_scripted(scripted, op, args),
            None => Err(pulsar_types::PulsarError::not_found(format!(
                "'{op}': handle does not hold a scripted instance"
            ))),
        }
    }
}

impl<T: 'static> Drop for ModuleHandle<T> {
    fn drop(&mut self) {
        if let Ok(manager) = self.ctx.manager() {
            manager.tree().mark_free(self.ctx.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ModuleManager;
    use pulsar_types::ModuleInfo;

    struct Echo {
        #[allow(dead_code)]
        id: u64,
    }

    #[test]
    fn drop_marks_tree_node_free() {
        let manager = ModuleManager::new();
        manager
            .register_native("Echo", ModuleInfo::new("Echo", "T", "<in-process>", "1.0"), |id| Echo { id })
            .unwrap();
        manager.enable_key("echo", "Echo").unwrap();
        let handle = manager.get_module::<Echo>("echo", 0).unwrap();
        let id = handle.id();
        assert!(manager.tree().with_node(id, |n| n.in_use()).unwrap());
        drop(handle);
        assert!(!manager.tree().with_node(id, |n| n.in_use()).unwrap());
    }
}

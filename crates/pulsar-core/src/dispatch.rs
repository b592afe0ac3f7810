//! The error-wrapping call dispatcher (spec §4.8, §7): every call from
//! framework code into a module's virtual operation goes through
//! [`call_wrapped`], which annotates any raised error with the raising
//! module's identity before rethrowing.
//!
//! Concrete domain interfaces (`EnergyMethod`, `SCFIterator`, ...) are out
//! of the core's scope (spec §1), so this dispatcher is a free function
//! any caller — a domain crate's trait-method wrapper, or
//! [`crate::context::ModuleContext::call_scripted`] on the scripted side —
//! wraps its own call with, rather than a method on some framework "base
//! class" (Rust has no inheritance to hang it from).

use pulsar_types::{PulsarError, Result};

use crate::context::ModuleContext;

/// Invoke `f`, and on failure attach `(id, key, name, version, from)`
/// context to the error before propagating it (spec §4.8, §7). `op` is the
/// short, human name of the operation being dispatched (the "function
/// tag" of spec §7); it becomes the `from` context value, formatted as
/// `[<id>] (<key>) <name> vN` — see spec §8 scenario 6.
pub fn call_wrapped<T>(ctx: &ModuleContext, op: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|e| wrap(ctx, op, e))
}

fn wrap(ctx: &ModuleContext, op: &str, err: PulsarError) -> PulsarError {
    let identity = ctx.identity_tag();
    let _ = op; // the op tag is folded into `identity` below; kept as a parameter for call sites to document intent.
    err.with_context("id", ctx.id().to_string())
        .with_context("key", ctx.key())
        .with_context("op", op)
        .with_context("from", identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ModuleManager;
    use pulsar_types::ModuleInfo;

    struct Bad;

    #[test]
    fn wraps_error_with_module_identity() {
        let manager = ModuleManager::new();
        manager
            .register_native("Bad", ModuleInfo::new("Bad", "T", "<in-process>", "1.0"), |_id| Bad)
            .unwrap();
        manager.enable_key("bad", "Bad").unwrap();
        let handle = manager.get_module::<Bad>("bad", 0).unwrap();
        let ctx = handle.ctx().clone();
        let err = call_wrapped(&ctx, "run", || -> Result<()> {
            Err(PulsarError::module_execution_error("boom"))
        })
        .unwrap_err();
        let rendered = err.render();
        assert!(rendered.contains("boom"));
        assert!(rendered.contains(&format!("[{}] (bad) Bad v1.0", ctx.id())));
    }
}

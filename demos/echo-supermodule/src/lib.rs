//! Demo native supermodule: a single module-class, `Echo`, that hands back
//! its `message` option prefixed by its instance id. Built as a cdylib so
//! it can be loaded with `pulsar_loader::NativeLoader`/the `pulsar` binary's
//! `--supermodule` flag, exercising the native half of spec §4.4's ABI
//! end to end. `demos/echo_scripted` is its Python counterpart.

use pulsar_loader::ModuleCreators;
use pulsar_types::ModuleInfo;

pub struct Echo {
    id: u64,
}

impl Echo {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn run(&self, message: &str) -> String {
        format!("[{}] {}", self.id, message)
    }
}

fn echo_info() -> ModuleInfo {
    let mut info = ModuleInfo::new("Echo", "EnergyMethod", env!("CARGO_MANIFEST_DIR"), "1.0");
    info.description = "Echoes its `message` option back, prefixed by its id.".to_string();
    info.authors = vec!["Pulsar demo".to_string()];
    info.options
        .declare("message", "hello", false, "text to echo back", None)
        .expect("declaring a fresh option never collides");
    info
}

/// Required entry point (spec §6 native ABI): returns the creators table
/// by value.
#[no_mangle]
pub extern "C" fn insert_supermodule() -> ModuleCreators {
    let creators = ModuleCreators::new();
    creators
        .add_native("Echo", echo_info(), |id| Echo { id })
        .expect("Echo is the only class this supermodule registers");
    creators
}

/// Optional lifecycle hook, called once before the first `insert_supermodule`.
#[no_mangle]
pub extern "C" fn initialize_supermodule() {
    tracing::info!("echo-supermodule initialized");
}

/// Optional lifecycle hook, called once at teardown.
#[no_mangle]
pub extern "C" fn finalize_supermodule() {
    tracing::info!("echo-supermodule finalized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_supermodule_registers_echo() {
        let creators = insert_supermodule();
        assert!(creators.has("Echo"));
        assert_eq!(creators.info("Echo").unwrap().name, "Echo");
        let holder = creators.create("Echo", 3).unwrap();
        assert_eq!(holder.downcast_ref::<Echo>().unwrap().run("hi"), "[3] hi");
    }
}

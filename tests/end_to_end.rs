//! The six end-to-end scenarios from spec §8, exercised against
//! in-process module-classes registered via `ModuleManager::register_native`
//! / `register_scripted`. Those two entry points share the same `ingest`
//! path `load_supermodule` uses (see `pulsar-core/src/manager.rs`), so
//! these scenarios cover the same semantics a real supermodule load would
//! without depending on a build-time `.so` artifact path. Driving an
//! actual on-disk supermodule load is `demos/echo-supermodule` (native)
//! and `demos/echo_scripted` (scripted), run manually via the `pulsar`
//! binary: `cargo run --bin pulsar -- --supermodule <path> --enable-key echo=Echo --dot`.

use std::sync::Arc;

use pulsar_core::ModuleManager;
use pulsar_types::{ModuleInfo, OptionMap, PulsarError};

struct Echo {
    #[allow(dead_code)]
    id: u64,
}

fn echo_info() -> ModuleInfo {
    let mut info = ModuleInfo::new("Echo", "EnergyMethod", "<in-process>", "1.0");
    info.options
        .declare("message", "hello", false, "a greeting", None)
        .unwrap();
    info
}

#[test]
fn scenario_1_smoke_load() {
    let manager = ModuleManager::new();
    manager
        .register_native("Echo", echo_info(), |id| Echo { id })
        .unwrap();
    manager.enable_key("echo", "Echo").unwrap();
    manager.test_all().unwrap();
    manager
        .tree()
        .with_node(1, |n| {
            assert_eq!(n.modulekey, "echo");
            assert_eq!(n.info.name, "Echo");
        })
        .unwrap();
}

#[test]
fn scenario_2_parent_child_ids() {
    let manager = ModuleManager::new();
    manager
        .register_native("Echo", echo_info(), |id| Echo { id })
        .unwrap();
    manager.enable_key("echo", "Echo").unwrap();

    let a = manager.get_module::<Echo>("echo", 0).unwrap();
    assert_eq!(a.id(), 1);
    let b = manager.get_module::<Echo>("echo", a.id()).unwrap();
    assert_eq!(b.id(), 2);

    manager
        .tree()
        .with_node(2, |n| assert_eq!(n.parent_id, 1))
        .unwrap();
    manager
        .tree()
        .with_node(1, |n| assert_eq!(n.children_ids(), vec![2]))
        .unwrap();
}

#[test]
fn scenario_3_option_mutation() {
    let manager = ModuleManager::new();
    manager
        .register_native("Echo", echo_info(), |id| Echo { id })
        .unwrap();
    manager.enable_key("echo", "Echo").unwrap();

    manager.change_option("echo", "message", "world").unwrap();
    let handle = manager.get_module::<Echo>("echo", 0).unwrap();
    let msg: String = handle.ctx().get_option("message").unwrap();
    assert_eq!(msg, "world");

    let before = manager.tree().len();
    let err = manager.change_option("echo", "message", 42i64);
    assert!(matches!(err, Err(PulsarError::TypeMismatch { .. })));
    // A rejected change_option never touches the tree (it doesn't even
    // allocate an id).
    assert_eq!(manager.tree().len(), before);
}

#[test]
fn scenario_4_cache_hit_and_tolerance_change() {
    let mut producer_opts = OptionMap::new();
    producer_opts.declare("tol", 1e-6, false, "", None).unwrap();
    producer_opts
        .declare("screening", true, false, "", None)
        .unwrap();

    let aux = pulsar_hash::hash_one(&"bs1,bs2".to_string());
    let cache = pulsar_cache::CacheData::new();
    cache.set(
        "ints",
        7i64,
        &producer_opts,
        aux,
        ModuleInfo::new("Ints", "T", "", "1.0"),
    );

    let mut consumer_opts = OptionMap::new();
    consumer_opts.declare("tol", 1e-6, false, "", None).unwrap();
    consumer_opts
        .declare("screening", false, false, "", None)
        .unwrap();
    let significant = vec!["tol".to_string()];
    assert!(cache.has_data("ints", &consumer_opts, &significant, aux));
    assert_eq!(
        cache
            .get::<i64>("ints", &consumer_opts, &significant, aux)
            .unwrap(),
        7
    );

    let mut drifted_tol = OptionMap::new();
    drifted_tol.declare("tol", 1e-8, false, "", None).unwrap();
    drifted_tol
        .declare("screening", false, false, "", None)
        .unwrap();
    assert!(!cache.has_data("ints", &drifted_tol, &significant, aux));
}

#[cfg(feature = "scripting")]
#[test]
fn scenario_5_dual_language_parent_child() {
    use pulsar_loader::{ScriptedFactory, ScriptedObject};
    use pyo3::prelude::*;

    struct Drive {
        #[allow(dead_code)]
        id: u64,
    }

    let manager = ModuleManager::new();
    manager
        .register_native("Drive", ModuleInfo::new("Drive", "Driver", "<in-process>", "1.0"), |id| Drive { id })
        .unwrap();
    manager.enable_key("drive", "Drive").unwrap();

    let worker_class: Py<PyAny> = Python::with_gil(|py| {
        let module = PyModule::from_code_bound(
            py,
            r#"
class Worker:
    def __init__(self, id):
        self.id = id
    def run(self, payload):
        return {"worked": payload, "id": self.id}
"#,
            "worker.py",
            "worker",
        )
        .unwrap();
        module.getattr("Worker").unwrap().unbind()
    });
    let factory: ScriptedFactory = Arc::new(move |id| {
        Python::with_gil(|py| {
            let wrapped = pulsar_script::ScriptedModule::instantiate(py, &worker_class, id)?;
            Ok(Box::new(wrapped) as Box<dyn ScriptedObject>)
        })
    });
    manager
        .register_scripted("Worker", ModuleInfo::new("Worker", "Worker", "<in-process>", "1.0"), factory)
        .unwrap();
    manager.enable_key("worker", "Worker").unwrap();

    let drive = manager.get_module::<Drive>("drive", 0).unwrap();
    let worker = drive.ctx().create_child::<()>("worker").unwrap();
    let result = worker.call("run", serde_json::json!("go")).unwrap();
    assert_eq!(result["worked"], serde_json::json!("go"));

    manager
        .tree()
        .with_node(worker.id(), |n| assert_eq!(n.parent_id, drive.id()))
        .unwrap();
}

#[cfg(feature = "scripting")]
#[test]
fn scenario_6_error_attribution() {
    use pulsar_loader::{ScriptedFactory, ScriptedObject};
    use pyo3::prelude::*;

    let manager = ModuleManager::new();
    let bad_class: Py<PyAny> = Python::with_gil(|py| {
        let module = PyModule::from_code_bound(
            py,
            r#"
class Bad:
    def __init__(self, id):
        self.id = id
    def run(self, payload):
        raise RuntimeError("boom")
"#,
            "bad.py",
            "bad",
        )
        .unwrap();
        module.getattr("Bad").unwrap().unbind()
    });
    let factory: ScriptedFactory = Arc::new(move |id| {
        Python::with_gil(|py| {
            let wrapped = pulsar_script::ScriptedModule::instantiate(py, &bad_class, id)?;
            Ok(Box::new(wrapped) as Box<dyn ScriptedObject>)
        })
    });
    manager
        .register_scripted("Bad", ModuleInfo::new("Bad", "T", "<in-process>", "1.0"), factory)
        .unwrap();
    manager.enable_key("bad", "Bad").unwrap();

    let handle = manager.get_module::<()>("bad", 0).unwrap();
    let err = handle.call("run", serde_json::json!(null)).unwrap_err();
    let rendered = err.render();
    assert!(rendered.contains("boom"));
    assert!(rendered.contains(&format!("[{}] (bad) Bad v1.0", handle.id())));
}

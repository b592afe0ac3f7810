//! The orchestration core of the Pulsar module runtime (spec §4.7-§4.11):
//! [`ModuleManager`] as the top-level façade, [`ModuleContext`] as the
//! Rust realization of `ModuleBase`, the [`ModuleHandle`] smart handle
//! instantiation returns, the error-wrapping call dispatcher, and the
//! tee'd output sink.

pub mod context;
pub mod dispatch;
pub mod handle;
pub mod manager;
pub mod output;

pub use context::ModuleContext;
pub use dispatch::call_wrapped;
pub use handle::ModuleHandle;
pub use manager::ModuleManager;
pub use output::TeeWriter;

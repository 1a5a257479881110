//! jsbridge - embedding boundary for a black-box JavaScript engine
//!
//! This crate is the lifecycle + protocol + marshalling layer around an
//! embedded script engine. The engine itself (parsing, GC, bytecode
//! execution) is an external collaborator reached through the
//! [`JsEngine`] trait; what lives here is everything that makes the
//! boundary safe and structured:
//!
//! - **VM lifecycle**: [`Vm`] creates instances with resource limits,
//!   preloads the JSON compatibility script, runs optional initializers,
//!   and guarantees release on any partial failure.
//! - **Command channel**: synchronous `define` (side effects) and `eval`
//!   (capture a value) dispatch, serialized per handle.
//! - **Value marshalling**: expressions are wrapped so the engine
//!   serializes its own result to JSON; payloads decode into
//!   [`serde_json::Value`], error payloads into [`ErrorRecord`].
//! - **Script cache**: [`ScriptCache`] avoids re-reading the bootstrap
//!   script per instance.
//!
//! # Example
//!
//! ```ignore
//! use jsbridge::{ScriptCache, Vm};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(my_engine::Engine::load()?);
//! let cache = ScriptCache::new();
//!
//! let vm = Vm::spawn_with_defaults(engine, &cache)?;
//! vm.define("function double(x) { return x * 2; }")?;
//! let value = vm.eval("double(21);")?;
//! assert_eq!(value, serde_json::json!(42));
//! vm.destroy();
//! ```

pub mod bootstrap;
pub mod cache;
mod channel;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod testing;
mod vm;

pub use cache::{FsLoader, ScriptCache, SourceLoader};
pub use engine::{
    EngineFault, InitError, JsEngine, ResourceLimits, DEFAULT_HEAP_MB, DEFAULT_THREAD_STACK_MB,
};
pub use error::{ErrorRecord, EvalError, FatalCause, SpawnError};
pub use marshal::ScriptSource;
pub use vm::Vm;

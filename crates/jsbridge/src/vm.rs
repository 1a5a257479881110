//! VM lifecycle management.
//!
//! [`Vm`] is the owning handle for one foreign engine instance. Spawning
//! either hands back a fully initialized handle (bootstrap script loaded,
//! optional initializer run) or no handle at all: every failure path
//! releases the instance before the error is returned, so a caller can
//! never observe a half-initialized VM.
//!
//! The handle is move-only. `destroy` consumes it, which makes
//! use-after-release and double release compile errors rather than
//! runtime conditions. No implicit finalization happens on drop;
//! releasing the engine instance is an explicit act.

use crate::bootstrap;
use crate::cache::ScriptCache;
use crate::channel;
use crate::engine::{JsEngine, ResourceLimits};
use crate::error::{EvalError, FatalCause, SpawnError};
use crate::marshal::ScriptSource;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Label used by [`Vm::define`] when the caller supplies none.
const DEFAULT_DEFINE_LABEL: &str = "unnamed";

/// Owning handle for one isolated engine instance.
///
/// Commands against a single handle are serialized by an internal lock:
/// at most one `define`/`eval` is in flight per instance, and each call
/// blocks its thread until the engine answers. Distinct handles are
/// fully independent and may be used concurrently.
///
/// There are no timeouts at this layer; an evaluation that never returns
/// blocks its caller indefinitely.
pub struct Vm<E: JsEngine> {
    engine: Arc<E>,
    instance: Mutex<E::Instance>,
    limits: ResourceLimits,
}

impl<E: JsEngine> Vm<E> {
    /// Create a bare instance with the given limits.
    ///
    /// No script is preloaded; `eval` results cannot be marshalled until
    /// a JSON-capable environment is defined into the instance. Most
    /// callers want [`Vm::spawn_with_defaults`] instead.
    pub fn spawn(engine: Arc<E>, limits: ResourceLimits) -> Result<Self, SpawnError> {
        let instance = engine.init(&limits)?;
        debug!(
            stack_mb = limits.thread_stack_mb,
            heap_mb = limits.heap_mb,
            "spawned engine instance"
        );
        Ok(Self {
            engine,
            instance: Mutex::new(instance),
            limits,
        })
    }

    /// Create an instance with default limits (8 MB stack, 8 MB heap)
    /// and load the JSON compatibility script into it.
    ///
    /// If the script cannot be read or fails to load, the instance is
    /// released before the error is returned.
    pub fn spawn_with_defaults(engine: Arc<E>, cache: &ScriptCache) -> Result<Self, SpawnError> {
        Self::spawn_bootstrapped(engine, cache, ResourceLimits::default())
    }

    /// [`Vm::spawn_with_defaults`] with explicit limits.
    pub fn spawn_bootstrapped(
        engine: Arc<E>,
        cache: &ScriptCache,
        limits: ResourceLimits,
    ) -> Result<Self, SpawnError> {
        let vm = Self::spawn(engine, limits)?;

        let script = match bootstrap::fetch(cache) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%err, "bootstrap script unreadable, releasing instance");
                vm.destroy();
                return Err(SpawnError::Io(err));
            }
        };

        if let Err(err) = vm.define_labeled(bootstrap::BOOTSTRAP_LABEL, script.to_vec()) {
            warn!(%err, "bootstrap script load failed, releasing instance");
            vm.destroy();
            return Err(SpawnError::Bootstrap(err));
        }

        Ok(vm)
    }

    /// Create a bootstrapped instance and run a caller-supplied
    /// initializer against it.
    ///
    /// Initializer failure is not an ordinary error: it means the
    /// embedding itself is misconfigured. The instance is released, the
    /// cause is logged, and [`SpawnError::Fatal`] is returned; callers
    /// must terminate the owning unit of work rather than handle it
    /// inline.
    pub fn spawn_with_initializer<F>(
        engine: Arc<E>,
        cache: &ScriptCache,
        limits: ResourceLimits,
        initializer: F,
    ) -> Result<Self, SpawnError>
    where
        F: FnOnce(&Vm<E>) -> Result<(), FatalCause>,
    {
        let vm = Self::spawn_bootstrapped(engine, cache, limits)?;

        if let Err(cause) = initializer(&vm) {
            error!(%cause, "VM initializer failed, releasing instance");
            vm.destroy();
            return Err(SpawnError::Fatal { cause });
        }

        Ok(vm)
    }

    /// Create a bootstrapped instance and define an initialization
    /// script into it. Equivalent to [`Vm::spawn_with_initializer`] with
    /// an initializer that defines `source`; failure is fatal.
    pub fn spawn_with_init_script(
        engine: Arc<E>,
        cache: &ScriptCache,
        limits: ResourceLimits,
        source: impl Into<ScriptSource>,
    ) -> Result<Self, SpawnError> {
        let source = source.into();
        Self::spawn_with_initializer(engine, cache, limits, move |vm| {
            vm.define(source).map_err(Into::into)
        })
    }

    /// Load and execute a script for side effects, under a default
    /// diagnostic label.
    pub fn define(&self, source: impl Into<ScriptSource>) -> Result<(), EvalError> {
        self.define_labeled(DEFAULT_DEFINE_LABEL, source)
    }

    /// Load and execute a script for side effects. `label` is advisory
    /// and appears only in diagnostics on failure.
    pub fn define_labeled(
        &self,
        label: &str,
        source: impl Into<ScriptSource>,
    ) -> Result<(), EvalError> {
        let bytes = source.into().resolve()?;
        let mut instance = self.instance.lock();
        channel::define(self.engine.as_ref(), &mut instance, label, &bytes)
    }

    /// Evaluate an expression and return its value as host-native JSON.
    ///
    /// Blocks until the engine answers. Script faults come back as
    /// [`EvalError::Script`] when the payload decodes to a structured
    /// record, [`EvalError::Raw`] otherwise.
    pub fn eval(&self, source: impl Into<ScriptSource>) -> Result<serde_json::Value, EvalError> {
        let bytes = source.into().resolve()?;
        let mut instance = self.instance.lock();
        channel::eval(self.engine.as_ref(), &mut instance, &bytes)
    }

    /// Release the engine instance.
    ///
    /// Consumes the handle, so the instance is released exactly once and
    /// cannot be used afterwards.
    pub fn destroy(self) {
        let Vm {
            engine, instance, ..
        } = self;
        engine.stop(instance.into_inner());
        debug!("engine instance stopped");
    }

    /// The limits this instance was created with.
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}

/// The handle is opaque; only the limits are printable. Engine instance
/// state never appears in debug output.
impl<E: JsEngine> fmt::Debug for Vm<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

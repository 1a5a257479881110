//! Foreign-engine capability interface.
//!
//! The embedded script engine is a black box to this crate. Everything it
//! must provide is captured by the [`JsEngine`] trait: create an isolated
//! instance with resource limits, execute source against it (optionally
//! returning a serialized value), and tear it down. The rest of the crate
//! is written against this seam, which is also what makes the boundary
//! protocol testable with [`crate::testing::MockEngine`].

use crate::error::ErrorRecord;
use thiserror::Error;

/// Default thread stack size for a new instance, in megabytes.
pub const DEFAULT_THREAD_STACK_MB: usize = 8;

/// Default heap size for a new instance, in megabytes.
pub const DEFAULT_HEAP_MB: usize = 8;

/// Resource limits applied to a foreign engine instance at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Thread stack size in megabytes.
    pub thread_stack_mb: usize,

    /// Heap size in megabytes.
    pub heap_mb: usize,
}

impl Default for ResourceLimits {
    /// 8 MB stack, 8 MB heap. These are the documented defaults used by
    /// [`crate::Vm::spawn_with_defaults`].
    fn default() -> Self {
        Self {
            thread_stack_mb: DEFAULT_THREAD_STACK_MB,
            heap_mb: DEFAULT_HEAP_MB,
        }
    }
}

impl ResourceLimits {
    /// Limits with an explicit stack and heap size, both in megabytes.
    pub fn new(thread_stack_mb: usize, heap_mb: usize) -> Self {
        Self {
            thread_stack_mb,
            heap_mb,
        }
    }
}

/// Instance creation failure reported by the engine.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct InitError(pub String);

/// Failure payload surfaced by the engine for a script fault.
///
/// Engines report faults either as text (which may itself be structured
/// JSON produced by the engine's own error serializer) or as an
/// already-decoded diagnostic record. The command channel decodes the
/// former and passes the latter through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineFault {
    /// Textual payload, possibly JSON.
    Text(String),

    /// Already-structured diagnostic record.
    Record(ErrorRecord),
}

/// One isolated, embeddable script engine.
///
/// Implementations wrap the native engine's C boundary (or an in-process
/// interpreter). All three operations are synchronous: they return only
/// once the engine has fully processed the request. The channel layer
/// guarantees at most one outstanding command per instance, so `eval`
/// receives the instance by exclusive reference.
pub trait JsEngine: Send + Sync + 'static {
    /// Opaque per-instance state owned by the VM handle.
    type Instance: Send;

    /// Create a new isolated instance with the given resource limits.
    fn init(&self, limits: &ResourceLimits) -> Result<Self::Instance, InitError>;

    /// Execute `source` against `instance`.
    ///
    /// `label` is advisory and used only for diagnostics. When
    /// `want_result` is true the engine returns the serialized result
    /// payload (JSON bytes); otherwise the source runs for side effects
    /// and `Ok(None)` is expected.
    fn eval(
        &self,
        instance: &mut Self::Instance,
        label: &str,
        source: &[u8],
        want_result: bool,
    ) -> Result<Option<Vec<u8>>, EngineFault>;

    /// Release `instance` and every native resource it holds.
    fn stop(&self, instance: Self::Instance);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_are_eight_megabytes() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.thread_stack_mb, 8);
        assert_eq!(limits.heap_mb, 8);
    }

    #[test]
    fn explicit_limits() {
        let limits = ResourceLimits::new(16, 32);
        assert_eq!(limits.thread_stack_mb, 16);
        assert_eq!(limits.heap_mb, 32);
    }
}

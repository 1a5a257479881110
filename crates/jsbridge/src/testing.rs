//! Test doubles for the engine and filesystem capabilities.
//!
//! [`MockEngine`] is a programmable stand-in for a native engine:
//! per-source canned replies, failure injection for `init` and `define`,
//! and creation/stop counters so tests can assert resource parity.
//! [`CountingLoader`] is an in-memory [`SourceLoader`] that counts reads.
//!
//! These live in the library (not behind `cfg(test)`) so downstream
//! embedders can exercise their own integration code against them.

use crate::cache::SourceLoader;
use crate::engine::{EngineFault, InitError, JsEngine, ResourceLimits};
use crate::error::ErrorRecord;
use crate::marshal;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Canned reply for one stubbed expression.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful eval returning this JSON payload.
    Value(String),

    /// Fault with a textual payload.
    FaultText(String),

    /// Fault with an already-structured record.
    FaultRecord(ErrorRecord),
}

/// Opaque instance state handed out by [`MockEngine`].
#[derive(Debug)]
pub struct MockInstance {
    id: usize,
}

impl MockInstance {
    /// Identifier of this instance, unique per engine.
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Programmable fake engine.
///
/// Unstubbed evals answer `null`; defines succeed unless a failure
/// marker is armed. All counters are monotonic.
#[derive(Default)]
pub struct MockEngine {
    replies: Mutex<HashMap<String, MockReply>>,
    define_fail_marker: Mutex<Option<String>>,
    fail_init: AtomicBool,
    inits: AtomicUsize,
    stops: AtomicUsize,
    defines: AtomicUsize,
    evals: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub the reply for evaluating `expression`. The expression is
    /// matched after marshalling, i.e. exactly what the engine would see.
    pub fn stub_eval(&self, expression: &str, reply: MockReply) {
        let wrapped = String::from_utf8(marshal::wrap_expression(expression.as_bytes()))
            .expect("wrapped expression is utf-8");
        self.replies.lock().insert(wrapped, reply);
    }

    /// Make every `init` call fail.
    pub fn fail_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }

    /// Make any `define` whose source contains `marker` fault with a
    /// structured JSON payload.
    pub fn fail_define_containing(&self, marker: &str) {
        *self.define_fail_marker.lock() = Some(marker.to_string());
    }

    /// Number of instances created.
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    /// Number of instances stopped.
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Instances currently alive (created minus stopped).
    pub fn live(&self) -> usize {
        self.inits() - self.stops()
    }

    /// Number of `define` commands dispatched.
    pub fn defines(&self) -> usize {
        self.defines.load(Ordering::SeqCst)
    }

    /// Number of `eval` commands dispatched.
    pub fn evals(&self) -> usize {
        self.evals.load(Ordering::SeqCst)
    }
}

impl JsEngine for MockEngine {
    type Instance = MockInstance;

    fn init(&self, _limits: &ResourceLimits) -> Result<MockInstance, InitError> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(InitError("mock engine init failure".to_string()));
        }
        let id = self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(MockInstance { id })
    }

    fn eval(
        &self,
        _instance: &mut MockInstance,
        _label: &str,
        source: &[u8],
        want_result: bool,
    ) -> Result<Option<Vec<u8>>, EngineFault> {
        let text = String::from_utf8_lossy(source).into_owned();

        if !want_result {
            self.defines.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.define_fail_marker.lock().as_deref() {
                if text.contains(marker) {
                    return Err(EngineFault::Text(
                        r#"{"message":"mock define failure","lineno":1}"#.to_string(),
                    ));
                }
            }
            return Ok(None);
        }

        self.evals.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().get(&text) {
            Some(MockReply::Value(payload)) => Ok(Some(payload.clone().into_bytes())),
            Some(MockReply::FaultText(payload)) => Err(EngineFault::Text(payload.clone())),
            Some(MockReply::FaultRecord(record)) => Err(EngineFault::Record(record.clone())),
            None => Ok(Some(b"null".to_vec())),
        }
    }

    fn stop(&self, _instance: MockInstance) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory loader with read-count instrumentation.
#[derive(Default)]
pub struct CountingLoader {
    files: HashMap<PathBuf, Vec<u8>>,
    reads: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file the loader will serve.
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        self.files.insert(path.into(), bytes);
        self
    }

    /// Shared handle to the read counter, usable after the loader has
    /// been moved into a cache.
    pub fn reads_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl SourceLoader for CountingLoader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_counters_track_lifecycle() {
        let engine = MockEngine::new();
        let limits = ResourceLimits::default();

        let a = engine.init(&limits).unwrap();
        let b = engine.init(&limits).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(engine.live(), 2);

        engine.stop(a);
        engine.stop(b);
        assert_eq!(engine.live(), 0);
        assert_eq!(engine.stops(), 2);
    }

    #[test]
    fn unstubbed_eval_answers_null() {
        let engine = MockEngine::new();
        let mut instance = engine.init(&ResourceLimits::default()).unwrap();
        let reply = engine
            .eval(&mut instance, "eval", b"JSON.stringify(1)", true)
            .unwrap();
        assert_eq!(reply, Some(b"null".to_vec()));
        engine.stop(instance);
    }

    #[test]
    fn armed_define_marker_faults() {
        let engine = MockEngine::new();
        engine.fail_define_containing("boom");
        let mut instance = engine.init(&ResourceLimits::default()).unwrap();

        assert!(engine
            .eval(&mut instance, "ok.js", b"var x = 1;", false)
            .is_ok());
        assert!(engine
            .eval(&mut instance, "bad.js", b"boom();", false)
            .is_err());
        engine.stop(instance);
    }
}

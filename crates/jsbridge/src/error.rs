//! Boundary error types.
//!
//! The taxonomy deliberately keeps four failure classes apart:
//! setup errors and evaluation errors are ordinary recoverable values,
//! I/O errors are surfaced distinctly from script faults, and initializer
//! failures are tagged [`SpawnError::Fatal`] with the caller contract
//! that they terminate the owning unit of work instead of being handled
//! inline.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

pub use crate::engine::InitError;

/// Cause carried by [`SpawnError::Fatal`].
pub type FatalCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured diagnostic record decoded from an engine error payload.
///
/// A string-keyed map of whatever fields the engine serialized
/// (typically `message`, `filename`, `lineno`). Accessors are provided
/// for the common fields; everything else is reachable via [`get`].
///
/// [`get`]: ErrorRecord::get
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(transparent)]
pub struct ErrorRecord {
    fields: Map<String, Value>,
}

impl ErrorRecord {
    /// Build a record from a decoded JSON value. Returns `None` unless
    /// the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Build a record directly from fields. Mainly useful for engines
    /// that produce structured faults natively, and for tests.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Look up an arbitrary diagnostic field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `message` field, if present and textual.
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }

    /// The `filename` field, if present and textual.
    pub fn file(&self) -> Option<&str> {
        self.fields.get("filename").and_then(Value::as_str)
    }

    /// The `lineno` field, if present and numeric.
    pub fn line(&self) -> Option<u64> {
        self.fields.get("lineno").and_then(Value::as_u64)
    }

    /// Whether the record carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(msg) => write!(f, "{}", msg),
            None => write!(f, "{}", Value::Object(self.fields.clone())),
        }
    }
}

/// Errors produced while creating a VM handle.
///
/// Every non-`Fatal` variant is recoverable and is always accompanied by
/// cleanup: if an engine instance was created before the failure, it has
/// been released by the time the error is returned.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The engine refused to create an instance.
    #[error("engine instance creation failed: {0}")]
    Init(#[from] InitError),

    /// Loading the JSON compatibility script into the fresh instance
    /// failed. The instance has already been released.
    #[error("bootstrap script load failed: {0}")]
    Bootstrap(#[source] EvalError),

    /// Reading the bootstrap script from disk failed. The instance has
    /// already been released.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A caller-supplied initializer reported failure.
    ///
    /// This indicates a misconfigured embedding, not a transient runtime
    /// fault. The instance has been released and the cause logged;
    /// callers are expected to tear down the owning unit of work rather
    /// than handle this variant inline.
    #[error("VM initializer failed: {cause}")]
    Fatal { cause: FatalCause },
}

impl SpawnError {
    /// True for the initializer-failure variant, which must not be
    /// handled as an ordinary error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpawnError::Fatal { .. })
    }
}

/// Errors produced by `define` and `eval` commands.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Script fault with a successfully decoded diagnostic record.
    #[error("script error: {0}")]
    Script(ErrorRecord),

    /// Script fault whose payload could not be decoded; the raw payload
    /// is passed through unchanged.
    #[error("script error: {0}")]
    Raw(String),

    /// Reading a file-backed script source failed. Kept distinct from
    /// evaluation faults so callers can tell a missing file from a
    /// broken script.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

//! Value marshalling across the engine boundary.
//!
//! Values never cross the boundary in the engine's native representation.
//! Outbound expressions are wrapped so the engine serializes its own
//! result to JSON (`JSON.stringify(<expr>)`), and inbound payloads are
//! decoded into host-native [`serde_json::Value`]s. This keeps value
//! transport format-agnostic: the host never inspects a native engine
//! value directly.

use crate::error::ErrorRecord;
use std::path::PathBuf;

/// Script source handed to `define`/`eval`: either inline bytes, or a
/// file path resolved to bytes before transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Inline source bytes.
    Inline(Vec<u8>),

    /// Path to a source file, read in full when the command is issued.
    File(PathBuf),
}

impl ScriptSource {
    /// Inline source from anything byte-like.
    pub fn inline(bytes: impl Into<Vec<u8>>) -> Self {
        ScriptSource::Inline(bytes.into())
    }

    /// File-backed source.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ScriptSource::File(path.into())
    }

    /// Resolve to raw bytes. A read failure surfaces as an I/O error,
    /// distinct from any evaluation error.
    pub(crate) fn resolve(self) -> std::io::Result<Vec<u8>> {
        match self {
            ScriptSource::Inline(bytes) => Ok(bytes),
            ScriptSource::File(path) => std::fs::read(path),
        }
    }
}

impl From<&str> for ScriptSource {
    fn from(source: &str) -> Self {
        ScriptSource::Inline(source.as_bytes().to_vec())
    }
}

impl From<String> for ScriptSource {
    fn from(source: String) -> Self {
        ScriptSource::Inline(source.into_bytes())
    }
}

impl From<Vec<u8>> for ScriptSource {
    fn from(source: Vec<u8>) -> Self {
        ScriptSource::Inline(source)
    }
}

impl From<&[u8]> for ScriptSource {
    fn from(source: &[u8]) -> Self {
        ScriptSource::Inline(source.to_vec())
    }
}

impl From<PathBuf> for ScriptSource {
    fn from(path: PathBuf) -> Self {
        ScriptSource::File(path)
    }
}

impl From<&std::path::Path> for ScriptSource {
    fn from(path: &std::path::Path) -> Self {
        ScriptSource::File(path.to_path_buf())
    }
}

/// Wrap an expression so the engine returns its result as a JSON string.
///
/// Trailing ASCII whitespace is trimmed and exactly one trailing
/// statement terminator (`;`) is stripped; an expression without one is
/// wrapped unchanged. Operates on raw bytes: source that is not valid
/// UTF-8 (a Latin-1 string literal, say) crosses the boundary untouched.
pub fn wrap_expression(source: &[u8]) -> Vec<u8> {
    let mut end = source.len();
    while end > 0 && source[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    if end > 0 && source[end - 1] == b';' {
        end -= 1;
    }

    let body = &source[..end];
    let mut wrapped = Vec::with_capacity(body.len() + "JSON.stringify()".len());
    wrapped.extend_from_slice(b"JSON.stringify(");
    wrapped.extend_from_slice(body);
    wrapped.push(b')');
    wrapped
}

/// Decode a successful eval payload into a host-native value.
pub fn decode_value(payload: &[u8]) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_slice(payload)
}

/// Decode a textual error payload into a structured record.
///
/// Only JSON objects qualify; anything else (arrays, bare strings,
/// non-JSON text) yields `None` and the caller falls back to the raw
/// payload.
pub fn decode_error(payload: &str) -> Option<ErrorRecord> {
    let value = serde_json::from_str(payload).ok()?;
    ErrorRecord::from_value(value)
}

//! Bootstrap script location and preloading.
//!
//! Every instance gets the JSON compatibility script defined into it
//! before user code runs; it provides the `JSON.stringify`/`JSON.parse`
//! support the marshaller relies on. The script ships with the crate
//! under `priv/` and is read through the [`ScriptCache`] so the disk is
//! touched at most once per process.

use crate::cache::ScriptCache;
use std::path::PathBuf;
use std::sync::Arc;

/// File name of the compatibility script.
pub const BOOTSTRAP_FILE: &str = "json_compat.js";

/// Environment variable overriding the directory the script is read
/// from. Takes precedence over the crate's own installation directory.
pub const PRIV_DIR_ENV: &str = "JSBRIDGE_PRIV_DIR";

/// Diagnostic label used when defining the script into an instance.
pub(crate) const BOOTSTRAP_LABEL: &str = BOOTSTRAP_FILE;

/// Resolve the path of the bootstrap script.
///
/// Tries the registered directory (`JSBRIDGE_PRIV_DIR`) first, then
/// falls back to the `priv/` directory of this crate's own location.
pub fn bootstrap_path() -> PathBuf {
    match std::env::var_os(PRIV_DIR_ENV) {
        Some(dir) => PathBuf::from(dir).join(BOOTSTRAP_FILE),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("priv")
            .join(BOOTSTRAP_FILE),
    }
}

/// Fetch the bootstrap script bytes through the cache.
pub(crate) fn fetch(cache: &ScriptCache) -> std::io::Result<Arc<[u8]>> {
    cache.fetch(&bootstrap_path())
}

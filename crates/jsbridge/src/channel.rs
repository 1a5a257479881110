//! Synchronous command dispatch to an engine instance.
//!
//! Two commands exist: `define` (load and execute for side effects, no
//! value captured) and `eval` (execute an expression and capture its
//! value). Both block until the engine answers, and every dispatch
//! yields exactly one of success, decoded error, or raw error.

use crate::engine::{EngineFault, JsEngine};
use crate::error::EvalError;
use crate::marshal;

/// Label attached to wrapped eval expressions for diagnostics.
const EVAL_LABEL: &str = "eval";

/// Load and execute `source` for side effects only.
pub(crate) fn define<E: JsEngine>(
    engine: &E,
    instance: &mut E::Instance,
    label: &str,
    source: &[u8],
) -> Result<(), EvalError> {
    match engine.eval(instance, label, source, false) {
        Ok(_) => Ok(()),
        Err(fault) => Err(decode_fault(fault)),
    }
}

/// Execute an expression and capture its value.
///
/// The expression is wrapped so the engine serializes its own result to
/// JSON before crossing the boundary; the payload is then decoded into a
/// host-native value.
pub(crate) fn eval<E: JsEngine>(
    engine: &E,
    instance: &mut E::Instance,
    source: &[u8],
) -> Result<serde_json::Value, EvalError> {
    let wrapped = marshal::wrap_expression(source);
    match engine.eval(instance, EVAL_LABEL, &wrapped, true) {
        Ok(Some(payload)) => marshal::decode_value(&payload)
            .map_err(|_| EvalError::Raw(String::from_utf8_lossy(&payload).into_owned())),
        // An engine that answers a value request with no payload
        // evaluated a void expression.
        Ok(None) => Ok(serde_json::Value::Null),
        Err(fault) => Err(decode_fault(fault)),
    }
}

/// Error decoding policy: textual payloads get one structured-decode
/// attempt and fall back to the raw text; structured faults pass through
/// unchanged.
fn decode_fault(fault: EngineFault) -> EvalError {
    match fault {
        EngineFault::Record(record) => EvalError::Script(record),
        EngineFault::Text(text) => match marshal::decode_error(&text) {
            Some(record) => EvalError::Script(record),
            None => EvalError::Raw(text),
        },
    }
}

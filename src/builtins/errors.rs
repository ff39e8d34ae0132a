//! Error construction: error
//!
//! `error` builds a catchable error value from the comma-joined string
//! forms of its arguments. Returning it raises: the evaluator treats the
//! error variant as a signal wherever it appears.

use super::{insert, Builtin};
use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

pub fn builtin_error(args: &[Value]) -> Result<Value, EvalError> {
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    Ok(Value::Error(rendered.join(", ")))
}

/// Register the error builtin.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "error", builtin_error);
}

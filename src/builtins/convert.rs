//! Conversions: str, int, float
//!
//! - `str`: the display form of any value
//! - `int`: parses a trimmed string, truncates a float, passes an integer
//! - `float`: parses a trimmed string, widens an integer, passes a float

use super::{insert, Builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::collections::HashMap;

/// String form of any value.
pub fn builtin_str(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }
    Ok(Value::String(args[0].to_string()))
}

pub fn builtin_int(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::String(value) => value
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| {
                EvalError::runtime(format!("cannot convert string \"{}\" to integer", value))
            }),
        Value::Float(value) => Ok(Value::Integer(*value as i64)),
        Value::Integer(value) => Ok(Value::Integer(*value)),
        other => Err(EvalError::type_mismatch(
            "int",
            "STRING, FLOAT, or INTEGER",
            other.type_name(),
        )),
    }
}

pub fn builtin_float(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::String(value) => value
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| {
                EvalError::runtime(format!("cannot convert string \"{}\" to float", value))
            }),
        Value::Float(value) => Ok(Value::Float(*value)),
        Value::Integer(value) => Ok(Value::Float(*value as f64)),
        other => Err(EvalError::type_mismatch(
            "float",
            "STRING, FLOAT, or INTEGER",
            other.type_name(),
        )),
    }
}

/// Register all conversion builtins.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "str", builtin_str);
    insert(registry, "int", builtin_int);
    insert(registry, "float", builtin_float);
}

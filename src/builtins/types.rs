//! Type predicates: isInt, isFloat, isBool, isString, isArray, isHash,
//! isFunction, isBuiltin, isCallable
//!
//! All take one argument and return a boolean. `isCallable` is true for
//! both user functions and builtins.

use super::{insert, Builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::collections::HashMap;

fn single(args: &[Value]) -> Result<&Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }
    Ok(&args[0])
}

pub fn builtin_is_int(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Integer(_))))
}

pub fn builtin_is_float(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Float(_))))
}

pub fn builtin_is_bool(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Boolean(_))))
}

pub fn builtin_is_string(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::String(_))))
}

pub fn builtin_is_array(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Array(_))))
}

pub fn builtin_is_hash(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Hash(_))))
}

pub fn builtin_is_function(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Function(_))))
}

pub fn builtin_is_builtin(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(single(args)?, Value::Builtin(_))))
}

pub fn builtin_is_callable(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Boolean(matches!(
        single(args)?,
        Value::Function(_) | Value::Builtin(_)
    )))
}

/// Register all type predicates.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "isInt", builtin_is_int);
    insert(registry, "isFloat", builtin_is_float);
    insert(registry, "isBool", builtin_is_bool);
    insert(registry, "isString", builtin_is_string);
    insert(registry, "isArray", builtin_is_array);
    insert(registry, "isHash", builtin_is_hash);
    insert(registry, "isFunction", builtin_is_function);
    insert(registry, "isBuiltin", builtin_is_builtin);
    insert(registry, "isCallable", builtin_is_callable);
}

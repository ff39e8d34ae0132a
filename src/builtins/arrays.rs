//! Array operations: first, last, rest, push, makeArray, copy, deepcopy
//!
//! `rest` and `push` are non-mutating: both hand back a fresh array.
//! `copy` and `deepcopy` accept any value but only arrays and hashes are
//! actually duplicated; scalars come back as-is.

use super::{insert, Builtin};
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::value::{HashPair, Value};
use std::collections::HashMap;

/// Returns the first element of a non-empty array.
pub fn builtin_first(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::Array(elements) => elements
            .borrow()
            .first()
            .cloned()
            .ok_or_else(|| EvalError::runtime("cannot get first element of an empty array")),
        other => Err(EvalError::type_mismatch("first", "ARRAY", other.type_name())),
    }
}

/// Returns the last element of a non-empty array.
pub fn builtin_last(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::Array(elements) => elements
            .borrow()
            .last()
            .cloned()
            .ok_or_else(|| EvalError::runtime("cannot get last element of an empty array")),
        other => Err(EvalError::type_mismatch("last", "ARRAY", other.type_name())),
    }
}

/// Returns a new array without the first element; errors on an empty array.
pub fn builtin_rest(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::Array(elements) => {
            let elements = elements.borrow();
            if elements.is_empty() {
                return Err(EvalError::runtime("cannot get rest of an empty array"));
            }
            Ok(Value::array(elements[1..].to_vec()))
        }
        other => Err(EvalError::type_mismatch("rest", "ARRAY", other.type_name())),
    }
}

/// Returns a new array with the element appended.
pub fn builtin_push(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity(ARITY_TWO, args.len()));
    }

    match &args[0] {
        Value::Array(elements) => {
            let mut appended = elements.borrow().clone();
            appended.push(args[1].clone());
            Ok(Value::array(appended))
        }
        other => Err(EvalError::type_mismatch("push", "ARRAY", other.type_name())),
    }
}

/// Builds an array of the given length, every slot pre-filled with the value.
pub fn builtin_make_array(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity(ARITY_TWO, args.len()));
    }

    let length = match &args[0] {
        Value::Integer(length) => *length,
        other => {
            return Err(EvalError::type_mismatch(
                "makeArray",
                "INTEGER",
                other.type_name(),
            ))
        }
    };
    if length < 0 {
        return Err(EvalError::runtime("makeArray: length must be >= 0"));
    }

    Ok(Value::array(vec![args[1].clone(); length as usize]))
}

/// Shallow copy: arrays and hashes get a fresh container sharing the same
/// element values; everything else passes through.
pub fn builtin_copy(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }
    Ok(shallow_copy(&args[0]))
}

/// Recursive copy of arrays and hashes.
pub fn builtin_deepcopy(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }
    Ok(deep_copy(&args[0]))
}

fn shallow_copy(value: &Value) -> Value {
    match value {
        Value::Array(elements) => Value::array(elements.borrow().clone()),
        Value::Hash(pairs) => Value::hash(pairs.borrow().clone()),
        _ => value.clone(),
    }
}

fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Array(elements) => {
            Value::array(elements.borrow().iter().map(deep_copy).collect())
        }
        Value::Hash(pairs) => {
            let copied: HashMap<_, _> = pairs
                .borrow()
                .iter()
                .map(|(key, pair)| {
                    (
                        *key,
                        HashPair {
                            key: pair.key.clone(),
                            value: deep_copy(&pair.value),
                        },
                    )
                })
                .collect();
            Value::hash(copied)
        }
        _ => value.clone(),
    }
}

/// Register all array builtins.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "first", builtin_first);
    insert(registry, "last", builtin_last);
    insert(registry, "rest", builtin_rest);
    insert(registry, "push", builtin_push);
    insert(registry, "makeArray", builtin_make_array);
    insert(registry, "copy", builtin_copy);
    insert(registry, "deepcopy", builtin_deepcopy);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array(values: &[i64]) -> Value {
        Value::array(values.iter().map(|v| Value::Integer(*v)).collect())
    }

    #[test]
    fn test_first_and_last() {
        let arr = int_array(&[1, 2, 3]);
        assert!(matches!(
            builtin_first(&[arr.clone()]),
            Ok(Value::Integer(1))
        ));
        assert!(matches!(builtin_last(&[arr]), Ok(Value::Integer(3))));

        let empty = int_array(&[]);
        assert!(builtin_first(&[empty.clone()]).is_err());
        assert!(builtin_last(&[empty]).is_err());
    }

    #[test]
    fn test_rest_is_non_mutating() {
        let arr = int_array(&[1, 2, 3]);
        let rest = builtin_rest(&[arr.clone()]).unwrap();
        assert_eq!(rest.to_string(), "[2, 3]");
        assert_eq!(arr.to_string(), "[1, 2, 3]");

        assert!(builtin_rest(&[int_array(&[])]).is_err());
    }

    #[test]
    fn test_push_is_non_mutating() {
        let arr = int_array(&[1]);
        let pushed = builtin_push(&[arr.clone(), Value::Integer(2)]).unwrap();
        assert_eq!(pushed.to_string(), "[1, 2]");
        assert_eq!(arr.to_string(), "[1]");
    }

    #[test]
    fn test_make_array() {
        let made = builtin_make_array(&[Value::Integer(3), Value::Integer(7)]).unwrap();
        assert_eq!(made.to_string(), "[7, 7, 7]");

        assert!(builtin_make_array(&[Value::Integer(-1), Value::Null]).is_err());
        assert!(builtin_make_array(&[Value::Null, Value::Null]).is_err());
    }

    #[test]
    fn test_copy_is_shallow() {
        let inner = int_array(&[1]);
        let outer = Value::array(vec![inner.clone()]);
        let copied = builtin_copy(&[outer.clone()]).unwrap();

        // The copied container is distinct ...
        assert!(!copied.identity_eq(&outer));
        // ... but still shares the nested array.
        if let (Value::Array(copy), Value::Array(_)) = (&copied, &outer) {
            assert!(copy.borrow()[0].identity_eq(&inner));
        } else {
            panic!("expected arrays");
        }
    }

    #[test]
    fn test_deepcopy_detaches_nested_values() {
        let inner = int_array(&[1]);
        let outer = Value::array(vec![inner.clone()]);
        let copied = builtin_deepcopy(&[outer]).unwrap();

        if let Value::Array(copy) = &copied {
            assert!(!copy.borrow()[0].identity_eq(&inner));
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn test_scalars_pass_through_copy() {
        assert!(matches!(
            builtin_copy(&[Value::Integer(5)]),
            Ok(Value::Integer(5))
        ));
        assert!(matches!(builtin_deepcopy(&[Value::Null]), Ok(Value::Null)));
    }

    #[test]
    fn test_arity_errors() {
        assert_eq!(
            builtin_first(&[]).unwrap_err().to_string(),
            "wrong number of arguments, want 1, got 0"
        );
        assert!(builtin_push(&[int_array(&[])]).is_err());
    }

    #[test]
    fn test_type_errors() {
        assert_eq!(
            builtin_first(&[Value::Integer(1)]).unwrap_err().to_string(),
            "first: expected ARRAY, got INTEGER"
        );
    }
}

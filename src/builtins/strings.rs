//! String operations: len, substring
//!
//! Both count code points, not bytes. `len` also measures arrays, so that
//! one builtin covers both sequence types. The `slice` helper backs both
//! `substring` and the evaluator's string indexing, keeping their bounds
//! checks identical.

use super::{insert, Builtin};
use crate::error::{EvalError, ARITY_ONE, ARITY_THREE};
use crate::value::Value;
use std::collections::HashMap;

/// Length of a string (in code points) or an array.
pub fn builtin_len(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }

    match &args[0] {
        Value::String(value) => Ok(Value::Integer(value.chars().count() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.borrow().len() as i64)),
        other => Err(EvalError::type_mismatch(
            "len",
            "STRING or ARRAY",
            other.type_name(),
        )),
    }
}

/// Half-open code-point slice `[start, end)` with validated bounds.
pub fn builtin_substring(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity(ARITY_THREE, args.len()));
    }

    let value = match &args[0] {
        Value::String(value) => value,
        other => {
            return Err(EvalError::type_mismatch(
                "substring",
                "STRING",
                other.type_name(),
            ))
        }
    };
    let start = match &args[1] {
        Value::Integer(start) => *start,
        other => {
            return Err(EvalError::type_mismatch(
                "substring",
                "INTEGER",
                other.type_name(),
            ))
        }
    };
    let end = match &args[2] {
        Value::Integer(end) => *end,
        other => {
            return Err(EvalError::type_mismatch(
                "substring",
                "INTEGER",
                other.type_name(),
            ))
        }
    };

    slice(value, start, end)
}

/// Shared slicing logic for `substring` and string indexing.
pub(crate) fn slice(value: &str, start: i64, end: i64) -> Result<Value, EvalError> {
    if start < 0 {
        return Err(EvalError::runtime("start index must be >= 0"));
    }
    let chars: Vec<char> = value.chars().collect();
    if end > chars.len() as i64 {
        return Err(EvalError::runtime("end index must be <= the string length"));
    }
    if end < start {
        return Err(EvalError::runtime("end index must be >= start index"));
    }
    Ok(Value::String(
        chars[start as usize..end as usize].iter().collect(),
    ))
}

/// Register all string builtins.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "len", builtin_len);
    insert(registry, "substring", builtin_substring);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_counts_code_points() {
        let result = builtin_len(&[Value::String("héllo".to_string())]).unwrap();
        assert!(matches!(result, Value::Integer(5)));

        let empty = builtin_len(&[Value::String(String::new())]).unwrap();
        assert!(matches!(empty, Value::Integer(0)));
    }

    #[test]
    fn test_len_on_arrays() {
        let arr = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(matches!(builtin_len(&[arr]), Ok(Value::Integer(2))));
    }

    #[test]
    fn test_len_rejects_other_types() {
        assert_eq!(
            builtin_len(&[Value::Integer(1)]).unwrap_err().to_string(),
            "len: expected STRING or ARRAY, got INTEGER"
        );
    }

    #[test]
    fn test_substring() {
        let s = Value::String("abc".to_string());
        let sub = builtin_substring(&[s.clone(), Value::Integer(0), Value::Integer(2)]).unwrap();
        assert_eq!(sub.to_string(), "ab");

        let whole =
            builtin_substring(&[s.clone(), Value::Integer(0), Value::Integer(3)]).unwrap();
        assert_eq!(whole.to_string(), "abc");

        let empty = builtin_substring(&[s, Value::Integer(1), Value::Integer(1)]).unwrap();
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn test_substring_bounds() {
        let s = Value::String("abc".to_string());
        assert!(builtin_substring(&[s.clone(), Value::Integer(2), Value::Integer(5)]).is_err());
        assert!(builtin_substring(&[s.clone(), Value::Integer(-1), Value::Integer(1)]).is_err());
        assert!(builtin_substring(&[s, Value::Integer(2), Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_substring_multibyte() {
        let s = Value::String("aé😀b".to_string());
        let sub = builtin_substring(&[s, Value::Integer(1), Value::Integer(3)]).unwrap();
        assert_eq!(sub.to_string(), "é😀");
    }

    #[test]
    fn test_substring_arity_and_types() {
        assert_eq!(
            builtin_substring(&[Value::String("a".to_string())])
                .unwrap_err()
                .to_string(),
            "wrong number of arguments, want 3, got 1"
        );
        assert!(builtin_substring(&[
            Value::String("a".to_string()),
            Value::Null,
            Value::Integer(1)
        ])
        .is_err());
    }
}

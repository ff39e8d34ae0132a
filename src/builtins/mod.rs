//! # Built-in Functions Module
//!
//! The fixed registry of host-provided functions, organized by category:
//!
//! - **[arrays]**: first, last, rest, push, makeArray, copy, deepcopy
//! - **[strings]**: len, substring
//! - **[console]**: print, println, readline
//! - **[convert]**: str, int, float
//! - **[types]**: isInt, isFloat, isBool, isString, isArray, isHash,
//!   isFunction, isBuiltin, isCallable
//! - **[errors]**: error
//!
//! Each category sub-module has a `register` function that inserts its
//! builtins into the process-wide map. The registry is immutable after first
//! access and is consulted by the evaluator only when environment lookup
//! fails, so user bindings shadow builtins.

use crate::error::EvalError;
use crate::value::Value;
use lazy_static::lazy_static;
use std::collections::HashMap;

pub mod arrays;
pub mod console;
pub mod convert;
pub mod errors;
pub mod strings;
pub mod types;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

/// One entry in the builtin registry.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

pub(crate) fn insert(
    registry: &mut HashMap<&'static str, Builtin>,
    name: &'static str,
    func: BuiltinFn,
) {
    registry.insert(name, Builtin { name, func });
}

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, Builtin> = {
        let mut registry = HashMap::new();
        arrays::register(&mut registry);
        strings::register(&mut registry);
        console::register(&mut registry);
        convert::register(&mut registry);
        types::register(&mut registry);
        errors::register(&mut registry);
        registry
    };
}

/// Resolves a builtin by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    REGISTRY.get(name)
}

/// Every registered builtin name (the REPL highlighter uses this).
pub fn names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

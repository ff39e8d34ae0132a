// ABOUTME: Runtime value model, including the internal control-flow signal variants

use crate::ast::Block;
use crate::builtins::Builtin;
use crate::env::Environment;
use crate::error::Diagnostic;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Every value the evaluator can produce.
///
/// Arrays and hashes are shared, interior-mutable references; all other user
/// values are value-semantic. `Return`, `Break`, `Continue`, `Error`, and
/// `ParserErrors` never reach user code directly — they are signals the
/// evaluator threads through recursion and consumes at function, loop, and
/// catch boundaries.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashMap<HashKey, HashPair>>>),
    Function(Rc<Function>),
    Builtin(&'static Builtin),
    Module(Rc<Module>),
    Return(Box<Value>),
    Break,
    Continue,
    Error(String),
    ParserErrors(Rc<Vec<Diagnostic>>),
}

/// A user-defined function closing over its defining environment.
#[derive(Debug)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Rc<Block>,
    pub env: Rc<Environment>,
}

/// A loaded module: its absolute path and top-level environment.
#[derive(Debug)]
pub struct Module {
    pub path: PathBuf,
    pub env: Rc<Environment>,
}

/// Identity of a hash entry: the key's variant tag plus a 64-bit digest,
/// so integers, booleans, and strings never collide across types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: HashKeyKind,
    pub digest: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKeyKind {
    Integer,
    Boolean,
    String,
}

/// A hash entry retains the original key value for iteration.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
        })
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn hash(pairs: HashMap<HashKey, HashPair>) -> Self {
        Value::Hash(Rc::new(RefCell::new(pairs)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Boolean(_) => "BOOL",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Module(_) => "MODULE",
            Value::Return(_) => "RETURN",
            Value::Break => "BREAK",
            Value::Continue => "CONTINUE",
            Value::Error(_) => "ERROR",
            Value::ParserErrors(_) => "PARSERERRORS",
        }
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    /// True for both catchable errors and parser-error bundles.
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_) | Value::ParserErrors(_))
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Value::Return(_))
    }

    pub fn is_break(&self) -> bool {
        matches!(self, Value::Break)
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Value::Continue)
    }

    /// The hash-key identity of a hashable value, or `None` for the rest.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey {
                kind: HashKeyKind::Integer,
                digest: *value as u64,
            }),
            Value::Boolean(value) => Some(HashKey {
                kind: HashKeyKind::Boolean,
                digest: u64::from(*value),
            }),
            Value::String(value) => Some(HashKey {
                kind: HashKeyKind::String,
                digest: fnv1a_64(value.as_bytes()),
            }),
            _ => None,
        }
    }

    /// Equality as `==` sees it: scalars by content, aggregates, functions,
    /// and modules by reference identity, distinct variants never equal.
    pub fn identity_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Float(value) => write!(f, "{:.6}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                let rendered: Vec<String> =
                    elements.borrow().iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Hash(pairs) => {
                let rendered: Vec<String> = pairs
                    .borrow()
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Function(function) => write!(
                f,
                "fun({}){}",
                function.parameters.join(", "),
                function.body
            ),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::Module(module) => write!(f, "{}", module.path.display()),
            Value::Return(value) => write!(f, "{}", value),
            Value::Break => write!(f, "break;"),
            Value::Continue => write!(f, "continue;"),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::ParserErrors(diagnostics) => {
                write!(f, "Parser errors:")?;
                for diagnostic in diagnostics.iter() {
                    write!(f, "\n{}", diagnostic)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_key() {
        let hello1 = Value::String("Hello World".to_string());
        let hello2 = Value::String("Hello World".to_string());
        let other = Value::String("Good bye".to_string());

        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), other.hash_key());
    }

    #[test]
    fn test_int_hash_key() {
        assert_eq!(Value::Integer(1).hash_key(), Value::Integer(1).hash_key());
        assert_ne!(Value::Integer(1).hash_key(), Value::Integer(2).hash_key());
    }

    #[test]
    fn test_bool_hash_key() {
        assert_eq!(
            Value::Boolean(true).hash_key(),
            Value::Boolean(true).hash_key()
        );
        assert_ne!(
            Value::Boolean(true).hash_key(),
            Value::Boolean(false).hash_key()
        );
    }

    #[test]
    fn test_hash_keys_never_collide_across_types() {
        // 1, true, and "1" all hash, but to distinct identities.
        let int_key = Value::Integer(1).hash_key().unwrap();
        let bool_key = Value::Boolean(true).hash_key().unwrap();
        let string_key = Value::String("1".to_string()).hash_key().unwrap();

        assert_ne!(int_key, bool_key);
        assert_ne!(int_key, string_key);
        assert_ne!(bool_key, string_key);
    }

    #[test]
    fn test_unhashable_values() {
        assert!(Value::Float(1.0).hash_key().is_none());
        assert!(Value::Null.hash_key().is_none());
        assert!(Value::array(vec![]).hash_key().is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(Value::array(vec![]).is_truthy());
        assert!(Value::hash(HashMap::new()).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Float(-2.5).to_string(), "-2.500000");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::String("hi".to_string()).to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::array(vec![Value::Integer(1), Value::Integer(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(Value::Error("boom".to_string()).to_string(), "ERROR: boom");
    }

    #[test]
    fn test_identity_eq() {
        let shared = Value::array(vec![Value::Integer(1)]);
        assert!(shared.identity_eq(&shared.clone()));
        assert!(!shared.identity_eq(&Value::array(vec![Value::Integer(1)])));

        assert!(Value::Integer(3).identity_eq(&Value::Integer(3)));
        assert!(!Value::Integer(3).identity_eq(&Value::Float(3.0)));
        assert!(Value::Null.identity_eq(&Value::Null));
    }
}

// ABOUTME: Lexically nested environments mapping names to values with const flags

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
struct Binding {
    value: Value,
    constant: bool,
}

/// One scope in the lexical chain.
///
/// Scopes are shared (`Rc`) because closures retain the environment they
/// were defined in; the name table is interior-mutable since evaluation is
/// single-threaded.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Binding>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new top-level environment with no outer scope.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// Creates a new scope nested inside `outer`.
    pub fn enclosing(outer: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    /// Looks a name up in this scope, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Mutates the nearest enclosing binding for `name`.
    ///
    /// Fails when that binding is const or when the name is unbound anywhere
    /// in the chain.
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.get_mut(name) {
            Some(binding) => {
                if binding.constant {
                    return false;
                }
                binding.value = value;
                true
            }
            None => {
                drop(bindings);
                match &self.outer {
                    Some(outer) => outer.set(name, value),
                    None => false,
                }
            }
        }
    }

    /// Binds a mutable name in this scope; fails if it already exists here.
    pub fn add(&self, name: &str, value: Value) -> bool {
        self.insert(name, value, false)
    }

    /// Binds a const name in this scope; fails if it already exists here.
    pub fn add_const(&self, name: &str, value: Value) -> bool {
        self.insert(name, value, true)
    }

    fn insert(&self, name: &str, value: Value, constant: bool) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return false;
        }
        bindings.insert(name.to_string(), Binding { value, constant });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let env = Environment::new();
        assert!(env.add("x", Value::Integer(42)));

        match env.get("x") {
            Some(Value::Integer(n)) => assert_eq!(n, 42),
            other => panic!("expected Integer(42), got {:?}", other),
        }
    }

    #[test]
    fn test_unbound_name() {
        let env = Environment::new();
        assert!(env.get("missing").is_none());
        assert!(!env.set("missing", Value::Integer(1)));
    }

    #[test]
    fn test_redefinition_in_same_scope_fails() {
        let env = Environment::new();
        assert!(env.add("x", Value::Integer(1)));
        assert!(!env.add("x", Value::Integer(2)));
        assert!(!env.add_const("x", Value::Integer(2)));
    }

    #[test]
    fn test_shadowing() {
        let outer = Environment::new();
        outer.add("x", Value::Integer(42));

        let inner = Environment::enclosing(outer.clone());
        assert!(inner.add("x", Value::Integer(100)));

        match inner.get("x") {
            Some(Value::Integer(n)) => assert_eq!(n, 100),
            other => panic!("expected Integer(100), got {:?}", other),
        }
        match outer.get("x") {
            Some(Value::Integer(n)) => assert_eq!(n, 42),
            other => panic!("expected Integer(42), got {:?}", other),
        }
    }

    #[test]
    fn test_set_walks_outward() {
        let outer = Environment::new();
        outer.add("x", Value::Integer(1));

        let inner = Environment::enclosing(outer.clone());
        assert!(inner.set("x", Value::Integer(2)));

        match outer.get("x") {
            Some(Value::Integer(n)) => assert_eq!(n, 2),
            other => panic!("expected Integer(2), got {:?}", other),
        }
    }

    #[test]
    fn test_const_cannot_be_set() {
        let env = Environment::new();
        env.add_const("a", Value::Integer(1));
        assert!(!env.set("a", Value::Integer(2)));

        // ... not even from a nested scope.
        let inner = Environment::enclosing(env.clone());
        assert!(!inner.set("a", Value::Integer(2)));

        match env.get("a") {
            Some(Value::Integer(n)) => assert_eq!(n, 1),
            other => panic!("expected Integer(1), got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.add("a", Value::Integer(1));

        let parent = Environment::enclosing(grandparent);
        parent.add("b", Value::Integer(2));

        let child = Environment::enclosing(parent);
        child.add("c", Value::Integer(3));

        for (name, expected) in [("a", 1), ("b", 2), ("c", 3)] {
            match child.get(name) {
                Some(Value::Integer(n)) => assert_eq!(n, expected),
                other => panic!("expected Integer({}), got {:?}", expected, other),
            }
        }
    }
}

// ABOUTME: End-to-end language scenarios driven through the library

use rill::env::Environment;
use rill::eval::Evaluator;
use rill::frontend;
use rill::value::Value;
use std::path::PathBuf;

fn run(source: &str) -> Value {
    let program = frontend::parse(source)
        .unwrap_or_else(|errors| panic!("parse errors: {:?}", errors));
    let env = Environment::new();
    let mut evaluator =
        Evaluator::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    evaluator.eval_program(&program, &env)
}

fn assert_int(source: &str, expected: i64) {
    match run(source) {
        Value::Integer(actual) => assert_eq!(actual, expected),
        other => panic!("expected Integer({}), got {:?}", expected, other),
    }
}

fn assert_string(source: &str, expected: &str) {
    match run(source) {
        Value::String(actual) => assert_eq!(actual, expected),
        other => panic!("expected String({:?}), got {:?}", expected, other),
    }
}

#[test]
fn test_object_style_hash_with_methods() {
    let source = r#"
    const create = fun(name) {
        let this = {};
        this.name = name;
        this.setName = fun(name) {
            this.name = name;
        };
        this.getName = fun() {
            return this.name;
        };
        return this;
    };
    let p = create("A");
    p.setName("B");
    p.getName();
    "#;
    assert_string(source, "B");
}

#[test]
fn test_range_loop_with_continue() {
    assert_int(
        "let a = 0; loop i in 0..10 { if i > 5 { continue; } a = a + i; } a;",
        15,
    );
}

#[test]
fn test_forever_loop_with_break() {
    assert_int(
        "let a = 0; loop forever { a = a + 1; if a > 4 { break; } } a;",
        5,
    );
}

#[test]
fn test_return_from_loop_in_immediate_call() {
    assert_int(
        "fun(a, b) { let c = a; loop forever { c = c + 1; if c > b { return c; } } }(1300, 1336);",
        1337,
    );
}

#[test]
fn test_reduce_via_recursion() {
    let source = r#"
    const reduce = fun(arr, acc, f) {
        if len(arr) == 0 {
            return acc;
        }
        return reduce(rest(arr), f(acc, first(arr)), f);
    };
    reduce([1, 2, 3, 4], 0, fun(a, b) { return a + b; });
    "#;
    assert_int(source, 10);
}

#[test]
fn test_map_via_recursion() {
    let source = r#"
    const map = fun(arr, f) {
        const walk = fun(arr, acc, f) {
            if len(arr) == 0 {
                return acc;
            }
            return walk(rest(arr), push(acc, f(first(arr))), f);
        };
        return walk(arr, [], f);
    };
    let doubled = map([1, 2, 3], fun(x) { return x * 2; });
    doubled[0] + doubled[1] + doubled[2];
    "#;
    assert_int(source, 12);
}

#[test]
fn test_try_catch_binds_error_message() {
    assert_string(
        "let a = 0; try { i; } catch e { a = e; } a;",
        "unknown identifier: i",
    );
}

#[test]
fn test_closure_capture_law() {
    assert_int(
        "let f = (fun(x) { return fun(y) { return x + y; }; })(2); f(3);",
        5,
    );
}

#[test]
fn test_const_immutability_law() {
    match run("const a = 1; a = 2;") {
        Value::Error(message) => assert_eq!(message, "cannot assign a"),
        other => panic!("expected error, got {:?}", other),
    }
    assert_int("let a = 1; a = 2;", 2);
}

#[test]
fn test_fibonacci_recursion() {
    let source = r#"
    const fib = fun(n) {
        if n < 2 {
            return n;
        }
        return fib(n - 1) + fib(n - 2);
    };
    fib(15);
    "#;
    assert_int(source, 610);
}

#[test]
fn test_shadowing_across_scopes_and_calls() {
    let source = r#"
    let x = 1;
    let f = fun(x) {
        let g = fun() {
            return x;
        };
        return g();
    };
    f(10) + x;
    "#;
    assert_int(source, 11);
}

#[test]
fn test_string_building_loop() {
    let source = r#"
    let out = "";
    loop c in ["a", "b", "c"] {
        out = out + c;
    }
    out + str(len(out));
    "#;
    assert_string(source, "abc3");
}

#[test]
fn test_nested_data_manipulation() {
    let source = r#"
    let table = {"rows": []};
    loop i in 0..3 {
        table.rows = push(table.rows, {"id": i, "square": i * i});
    }
    let total = 0;
    loop i, row in table.rows {
        total = total + row.square;
    }
    total;
    "#;
    assert_int(source, 5);
}

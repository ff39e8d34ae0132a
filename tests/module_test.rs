// ABOUTME: Module loader tests against real files — caching, cycles, path handling

use rill::env::Environment;
use rill::eval::Evaluator;
use rill::frontend;
use rill::value::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_module(dir: &Path, name: &str, source: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create module directory");
    }
    fs::write(path, source).expect("write module file");
}

fn run_in(dir: &Path, source: &str) -> Value {
    let mut evaluator = Evaluator::new(dir.to_path_buf());
    run_with(&mut evaluator, &Environment::new(), source)
}

fn run_with(evaluator: &mut Evaluator, env: &std::rc::Rc<Environment>, source: &str) -> Value {
    let program = frontend::parse(source)
        .unwrap_or_else(|errors| panic!("parse errors: {:?}", errors));
    evaluator.eval_program(&program, env)
}

fn assert_int(value: Value, expected: i64) {
    match value {
        Value::Integer(actual) => assert_eq!(actual, expected),
        other => panic!("expected Integer({}), got {:?}", expected, other),
    }
}

#[test]
fn test_import_binds_module_members() {
    let dir = TempDir::new().unwrap();
    write_module(
        dir.path(),
        "m.rill",
        "let x = 42; const twice = fun(a) { return a * 2; };",
    );

    let result = run_in(dir.path(), "import \"m.rill\" as m; m.x + m.twice(4);");
    assert_int(result, 50);
}

#[test]
fn test_same_path_imports_share_one_module() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "m.rill", "let data = {\"count\": 0};");

    // Mutations through one alias are visible through the other, so the
    // module's top-level code ran exactly once.
    let result = run_in(
        dir.path(),
        r#"
        import "m.rill" as a;
        import "m.rill" as b;
        a.data.count = 5;
        b.data.count;
        "#,
    );
    assert_int(result, 5);
}

#[test]
fn test_import_cycle_resolves_to_partial_module() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "a.rill", "import \"b.rill\" as b; let x = 1;");
    write_module(dir.path(), "b.rill", "import \"a.rill\" as a; let y = 2;");

    let result = run_in(dir.path(), "import \"a.rill\" as a; a.x + a.b.y;");
    assert_int(result, 3);
}

#[test]
fn test_cycle_member_defined_after_import_is_missing_in_partner() {
    let dir = TempDir::new().unwrap();
    // When b evaluates, a's `late` binding does not exist yet.
    write_module(
        dir.path(),
        "a.rill",
        "import \"b.rill\" as b; let late = 1;",
    );
    write_module(
        dir.path(),
        "b.rill",
        "import \"a.rill\" as a; let probe = a[\"late\"];",
    );

    let result = run_in(dir.path(), "import \"a.rill\" as a; a;");
    match result {
        Value::Error(message) => assert_eq!(message, "cannot find late in module"),
        other => panic!("expected error from cycle probe, got {:?}", other),
    }
}

#[test]
fn test_nested_relative_imports_resolve_against_module_dir() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "sub/inner.rill", "let v = 7;");
    write_module(
        dir.path(),
        "outer.rill",
        "import \"sub/inner.rill\" as inner; let v = inner.v;",
    );

    let result = run_in(dir.path(), "import \"outer.rill\" as outer; outer.v;");
    assert_int(result, 7);
}

#[test]
fn test_module_dir_is_restored_after_failed_import() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "bad.rill", "let = ;");
    write_module(dir.path(), "good.rill", "let x = 9;");

    let mut evaluator = Evaluator::new(dir.path().to_path_buf());
    let env = Environment::new();

    let failed = run_with(&mut evaluator, &env, "import \"bad.rill\" as bad;");
    assert!(matches!(failed, Value::ParserErrors(_)));

    // Relative resolution still works, so the directory was restored.
    let result = run_with(&mut evaluator, &env, "import \"good.rill\" as good; good.x;");
    assert_int(result, 9);
}

#[test]
fn test_parse_error_module_is_a_parser_errors_signal() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "bad.rill", "let = ;");

    let result = run_in(dir.path(), "import \"bad.rill\" as bad;");
    match result {
        Value::ParserErrors(errors) => {
            assert!(errors[0].to_string().contains("expected an identifier"));
        }
        other => panic!("expected ParserErrors, got {:?}", other),
    }
}

#[test]
fn test_missing_module_file() {
    let dir = TempDir::new().unwrap();
    let result = run_in(dir.path(), "import \"nope.rill\" as nope;");
    match result {
        Value::ParserErrors(errors) => {
            assert!(errors[0].to_string().contains("cannot read"));
        }
        other => panic!("expected ParserErrors, got {:?}", other),
    }
}

#[test]
fn test_unknown_module_member() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "m.rill", "let x = 1;");

    let result = run_in(dir.path(), "import \"m.rill\" as m; m.nope;");
    match result {
        Value::Error(message) => assert_eq!(message, "cannot find nope in module"),
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_alias_collision() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "m.rill", "let x = 1;");

    let result = run_in(dir.path(), "let m = 1; import \"m.rill\" as m;");
    match result {
        Value::Error(message) => {
            assert_eq!(message, "cannot define module with this name, it is already taken")
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_module_assignments_are_rejected() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "m.rill", "let x = 1;");

    let result = run_in(dir.path(), "import \"m.rill\" as m; m.x = 2;");
    match result {
        Value::Error(message) => assert_eq!(message, "cannot assign into a module"),
        other => panic!("expected error, got {:?}", other),
    }
}

#[test]
fn test_module_values_are_modules() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), "m.rill", "let x = 1;");

    let result = run_in(dir.path(), "import \"m.rill\" as m; m;");
    match result {
        Value::Module(module) => assert!(module.path.ends_with("m.rill")),
        other => panic!("expected module value, got {:?}", other),
    }
}

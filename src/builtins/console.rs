//! Console I/O: print, println, readline
//!
//! `print` and `println` write the comma-joined string forms of their
//! arguments to standard output; `println` appends a newline. `readline`
//! writes its prompt, flushes, and returns one line from standard input
//! without the trailing newline.

use super::{insert, Builtin};
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

fn join_arguments(args: &[Value]) -> String {
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    rendered.join(", ")
}

/// Writes the comma-joined arguments without a newline. Returns null.
pub fn builtin_print(args: &[Value]) -> Result<Value, EvalError> {
    print!("{}", join_arguments(args));
    io::stdout().flush().ok();
    Ok(Value::Null)
}

/// Writes the comma-joined arguments followed by a newline. Returns null.
pub fn builtin_println(args: &[Value]) -> Result<Value, EvalError> {
    println!("{}", join_arguments(args));
    Ok(Value::Null)
}

/// Writes the string prompt, then reads and returns one line from stdin.
pub fn builtin_readline(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity(ARITY_ONE, args.len()));
    }
    let prompt = match &args[0] {
        Value::String(prompt) => prompt,
        other => {
            return Err(EvalError::type_mismatch(
                "readline",
                "STRING",
                other.type_name(),
            ))
        }
    };

    print!("{}", prompt);
    io::stdout().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| EvalError::runtime(format!("readline: {}", err)))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::String(line))
}

/// Register all console builtins.
pub fn register(registry: &mut HashMap<&'static str, Builtin>) {
    insert(registry, "print", builtin_print);
    insert(registry, "println", builtin_println);
    insert(registry, "readline", builtin_readline);
}

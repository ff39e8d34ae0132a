// ABOUTME: Host-side error types — builtin/runtime failures and parser diagnostics

use crate::token::Token;
use std::fmt;
use thiserror::Error;

// ===== Arity constant strings (shared by the builtin arity checks) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";

/// Failure raised by a builtin (or by the evaluator on its behalf).
///
/// These become catchable `Value::Error` signals: the evaluator renders the
/// error through `Display` and wraps the message.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Wrong number of arguments passed to a builtin.
    #[error("wrong number of arguments, want {expected}, got {actual}")]
    Arity { expected: &'static str, actual: usize },

    /// A builtin received an argument of an unsupported type.
    #[error("{function}: expected {expected}, got {actual}")]
    TypeMismatch {
        function: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// Anything else a builtin can reject, with a ready-made message.
    #[error("{0}")]
    Runtime(String),
}

impl EvalError {
    pub fn arity(expected: &'static str, actual: usize) -> Self {
        EvalError::Arity { expected, actual }
    }

    pub fn type_mismatch(
        function: &'static str,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        EvalError::TypeMismatch {
            function,
            expected,
            actual,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime(message.into())
    }
}

/// A parser (or file-loading) problem with optional source position.
///
/// Diagnostics render as
/// `line: <l>, column: <c>, Literal: "<lit>" [<kind>]: <message>`
/// when a token is attached, and as the bare message otherwise (used for
/// unreadable module files).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub token: Option<Token>,
}

impl Diagnostic {
    pub fn at(message: impl Into<String>, token: &Token) -> Self {
        Diagnostic {
            message: message.into(),
            token: Some(token.clone()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            token: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "line: {}, column: {}, Literal: \"{}\" [{}]: {}",
                token.line, token.column, token.literal, token.kind, self.message
            ),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

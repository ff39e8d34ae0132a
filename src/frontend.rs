// ABOUTME: Source-to-AST glue shared by the shim, the REPL, and the module loader

use crate::ast::Program;
use crate::error::Diagnostic;
use crate::parser::Parser;
use crate::scanner::Scanner;
use std::fs;
use std::path::Path;

/// Parses source text into a program, or the diagnostics that stopped it.
pub fn parse(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let scanner = Scanner::new(source);
    let (program, errors) = Parser::new(scanner).parse();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// Reads and parses a source file. An unreadable file surfaces as a single
/// position-less diagnostic so the caller reports it the same way as a
/// parse failure.
pub fn build(path: &Path) -> Result<Program, Vec<Diagnostic>> {
    let source = fs::read_to_string(path).map_err(|err| {
        vec![Diagnostic::message(format!(
            "cannot read {}: {}",
            path.display(),
            err
        ))]
    })?;
    parse(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        let program = parse("let a = 1; a + 1;").expect("should parse");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_parse_reports_diagnostics() {
        let errors = parse("let = 1;").unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_build_missing_file() {
        let errors = build(Path::new("/definitely/not/here.rill")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("cannot read"));
    }
}

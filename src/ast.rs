// ABOUTME: AST node families produced by the parser and walked by the evaluator

use std::fmt;
use std::rc::Rc;

/// Source position carried by every node (one-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

/// An ordered list of top-level statements.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// A braced statement list. Blocks appear as `if`/loop/function/try bodies;
/// a standalone `{ … }` at statement position is a hash literal instead.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expression(Expr),
    Let {
        name: String,
        value: Expr,
    },
    Const {
        name: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Block,
        otherwise: Block,
    },
    While {
        head: Expr,
        body: Block,
    },
    RangeLoop {
        binder: String,
        range: Expr,
        body: Block,
    },
    KeyValueLoop {
        key_binder: String,
        value_binder: String,
        range: Expr,
        body: Block,
    },
    Return(Expr),
    Break,
    Continue,
    TryCatch {
        try_block: Block,
        binder: String,
        catch_block: Block,
    },
    Import {
        path: String,
        alias: String,
    },
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Expression(expr) => write!(f, "{};", expr),
            StmtKind::Let { name, value } => write!(f, "let {} = {};", name, value),
            StmtKind::Const { name, value } => write!(f, "const {} = {};", name, value),
            StmtKind::If {
                cond,
                then,
                otherwise,
            } => write!(f, "if {} {} else {}", cond, then, otherwise),
            StmtKind::While { head, body } => write!(f, "loop {}{}", head, body),
            StmtKind::RangeLoop {
                binder,
                range,
                body,
            } => write!(f, "loop {} in {}{}", binder, range, body),
            StmtKind::KeyValueLoop {
                key_binder,
                value_binder,
                range,
                body,
            } => write!(f, "loop {}, {} in {}{}", key_binder, value_binder, range, body),
            StmtKind::Return(expr) => write!(f, "return {};", expr),
            StmtKind::Break => write!(f, "break;"),
            StmtKind::Continue => write!(f, "continue;"),
            StmtKind::TryCatch {
                try_block,
                binder,
                catch_block,
            } => write!(f, "try {} catch {} {}", try_block, binder, catch_block),
            StmtKind::Import { path, alias } => write!(f, "import \"{}\" as {};", path, alias),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Infix {
        op: InfixOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Function {
        parameters: Vec<String>,
        body: Rc<Block>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Array(Vec<Expr>),
    Hash(Vec<(Expr, Expr)>),
    Index {
        container: Box<Expr>,
        index: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Integer(value) => write!(f, "{}", value),
            ExprKind::Float(value) => write!(f, "{:.6}", value),
            ExprKind::Boolean(value) => write!(f, "{}", value),
            ExprKind::String(value) => write!(f, "\"{}\"", value),
            ExprKind::Null => write!(f, "null"),
            ExprKind::Identifier(name) => write!(f, "{}", name),
            ExprKind::Unary { op, operand } => write!(f, "({}{})", op, operand),
            ExprKind::Infix { op, lhs, rhs } => write!(f, "({}{}{})", lhs, op, rhs),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => write!(f, "({}?{}:{})", cond, then, otherwise),
            ExprKind::Function { parameters, body } => {
                write!(f, "fun({}){}", parameters.join(", "), body)
            }
            ExprKind::Call { callee, arguments } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", callee, args.join(", "))
            }
            ExprKind::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            ExprKind::Hash(pairs) => {
                let rendered: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            ExprKind::Index { container, index } => write!(f, "({}[{}])", container, index),
            ExprKind::Assign { target, op, value } => write!(f, "({}{}{})", target, op, value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    NullCoalesce,
    Range,
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Mod => "%",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::LtEq => "<=",
            InfixOp::GtEq => ">=",
            InfixOp::NullCoalesce => "??",
            InfixOp::Range => "..",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment desugars to.
    pub fn desugared(self) -> Option<InfixOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(InfixOp::Add),
            AssignOp::Sub => Some(InfixOp::Sub),
            AssignOp::Mul => Some(InfixOp::Mul),
            AssignOp::Div => Some(InfixOp::Div),
            AssignOp::Mod => Some(InfixOp::Mod),
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
        };
        write!(f, "{}", symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(kind: ExprKind) -> Expr {
        Expr {
            kind,
            pos: Position::default(),
        }
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(expr(ExprKind::Integer(42)).to_string(), "42");
        assert_eq!(expr(ExprKind::Float(3.14)).to_string(), "3.140000");
        assert_eq!(expr(ExprKind::Boolean(true)).to_string(), "true");
        assert_eq!(expr(ExprKind::String("hi".into())).to_string(), "\"hi\"");
        assert_eq!(expr(ExprKind::Null).to_string(), "null");
    }

    #[test]
    fn test_infix_display_parenthesizes() {
        let sum = expr(ExprKind::Infix {
            op: InfixOp::Add,
            lhs: Box::new(expr(ExprKind::Integer(1))),
            rhs: Box::new(expr(ExprKind::Infix {
                op: InfixOp::Mul,
                lhs: Box::new(expr(ExprKind::Integer(2))),
                rhs: Box::new(expr(ExprKind::Integer(3))),
            })),
        });
        assert_eq!(sum.to_string(), "(1+(2*3))");
    }

    #[test]
    fn test_statement_display() {
        let stmt = Stmt {
            kind: StmtKind::Let {
                name: "a".into(),
                value: expr(ExprKind::Integer(1)),
            },
            pos: Position::default(),
        };
        assert_eq!(stmt.to_string(), "let a = 1;");

        let imp = Stmt {
            kind: StmtKind::Import {
                path: "lib/util".into(),
                alias: "util".into(),
            },
            pos: Position::default(),
        };
        assert_eq!(imp.to_string(), "import \"lib/util\" as util;");
    }

    #[test]
    fn test_function_and_block_display() {
        let body = Block {
            statements: vec![Stmt {
                kind: StmtKind::Return(expr(ExprKind::Identifier("a".into()))),
                pos: Position::default(),
            }],
        };
        let fun = expr(ExprKind::Function {
            parameters: vec!["a".into(), "b".into()],
            body: Rc::new(body),
        });
        assert_eq!(fun.to_string(), "fun(a, b){ return a; }");
    }

    #[test]
    fn test_assign_display_keeps_compound_operator() {
        let assign = expr(ExprKind::Assign {
            target: Box::new(expr(ExprKind::Identifier("a".into()))),
            op: AssignOp::Add,
            value: Box::new(expr(ExprKind::Integer(2))),
        });
        assert_eq!(assign.to_string(), "(a+=2)");
    }
}

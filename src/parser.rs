// ABOUTME: Pratt expression parser fused with a recursive-descent statement parser

use crate::ast::{AssignOp, Block, Expr, ExprKind, InfixOp, Position, Program, Stmt, StmtKind, UnaryOp};
use crate::error::Diagnostic;
use crate::scanner::Scanner;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

// Precedence levels, loosest first. Assignment, ternary, and null-coalescing
// are right-associative: their right-hand parse runs at precedence minus one.
const LOWEST: u8 = 1;
const ASSIGN: u8 = 2;
const TERNARY: u8 = 3;
const NULL_COALESCING: u8 = 4;
const DISJUNCTION: u8 = 5;
const CONJUNCTION: u8 = 6;
const EQUALS: u8 = 7;
const COMPARE: u8 = 8;
const SUM: u8 = 9;
const PRODUCT: u8 = 10;
const RANGE: u8 = 11;
const PREFIX: u8 = 12;
const POSTFIX: u8 = 13;

fn precedence_of(kind: TokenKind) -> u8 {
    match kind {
        TokenKind::Assign
        | TokenKind::PlusAssign
        | TokenKind::MinusAssign
        | TokenKind::StarAssign
        | TokenKind::SlashAssign
        | TokenKind::PercentAssign => ASSIGN,
        TokenKind::Question => TERNARY,
        TokenKind::NullCoalesce => NULL_COALESCING,
        TokenKind::Or => DISJUNCTION,
        TokenKind::And => CONJUNCTION,
        TokenKind::Eq | TokenKind::NotEq => EQUALS,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => COMPARE,
        TokenKind::Plus | TokenKind::Minus => SUM,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => PRODUCT,
        TokenKind::Range => RANGE,
        TokenKind::Dot | TokenKind::LParen | TokenKind::LBracket => POSTFIX,
        _ => LOWEST,
    }
}

fn is_right_associative(precedence: u8) -> bool {
    precedence == ASSIGN || precedence == TERNARY || precedence == NULL_COALESCING
}

fn binary_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Star => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Percent => InfixOp::Mod,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::NotEq,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::LtEq => InfixOp::LtEq,
        TokenKind::GtEq => InfixOp::GtEq,
        TokenKind::NullCoalesce => InfixOp::NullCoalesce,
        TokenKind::Range => InfixOp::Range,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn token_pos(token: &Token) -> Position {
    Position::new(token.line, token.column)
}

/// Parser over a two-token lookahead buffer.
///
/// Produces a `Program` plus a diagnostic list; after the first diagnostic
/// it stops at the statement level. A stack of loop flags tracks whether
/// `break`/`continue` are legal — entering a function literal pushes a fresh
/// `false` so they cannot leak out of a nested function body.
pub struct Parser {
    scanner: Scanner,
    buffer: [Token; 2],
    errors: Vec<Diagnostic>,
    enclosing_functions: usize,
    loop_stack: Vec<bool>,
}

impl Parser {
    pub fn new(mut scanner: Scanner) -> Self {
        let first = scanner.next_token();
        let second = scanner.next_token();
        Parser {
            scanner,
            buffer: [first, second],
            errors: Vec::new(),
            enclosing_functions: 0,
            loop_stack: vec![false],
        }
    }

    /// Parses the whole input. Import statements are only recognized here,
    /// at the outermost module level.
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut program = Program::default();

        while !self.had_errors() {
            match self.parse_module_stmt() {
                Some(stmt) => program.statements.push(stmt),
                None => break,
            }
            if self.is_at_end() {
                break;
            }
        }

        if !self.is_at_end() && self.errors.is_empty() {
            let token = self.peek().clone();
            self.push_error("there are unparsed tokens left", &token);
        }
        (program, self.errors)
    }

    // ===== token plumbing =====

    fn advance(&mut self) -> Token {
        let incoming = self.scanner.next_token();
        self.buffer.swap(0, 1);
        let result = std::mem::replace(&mut self.buffer[1], incoming);
        if result.kind == TokenKind::Error {
            let message = result.literal.clone();
            self.push_error(message, &result);
        }
        result
    }

    fn peek(&self) -> &Token {
        &self.buffer[0]
    }

    fn peek2(&self) -> &Token {
        &self.buffer[1]
    }

    fn is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn are(&self, first: TokenKind, second: TokenKind) -> bool {
        self.is(first) && self.peek2().kind == second
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.is(kind) {
            return Some(self.advance());
        }
        let token = self.peek().clone();
        self.push_error(message, &token);
        None
    }

    fn is_at_end(&self) -> bool {
        self.is(TokenKind::Eof)
    }

    pub fn had_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn push_error(&mut self, message: impl Into<String>, at: &Token) {
        self.errors.push(Diagnostic::at(message, at));
    }

    // ===== context stacks =====

    fn in_function(&self) -> bool {
        self.enclosing_functions > 0
    }

    fn in_loop(&self) -> bool {
        *self.loop_stack.last().unwrap_or(&false)
    }

    // ===== statements =====

    fn parse_module_stmt(&mut self) -> Option<Stmt> {
        match self.peek().kind {
            TokenKind::Import => self.parse_import(),
            _ => self.parse_stmt(),
        }
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.peek().kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Const => self.parse_const(),
            TokenKind::If => self.parse_if(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Try => self.parse_try_catch(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_let(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Let, "expected let statement")?;

        let name = self.advance();
        if name.kind != TokenKind::Identifier {
            self.push_error("expected an identifier", &name);
            return None;
        }

        self.expect(TokenKind::Assign, "expected =")?;
        let value = self.expression()?;
        self.matches(TokenKind::Semicolon);

        Some(Stmt {
            kind: StmtKind::Let {
                name: name.literal,
                value,
            },
            pos,
        })
    }

    fn parse_const(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Const, "expected const statement")?;

        let name = self.advance();
        if name.kind != TokenKind::Identifier {
            self.push_error("expected an identifier", &name);
            return None;
        }

        self.expect(TokenKind::Assign, "expected =")?;
        let value = self.expression()?;
        self.matches(TokenKind::Semicolon);

        Some(Stmt {
            kind: StmtKind::Const {
                name: name.literal,
                value,
            },
            pos,
        })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::If, "expected if")?;

        let cond = self.expression()?;
        let then = self.block()?;

        if self.matches(TokenKind::Else) {
            // `else if` nests as a one-statement block holding the next if.
            if self.is(TokenKind::If) {
                let else_if = self.parse_if()?;
                let otherwise = Block {
                    statements: vec![else_if],
                };
                return Some(Stmt {
                    kind: StmtKind::If {
                        cond,
                        then,
                        otherwise,
                    },
                    pos,
                });
            }
            let otherwise = self.block()?;
            return Some(Stmt {
                kind: StmtKind::If {
                    cond,
                    then,
                    otherwise,
                },
                pos,
            });
        }

        // A missing else is synthesized as an empty block.
        Some(Stmt {
            kind: StmtKind::If {
                cond,
                then,
                otherwise: Block::default(),
            },
            pos,
        })
    }

    fn parse_loop(&mut self) -> Option<Stmt> {
        self.loop_stack.push(true);
        let result = self.parse_loop_inner();
        self.loop_stack.pop();
        result
    }

    fn parse_loop_inner(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Loop, "expected loop")?;

        if self.is(TokenKind::Forever) {
            let forever = self.advance();
            let head = Expr {
                kind: ExprKind::Boolean(true),
                pos: token_pos(&forever),
            };
            let body = self.block()?;
            return Some(Stmt {
                kind: StmtKind::While { head, body },
                pos,
            });
        }

        if self.are(TokenKind::Identifier, TokenKind::In) {
            let binder = self.advance();
            self.advance();
            let range = self.expression()?;
            let body = self.block()?;
            return Some(Stmt {
                kind: StmtKind::RangeLoop {
                    binder: binder.literal,
                    range,
                    body,
                },
                pos,
            });
        }

        if self.are(TokenKind::Identifier, TokenKind::Comma) {
            let key_binder = self.advance();
            self.advance();
            if !self.is(TokenKind::Identifier) {
                let token = self.peek().clone();
                self.push_error("expected identifier", &token);
                return None;
            }
            let value_binder = self.advance();
            self.expect(TokenKind::In, "expected in")?;
            let range = self.expression()?;
            let body = self.block()?;
            return Some(Stmt {
                kind: StmtKind::KeyValueLoop {
                    key_binder: key_binder.literal,
                    value_binder: value_binder.literal,
                    range,
                    body,
                },
                pos,
            });
        }

        let head = self.expression()?;
        let body = self.block()?;
        Some(Stmt {
            kind: StmtKind::While { head, body },
            pos,
        })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Return, "expected return statement")?;

        if !self.in_function() {
            let token = self.peek().clone();
            self.push_error("return is only allowed in function definitions", &token);
            return None;
        }

        if self.matches(TokenKind::Semicolon) {
            return Some(Stmt {
                kind: StmtKind::Return(Expr {
                    kind: ExprKind::Null,
                    pos,
                }),
                pos,
            });
        }

        let result = self.expression()?;
        self.matches(TokenKind::Semicolon);
        Some(Stmt {
            kind: StmtKind::Return(result),
            pos,
        })
    }

    fn parse_break(&mut self) -> Option<Stmt> {
        if !self.in_loop() {
            let token = self.peek().clone();
            self.push_error("break is only allowed inside a loop", &token);
            return None;
        }

        let pos = token_pos(self.peek());
        self.expect(TokenKind::Break, "expected break statement")?;
        self.matches(TokenKind::Semicolon);
        Some(Stmt {
            kind: StmtKind::Break,
            pos,
        })
    }

    fn parse_continue(&mut self) -> Option<Stmt> {
        if !self.in_loop() {
            let token = self.peek().clone();
            self.push_error("continue is only allowed inside a loop", &token);
            return None;
        }

        let pos = token_pos(self.peek());
        self.expect(TokenKind::Continue, "expected continue statement")?;
        self.matches(TokenKind::Semicolon);
        Some(Stmt {
            kind: StmtKind::Continue,
            pos,
        })
    }

    fn parse_try_catch(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Try, "expected try")?;
        let try_block = self.block()?;

        self.expect(TokenKind::Catch, "expected catch")?;
        let binder = self.advance();
        if binder.kind != TokenKind::Identifier {
            self.push_error("expected identifier", &binder);
            return None;
        }
        let catch_block = self.block()?;

        Some(Stmt {
            kind: StmtKind::TryCatch {
                try_block,
                binder: binder.literal,
                catch_block,
            },
            pos,
        })
    }

    fn parse_import(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        self.expect(TokenKind::Import, "expected import")?;

        let path = self.advance();
        if path.kind != TokenKind::String {
            self.push_error("expected string", &path);
            return None;
        }

        self.expect(TokenKind::As, "expected as")?;

        let alias = self.advance();
        if alias.kind != TokenKind::Identifier {
            self.push_error("expected identifier", &alias);
            return None;
        }

        self.matches(TokenKind::Semicolon);
        Some(Stmt {
            kind: StmtKind::Import {
                path: path.literal,
                alias: alias.literal,
            },
            pos,
        })
    }

    fn block(&mut self) -> Option<Block> {
        self.expect(TokenKind::LBrace, "expected block")?;

        let mut statements = Vec::new();
        while !self.is(TokenKind::RBrace) {
            if self.is_at_end() {
                let token = self.peek().clone();
                self.push_error("unexpected end of file", &token);
                return None;
            }
            let stmt = self.parse_stmt()?;
            if self.had_errors() {
                return None;
            }
            statements.push(stmt);
        }

        self.expect(TokenKind::RBrace, "expected }")?;
        Some(Block { statements })
    }

    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let pos = token_pos(self.peek());
        let expr = self.expression()?;
        self.matches(TokenKind::Semicolon);
        Some(Stmt {
            kind: StmtKind::Expression(expr),
            pos,
        })
    }

    // ===== expressions =====

    fn expression(&mut self) -> Option<Expr> {
        self.expression_with(LOWEST)
    }

    fn expression_with(&mut self, precedence: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;
        while precedence < precedence_of(self.peek().kind) {
            lhs = self.parse_infix(lhs)?;
        }
        Some(lhs)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.peek().kind {
            TokenKind::Int => self.parse_int(),
            TokenKind::Float => self.parse_float(),
            TokenKind::String => {
                let token = self.advance();
                Some(Expr {
                    pos: token_pos(&token),
                    kind: ExprKind::String(token.literal),
                })
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Some(Expr {
                    kind: ExprKind::Boolean(token.kind == TokenKind::True),
                    pos: token_pos(&token),
                })
            }
            TokenKind::Null => {
                let token = self.advance();
                Some(Expr {
                    kind: ExprKind::Null,
                    pos: token_pos(&token),
                })
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Some(Expr {
                    pos: token_pos(&token),
                    kind: ExprKind::Identifier(token.literal),
                })
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_hash(),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Bang => self.parse_unary(),
            TokenKind::LParen => self.parse_grouping(),
            TokenKind::Fun => self.parse_function_literal(),
            // Consuming the error token records the scanner's message.
            TokenKind::Error => {
                self.advance();
                None
            }
            _ => {
                let token = self.peek().clone();
                self.push_error("expected atomic or prefix expression", &token);
                None
            }
        }
    }

    fn parse_infix(&mut self, lhs: Expr) -> Option<Expr> {
        match self.peek().kind {
            TokenKind::Question => self.parse_conditional(lhs),
            TokenKind::LParen => self.parse_call(lhs),
            TokenKind::LBracket => self.parse_index(lhs),
            TokenKind::Dot => self.parse_property(lhs),
            TokenKind::Assign
            | TokenKind::PlusAssign
            | TokenKind::MinusAssign
            | TokenKind::StarAssign
            | TokenKind::SlashAssign
            | TokenKind::PercentAssign => self.parse_assign(lhs),
            _ => self.parse_binary(lhs),
        }
    }

    fn parse_int(&mut self) -> Option<Expr> {
        let token = self.advance();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expr {
                kind: ExprKind::Integer(value),
                pos: token_pos(&token),
            }),
            Err(_) => {
                self.push_error("integer literal out of range", &token);
                None
            }
        }
    }

    fn parse_float(&mut self) -> Option<Expr> {
        let token = self.advance();
        match token.literal.parse::<f64>() {
            Ok(value) => Some(Expr {
                kind: ExprKind::Float(value),
                pos: token_pos(&token),
            }),
            Err(_) => {
                self.push_error("malformed float literal", &token);
                None
            }
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => {
                self.push_error(
                    format!("unexpected unary operator: {}", token.kind),
                    &token,
                );
                return None;
            }
        };
        let operand = self.expression_with(PREFIX)?;
        Some(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            pos: token_pos(&token),
        })
    }

    fn parse_binary(&mut self, lhs: Expr) -> Option<Expr> {
        let token = self.advance();
        let op = match binary_op(token.kind) {
            Some(op) => op,
            None => {
                self.push_error(
                    format!("unexpected infix operator: {}", token.kind),
                    &token,
                );
                return None;
            }
        };

        let precedence = precedence_of(token.kind);
        let rhs_precedence = if is_right_associative(precedence) {
            precedence - 1
        } else {
            precedence
        };
        let rhs = self.expression_with(rhs_precedence)?;

        Some(Expr {
            kind: ExprKind::Infix {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            pos: token_pos(&token),
        })
    }

    fn parse_assign(&mut self, lhs: Expr) -> Option<Expr> {
        let token = self.advance();
        let op = match assign_op(token.kind) {
            Some(op) => op,
            None => {
                self.push_error(
                    format!("unexpected assignment operator: {}", token.kind),
                    &token,
                );
                return None;
            }
        };
        let value = self.expression_with(ASSIGN - 1)?;

        Some(Expr {
            kind: ExprKind::Assign {
                target: Box::new(lhs),
                op,
                value: Box::new(value),
            },
            pos: token_pos(&token),
        })
    }

    fn parse_conditional(&mut self, cond: Expr) -> Option<Expr> {
        let question = self.expect(TokenKind::Question, "expected ?")?;
        let then = self.expression()?;
        self.expect(TokenKind::Colon, "expected :")?;
        let otherwise = self.expression()?;

        Some(Expr {
            kind: ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            pos: token_pos(&question),
        })
    }

    fn parse_call(&mut self, callee: Expr) -> Option<Expr> {
        self.expect(TokenKind::LParen, "expected (")?;
        let arguments = self.call_arguments()?;
        self.expect(TokenKind::RParen, "expected )")?;

        let pos = callee.pos;
        Some(Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            pos,
        })
    }

    fn call_arguments(&mut self) -> Option<Vec<Expr>> {
        let mut arguments = Vec::new();
        if !self.is(TokenKind::RParen) {
            arguments.push(self.expression()?);
        }
        while self.is(TokenKind::Comma) {
            self.advance();
            arguments.push(self.expression()?);
        }
        Some(arguments)
    }

    fn parse_index(&mut self, container: Expr) -> Option<Expr> {
        let bracket = self.expect(TokenKind::LBracket, "expected index expression")?;
        let index = self.expression()?;
        self.expect(TokenKind::RBracket, "expected ]")?;

        Some(Expr {
            kind: ExprKind::Index {
                container: Box::new(container),
                index: Box::new(index),
            },
            pos: token_pos(&bracket),
        })
    }

    // `a.b` desugars to `a["b"]` with a string-literal index.
    fn parse_property(&mut self, container: Expr) -> Option<Expr> {
        let dot = self.expect(TokenKind::Dot, "expected property expression")?;
        if !self.is(TokenKind::Identifier) {
            let token = self.peek().clone();
            self.push_error("expected identifier", &token);
            return None;
        }
        let name = self.advance();

        let index = Expr {
            pos: token_pos(&name),
            kind: ExprKind::String(name.literal),
        };
        Some(Expr {
            kind: ExprKind::Index {
                container: Box::new(container),
                index: Box::new(index),
            },
            pos: token_pos(&dot),
        })
    }

    fn parse_grouping(&mut self) -> Option<Expr> {
        self.expect(TokenKind::LParen, "expected '('")?;
        let expr = self.expression()?;
        self.expect(TokenKind::RParen, "expected ')'")?;
        Some(expr)
    }

    fn parse_array(&mut self) -> Option<Expr> {
        let bracket = self.expect(TokenKind::LBracket, "expected array")?;

        let mut elements = Vec::new();
        if !self.is(TokenKind::RBracket) {
            elements.push(self.expression()?);
            while self.is(TokenKind::Comma) {
                self.advance();
                elements.push(self.expression()?);
            }
        }

        self.expect(TokenKind::RBracket, "missing ]")?;
        Some(Expr {
            kind: ExprKind::Array(elements),
            pos: token_pos(&bracket),
        })
    }

    fn parse_hash(&mut self) -> Option<Expr> {
        let brace = self.expect(TokenKind::LBrace, "expected hash")?;

        let mut pairs = Vec::new();
        while !self.is(TokenKind::RBrace) {
            let key = self.expression()?;
            self.expect(TokenKind::Colon, "expected :")?;
            let value = self.expression()?;
            pairs.push((key, value));

            if !self.is(TokenKind::RBrace) && !self.matches(TokenKind::Comma) {
                let token = self.peek().clone();
                self.push_error("expected , or }", &token);
                return None;
            }
        }

        self.expect(TokenKind::RBrace, "expected }")?;
        Some(Expr {
            kind: ExprKind::Hash(pairs),
            pos: token_pos(&brace),
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        self.enclosing_functions += 1;
        self.loop_stack.push(false);
        let result = self.parse_function_literal_inner();
        self.loop_stack.pop();
        self.enclosing_functions -= 1;
        result
    }

    fn parse_function_literal_inner(&mut self) -> Option<Expr> {
        let fun = self.expect(TokenKind::Fun, "expected function literal")?;
        self.expect(TokenKind::LParen, "expected (")?;
        let parameters = self.function_parameters()?;
        self.expect(TokenKind::RParen, "expected )")?;
        let body = self.block()?;

        Some(Expr {
            kind: ExprKind::Function {
                parameters,
                body: Rc::new(body),
            },
            pos: token_pos(&fun),
        })
    }

    fn function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();
        if self.is(TokenKind::Identifier) {
            parameters.push(self.advance().literal);
        }
        while self.is(TokenKind::Comma) {
            self.advance();
            if !self.is(TokenKind::Identifier) {
                let token = self.peek().clone();
                self.push_error("expected parameter name", &token);
                return None;
            }
            parameters.push(self.advance().literal);
        }
        Some(parameters)
    }
}

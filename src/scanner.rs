// ABOUTME: Lexical scanner producing one token at a time from source text

use crate::token::{keyword_kind, Token, TokenKind};

/// On-demand tokenizer over the source's code points.
///
/// `next_token` skips whitespace and comments and returns exactly one token;
/// once the input is exhausted it keeps returning EOF tokens at the final
/// position. Lexical problems (stray `&`, bad escapes, unterminated strings
/// or comments) surface as `TokenKind::Error` tokens whose literal holds the
/// message, so the parser can report them with positions attached.
pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line_start: usize,
    line: u32,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line_start: 0,
            line: 1,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_eof();
        }

        let c = self.advance();
        match c {
            '+' => {
                if self.matches('=') {
                    self.make_token(TokenKind::PlusAssign)
                } else {
                    self.make_token(TokenKind::Plus)
                }
            }
            '-' => {
                if self.matches('=') {
                    self.make_token(TokenKind::MinusAssign)
                } else {
                    self.make_token(TokenKind::Minus)
                }
            }
            '*' => {
                if self.matches('=') {
                    self.make_token(TokenKind::StarAssign)
                } else {
                    self.make_token(TokenKind::Star)
                }
            }
            '/' => {
                if self.matches('=') {
                    self.make_token(TokenKind::SlashAssign)
                } else if self.matches('/') {
                    match self.read_line_comment() {
                        Ok(()) => self.next_token(),
                        Err(msg) => self.make_error(msg),
                    }
                } else if self.matches('*') {
                    match self.read_block_comment() {
                        Ok(()) => self.next_token(),
                        Err(msg) => self.make_error(msg),
                    }
                } else {
                    self.make_token(TokenKind::Slash)
                }
            }
            '%' => {
                if self.matches('=') {
                    self.make_token(TokenKind::PercentAssign)
                } else {
                    self.make_token(TokenKind::Percent)
                }
            }
            '=' => {
                if self.matches('=') {
                    self.make_token(TokenKind::Eq)
                } else {
                    self.make_token(TokenKind::Assign)
                }
            }
            '!' => {
                if self.matches('=') {
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Bang)
                }
            }
            '<' => {
                if self.matches('=') {
                    self.make_token(TokenKind::LtEq)
                } else {
                    self.make_token(TokenKind::Lt)
                }
            }
            '>' => {
                if self.matches('=') {
                    self.make_token(TokenKind::GtEq)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            '&' => {
                if self.matches('&') {
                    self.make_token(TokenKind::And)
                } else {
                    self.make_error("unexpected '&'".to_string())
                }
            }
            '|' => {
                if self.matches('|') {
                    self.make_token(TokenKind::Or)
                } else {
                    self.make_error("unexpected '|'".to_string())
                }
            }
            '(' => self.make_token(TokenKind::LParen),
            ')' => self.make_token(TokenKind::RParen),
            '[' => self.make_token(TokenKind::LBracket),
            ']' => self.make_token(TokenKind::RBracket),
            '{' => self.make_token(TokenKind::LBrace),
            '}' => self.make_token(TokenKind::RBrace),
            '.' => {
                if self.matches('.') {
                    self.make_token(TokenKind::Range)
                } else {
                    self.make_token(TokenKind::Dot)
                }
            }
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            ':' => self.make_token(TokenKind::Colon),
            '?' => {
                if self.matches('?') {
                    self.make_token(TokenKind::NullCoalesce)
                } else {
                    self.make_token(TokenKind::Question)
                }
            }
            '_' => {
                self.read_identifier();
                self.make_token_with_lexeme(TokenKind::Identifier)
            }
            '"' => match self.read_string() {
                Ok(contents) => {
                    let mut token = self.make_token(TokenKind::String);
                    token.literal = contents;
                    token
                }
                Err(msg) => self.make_error(msg),
            },
            c if c.is_ascii_digit() => {
                self.read_digits();
                if self.read_fraction() {
                    self.make_token_with_lexeme(TokenKind::Float)
                } else {
                    self.make_token_with_lexeme(TokenKind::Int)
                }
            }
            c if c.is_alphabetic() => {
                self.read_identifier();
                match keyword_kind(&self.lexeme()) {
                    Some(kind) => self.make_token(kind),
                    None => self.make_token_with_lexeme(TokenKind::Identifier),
                }
            }
            _ => self.make_error(format!("unexpected lexeme '{}'", self.lexeme())),
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        if c == '\n' {
            self.line_start = self.current + 1;
            self.line += 1;
        }
        self.current += 1;
        c
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.source.get(self.current + 1).copied()
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    fn matches2(&mut self, first: char, second: char) -> bool {
        if self.peek() == Some(first) && self.peek2() == Some(second) {
            self.advance();
            self.advance();
            return true;
        }
        false
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    // Column numbering is one-based, measured from the most recent newline.
    fn current_column(&self) -> u32 {
        (self.start - self.line_start + 1) as u32
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::from_kind(kind, self.line, self.current_column())
    }

    fn make_token_with_lexeme(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.line, self.current_column())
    }

    fn make_error(&self, message: String) -> Token {
        Token::new(TokenKind::Error, message, self.line, self.current_column())
    }

    fn make_eof(&self) -> Token {
        Token::from_kind(TokenKind::Eof, self.line, self.current_column())
    }

    fn read_digits(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
    }

    // Consumes `.<digits>` only when a digit follows the dot, so `0..10`
    // leaves the range operator alone.
    fn read_fraction(&mut self) -> bool {
        if self.peek() == Some('.') && matches!(self.peek2(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            self.advance();
            self.read_digits();
            return true;
        }
        false
    }

    fn read_identifier(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
    }

    fn read_string(&mut self) -> Result<String, String> {
        let mut out = String::new();
        loop {
            if self.is_at_end() {
                return Err("unexpected end of file in string".to_string());
            }
            let c = self.advance();
            match c {
                '"' => return Ok(out),
                '\\' => {
                    if self.is_at_end() {
                        return Err("unexpected end of file in string".to_string());
                    }
                    match self.advance() {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'u' => out.push(self.read_unicode_escape(4)?),
                        'U' => out.push(self.read_unicode_escape(8)?),
                        _ => return Err("unexpected escape sequence".to_string()),
                    }
                }
                _ => out.push(c),
            }
        }
    }

    fn read_unicode_escape(&mut self, digits: u32) -> Result<char, String> {
        let mut hex = String::new();
        for _ in 0..digits {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(self.advance());
                }
                _ => return Err(format!("expected unicode sequence of length {}", digits)),
            }
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| "cannot convert unicode sequence".to_string())?;
        char::from_u32(code).ok_or_else(|| "cannot convert unicode sequence".to_string())
    }

    fn read_line_comment(&mut self) -> Result<(), String> {
        while !self.matches('\n') {
            if self.is_at_end() {
                return Err("unexpected end of file in comment".to_string());
            }
            self.advance();
        }
        Ok(())
    }

    // Block comments nest: every inner `/*` must close before the outer `*/`.
    fn read_block_comment(&mut self) -> Result<(), String> {
        loop {
            if self.is_at_end() {
                return Err("unexpected end of file in multiline comment".to_string());
            }
            if self.matches2('*', '/') {
                return Ok(());
            }
            if self.matches2('/', '*') {
                self.read_block_comment()?;
                continue;
            }
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }
}

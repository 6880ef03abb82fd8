//! Lexer for embedded expressions.
//!
//! Tokenizes the script-like expression language found inside `{...}`.
//! Offsets are bytes relative to the expression string. Comments and
//! whitespace are skipped; template literals are one token.
//!
//! # Examples
//!
//! ```
//! use duo_parser::expr_lexer::{ExprLexer, TokenKind};
//!
//! let tokens = ExprLexer::tokenize("count + 1").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! assert_eq!(tokens[1].kind, TokenKind::Plus);
//! assert_eq!(tokens[2].kind, TokenKind::Number);
//! ```

use duo_lexer::{find_expression_end, Span};

/// A token produced by the expression lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: TokenValue,
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    Template,
    Regex,
    Boolean,
    Null,
    Undefined,

    // Identifiers & keywords
    Identifier,
    Keyword,

    // Arithmetic
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,

    // Comparison
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Lte,
    Gte,

    // Logical and bitwise
    And,
    Or,
    Not,
    QuestionQuestion,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,

    // Assignment
    Eq,
    /// Any compound assignment: `+=`, `??=`, `>>>=`, ...
    AssignOp,

    // Postfix
    PlusPlus,
    MinusMinus,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Dot,
    Spread,
    Comma,
    Colon,
    Semicolon,
    Question,
    Arrow,
    OptionalChain,

    // End of input
    Eof,
}

impl TokenKind {
    /// Tokens after which a `/` begins a regex literal rather than division.
    fn allows_regex_after(self) -> bool {
        !matches!(
            self,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::Template
                | TokenKind::Regex
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::Undefined
                | TokenKind::Identifier
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Number(f64),
    String(String),
    Boolean(bool),
    Identifier(String),
}

/// Expression lexer error.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLexerError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ExprLexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expression lexer error at position {}: {}",
            self.span.start, self.message
        )
    }
}

impl std::error::Error for ExprLexerError {}

/// Reserved words that never stand alone as an operand.
pub const KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "finally", "for", "function", "if",
    "import", "in", "instanceof", "let", "new", "of", "return", "static", "super", "switch",
    "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Longest first, so `>>>=` wins over `>>>` and `>>`.
const PUNCTUATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::AssignOp),
    ("...", TokenKind::Spread),
    ("===", TokenKind::StrictEq),
    ("!==", TokenKind::StrictNotEq),
    ("**=", TokenKind::AssignOp),
    ("<<=", TokenKind::AssignOp),
    (">>=", TokenKind::AssignOp),
    (">>>", TokenKind::ShiftRight),
    ("&&=", TokenKind::AssignOp),
    ("||=", TokenKind::AssignOp),
    ("??=", TokenKind::AssignOp),
    ("=>", TokenKind::Arrow),
    ("==", TokenKind::EqEq),
    ("!=", TokenKind::NotEq),
    ("<=", TokenKind::Lte),
    (">=", TokenKind::Gte),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("??", TokenKind::QuestionQuestion),
    ("?.", TokenKind::OptionalChain),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("**", TokenKind::StarStar),
    ("<<", TokenKind::ShiftLeft),
    (">>", TokenKind::ShiftRight),
    ("+=", TokenKind::AssignOp),
    ("-=", TokenKind::AssignOp),
    ("*=", TokenKind::AssignOp),
    ("/=", TokenKind::AssignOp),
    ("%=", TokenKind::AssignOp),
    ("&=", TokenKind::AssignOp),
    ("|=", TokenKind::AssignOp),
    ("^=", TokenKind::AssignOp),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("=", TokenKind::Eq),
    ("!", TokenKind::Not),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (".", TokenKind::Dot),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    ("?", TokenKind::Question),
];

/// Embedded expression lexer.
///
/// Operates on a single expression string (e.g. the content of `{count + 1}`).
pub struct ExprLexer<'a> {
    source: &'a str,
    pos: usize,
    prev: Option<TokenKind>,
}

impl<'a> ExprLexer<'a> {
    /// Create a new expression lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            prev: None,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprLexerError> {
        let mut lexer = ExprLexer::new(source);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Read the next token from the source.
    pub fn next_token(&mut self) -> Result<Token, ExprLexerError> {
        self.skip_trivia()?;

        if self.is_at_end() {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.pos, self.pos),
                value: TokenValue::None,
            });
        }

        let start = self.pos;
        let ch = self.current();

        let token = match ch {
            '0'..='9' => self.read_number(start)?,
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start)?,
            '\'' | '"' => self.read_string(start)?,
            '`' => self.read_template(start)?,
            '/' if self.prev.map_or(true, TokenKind::allows_regex_after) => self.read_regex(start)?,
            c if is_identifier_start(c) => self.read_identifier(start),
            _ => self.read_punctuator(start)?,
        };

        self.prev = Some(token.kind);
        Ok(token)
    }

    // --- Private helpers ---

    fn skip_trivia(&mut self) -> Result<(), ExprLexerError> {
        loop {
            while !self.is_at_end() && self.current().is_whitespace() {
                self.advance();
            }
            let rest = &self.source[self.pos..];
            if rest.starts_with("//") {
                while !self.is_at_end() && self.current() != '\n' {
                    self.advance();
                }
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(rel) => self.pos += 2 + rel + 2,
                    None => {
                        return Err(ExprLexerError {
                            message: "Unterminated comment".into(),
                            span: Span::new(self.pos, self.source.len()),
                        })
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    fn read_number(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        let rest = &self.source[start..];
        if rest.len() > 1 && rest.starts_with('0') && matches!(rest.as_bytes()[1], b'x' | b'X' | b'b' | b'B' | b'o' | b'O') {
            self.advance_n(2);
            while !self.is_at_end() && (self.current().is_ascii_hexdigit() || self.current() == '_') {
                self.advance();
            }
            return Ok(self.token(TokenKind::Number, start, TokenValue::None));
        }

        while !self.is_at_end()
            && (self.current().is_ascii_digit() || self.current() == '.' || self.current() == '_')
        {
            self.advance();
        }
        if !self.is_at_end() && matches!(self.current(), 'e' | 'E') {
            self.advance();
            if !self.is_at_end() && matches!(self.current(), '+' | '-') {
                self.advance();
            }
            while !self.is_at_end() && self.current().is_ascii_digit() {
                self.advance();
            }
        }
        // BigInt suffix
        if !self.is_at_end() && self.current() == 'n' {
            self.advance();
            return Ok(self.token(TokenKind::Number, start, TokenValue::None));
        }

        let text = self.source[start..self.pos].replace('_', "");
        let value: f64 = text.parse().map_err(|_| ExprLexerError {
            message: format!("Invalid number: '{}'", &self.source[start..self.pos]),
            span: Span::new(start, self.pos),
        })?;

        Ok(self.token(TokenKind::Number, start, TokenValue::Number(value)))
    }

    fn read_string(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        let quote = self.current();
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.current() != quote {
            if self.current() == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                match self.current() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    c => value.push(c),
                }
            } else {
                value.push(self.current());
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(ExprLexerError {
                message: "Unterminated string".into(),
                span: Span::new(start, self.pos),
            });
        }

        self.advance(); // skip closing quote
        Ok(self.token(TokenKind::String, start, TokenValue::String(value)))
    }

    /// Template literals are kept whole; `${...}` substitutions are measured
    /// with the same boundary scanner the template lexer uses.
    fn read_template(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        self.advance();
        while !self.is_at_end() {
            match self.current() {
                '\\' => self.advance_n(2),
                '`' => {
                    self.advance();
                    return Ok(self.token(TokenKind::Template, start, TokenValue::None));
                }
                '$' if self.peek() == Some('{') => {
                    let Some(end) = find_expression_end(self.source, self.pos + 2) else {
                        break;
                    };
                    self.pos = end + 1;
                }
                _ => self.advance(),
            }
        }

        Err(ExprLexerError {
            message: "Unterminated template literal".into(),
            span: Span::new(start, self.source.len()),
        })
    }

    fn read_regex(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        self.advance();
        let mut in_class = false;
        while !self.is_at_end() {
            match self.current() {
                '\n' => break,
                '\\' => self.advance_n(2),
                '[' => {
                    in_class = true;
                    self.advance();
                }
                ']' => {
                    in_class = false;
                    self.advance();
                }
                '/' if !in_class => {
                    self.advance();
                    while !self.is_at_end() && self.current().is_ascii_alphabetic() {
                        self.advance();
                    }
                    return Ok(self.token(TokenKind::Regex, start, TokenValue::None));
                }
                _ => self.advance(),
            }
        }

        Err(ExprLexerError {
            message: "Unterminated regular expression".into(),
            span: Span::new(start, self.pos),
        })
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while !self.is_at_end() && is_identifier_part(self.current()) {
            self.advance();
        }

        let text = &self.source[start..self.pos];
        match text {
            "true" => self.token(TokenKind::Boolean, start, TokenValue::Boolean(true)),
            "false" => self.token(TokenKind::Boolean, start, TokenValue::Boolean(false)),
            "null" => self.token(TokenKind::Null, start, TokenValue::None),
            "undefined" => self.token(TokenKind::Undefined, start, TokenValue::None),
            _ if KEYWORDS.contains(&text) => {
                self.token(TokenKind::Keyword, start, TokenValue::Identifier(text.to_string()))
            }
            _ => self.token(TokenKind::Identifier, start, TokenValue::Identifier(text.to_string())),
        }
    }

    fn read_punctuator(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        let rest = &self.source[start..];
        for (text, kind) in PUNCTUATORS {
            if rest.starts_with(text) {
                // `?.5` is a conditional followed by a number
                if *kind == TokenKind::OptionalChain
                    && rest[2..].starts_with(|c: char| c.is_ascii_digit())
                {
                    continue;
                }
                self.advance_n(text.len());
                return Ok(self.token(*kind, start, TokenValue::None));
            }
        }

        let ch = self.current();
        Err(ExprLexerError {
            message: format!("Unexpected character: '{ch}'"),
            span: Span::new(start, start + ch.len_utf8()),
        })
    }

    fn token(&self, kind: TokenKind, start: usize, value: TokenValue) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
            value,
        }
    }

    fn current(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.source[self.pos..].chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

pub fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

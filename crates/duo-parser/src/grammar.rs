//! Embedded expression grammar.
//!
//! The template parser never interprets expression text itself. It hands
//! each delimited expression to an [`ExpressionGrammar`] and stores the
//! classification it gets back. [`ScriptGrammar`] is the default: a
//! structural check over the expression token stream.

use duo_lexer::Span;

use crate::ast::ExpressionKind;
use crate::expr_lexer::{ExprLexer, Token, TokenKind, TokenValue};

/// Grammar failure. `span` is absolute in the template source.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct GrammarError {
    pub message: String,
    pub span: Span,
}

/// Pluggable expression sub-parser.
///
/// `source` is the expression text with delimiters and surrounding
/// whitespace removed; `offset` is where it starts in the template.
pub trait ExpressionGrammar {
    /// Parse a value expression.
    fn parse_expression(&self, source: &str, offset: usize) -> Result<ExpressionKind, GrammarError>;

    /// Parse a binding pattern (each-block context, await value).
    fn parse_pattern(&self, source: &str, offset: usize) -> Result<ExpressionKind, GrammarError>;
}

/// Default grammar for script-like expressions.
///
/// Rejects empty input, characters the expression lexer does not know,
/// unbalanced brackets, dangling operators and two operands in a row.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptGrammar;

impl ExpressionGrammar for ScriptGrammar {
    fn parse_expression(&self, source: &str, offset: usize) -> Result<ExpressionKind, GrammarError> {
        let tokens = tokenize(source, offset)?;
        check_structure(&tokens, source, offset)?;

        match tokens.as_slice() {
            [Token {
                kind: TokenKind::Identifier,
                value: TokenValue::Identifier(name),
                ..
            }, eof] if eof.kind == TokenKind::Eof => Ok(ExpressionKind::Identifier(name.clone())),
            _ => Ok(ExpressionKind::Other),
        }
    }

    fn parse_pattern(&self, source: &str, offset: usize) -> Result<ExpressionKind, GrammarError> {
        let kind = self.parse_expression(source, offset)?;
        if let ExpressionKind::Identifier(_) = kind {
            return Ok(kind);
        }

        let tokens = tokenize(source, offset)?;
        let opener = tokens[0].kind;
        if matches!(opener, TokenKind::LBrace | TokenKind::LBracket)
            && closing_index(&tokens) == Some(tokens.len() - 2)
        {
            return Ok(ExpressionKind::Destructure);
        }

        Err(GrammarError {
            message: format!("Expected an identifier or destructuring pattern, found '{source}'"),
            span: Span::new(offset, offset + source.len()),
        })
    }
}

fn tokenize(source: &str, offset: usize) -> Result<Vec<Token>, GrammarError> {
    let tokens = ExprLexer::tokenize(source).map_err(|e| GrammarError {
        message: e.message,
        span: Span::new(offset + e.span.start, offset + e.span.end),
    })?;

    if tokens.len() == 1 {
        return Err(GrammarError {
            message: "Expected an expression".into(),
            span: Span::new(offset, offset + source.len()),
        });
    }
    Ok(tokens)
}

fn check_structure(tokens: &[Token], source: &str, offset: usize) -> Result<(), GrammarError> {
    let at = |token: &Token| Span::new(offset + token.span.start, offset + token.span.end);
    let mut stack: Vec<&Token> = Vec::new();
    let mut prev: Option<&Token> = None;

    for token in tokens {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => stack.push(token),
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                let expected = match token.kind {
                    TokenKind::RParen => TokenKind::LParen,
                    TokenKind::RBracket => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                };
                match stack.pop() {
                    Some(open) if open.kind == expected => {}
                    _ => {
                        return Err(GrammarError {
                            message: format!(
                                "Unexpected '{}'",
                                &source[token.span.start..token.span.end]
                            ),
                            span: at(token),
                        })
                    }
                }
            }
            TokenKind::Eof => {
                if let Some(open) = stack.last() {
                    return Err(GrammarError {
                        message: format!(
                            "'{}' is never closed",
                            &source[open.span.start..open.span.end]
                        ),
                        span: at(open),
                    });
                }
                if let Some(last) = prev.filter(|t| is_dangling(t.kind)) {
                    return Err(GrammarError {
                        message: "Unexpected end of expression".into(),
                        span: at(last),
                    });
                }
            }
            _ => {}
        }

        if let Some(before) = prev {
            // a line break ends a statement inside a function body
            let separated = source[before.span.end..token.span.start].contains('\n');
            if is_operand(before)
                && is_operand(token)
                && token.kind != TokenKind::Template
                && !separated
                && !is_accessor(before, stack.last().copied())
            {
                return Err(GrammarError {
                    message: format!(
                        "Unexpected token '{}'",
                        &source[token.span.start..token.span.end]
                    ),
                    span: at(token),
                });
            }
        }
        prev = Some(token);
    }

    Ok(())
}

/// Index of the token closing the bracket opened by `tokens[0]`.
fn closing_index(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_operand(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Identifier
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::Template
            | TokenKind::Regex
            | TokenKind::Boolean
            | TokenKind::Null
            | TokenKind::Undefined
    )
}

/// `get` or `set` in front of a property name in an object literal.
fn is_accessor(token: &Token, enclosing: Option<&Token>) -> bool {
    let in_object = enclosing.is_some_and(|open| open.kind == TokenKind::LBrace);
    in_object
        && matches!(&token.value, TokenValue::Identifier(name) if name == "get" || name == "set")
}

/// Binary and prefix operators that cannot end an expression.
fn is_dangling(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::StarStar
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::StrictEq
            | TokenKind::StrictNotEq
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::Lte
            | TokenKind::Gte
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Not
            | TokenKind::QuestionQuestion
            | TokenKind::Ampersand
            | TokenKind::Pipe
            | TokenKind::Caret
            | TokenKind::Tilde
            | TokenKind::ShiftLeft
            | TokenKind::ShiftRight
            | TokenKind::Eq
            | TokenKind::AssignOp
            | TokenKind::Dot
            | TokenKind::Spread
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::Arrow
            | TokenKind::OptionalChain
    )
}

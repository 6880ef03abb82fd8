//! duo Lexer
//!
//! Tokenizes component template source into a stream of tokens.
//! The lexer is context-sensitive: markup, attribute values, raw `script`
//! and `style` bodies, and embedded `{expression}` boundaries are each
//! scanned in their own mode.
//!
//! # Example
//!
//! ```
//! use duo_lexer::{Lexer, TokenKind};
//!
//! let tokens = Lexer::tokenize("<p>hi</p>").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::TagOpenStart("p".into()));
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```

pub mod boundary;
pub mod position;
pub mod scanner;
pub mod token;

pub use boundary::find_expression_end;
pub use position::{LineIndex, Position};
pub use scanner::Lexer;
pub use token::{Span, Token, TokenKind};

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedTag,
    UnterminatedExpression,
    UnterminatedRawTextBlock,
    UnterminatedComment,
    UnterminatedAttributeValue,
    InvalidTagName,
    InvalidAttributeName,
}

/// Lexer error. The span points at the start of the offending construct.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lexer error at byte {}: {message}", .span.start)]
pub struct LexerError {
    pub kind: LexErrorKind,
    pub message: String,
    pub span: Span,
}

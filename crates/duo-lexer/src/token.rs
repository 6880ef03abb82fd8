use std::fmt;

use serde::Serialize;

/// Byte range into the source text, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Token classification for template source.
///
/// Tokens never carry expression contents: an embedded expression is the
/// source between an `ExpressionStart` (or block token) and the following
/// `ExpressionEnd`.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Content
    Text(String),
    CommentText(String),
    Doctype(String),

    // Tags
    TagOpenStart(String), // <name
    TagOpenEnd,           // >
    TagSelfCloseEnd,      // />
    TagCloseStart(String), // </name
    TagCloseEnd,          // >

    // Attributes
    AttributeName(String),
    Equals,
    Quote,
    AttributeValue(String),

    // Embedded expressions
    ExpressionStart, // {
    ExpressionEnd,   // }

    // Blocks, carrying the keyword
    BlockOpen(String),  // {#if
    BlockElse(String),  // {:else
    BlockClose(String), // {/if

    Eof,
}

/// A token with its kind and position in source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Text(text) => write!(f, "text:{text:?}"),
            TokenKind::CommentText(text) => write!(f, "comment:{text:?}"),
            TokenKind::Doctype(value) => write!(f, "doctype:{value:?}"),
            TokenKind::TagOpenStart(name) => write!(f, "tag_open_start:{name:?}"),
            TokenKind::TagOpenEnd => write!(f, "tag_open_end"),
            TokenKind::TagSelfCloseEnd => write!(f, "tag_self_close_end"),
            TokenKind::TagCloseStart(name) => write!(f, "tag_close_start:{name:?}"),
            TokenKind::TagCloseEnd => write!(f, "tag_close_end"),
            TokenKind::AttributeName(name) => write!(f, "attribute_name:{name:?}"),
            TokenKind::Equals => write!(f, "equals"),
            TokenKind::Quote => write!(f, "quote"),
            TokenKind::AttributeValue(value) => write!(f, "attribute_value:{value:?}"),
            TokenKind::ExpressionStart => write!(f, "expression_start"),
            TokenKind::ExpressionEnd => write!(f, "expression_end"),
            TokenKind::BlockOpen(keyword) => write!(f, "block_open:{keyword:?}"),
            TokenKind::BlockElse(keyword) => write!(f, "block_else:{keyword:?}"),
            TokenKind::BlockClose(keyword) => write!(f, "block_close:{keyword:?}"),
            TokenKind::Eof => write!(f, "eof"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} {}", self.span.start, self.span.end, self.kind)
    }
}

/// HTML void elements (self-closing, no children).
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Tags whose body is raw text, scanned only for the matching closing tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Check if a tag name is an HTML5 void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(tag))
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|raw| raw.eq_ignore_ascii_case(tag))
}

//! Structured diagnostics.
//!
//! Lexer, parser and expression grammar failures all become a single
//! [`Diagnostic`] with a stable kebab-case code and resolved positions.

use std::fmt;

use duo_lexer::{LexErrorKind, LexerError, LineIndex, Position, Span};
use serde::Serialize;

use crate::grammar::GrammarError;

/// Closed set of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    UnterminatedTag,
    UnterminatedExpression,
    UnterminatedRawTextBlock,
    UnterminatedComment,
    UnterminatedAttributeValue,
    InvalidTagName,
    InvalidAttributeName,
    UnclosedElement,
    UnclosedBlock,
    MismatchedClosingTag,
    UnexpectedClosingTag,
    UnexpectedBlockClose,
    UnexpectedBlockElse,
    MismatchedBlockClose,
    InvalidBlockContinuation,
    InvalidBlockHeader,
    InvalidExpression,
    InvalidAttributeShorthand,
    InvalidDirectiveValue,
    EmptyDirectiveName,
    ConflictingDirective,
}

impl DiagnosticCode {
    pub const ALL: &'static [DiagnosticCode] = &[
        DiagnosticCode::UnterminatedTag,
        DiagnosticCode::UnterminatedExpression,
        DiagnosticCode::UnterminatedRawTextBlock,
        DiagnosticCode::UnterminatedComment,
        DiagnosticCode::UnterminatedAttributeValue,
        DiagnosticCode::InvalidTagName,
        DiagnosticCode::InvalidAttributeName,
        DiagnosticCode::UnclosedElement,
        DiagnosticCode::UnclosedBlock,
        DiagnosticCode::MismatchedClosingTag,
        DiagnosticCode::UnexpectedClosingTag,
        DiagnosticCode::UnexpectedBlockClose,
        DiagnosticCode::UnexpectedBlockElse,
        DiagnosticCode::MismatchedBlockClose,
        DiagnosticCode::InvalidBlockContinuation,
        DiagnosticCode::InvalidBlockHeader,
        DiagnosticCode::InvalidExpression,
        DiagnosticCode::InvalidAttributeShorthand,
        DiagnosticCode::InvalidDirectiveValue,
        DiagnosticCode::EmptyDirectiveName,
        DiagnosticCode::ConflictingDirective,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedTag => "unterminated-tag",
            DiagnosticCode::UnterminatedExpression => "unterminated-expression",
            DiagnosticCode::UnterminatedRawTextBlock => "unterminated-raw-text-block",
            DiagnosticCode::UnterminatedComment => "unterminated-comment",
            DiagnosticCode::UnterminatedAttributeValue => "unterminated-attribute-value",
            DiagnosticCode::InvalidTagName => "invalid-tag-name",
            DiagnosticCode::InvalidAttributeName => "invalid-attribute-name",
            DiagnosticCode::UnclosedElement => "unclosed-element",
            DiagnosticCode::UnclosedBlock => "unclosed-block",
            DiagnosticCode::MismatchedClosingTag => "mismatched-closing-tag",
            DiagnosticCode::UnexpectedClosingTag => "unexpected-closing-tag",
            DiagnosticCode::UnexpectedBlockClose => "unexpected-block-close",
            DiagnosticCode::UnexpectedBlockElse => "unexpected-block-else",
            DiagnosticCode::MismatchedBlockClose => "mismatched-block-close",
            DiagnosticCode::InvalidBlockContinuation => "invalid-block-continuation",
            DiagnosticCode::InvalidBlockHeader => "invalid-block-header",
            DiagnosticCode::InvalidExpression => "invalid-expression",
            DiagnosticCode::InvalidAttributeShorthand => "invalid-attribute-shorthand",
            DiagnosticCode::InvalidDirectiveValue => "invalid-directive-value",
            DiagnosticCode::EmptyDirectiveName => "empty-directive-name",
            DiagnosticCode::ConflictingDirective => "conflicting-directive",
        }
    }

    /// Every syntax error ends the parse.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }

    fn default_message(&self) -> &'static str {
        match self {
            DiagnosticCode::UnterminatedTag => "Tag was left open",
            DiagnosticCode::UnterminatedExpression => "Expression was left open",
            DiagnosticCode::UnterminatedRawTextBlock => "Raw text element was left open",
            DiagnosticCode::UnterminatedComment => "Comment was left open",
            DiagnosticCode::UnterminatedAttributeValue => "Attribute value was left open",
            DiagnosticCode::InvalidTagName => "Expected a valid tag name",
            DiagnosticCode::InvalidAttributeName => "Expected a valid attribute name",
            DiagnosticCode::UnclosedElement => "Element was left open",
            DiagnosticCode::UnclosedBlock => "Block was left open",
            DiagnosticCode::MismatchedClosingTag => "Closing tag does not match the open element",
            DiagnosticCode::UnexpectedClosingTag => "Closing tag has no matching open element",
            DiagnosticCode::UnexpectedBlockClose => "Block close has no matching open block",
            DiagnosticCode::UnexpectedBlockElse => "Block continuation has no matching open block",
            DiagnosticCode::MismatchedBlockClose => "Block close does not match the open block",
            DiagnosticCode::InvalidBlockContinuation => "Continuation is not valid here",
            DiagnosticCode::InvalidBlockHeader => "Malformed block header",
            DiagnosticCode::InvalidExpression => "Invalid expression",
            DiagnosticCode::InvalidAttributeShorthand => "Attribute shorthand must be an identifier",
            DiagnosticCode::InvalidDirectiveValue => "Directive value must be an expression",
            DiagnosticCode::EmptyDirectiveName => "Directive is missing a name",
            DiagnosticCode::ConflictingDirective => "Directive conflicts with an earlier one",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Recoverable,
}

/// A located syntax error.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{}: {message} ({code})", location(.filename, .start))]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    pub start: Position,
    pub end: Position,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

fn location(filename: &Option<String>, start: &Position) -> String {
    match filename {
        Some(name) => format!("{name}:{}:{}", start.line, start.column),
        None => format!("{}:{}", start.line, start.column),
    }
}

/// Builds diagnostics for one source, resolving byte spans to positions.
#[derive(Debug, Clone)]
pub struct Reporter<'a> {
    index: LineIndex<'a>,
    filename: Option<String>,
}

impl<'a> Reporter<'a> {
    pub fn new(source: &'a str, filename: Option<&str>) -> Self {
        Self {
            index: LineIndex::new(source),
            filename: filename.map(str::to_string),
        }
    }

    pub fn report(&self, code: DiagnosticCode, span: Span) -> Diagnostic {
        self.report_with(code, span, code.default_message())
    }

    pub fn report_with(
        &self,
        code: DiagnosticCode,
        span: Span,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic {
            code,
            message: message.into(),
            start: self.index.position(span.start),
            end: self.index.position(span.end),
            severity: code.severity(),
            filename: self.filename.clone(),
        }
    }

    pub fn from_lexer(&self, error: LexerError) -> Diagnostic {
        let code = match error.kind {
            LexErrorKind::UnterminatedTag => DiagnosticCode::UnterminatedTag,
            LexErrorKind::UnterminatedExpression => DiagnosticCode::UnterminatedExpression,
            LexErrorKind::UnterminatedRawTextBlock => DiagnosticCode::UnterminatedRawTextBlock,
            LexErrorKind::UnterminatedComment => DiagnosticCode::UnterminatedComment,
            LexErrorKind::UnterminatedAttributeValue => DiagnosticCode::UnterminatedAttributeValue,
            LexErrorKind::InvalidTagName => DiagnosticCode::InvalidTagName,
            LexErrorKind::InvalidAttributeName => DiagnosticCode::InvalidAttributeName,
        };
        self.report_with(code, error.span, error.message)
    }

    /// Grammar failures keep the grammar's own message and span.
    pub fn from_grammar(&self, error: GrammarError) -> Diagnostic {
        self.report_with(DiagnosticCode::InvalidExpression, error.span, error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_codes_are_unique_kebab_case() {
        let mut seen = std::collections::HashSet::new();
        for code in DiagnosticCode::ALL {
            let s = code.as_str();
            assert!(seen.insert(s), "duplicate code {s}");
            assert!(s.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::Value::String(s.to_string()));
        }
        assert_eq!(seen.len(), 21);
    }

    #[test]
    fn test_report_resolves_positions() {
        let reporter = Reporter::new("<div>\n  <p>", None);
        let diagnostic = reporter.report(DiagnosticCode::UnclosedElement, Span::new(8, 10));
        assert_eq!(diagnostic.start, Position::new(8, 2, 3));
        assert_eq!(diagnostic.end, Position::new(10, 2, 5));
        assert_eq!(diagnostic.severity, Severity::Fatal);
    }

    #[test]
    fn test_display_with_filename() {
        let reporter = Reporter::new("<p>", Some("App.duo"));
        let diagnostic = reporter.report_with(DiagnosticCode::UnclosedElement, Span::new(0, 2), "<p> was left open");
        assert_eq!(
            diagnostic.to_string(),
            "App.duo:1:1: <p> was left open (unclosed-element)"
        );
    }

    #[test]
    fn test_display_without_filename() {
        let reporter = Reporter::new("</p>", None);
        let diagnostic = reporter.report(DiagnosticCode::UnexpectedClosingTag, Span::new(0, 3));
        assert_eq!(
            diagnostic.to_string(),
            "1:1: Closing tag has no matching open element (unexpected-closing-tag)"
        );
    }

    #[test]
    fn test_from_lexer_keeps_span() {
        let reporter = Reporter::new("a<!-- b", None);
        let error = LexerError {
            kind: LexErrorKind::UnterminatedComment,
            message: "open".into(),
            span: Span::new(1, 5),
        };
        let diagnostic = reporter.from_lexer(error);
        assert_eq!(diagnostic.code, DiagnosticCode::UnterminatedComment);
        assert_eq!(diagnostic.start.offset, 1);
    }

    #[test]
    fn test_serialized_shape() {
        let reporter = Reporter::new("</p>", None);
        let diagnostic = reporter.report(DiagnosticCode::UnexpectedClosingTag, Span::new(0, 3));
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["code"], "unexpected-closing-tag");
        assert_eq!(json["severity"], "fatal");
        assert_eq!(json["start"]["offset"], 0);
        assert_eq!(json["end"]["column"], 4);
        assert!(json.get("filename").is_none());
    }
}

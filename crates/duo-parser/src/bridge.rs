use duo_lexer::{find_expression_end, Span};

use crate::ast::{Expression, ExpressionKind};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Reporter};
use crate::grammar::{ExpressionGrammar, GrammarError};

/// Connects the template parser to an [`ExpressionGrammar`].
///
/// Trims the delimited source, invokes the grammar and wraps the result as
/// an [`Expression`] node. Grammar failures become `invalid-expression`
/// diagnostics at the span the grammar reported.
#[derive(Clone, Copy)]
pub struct ExpressionBridge<'g> {
    grammar: &'g dyn ExpressionGrammar,
}

impl<'g> ExpressionBridge<'g> {
    pub fn new(grammar: &'g dyn ExpressionGrammar) -> Self {
        Self { grammar }
    }

    /// Parse the expression whose opening delimiter ends at `after_open`.
    /// Returns the expression and the offset of the closing `}`.
    pub fn parse_delimited(
        &self,
        reporter: &Reporter<'_>,
        source: &str,
        after_open: usize,
    ) -> Result<(Expression, usize), Diagnostic> {
        let end = find_expression_end(source, after_open).ok_or_else(|| {
            let open = after_open.saturating_sub(1);
            reporter.report_with(
                DiagnosticCode::UnterminatedExpression,
                Span::new(open, after_open),
                "Expected '}' to close the expression",
            )
        })?;
        let expression = self.expression(reporter, source, Span::new(after_open, end))?;
        Ok((expression, end))
    }

    /// Parse `span` of `source` as a value expression.
    pub fn expression(
        &self,
        reporter: &Reporter<'_>,
        source: &str,
        span: Span,
    ) -> Result<Expression, Diagnostic> {
        self.run(reporter, source, span, |grammar, text, offset| {
            grammar.parse_expression(text, offset)
        })
    }

    /// Parse `span` of `source` as a binding pattern.
    pub fn pattern(
        &self,
        reporter: &Reporter<'_>,
        source: &str,
        span: Span,
    ) -> Result<Expression, Diagnostic> {
        self.run(reporter, source, span, |grammar, text, offset| {
            grammar.parse_pattern(text, offset)
        })
    }

    fn run<F>(
        &self,
        reporter: &Reporter<'_>,
        source: &str,
        span: Span,
        parse: F,
    ) -> Result<Expression, Diagnostic>
    where
        F: FnOnce(&dyn ExpressionGrammar, &str, usize) -> Result<ExpressionKind, GrammarError>,
    {
        let span = trim_span(source, span);
        let text = &source[span.start..span.end];
        let kind = parse(self.grammar, text, span.start).map_err(|e| reporter.from_grammar(e))?;
        Ok(Expression {
            span,
            source: text.to_string(),
            kind,
        })
    }
}

/// Narrow `span` to exclude leading and trailing whitespace.
/// An all-whitespace span collapses to its start.
pub fn trim_span(source: &str, span: Span) -> Span {
    let text = &source[span.start..span.end];
    let trimmed_start = text.trim_start();
    if trimmed_start.is_empty() {
        return Span::new(span.start, span.start);
    }
    let start = span.start + (text.len() - trimmed_start.len());
    let end = start + trimmed_start.trim_end().len();
    Span::new(start, end)
}

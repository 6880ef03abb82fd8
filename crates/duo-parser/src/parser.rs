//! Template parser.
//!
//! Recursive descent over the token stream from `duo-lexer`, pulled one
//! token at a time. The lookahead is held as a `Result` so a lexer failure
//! only surfaces once the parser actually inspects that token, which keeps
//! the first diagnostic in source order the one reported.
//!
//! Open elements and blocks are tracked on an explicit frame stack; closing
//! tags and block closers are resolved against its innermost frame.

use duo_lexer::token::{is_raw_text_element, is_void_element};
use duo_lexer::{Lexer, Span, Token, TokenKind};
use tracing::trace;

use crate::ast::{
    Attribute, AttributeValue, AwaitBlock, Comment, DirectiveKind, Doctype, EachBlock, Element,
    Expression, Fragment, IfBlock, KeyBlock, MustacheTag, Node, RawElement, RawText, Text,
    TransitionDirection, ValuePart,
};
use crate::bridge::{trim_span, ExpressionBridge};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Reporter};
use crate::grammar::ExpressionGrammar;
use crate::header::{self, AwaitBranch};

/// An open element or block awaiting its closer.
#[derive(Debug, Clone)]
enum Frame {
    Element { name: String, span: Span },
    Block { keyword: &'static str, span: Span },
}

/// A block tag (`{#kw ...}`, `{:kw ...}` or `{/kw ...}`) with its closing
/// brace consumed. `header` is the text between the keyword and the brace.
#[derive(Debug, Clone)]
struct BlockTag {
    keyword: String,
    span: Span,
    header: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AwaitPhase {
    Pending,
    Then,
    Catch,
}

/// Template parser.
///
/// Converts template source into a [`Fragment`] using recursive descent.
/// Embedded expressions are handed to the [`ExpressionGrammar`] through an
/// [`ExpressionBridge`].
pub struct Parser<'a, 'g> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Result<Token, Diagnostic>,
    prev_end: usize,
    bridge: ExpressionBridge<'g>,
    reporter: Reporter<'a>,
    stack: Vec<Frame>,
    opened: usize,
    closed: usize,
}

impl<'a, 'g> Parser<'a, 'g> {
    pub fn new(
        source: &'a str,
        grammar: &'g dyn ExpressionGrammar,
        filename: Option<&str>,
    ) -> Self {
        let reporter = Reporter::new(source, filename);
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token().map_err(|e| reporter.from_lexer(e));
        Self {
            source,
            lexer,
            current,
            prev_end: 0,
            bridge: ExpressionBridge::new(grammar),
            reporter,
            stack: Vec::new(),
            opened: 0,
            closed: 0,
        }
    }

    /// Parse source into an unnormalized fragment.
    pub fn parse(source: &str, grammar: &dyn ExpressionGrammar) -> Result<Fragment, Diagnostic> {
        Parser::new(source, grammar, None).parse_document()
    }

    /// Parse the whole source. The fragment span covers the full input.
    pub fn parse_document(&mut self) -> Result<Fragment, Diagnostic> {
        let children = self.parse_fragment()?;

        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::TagCloseStart(name) => return Err(self.stray_closing_tag(&name, token.span)),
            TokenKind::BlockClose(keyword) => {
                return Err(self.reporter.report_with(
                    DiagnosticCode::UnexpectedBlockClose,
                    token.span,
                    format!("{{/{keyword}}} has no matching {{#{keyword}}}"),
                ))
            }
            TokenKind::BlockElse(keyword) => {
                return Err(self.reporter.report_with(
                    DiagnosticCode::UnexpectedBlockElse,
                    token.span,
                    format!("{{:{keyword}}} appears outside of any block"),
                ))
            }
            _ => {}
        }

        debug_assert_eq!(self.opened, self.closed);
        Ok(Fragment {
            span: Span::new(0, self.source.len()),
            children,
        })
    }

    /// Elements and blocks opened so far.
    pub fn frames_opened(&self) -> usize {
        self.opened
    }

    /// Elements and blocks closed so far.
    pub fn frames_closed(&self) -> usize {
        self.closed
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Parse sibling nodes until end of input or a token that closes the
    /// enclosing construct.
    fn parse_fragment(&mut self) -> Result<Vec<Node>, Diagnostic> {
        let mut nodes = Vec::new();
        loop {
            if matches!(
                self.peek()?.kind,
                TokenKind::Eof
                    | TokenKind::TagCloseStart(_)
                    | TokenKind::BlockElse(_)
                    | TokenKind::BlockClose(_)
            ) {
                return Ok(nodes);
            }
            nodes.push(self.parse_node()?);
        }
    }

    fn parse_node(&mut self) -> Result<Node, Diagnostic> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Text(raw) => {
                self.advance()?;
                let data = unescape(&raw);
                Ok(Node::Text(Text {
                    span: token.span,
                    raw,
                    data,
                }))
            }
            TokenKind::CommentText(body) => {
                self.advance()?;
                let data = body.trim().to_string();
                let ignores = ignore_codes(&data);
                Ok(Node::Comment(Comment {
                    span: token.span,
                    data,
                    ignores,
                }))
            }
            TokenKind::Doctype(value) => {
                self.advance()?;
                Ok(Node::Doctype(Doctype {
                    span: token.span,
                    value,
                }))
            }
            TokenKind::TagOpenStart(name) => self.parse_element(name, token.span),
            TokenKind::ExpressionStart => self.parse_mustache(token.span),
            TokenKind::BlockOpen(_) => self.parse_block(),
            other => Err(self.reporter.report_with(
                DiagnosticCode::InvalidTagName,
                token.span,
                format!("Unexpected {other}"),
            )),
        }
    }

    fn parse_mustache(&mut self, open: Span) -> Result<Node, Diagnostic> {
        self.advance()?;
        let body = Span::new(open.end, self.peek()?.span.start);

        if let Some(data) = comment_body(self.source[body.start..body.end].trim()) {
            let end = self.expect_expression_end()?.end;
            let ignores = ignore_codes(&data);
            return Ok(Node::Comment(Comment {
                span: Span::new(open.start, end),
                data,
                ignores,
            }));
        }

        let expression = self.bridge.expression(&self.reporter, self.source, body)?;
        let end = self.expect_expression_end()?.end;
        Ok(Node::MustacheTag(MustacheTag {
            span: Span::new(open.start, end),
            expression,
        }))
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn parse_element(&mut self, name: String, open: Span) -> Result<Node, Diagnostic> {
        self.advance()?;
        let attributes = self.parse_attributes()?;

        let token = self.advance()?;
        let tag_end = token.span.end;
        match token.kind {
            TokenKind::TagSelfCloseEnd => {
                return Ok(Node::Element(Element {
                    span: Span::new(open.start, tag_end),
                    name,
                    attributes,
                    children: Vec::new(),
                    self_closing: true,
                }))
            }
            TokenKind::TagOpenEnd => {}
            other => {
                return Err(self.reporter.report_with(
                    DiagnosticCode::InvalidAttributeName,
                    token.span,
                    format!("Unexpected {other} inside <{name}>"),
                ))
            }
        }

        if is_raw_text_element(&name) {
            return self.parse_raw_element(name, open, attributes, tag_end);
        }

        if is_void_element(&name) {
            return Ok(Node::Element(Element {
                span: Span::new(open.start, tag_end),
                name,
                attributes,
                children: Vec::new(),
                self_closing: false,
            }));
        }

        self.open_frame(Frame::Element {
            name: name.clone(),
            span: open,
        });
        let children = self.parse_fragment()?;
        let end = self.close_element(&name, open)?;

        Ok(Node::Element(Element {
            span: Span::new(open.start, end),
            name,
            attributes,
            children,
            self_closing: false,
        }))
    }

    /// The lexer only leaves raw text mode at the matching closing tag.
    fn parse_raw_element(
        &mut self,
        name: String,
        open: Span,
        attributes: Vec<Attribute>,
        tag_end: usize,
    ) -> Result<Node, Diagnostic> {
        self.open_frame(Frame::Element {
            name: name.clone(),
            span: open,
        });

        let token = self.peek()?.clone();
        let content = match token.kind {
            TokenKind::Text(data) => {
                self.advance()?;
                RawText {
                    span: token.span,
                    data,
                }
            }
            _ => RawText {
                span: Span::new(tag_end, tag_end),
                data: String::new(),
            },
        };

        self.advance()?; // </script
        let end = self.expect_tag_close_end()?;
        self.close_frame();

        let element = RawElement {
            span: Span::new(open.start, end),
            name: name.clone(),
            attributes,
            content,
        };
        if name.eq_ignore_ascii_case("script") {
            Ok(Node::Script(element))
        } else {
            Ok(Node::Style(element))
        }
    }

    /// Resolve the token that ended an element's children. Returns the end
    /// offset of the closing tag.
    fn close_element(&mut self, name: &str, open: Span) -> Result<usize, Diagnostic> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::TagCloseStart(closing) if closing == name => {
                self.advance()?;
                let end = self.expect_tag_close_end()?;
                self.close_frame();
                Ok(end)
            }
            TokenKind::TagCloseStart(closing) if is_void_element(&closing) => {
                Err(self.stray_closing_tag(&closing, token.span))
            }
            TokenKind::TagCloseStart(closing) => Err(self.reporter.report_with(
                DiagnosticCode::MismatchedClosingTag,
                token.span,
                format!("</{closing}> attempted to close <{name}>"),
            )),
            TokenKind::BlockClose(_) | TokenKind::BlockElse(_) if self.has_open_block() => {
                Err(self.unclosed_element(name, open))
            }
            TokenKind::BlockClose(keyword) => Err(self.reporter.report_with(
                DiagnosticCode::UnexpectedBlockClose,
                token.span,
                format!("{{/{keyword}}} has no matching {{#{keyword}}}"),
            )),
            TokenKind::BlockElse(keyword) => Err(self.reporter.report_with(
                DiagnosticCode::UnexpectedBlockElse,
                token.span,
                format!("{{:{keyword}}} appears outside of any block"),
            )),
            _ => Err(self.unclosed_element(name, open)),
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, Diagnostic> {
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let kind = self.peek()?.kind.clone();
            let attribute = match kind {
                TokenKind::AttributeName(name) => self.parse_attribute(name)?,
                TokenKind::ExpressionStart => self.parse_attribute_shorthand()?,
                _ => return Ok(attributes),
            };
            self.check_conflicts(&attributes, &attribute)?;
            attributes.push(attribute);
        }
    }

    fn parse_attribute(&mut self, raw_name: String) -> Result<Attribute, Diagnostic> {
        let name_span = self.advance()?.span;
        let value = if self.at(&TokenKind::Equals) {
            self.advance()?;
            Some(self.parse_attribute_value()?)
        } else {
            None
        };
        let span = Span::new(name_span.start, self.prev_end);

        let (kind, name, modifiers) = classify_attribute(&raw_name);
        if kind.is_directive() {
            if name.is_empty() {
                return Err(self.reporter.report_with(
                    DiagnosticCode::EmptyDirectiveName,
                    span,
                    format!("'{raw_name}' is missing a name after the prefix"),
                ));
            }
            if matches!(
                value,
                Some(AttributeValue::Literal(_) | AttributeValue::Template(_))
            ) {
                return Err(self.reporter.report_with(
                    DiagnosticCode::InvalidDirectiveValue,
                    span,
                    format!("'{raw_name}' expects a single {{expression}} as its value"),
                ));
            }
        }

        Ok(Attribute {
            span,
            name,
            kind,
            modifiers,
            value,
        })
    }

    fn parse_attribute_value(&mut self) -> Result<AttributeValue, Diagnostic> {
        let mut parts = Vec::new();

        let kind = self.peek()?.kind.clone();
        match kind {
            TokenKind::Quote => {
                self.advance()?;
                loop {
                    let token = self.peek()?.clone();
                    match token.kind {
                        TokenKind::AttributeValue(data) => {
                            self.advance()?;
                            parts.push(ValuePart::Text {
                                span: token.span,
                                data,
                            });
                        }
                        TokenKind::ExpressionStart => {
                            parts.push(ValuePart::Expression(self.parse_braced_expression()?))
                        }
                        TokenKind::Quote => {
                            self.advance()?;
                            break;
                        }
                        other => {
                            return Err(self.reporter.report_with(
                                DiagnosticCode::UnterminatedAttributeValue,
                                token.span,
                                format!("Unexpected {other} inside a quoted value"),
                            ))
                        }
                    }
                }
            }
            TokenKind::AttributeValue(_) | TokenKind::ExpressionStart => {
                // bare parts only belong together while they touch; a lexer
                // failure past the value is left for the next peek
                loop {
                    let Some(token) = self.current.as_ref().ok().cloned() else {
                        break;
                    };
                    if !parts.is_empty() && token.span.start != self.prev_end {
                        break;
                    }
                    match token.kind {
                        TokenKind::AttributeValue(data) => {
                            self.advance()?;
                            parts.push(ValuePart::Text {
                                span: token.span,
                                data,
                            });
                        }
                        TokenKind::ExpressionStart => {
                            parts.push(ValuePart::Expression(self.parse_braced_expression()?))
                        }
                        _ => break,
                    }
                }
            }
            _ => {}
        }

        Ok(collapse_value(parts))
    }

    /// `{name}` shorthand or `{...spread}` in attribute position.
    fn parse_attribute_shorthand(&mut self) -> Result<Attribute, Diagnostic> {
        let open = self.advance()?.span;
        let body = trim_span(self.source, Span::new(open.end, self.peek()?.span.start));
        let text = &self.source[body.start..body.end];

        if text.starts_with("...") {
            let expression = self.bridge.expression(
                &self.reporter,
                self.source,
                Span::new(body.start + 3, body.end),
            )?;
            let end = self.expect_expression_end()?.end;
            return Ok(Attribute {
                span: Span::new(open.start, end),
                name: String::new(),
                kind: DirectiveKind::Spread,
                modifiers: Vec::new(),
                value: Some(AttributeValue::Expression(expression)),
            });
        }

        let expression = self.bridge.expression(&self.reporter, self.source, body)?;
        let Some(name) = expression.identifier().map(str::to_string) else {
            return Err(self.reporter.report_with(
                DiagnosticCode::InvalidAttributeShorthand,
                expression.span,
                format!("'{{{}}}' is not a valid attribute shorthand", expression.source),
            ));
        };
        let end = self.expect_expression_end()?.end;
        let (kind, name) = match event_name(&name) {
            Some(event) => (DirectiveKind::EventHandler, event),
            None => (DirectiveKind::Plain, name),
        };

        Ok(Attribute {
            span: Span::new(open.start, end),
            name,
            kind,
            modifiers: Vec::new(),
            value: Some(AttributeValue::Expression(expression)),
        })
    }

    fn check_conflicts(&self, existing: &[Attribute], attribute: &Attribute) -> Result<(), Diagnostic> {
        let message = existing.iter().find_map(|previous| match (previous.kind, attribute.kind) {
            (DirectiveKind::Binding, DirectiveKind::Binding) if previous.name == attribute.name => {
                Some(format!("'bind:{}' appears more than once", attribute.name))
            }
            (DirectiveKind::Transition(a), DirectiveKind::Transition(b)) if a.intro() && b.intro() => {
                Some("An element can only have one intro transition".to_string())
            }
            (DirectiveKind::Transition(a), DirectiveKind::Transition(b)) if a.outro() && b.outro() => {
                Some("An element can only have one outro transition".to_string())
            }
            (DirectiveKind::Animation, DirectiveKind::Animation) => {
                Some("An element can only have one 'animate' directive".to_string())
            }
            _ => None,
        });

        match message {
            Some(message) => Err(self.reporter.report_with(
                DiagnosticCode::ConflictingDirective,
                attribute.span,
                message,
            )),
            None => Ok(()),
        }
    }

    fn parse_braced_expression(&mut self) -> Result<Expression, Diagnostic> {
        let open = self.advance()?.span;
        let (expression, _) = self
            .bridge
            .parse_delimited(&self.reporter, self.source, open.end)?;
        self.expect_expression_end()?;
        Ok(expression)
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    fn parse_block(&mut self) -> Result<Node, Diagnostic> {
        let tag = self.read_block_tag()?;
        match tag.keyword.as_str() {
            "if" => self.parse_if(tag),
            "each" => self.parse_each(tag),
            "await" => self.parse_await(tag),
            "key" => self.parse_key(tag),
            "" => Err(self.reporter.report_with(
                DiagnosticCode::InvalidBlockHeader,
                tag.span,
                "Expected a block keyword after '{#'",
            )),
            other => Err(self.reporter.report_with(
                DiagnosticCode::InvalidBlockHeader,
                tag.span,
                format!("Unknown block type '{{#{other}}}'"),
            )),
        }
    }

    fn parse_if(&mut self, tag: BlockTag) -> Result<Node, Diagnostic> {
        let condition = self.required_expression(tag.header, &tag, "a condition after '{#if'")?;
        self.open_frame(Frame::Block {
            keyword: "if",
            span: tag.span,
        });
        let mut block = self.parse_if_branches(tag.span.start, condition, false)?;
        block.span.end = self.close_block("if", tag.span)?;
        Ok(Node::IfBlock(block))
    }

    /// Consequent plus any `{:else}` / `{:else if}` chain, stopping before
    /// the closer. An `{:else if}` nests as an `elseif` block whose span
    /// ends where the closer starts.
    fn parse_if_branches(
        &mut self,
        start: usize,
        condition: Expression,
        elseif: bool,
    ) -> Result<IfBlock, Diagnostic> {
        let consequent = self.parse_fragment()?;
        let mut alternate = None;

        let next = self.peek()?.kind.clone();
        if let TokenKind::BlockElse(keyword) = next {
            let tag = self.read_block_tag()?;
            if keyword != "else" {
                return Err(self.invalid_continuation(&tag, "if"));
            }

            let header = &self.source[tag.header.start..tag.header.end];
            if header.trim().is_empty() {
                let nodes = self.parse_fragment()?;
                let token = self.peek()?.clone();
                if let TokenKind::BlockElse(_) = token.kind {
                    return Err(self.reporter.report_with(
                        DiagnosticCode::InvalidBlockContinuation,
                        token.span,
                        "Expected {/if} after {:else}",
                    ));
                }
                alternate = Some(nodes);
            } else if let Some(after_if) = header::else_if_condition(header) {
                let span = Span::new(tag.header.start + after_if, tag.header.end);
                let condition = self.required_expression(span, &tag, "a condition after '{:else if'")?;
                let nested = self.parse_if_branches(tag.span.start, condition, true)?;
                alternate = Some(vec![Node::IfBlock(nested)]);
            } else {
                return Err(self.reporter.report_with(
                    DiagnosticCode::InvalidBlockContinuation,
                    tag.span,
                    "Expected {:else} or {:else if ...}",
                ));
            }
        }

        let end = self.peek()?.span.start;
        Ok(IfBlock {
            span: Span::new(start, end),
            condition,
            consequent,
            alternate,
            elseif,
        })
    }

    fn parse_each(&mut self, tag: BlockTag) -> Result<Node, Diagnostic> {
        let source = self.source;
        let parts = header::split_each(&source[tag.header.start..tag.header.end])
            .map_err(|message| {
                self.reporter
                    .report_with(DiagnosticCode::InvalidBlockHeader, tag.span, message)
            })?;
        let at = |span: Span| Span::new(tag.header.start + span.start, tag.header.start + span.end);

        let expression =
            self.required_expression(at(parts.expression), &tag, "an expression after '{#each'")?;
        let context = match parts.context {
            Some(span) => Some(self.bridge.pattern(&self.reporter, source, at(span))?),
            None => None,
        };
        let index = match parts.index {
            Some(span) => Some(self.index_name(at(span))?),
            None => None,
        };
        let key = match parts.key {
            Some(span) => Some(self.bridge.expression(&self.reporter, source, at(span))?),
            None => None,
        };

        self.open_frame(Frame::Block {
            keyword: "each",
            span: tag.span,
        });
        let body = self.parse_fragment()?;

        let mut fallback = None;
        let next = self.peek()?.kind.clone();
        if let TokenKind::BlockElse(keyword) = next {
            let else_tag = self.read_block_tag()?;
            if keyword != "else" || !self.is_blank(else_tag.header) {
                return Err(self.invalid_continuation(&else_tag, "each"));
            }
            fallback = Some(self.parse_fragment()?);
        }

        let end = self.close_block("each", tag.span)?;
        Ok(Node::EachBlock(EachBlock {
            span: Span::new(tag.span.start, end),
            expression,
            context,
            index,
            key,
            body,
            fallback,
        }))
    }

    fn parse_await(&mut self, tag: BlockTag) -> Result<Node, Diagnostic> {
        let source = self.source;
        let parts = header::split_await(&source[tag.header.start..tag.header.end]);
        let at = |span: Span| Span::new(tag.header.start + span.start, tag.header.start + span.end);

        let expression =
            self.required_expression(at(parts.expression), &tag, "a promise after '{#await'")?;

        let mut value = None;
        let mut error = None;
        let mut phase = match parts.branch {
            Some((AwaitBranch::Then, span)) => {
                value = self.optional_pattern(at(span))?;
                AwaitPhase::Then
            }
            Some((AwaitBranch::Catch, span)) => {
                error = self.optional_pattern(at(span))?;
                AwaitPhase::Catch
            }
            None => AwaitPhase::Pending,
        };

        self.open_frame(Frame::Block {
            keyword: "await",
            span: tag.span,
        });

        let (mut pending, mut then, mut catch) = (None, None, None);
        loop {
            let nodes = self.parse_fragment()?;
            match phase {
                AwaitPhase::Pending => pending = Some(nodes),
                AwaitPhase::Then => then = Some(nodes),
                AwaitPhase::Catch => catch = Some(nodes),
            }

            let TokenKind::BlockElse(keyword) = self.peek()?.kind.clone() else {
                break;
            };
            let continuation = self.read_block_tag()?;
            let next = match (keyword.as_str(), phase) {
                ("then", AwaitPhase::Pending) => AwaitPhase::Then,
                ("catch", AwaitPhase::Pending | AwaitPhase::Then) => AwaitPhase::Catch,
                _ => return Err(self.invalid_continuation(&continuation, "await")),
            };
            let binding = self.optional_pattern(continuation.header)?;
            match next {
                AwaitPhase::Then => value = binding,
                AwaitPhase::Catch => error = binding,
                AwaitPhase::Pending => {}
            }
            phase = next;
        }

        let end = self.close_block("await", tag.span)?;
        Ok(Node::AwaitBlock(AwaitBlock {
            span: Span::new(tag.span.start, end),
            expression,
            value,
            error,
            pending,
            then,
            catch,
        }))
    }

    fn parse_key(&mut self, tag: BlockTag) -> Result<Node, Diagnostic> {
        let expression = self.required_expression(tag.header, &tag, "an expression after '{#key'")?;
        self.open_frame(Frame::Block {
            keyword: "key",
            span: tag.span,
        });
        let body = self.parse_fragment()?;
        let end = self.close_block("key", tag.span)?;
        Ok(Node::KeyBlock(KeyBlock {
            span: Span::new(tag.span.start, end),
            expression,
            body,
        }))
    }

    /// Resolve the token that ended a block body. Returns the end offset of
    /// the `{/keyword}` closer.
    fn close_block(&mut self, keyword: &str, open: Span) -> Result<usize, Diagnostic> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::BlockClose(closing) if closing == keyword => {
                let tag = self.read_block_tag()?;
                if !self.is_blank(tag.header) {
                    return Err(self.reporter.report_with(
                        DiagnosticCode::InvalidBlockHeader,
                        tag.span,
                        format!("{{/{keyword}}} does not take an expression"),
                    ));
                }
                self.close_frame();
                Ok(tag.span.end)
            }
            TokenKind::BlockClose(closing) => Err(self.reporter.report_with(
                DiagnosticCode::MismatchedBlockClose,
                token.span,
                format!("Expected {{/{keyword}}}, found {{/{closing}}}"),
            )),
            TokenKind::BlockElse(continuation) => Err(self.reporter.report_with(
                DiagnosticCode::InvalidBlockContinuation,
                token.span,
                format!("{{:{continuation}}} is not valid inside {{#{keyword}}}"),
            )),
            TokenKind::TagCloseStart(name) if is_void_element(&name) || !self.has_open_element() => {
                Err(self.stray_closing_tag(&name, token.span))
            }
            _ => Err(self.reporter.report_with(
                DiagnosticCode::UnclosedBlock,
                open,
                format!("{{#{keyword}}} was left open"),
            )),
        }
    }

    fn read_block_tag(&mut self) -> Result<BlockTag, Diagnostic> {
        let token = self.advance()?;
        let keyword = match token.kind {
            TokenKind::BlockOpen(keyword)
            | TokenKind::BlockElse(keyword)
            | TokenKind::BlockClose(keyword) => keyword,
            _ => String::new(),
        };
        let close = self.expect_expression_end()?;
        Ok(BlockTag {
            keyword,
            span: Span::new(token.span.start, close.end),
            header: Span::new(token.span.end, close.start),
        })
    }

    fn required_expression(
        &self,
        span: Span,
        tag: &BlockTag,
        what: &str,
    ) -> Result<Expression, Diagnostic> {
        if self.is_blank(span) {
            return Err(self.reporter.report_with(
                DiagnosticCode::InvalidBlockHeader,
                tag.span,
                format!("Expected {what}"),
            ));
        }
        self.bridge.expression(&self.reporter, self.source, span)
    }

    fn optional_pattern(&self, span: Span) -> Result<Option<Expression>, Diagnostic> {
        if self.is_blank(span) {
            return Ok(None);
        }
        self.bridge
            .pattern(&self.reporter, self.source, span)
            .map(Some)
    }

    fn index_name(&self, span: Span) -> Result<String, Diagnostic> {
        let expression = self.bridge.expression(&self.reporter, self.source, span)?;
        match expression.identifier() {
            Some(name) => Ok(name.to_string()),
            None => Err(self.reporter.report_with(
                DiagnosticCode::InvalidBlockHeader,
                expression.span,
                format!("'{}' is not a valid index name", expression.source),
            )),
        }
    }

    // =========================================================================
    // Frames and diagnostics
    // =========================================================================

    fn open_frame(&mut self, frame: Frame) {
        trace!(?frame, depth = self.stack.len(), "open");
        self.stack.push(frame);
        self.opened += 1;
    }

    fn close_frame(&mut self) {
        if let Some(frame) = self.stack.pop() {
            trace!(?frame, depth = self.stack.len(), "close");
            self.closed += 1;
        }
    }

    fn has_open_block(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Block { .. }))
    }

    fn has_open_element(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Element { .. }))
    }

    fn unclosed_element(&self, name: &str, open: Span) -> Diagnostic {
        self.reporter.report_with(
            DiagnosticCode::UnclosedElement,
            open,
            format!("<{name}> was left open"),
        )
    }

    fn stray_closing_tag(&self, name: &str, span: Span) -> Diagnostic {
        let message = if is_void_element(name) {
            format!("</{name}> attempted to close a void element")
        } else {
            format!("</{name}> attempted to close an element that was not open")
        };
        self.reporter
            .report_with(DiagnosticCode::UnexpectedClosingTag, span, message)
    }

    fn invalid_continuation(&self, tag: &BlockTag, block: &str) -> Diagnostic {
        self.reporter.report_with(
            DiagnosticCode::InvalidBlockContinuation,
            tag.span,
            format!("{{:{}}} is not valid inside {{#{block}}}", tag.keyword),
        )
    }

    // =========================================================================
    // Token navigation helpers
    // =========================================================================

    fn peek(&self) -> Result<&Token, Diagnostic> {
        self.current.as_ref().map_err(Clone::clone)
    }

    /// Whether the lookahead is `kind`. A pending lexer error reads as no.
    fn at(&self, kind: &TokenKind) -> bool {
        matches!(&self.current, Ok(token) if token.kind == *kind)
    }

    /// Consume the current token and pull the next one. A lexer failure on
    /// the next token is stored, not returned.
    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let next = self
            .lexer
            .next_token()
            .map_err(|e| self.reporter.from_lexer(e));
        let previous = std::mem::replace(&mut self.current, next)?;
        self.prev_end = previous.span.end;
        Ok(previous)
    }

    fn expect_expression_end(&mut self) -> Result<Span, Diagnostic> {
        let token = self.peek()?;
        if token.kind != TokenKind::ExpressionEnd {
            return Err(self.reporter.report(DiagnosticCode::UnterminatedExpression, token.span));
        }
        Ok(self.advance()?.span)
    }

    fn expect_tag_close_end(&mut self) -> Result<usize, Diagnostic> {
        let token = self.peek()?;
        if token.kind != TokenKind::TagCloseEnd {
            return Err(self.reporter.report(DiagnosticCode::UnterminatedTag, token.span));
        }
        Ok(self.advance()?.span.end)
    }

    fn is_blank(&self, span: Span) -> bool {
        self.source[span.start..span.end].trim().is_empty()
    }
}

/// Split a raw attribute name into directive kind, name and modifiers.
/// Unknown prefixes stay plain with the full name kept.
fn classify_attribute(raw: &str) -> (DirectiveKind, String, Vec<String>) {
    if let Some(event) = event_name(raw) {
        return (DirectiveKind::EventHandler, event, Vec::new());
    }
    let Some((prefix, rest)) = raw.split_once(':') else {
        return (DirectiveKind::Plain, raw.to_string(), Vec::new());
    };

    let kind = match prefix {
        "on" => DirectiveKind::EventHandler,
        "bind" => DirectiveKind::Binding,
        "class" => DirectiveKind::Class,
        "transition" => DirectiveKind::Transition(TransitionDirection::Both),
        "in" => DirectiveKind::Transition(TransitionDirection::In),
        "out" => DirectiveKind::Transition(TransitionDirection::Out),
        "animate" => DirectiveKind::Animation,
        "use" => DirectiveKind::Action,
        "let" => DirectiveKind::Let,
        _ => return (DirectiveKind::Plain, raw.to_string(), Vec::new()),
    };

    let mut pieces = rest.split('|');
    let name = pieces.next().unwrap_or_default().to_string();
    let modifiers = pieces
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    (kind, name, modifiers)
}

/// `onClick` style handler names: `on` then an uppercase letter. The event
/// name comes back lowercased.
fn event_name(raw: &str) -> Option<String> {
    let rest = raw.strip_prefix("on")?;
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) || rest.contains(':') {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

fn collapse_value(mut parts: Vec<ValuePart>) -> AttributeValue {
    if parts.len() > 1 {
        return AttributeValue::Template(parts);
    }
    match parts.pop() {
        None => AttributeValue::Literal(String::new()),
        Some(ValuePart::Text { data, .. }) => AttributeValue::Literal(data),
        Some(ValuePart::Expression(expression)) => AttributeValue::Expression(expression),
    }
}

/// Mustache bodies that are comments: empty, `! ...`, or one `/* ... */`.
fn comment_body(text: &str) -> Option<String> {
    if text.is_empty() {
        return Some(String::new());
    }
    if let Some(rest) = text.strip_prefix('!') {
        return Some(rest.trim().to_string());
    }
    let inner = text.strip_prefix("/*")?.strip_suffix("*/")?;
    if inner.contains("*/") {
        None
    } else {
        Some(inner.trim().to_string())
    }
}

/// Codes listed after a `duo-ignore` marker, separated by whitespace or commas.
fn ignore_codes(data: &str) -> Vec<String> {
    match data.strip_prefix("duo-ignore") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn unescape(raw: &str) -> String {
    raw.replace("\\{", "{").replace("\\}", "}")
}

use crate::boundary::find_expression_end;
use crate::token::{is_raw_text_element, Span, Token, TokenKind};
use crate::{LexErrorKind, LexerError};

/// Lexer mode. The lexer keeps a stack of these; the top decides how the
/// next character is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    /// Markup and text between tags.
    Text,
    /// Inside `<name ...`, expecting attributes or the end of the tag.
    Tag { name: String, start: usize },
    /// After an attribute name, with `=` coming next.
    AfterName,
    /// After `=`, expecting a quoted, braced or bare value.
    AttributeValue,
    /// Inside a quoted attribute value.
    Quoted { quote: char, start: usize },
    /// Inside a bare attribute value.
    Unquoted,
    /// Inside `</name`, expecting `>`.
    CloseTag { start: usize },
    /// Body of `script` or `style`, up to the closing tag.
    RawText { name: String, open_start: usize },
    /// Expression body already measured; only the closing brace is left.
    Expression { end: usize },
}

/// Template source lexer.
///
/// Produces tokens one at a time through [`Lexer::next_token`], so the
/// first error in source order is the one reported. Expression bodies
/// are measured with the boundary scanner and skipped, never tokenized.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            modes: vec![Mode::Text],
            finished: false,
        }
    }

    /// Tokenize the entire source into a vector of tokens, ending with `Eof`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Scan the next token. After `Eof` every further call yields `Eof` again.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        if self.finished {
            return Ok(self.eof());
        }

        let mode = self.modes.last().cloned().unwrap_or(Mode::Text);
        match mode {
            Mode::Text => self.scan_text(),
            Mode::Tag { name, start } => self.scan_tag(&name, start),
            Mode::AfterName => self.scan_equals(),
            Mode::AttributeValue => self.scan_attribute_value(),
            Mode::Quoted { quote, start } => self.scan_quoted(quote, start),
            Mode::Unquoted => self.scan_unquoted(),
            Mode::CloseTag { start } => self.scan_close_tag_end(start),
            Mode::RawText { name, open_start } => self.scan_raw_text(&name, open_start),
            Mode::Expression { end } => {
                self.modes.pop();
                self.pos = end + 1;
                Ok(Token::new(TokenKind::ExpressionEnd, Span::new(end, end + 1)))
            }
        }
    }

    // --- Text mode ---

    fn scan_text(&mut self) -> Result<Token, LexerError> {
        if self.is_at_end() {
            self.finished = true;
            return Ok(self.eof());
        }

        match self.peek() {
            '<' => self.scan_markup(),
            '{' => self.scan_brace(),
            _ => {
                let start = self.pos;
                while !self.is_at_end() {
                    match self.peek() {
                        '<' | '{' => break,
                        '\\' if matches!(self.peek_next(), '{' | '}') => {
                            self.advance();
                            self.advance();
                        }
                        _ => self.advance(),
                    }
                }
                Ok(self.token_from(start, TokenKind::Text(self.slice(start).to_string())))
            }
        }
    }

    fn scan_markup(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let rest = &self.source[start..];

        if rest.starts_with("<!--") {
            return self.scan_comment();
        }
        if rest.len() >= 9 && rest.as_bytes()[..9].eq_ignore_ascii_case(b"<!doctype") {
            return self.scan_doctype();
        }

        if rest.starts_with("</") {
            self.pos += 2;
            let name = self.scan_tag_name();
            if name.is_empty() {
                return Err(self.error_at(
                    LexErrorKind::InvalidTagName,
                    "Expected a tag name after '</'",
                    Span::new(start, self.pos),
                ));
            }
            self.modes.push(Mode::CloseTag { start });
            return Ok(self.token_from(start, TokenKind::TagCloseStart(name)));
        }

        self.advance();
        let name = self.scan_tag_name();
        if name.is_empty() {
            return Err(self.error_at(
                LexErrorKind::InvalidTagName,
                "Expected a tag name after '<'",
                Span::new(start, self.pos),
            ));
        }
        self.modes.push(Mode::Tag {
            name: name.clone(),
            start,
        });
        Ok(self.token_from(start, TokenKind::TagOpenStart(name)))
    }

    fn scan_comment(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let body_start = start + 4;
        match self.source[body_start..].find("-->") {
            Some(rel) => {
                let body = &self.source[body_start..body_start + rel];
                self.pos = body_start + rel + 3;
                Ok(self.token_from(start, TokenKind::CommentText(body.to_string())))
            }
            None => Err(self.error_at(
                LexErrorKind::UnterminatedComment,
                "Comment was left open, expected '-->'",
                Span::new(start, body_start),
            )),
        }
    }

    fn scan_doctype(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let value_start = start + 9;
        match self.source[value_start..].find('>') {
            Some(rel) => {
                let value = self.source[value_start..value_start + rel].trim();
                self.pos = value_start + rel + 1;
                Ok(self.token_from(start, TokenKind::Doctype(value.to_string())))
            }
            None => Err(self.error_at(
                LexErrorKind::UnterminatedTag,
                "Doctype was left open, expected '>'",
                Span::new(start, value_start),
            )),
        }
    }

    /// `{#kw`, `{:kw`, `{/kw` open block tokens; anything else is a mustache.
    fn scan_brace(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let mut chars = self.source[start..].chars().skip(1);
        let sigil = chars.next().unwrap_or('\0');
        let after_sigil = chars.next().unwrap_or('\0');

        let is_block = match sigil {
            '#' | ':' => true,
            // `{/*` and `{//` are comments inside a mustache
            '/' => after_sigil != '*' && after_sigil != '/',
            _ => false,
        };

        if !is_block {
            self.advance();
            self.enter_expression(start)?;
            return Ok(self.token_from(start, TokenKind::ExpressionStart));
        }

        self.advance();
        self.advance();
        let keyword_start = self.pos;
        while self.peek().is_ascii_alphabetic() {
            self.advance();
        }
        let keyword = self.slice(keyword_start).to_string();
        let kind = match sigil {
            '#' => TokenKind::BlockOpen(keyword),
            ':' => TokenKind::BlockElse(keyword),
            _ => TokenKind::BlockClose(keyword),
        };
        let token = self.token_from(start, kind);
        self.enter_expression(start)?;
        Ok(token)
    }

    /// Measure the expression that began with the `{` at `open` and push
    /// expression mode so the closing brace is the next token after any
    /// header the parser reads from the source.
    fn enter_expression(&mut self, open: usize) -> Result<(), LexerError> {
        match find_expression_end(self.source, self.pos) {
            Some(end) => {
                self.modes.push(Mode::Expression { end });
                Ok(())
            }
            None => Err(self.error_at(
                LexErrorKind::UnterminatedExpression,
                "Expected '}' to close the expression",
                Span::new(open, open + 1),
            )),
        }
    }

    // --- Tag mode ---

    fn scan_tag(&mut self, name: &str, start: usize) -> Result<Token, LexerError> {
        self.skip_whitespace();
        if self.is_at_end() {
            return Err(self.unterminated_tag(start));
        }

        let at = self.pos;
        match self.peek() {
            '>' => {
                self.advance();
                self.modes.pop();
                if is_raw_text_element(name) {
                    self.modes.push(Mode::RawText {
                        name: name.to_string(),
                        open_start: start,
                    });
                }
                Ok(self.token_from(at, TokenKind::TagOpenEnd))
            }
            '/' if self.peek_next() == '>' => {
                self.advance();
                self.advance();
                self.modes.pop();
                Ok(self.token_from(at, TokenKind::TagSelfCloseEnd))
            }
            '<' => Err(self.unterminated_tag(start)),
            '{' => {
                self.advance();
                self.enter_expression(at)?;
                Ok(self.token_from(at, TokenKind::ExpressionStart))
            }
            ch if is_attribute_name_char(ch) => {
                while !self.is_at_end() && is_attribute_name_char(self.peek()) {
                    self.advance();
                }
                let token = self.token_from(at, TokenKind::AttributeName(self.slice(at).to_string()));
                let after = self.source[self.pos..].trim_start();
                if after.starts_with('=') {
                    self.modes.push(Mode::AfterName);
                }
                Ok(token)
            }
            ch => Err(self.error_at(
                LexErrorKind::InvalidAttributeName,
                &format!("Unexpected '{ch}' where an attribute name was expected"),
                Span::new(at, at + ch.len_utf8()),
            )),
        }
    }

    fn scan_equals(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();
        let at = self.pos;
        // AfterName is only pushed when '=' follows
        self.advance();
        self.modes.pop();
        self.modes.push(Mode::AttributeValue);
        Ok(self.token_from(at, TokenKind::Equals))
    }

    fn scan_attribute_value(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace();
        let at = self.pos;
        self.modes.pop();
        match self.peek() {
            quote @ ('"' | '\'') => {
                self.advance();
                self.modes.push(Mode::Quoted { quote, start: at });
                Ok(self.token_from(at, TokenKind::Quote))
            }
            _ => {
                self.modes.push(Mode::Unquoted);
                self.scan_unquoted()
            }
        }
    }

    fn scan_quoted(&mut self, quote: char, open: usize) -> Result<Token, LexerError> {
        if self.is_at_end() {
            return Err(self.error_at(
                LexErrorKind::UnterminatedAttributeValue,
                &format!("Attribute value was left open, expected {quote}"),
                Span::new(open, open + 1),
            ));
        }

        let at = self.pos;
        match self.peek() {
            ch if ch == quote => {
                self.advance();
                self.modes.pop();
                Ok(self.token_from(at, TokenKind::Quote))
            }
            '{' => {
                self.advance();
                self.enter_expression(at)?;
                Ok(self.token_from(at, TokenKind::ExpressionStart))
            }
            _ => {
                while !self.is_at_end() && self.peek() != quote && self.peek() != '{' {
                    self.advance();
                }
                Ok(self.token_from(at, TokenKind::AttributeValue(self.slice(at).to_string())))
            }
        }
    }

    fn scan_unquoted(&mut self) -> Result<Token, LexerError> {
        let at = self.pos;
        if self.peek() == '{' {
            self.advance();
            self.enter_expression(at)?;
            return Ok(self.token_from(at, TokenKind::ExpressionStart));
        }

        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_whitespace() || ch == '>' || ch == '{' || (ch == '/' && self.peek_next() == '>') {
                break;
            }
            self.advance();
        }
        if self.peek() != '{' {
            self.modes.pop();
            if self.pos == at {
                // value ended right after an expression, or was empty
                return self.next_token();
            }
        }
        Ok(self.token_from(at, TokenKind::AttributeValue(self.slice(at).to_string())))
    }

    fn scan_close_tag_end(&mut self, start: usize) -> Result<Token, LexerError> {
        self.skip_whitespace();
        if self.peek() != '>' {
            return Err(self.unterminated_tag(start));
        }
        let at = self.pos;
        self.advance();
        self.modes.pop();
        Ok(self.token_from(at, TokenKind::TagCloseEnd))
    }

    // --- Raw text mode ---

    fn scan_raw_text(&mut self, name: &str, open_start: usize) -> Result<Token, LexerError> {
        let start = self.pos;
        let Some(close) = self.find_raw_close(name) else {
            return Err(self.error_at(
                LexErrorKind::UnterminatedRawTextBlock,
                &format!("<{name}> was left open, expected </{name}>"),
                Span::new(open_start, open_start + 1 + name.len()),
            ));
        };

        self.modes.pop();
        if close == start {
            // empty body: go straight to the closing tag
            return self.scan_text();
        }
        self.pos = close;
        Ok(self.token_from(start, TokenKind::Text(self.source[start..close].to_string())))
    }

    /// Offset of `</name` closing the raw text body, matched ASCII case-insensitively.
    fn find_raw_close(&self, name: &str) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut from = self.pos;
        while let Some(rel) = self.source[from..].find("</") {
            let at = from + rel;
            let name_start = at + 2;
            let name_end = name_start + name.len();
            if name_end <= bytes.len()
                && bytes[name_start..name_end].eq_ignore_ascii_case(name.as_bytes())
                && !bytes
                    .get(name_end)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
            {
                return Some(at);
            }
            from = name_start;
        }
        None
    }

    // --- Helpers ---

    /// Tag names start with an ASCII letter and continue with
    /// alphanumerics, `-`, `:`, `.` or `_`.
    fn scan_tag_name(&mut self) -> String {
        let start = self.pos;
        if !self.peek().is_ascii_alphabetic() {
            return String::new();
        }
        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | ':' | '.' | '_') {
                self.advance();
            } else {
                break;
            }
        }
        self.slice(start).to_string()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn token_from(&self, start: usize, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(start, self.pos))
    }

    fn eof(&self) -> Token {
        let len = self.source.len();
        Token::new(TokenKind::Eof, Span::new(len, len))
    }

    fn slice(&self, start: usize) -> &'a str {
        &self.source[start..self.pos]
    }

    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(ch) = self.source[self.pos..].chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn unterminated_tag(&self, start: usize) -> LexerError {
        self.error_at(
            LexErrorKind::UnterminatedTag,
            "Tag was left open, expected '>'",
            Span::new(start, start + 1),
        )
    }

    fn error_at(&self, kind: LexErrorKind, message: &str, span: Span) -> LexerError {
        LexerError {
            kind,
            message: message.to_string(),
            span,
        }
    }
}

fn is_attribute_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '=' | '>' | '<' | '"' | '\'' | '{' | '}' | '/' | '\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Helper: tokenize and return token kinds (ignoring spans).
    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn error(source: &str) -> LexerError {
        match Lexer::tokenize(source) {
            Err(e) => e,
            Ok(tokens) => panic!("Expected lexer error, got {tokens:?}"),
        }
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Text(s.into())
    }

    // =========================================================================
    // Text and elements
    // =========================================================================

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("hello"), vec![text("hello"), TokenKind::Eof]);
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds("<p>hi</p>"),
            vec![
                TokenKind::TagOpenStart("p".into()),
                TokenKind::TagOpenEnd,
                text("hi"),
                TokenKind::TagCloseStart("p".into()),
                TokenKind::TagCloseEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_element_spans() {
        let tokens = Lexer::tokenize("<p>hi</p>").unwrap();
        let spans: Vec<(usize, usize)> = tokens.iter().map(|t| (t.span.start, t.span.end)).collect();
        assert_eq!(spans, vec![(0, 2), (2, 3), (3, 5), (5, 8), (8, 9), (9, 9)]);
    }

    #[test]
    fn test_self_closing() {
        assert_eq!(
            kinds("<br/>"),
            vec![
                TokenKind::TagOpenStart("br".into()),
                TokenKind::TagSelfCloseEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_namespaced_and_component_names() {
        assert_eq!(
            kinds("<svelte:head><Foo.Bar/></svelte:head>")[..3],
            [
                TokenKind::TagOpenStart("svelte:head".into()),
                TokenKind::TagOpenEnd,
                TokenKind::TagOpenStart("Foo.Bar".into()),
            ]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("<!-- note -->"),
            vec![TokenKind::CommentText(" note ".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_doctype() {
        assert_eq!(
            kinds("<!DOCTYPE html>"),
            vec![TokenKind::Doctype("html".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_escaped_brace_stays_in_text() {
        assert_eq!(kinds(r"a \{b} c"), vec![text(r"a \{b} c"), TokenKind::Eof]);
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    #[test]
    fn test_boolean_attribute() {
        assert_eq!(
            kinds("<input disabled>"),
            vec![
                TokenKind::TagOpenStart("input".into()),
                TokenKind::AttributeName("disabled".into()),
                TokenKind::TagOpenEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_attribute() {
        assert_eq!(
            kinds(r#"<a href = "/x">"#),
            vec![
                TokenKind::TagOpenStart("a".into()),
                TokenKind::AttributeName("href".into()),
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::AttributeValue("/x".into()),
                TokenKind::Quote,
                TokenKind::TagOpenEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_mixed_quoted_attribute() {
        assert_eq!(
            kinds(r#"<p class="a {b}">"#),
            vec![
                TokenKind::TagOpenStart("p".into()),
                TokenKind::AttributeName("class".into()),
                TokenKind::Equals,
                TokenKind::Quote,
                TokenKind::AttributeValue("a ".into()),
                TokenKind::ExpressionStart,
                TokenKind::ExpressionEnd,
                TokenKind::Quote,
                TokenKind::TagOpenEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_expression_attribute() {
        let tokens = Lexer::tokenize("<input bind:value={name}>").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TagOpenStart("input".into()),
                TokenKind::AttributeName("bind:value".into()),
                TokenKind::Equals,
                TokenKind::ExpressionStart,
                TokenKind::ExpressionEnd,
                TokenKind::TagOpenEnd,
                TokenKind::Eof,
            ]
        );
        // the body lies between the braces
        assert_eq!(tokens[3].span, Span::new(18, 19));
        assert_eq!(tokens[4].span, Span::new(23, 24));
    }

    #[test]
    fn test_unquoted_attribute() {
        assert_eq!(
            kinds("<a href=/x/>"),
            vec![
                TokenKind::TagOpenStart("a".into()),
                TokenKind::AttributeName("href".into()),
                TokenKind::Equals,
                TokenKind::AttributeValue("/x".into()),
                TokenKind::TagSelfCloseEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_shorthand_attribute() {
        assert_eq!(
            kinds("<div {id}>"),
            vec![
                TokenKind::TagOpenStart("div".into()),
                TokenKind::ExpressionStart,
                TokenKind::ExpressionEnd,
                TokenKind::TagOpenEnd,
                TokenKind::Eof,
            ]
        );
    }

    // =========================================================================
    // Expressions and blocks
    // =========================================================================

    #[test]
    fn test_mustache() {
        assert_eq!(
            kinds("{a + '}'}"),
            vec![TokenKind::ExpressionStart, TokenKind::ExpressionEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_mustache_is_not_block_close() {
        assert_eq!(
            kinds("{/* x */}"),
            vec![TokenKind::ExpressionStart, TokenKind::ExpressionEnd, TokenKind::Eof]
        );
    }

    #[test]
    fn test_if_block() {
        assert_eq!(
            kinds("{#if x}a{:else}b{/if}"),
            vec![
                TokenKind::BlockOpen("if".into()),
                TokenKind::ExpressionEnd,
                text("a"),
                TokenKind::BlockElse("else".into()),
                TokenKind::ExpressionEnd,
                text("b"),
                TokenKind::BlockClose("if".into()),
                TokenKind::ExpressionEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_block_open_span_covers_keyword() {
        let tokens = Lexer::tokenize("{#each items as item}").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(20, 21));
    }

    // =========================================================================
    // Raw text
    // =========================================================================

    #[test]
    fn test_script_body_is_raw() {
        assert_eq!(
            kinds("<script>if (a < b) { x() }</script>"),
            vec![
                TokenKind::TagOpenStart("script".into()),
                TokenKind::TagOpenEnd,
                text("if (a < b) { x() }"),
                TokenKind::TagCloseStart("script".into()),
                TokenKind::TagCloseEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_raw_close_is_case_insensitive() {
        assert_eq!(
            kinds("<style>p{}</STYLE>")[2..4],
            [text("p{}"), TokenKind::TagCloseStart("STYLE".into())]
        );
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(
            kinds("<script></script>"),
            vec![
                TokenKind::TagOpenStart("script".into()),
                TokenKind::TagOpenEnd,
                TokenKind::TagCloseStart("script".into()),
                TokenKind::TagCloseEnd,
                TokenKind::Eof,
            ]
        );
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unterminated_tag() {
        let err = error("text <div class");
        assert_eq!(err.kind, LexErrorKind::UnterminatedTag);
        assert_eq!(err.span.start, 5);
    }

    #[test]
    fn test_unterminated_expression() {
        let err = error("<p>{a</p>");
        assert_eq!(err.kind, LexErrorKind::UnterminatedExpression);
        assert_eq!(err.span.start, 3);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = error("a<!-- b");
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.span.start, 1);
    }

    #[test]
    fn test_unterminated_raw_text() {
        let err = error("<script>let a = 1;");
        assert_eq!(err.kind, LexErrorKind::UnterminatedRawTextBlock);
        assert_eq!(err.span, Span::new(0, 7));
    }

    #[test]
    fn test_unterminated_attribute_value() {
        let err = error(r#"<a href="x>"#);
        assert_eq!(err.kind, LexErrorKind::UnterminatedAttributeValue);
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn test_invalid_tag_name() {
        assert_eq!(error("a < b").kind, LexErrorKind::InvalidTagName);
        assert_eq!(error("</>").kind, LexErrorKind::InvalidTagName);
    }

    #[test]
    fn test_invalid_attribute_name() {
        let err = error(r#"<a "b">"#);
        assert_eq!(err.kind, LexErrorKind::InvalidAttributeName);
        assert_eq!(err.span.start, 3);
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

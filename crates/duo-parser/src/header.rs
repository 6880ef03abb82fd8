//! Block header splitting.
//!
//! Splits the text after a block keyword into its expression and binding
//! parts. All spans are relative to the header text; only characters at
//! bracket depth zero and outside string literals count as separators.

use duo_lexer::{find_expression_end, Span};

/// `{#each expression as context, index (key)}` parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EachHeader {
    pub expression: Span,
    pub context: Option<Span>,
    pub index: Option<Span>,
    pub key: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitBranch {
    Then,
    Catch,
}

/// `{#await expression then value}` parts. The binding span may be blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitHeader {
    pub expression: Span,
    pub branch: Option<(AwaitBranch, Span)>,
}

pub fn split_each(header: &str) -> Result<EachHeader, String> {
    let Some(as_pos) = find_word(header, "as").last().copied() else {
        // `{#each items}` or `{#each items, i}`
        return Ok(match find_byte(header, 0, b',') {
            Some(comma) => EachHeader {
                expression: Span::new(0, comma),
                context: None,
                index: Some(non_blank(header, Span::new(comma + 1, header.len()), "index")?),
                key: None,
            },
            None => EachHeader {
                expression: Span::new(0, header.len()),
                context: None,
                index: None,
                key: None,
            },
        });
    };

    let rest = as_pos + 2;
    let comma = find_byte(header, rest, b',');
    let paren = find_byte(header, rest, b'(');

    let context_end = match (comma, paren) {
        (Some(c), Some(p)) => c.min(p),
        (Some(c), None) => c,
        (None, Some(p)) => p,
        (None, None) => header.len(),
    };
    let context = non_blank(header, Span::new(rest, context_end), "context after 'as'")?;

    let index = match comma {
        Some(c) if paren.map_or(true, |p| c < p) => {
            let end = paren.unwrap_or(header.len());
            Some(non_blank(header, Span::new(c + 1, end), "index")?)
        }
        _ => None,
    };

    let key = match paren {
        Some(open) => {
            let close = matching_paren(header, open)
                .ok_or_else(|| "Key expression is missing ')'".to_string())?;
            if !header[close + 1..].trim().is_empty() {
                return Err(format!(
                    "Unexpected '{}' after the key expression",
                    header[close + 1..].trim()
                ));
            }
            Some(non_blank(header, Span::new(open + 1, close), "key expression")?)
        }
        None => None,
    };

    Ok(EachHeader {
        expression: Span::new(0, as_pos),
        context: Some(context),
        index,
        key,
    })
}

pub fn split_await(header: &str) -> AwaitHeader {
    let then = find_word(header, "then").first().copied();
    let catch = find_word(header, "catch").first().copied();

    let branch = match (then, catch) {
        (Some(t), Some(c)) if c < t => Some((AwaitBranch::Catch, c, 5)),
        (Some(t), _) => Some((AwaitBranch::Then, t, 4)),
        (None, Some(c)) => Some((AwaitBranch::Catch, c, 5)),
        (None, None) => None,
    };

    match branch {
        Some((kind, at, len)) => AwaitHeader {
            expression: Span::new(0, at),
            branch: Some((kind, Span::new(at + len, header.len()))),
        },
        None => AwaitHeader {
            expression: Span::new(0, header.len()),
            branch: None,
        },
    }
}

/// For a `{:else ...}` header, the offset just past `if` when it reads
/// `else if ...`.
pub fn else_if_condition(header: &str) -> Option<usize> {
    let trimmed = header.trim_start();
    let lead = header.len() - trimmed.len();
    let after = trimmed.strip_prefix("if")?;
    if after.is_empty() || after.starts_with(char::is_whitespace) {
        Some(lead + 2)
    } else {
        None
    }
}

fn non_blank(header: &str, span: Span, what: &str) -> Result<Span, String> {
    if header[span.start..span.end].trim().is_empty() {
        Err(format!("Expected {what}"))
    } else {
        Ok(span)
    }
}

/// Positions of `word` at depth zero, preceded by whitespace and followed
/// by whitespace or the end of the header.
fn find_word(header: &str, word: &str) -> Vec<usize> {
    let bytes = header.as_bytes();
    top_level(header)
        .into_iter()
        .filter(|&i| {
            header[i..].starts_with(word)
                && i > 0
                && bytes[i - 1].is_ascii_whitespace()
                && bytes.get(i + word.len()).map_or(true, |b| b.is_ascii_whitespace())
        })
        .collect()
}

fn find_byte(header: &str, from: usize, byte: u8) -> Option<usize> {
    let bytes = header.as_bytes();
    top_level(header)
        .into_iter()
        .find(|&i| i >= from && bytes[i] == byte)
}

fn matching_paren(header: &str, open: usize) -> Option<usize> {
    let bytes = header.as_bytes();
    top_level(header)
        .into_iter()
        .find(|&i| i > open && bytes[i] == b')')
}

/// Byte offsets at bracket depth zero, outside string and template literals.
/// Openers are reported before their depth applies, closers after, so a
/// top-level `(` and its matching `)` are both included.
fn top_level(header: &str) -> Vec<usize> {
    let bytes = header.as_bytes();
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    match bytes[i] {
                        b'\\' => i += 1,
                        b'$' if bytes.get(i + 1) == Some(&b'{') => {
                            match find_expression_end(header, i + 2) {
                                Some(end) => i = end,
                                None => return positions,
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
            }
            b'(' | b'[' | b'{' => {
                if depth == 0 {
                    positions.push(i);
                }
                depth += 1;
            }
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    positions.push(i);
                }
            }
            _ if depth == 0 && header.is_char_boundary(i) => positions.push(i),
            _ => {}
        }
        i += 1;
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(header: &str, span: Span) -> &str {
        header[span.start..span.end].trim()
    }

    // =========================================================================
    // each
    // =========================================================================

    #[test]
    fn test_each_full_header() {
        let header = " items as item, i (item.id)";
        let each = split_each(header).unwrap();
        assert_eq!(text(header, each.expression), "items");
        assert_eq!(text(header, each.context.unwrap()), "item");
        assert_eq!(text(header, each.index.unwrap()), "i");
        assert_eq!(text(header, each.key.unwrap()), "item.id");
    }

    #[test]
    fn test_each_key_without_index() {
        let header = " items as item (item.id)";
        let each = split_each(header).unwrap();
        assert_eq!(each.index, None);
        assert_eq!(text(header, each.key.unwrap()), "item.id");
    }

    #[test]
    fn test_each_destructured_context() {
        let header = " pairs as { a, b }, i";
        let each = split_each(header).unwrap();
        assert_eq!(text(header, each.context.unwrap()), "{ a, b }");
        assert_eq!(text(header, each.index.unwrap()), "i");
    }

    #[test]
    fn test_each_as_inside_call_is_ignored() {
        let header = " get('a as b') as x";
        let each = split_each(header).unwrap();
        assert_eq!(text(header, each.expression), "get('a as b')");
        assert_eq!(text(header, each.context.unwrap()), "x");
    }

    #[test]
    fn test_each_without_as() {
        let header = " items";
        let each = split_each(header).unwrap();
        assert_eq!(text(header, each.expression), "items");
        assert_eq!(each.context, None);

        let header = " items, i";
        let each = split_each(header).unwrap();
        assert_eq!(text(header, each.index.unwrap()), "i");
    }

    #[test]
    fn test_each_missing_context() {
        assert!(split_each(" items as ").is_err());
        assert!(split_each(" items as , i").is_err());
    }

    #[test]
    fn test_each_trailing_after_key() {
        assert!(split_each(" items as item (item.id) extra").is_err());
        assert!(split_each(" items as item (item.id").is_err());
    }

    // =========================================================================
    // await
    // =========================================================================

    #[test]
    fn test_await_plain() {
        let header = " promise";
        let await_header = split_await(header);
        assert_eq!(text(header, await_header.expression), "promise");
        assert_eq!(await_header.branch, None);
    }

    #[test]
    fn test_await_then_shorthand() {
        let header = " load() then value";
        let await_header = split_await(header);
        assert_eq!(text(header, await_header.expression), "load()");
        let (branch, binding) = await_header.branch.unwrap();
        assert_eq!(branch, AwaitBranch::Then);
        assert_eq!(text(header, binding), "value");
    }

    #[test]
    fn test_await_catch_shorthand_without_binding() {
        let header = " p catch";
        let (branch, binding) = split_await(header).branch.unwrap();
        assert_eq!(branch, AwaitBranch::Catch);
        assert_eq!(text(header, binding), "");
    }

    #[test]
    fn test_await_then_inside_string_is_ignored() {
        let header = " f(' then ')";
        assert_eq!(split_await(header).branch, None);
    }

    // =========================================================================
    // else if
    // =========================================================================

    #[test]
    fn test_else_if() {
        assert_eq!(else_if_condition(" if x"), Some(3));
        assert_eq!(else_if_condition(" ifx"), None);
        assert_eq!(else_if_condition(""), None);
    }
}

//! Embedded expression boundary detection.
//!
//! Finds the `}` that closes an embedded expression without parsing the
//! expression. Braces inside string literals, template literals, comments
//! and regular expression literals are skipped; nested `{`, `[` and `(`
//! raise the depth.

/// Offset of the `}` matching an already-consumed `{`, scanning from `from`.
///
/// Returns `None` when the input ends first, including when it ends inside a
/// string, template literal or block comment.
pub fn find_expression_end(source: &str, from: usize) -> Option<usize> {
    scan(source.as_bytes(), from)
}

fn scan(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' => {
                i = skip_string(bytes, i, b)?;
                prev = Some(b);
                continue;
            }
            b'`' => {
                i = skip_template(bytes, i)?;
                prev = Some(b);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_bytes(bytes, i + 2, b"*/")? + 2;
                continue;
            }
            b'/' if could_start_regex(prev) => {
                if let Some(end) = skip_regex(bytes, i) {
                    i = end;
                    prev = Some(b'/');
                    continue;
                }
            }
            b'{' | b'[' | b'(' => depth += 1,
            b'}' if depth == 0 => return Some(i),
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if !b.is_ascii_whitespace() {
            prev = Some(b);
        }
        i += 1;
    }

    None
}

/// A `/` starts a regex literal when the previous significant character
/// cannot end an operand.
fn could_start_regex(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(b) => matches!(
            b,
            b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
                | b'+' | b'-' | b'*' | b'%' | b'<' | b'>' | b'~' | b'^'
        ),
    }
}

fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn skip_template(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                i = scan(bytes, i + 2)? + 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Returns `None` when the candidate is not a well-formed single-line regex,
/// in which case the `/` is treated as division.
fn skip_regex(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return None,
            b'\\' => i += 2,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                if i == start + 1 {
                    return None;
                }
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
    None
}

fn find_bytes(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|p| from + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end(source: &str) -> Option<usize> {
        // every fixture starts with the opening brace
        find_expression_end(source, 1)
    }

    #[test]
    fn test_simple_identifier() {
        assert_eq!(end("{name}"), Some(5));
    }

    #[test]
    fn test_nested_braces() {
        assert_eq!(end("{ {a: {b: 1}} }"), Some(14));
    }

    #[test]
    fn test_brackets_and_parens() {
        assert_eq!(end("{f([1, 2], (x))}"), Some(15));
    }

    #[test]
    fn test_brace_in_string() {
        assert_eq!(end("{'}' + \"}\"}"), Some(10));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        assert_eq!(end(r"{'a\'}'}"), Some(7));
    }

    #[test]
    fn test_template_literal_with_substitution() {
        let source = "{`a ${ {b: 1}.b } }`}";
        assert_eq!(end(source), Some(source.len() - 1));
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(end("{/* } */ x}"), Some(10));
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(end("{x // }\n}"), Some(8));
    }

    #[test]
    fn test_regex_literal() {
        let source = "{/}/.test(s)}";
        assert_eq!(end(source), Some(source.len() - 1));
    }

    #[test]
    fn test_division_is_not_regex() {
        assert_eq!(end("{a / b}"), Some(6));
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(end("{a"), None);
        assert_eq!(end("{'}"), None);
        assert_eq!(end("{`${`"), None);
        assert_eq!(end("{/* }"), None);
    }
}

//! duo Parser
//!
//! Parses component template source into a syntax tree.
//! The parser drives the lexer from `duo-lexer`, hands embedded
//! `{expressions}` to a pluggable [`ExpressionGrammar`], and reports the
//! first syntax error as a single [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use duo_parser::{parse, Node};
//!
//! let fragment = parse("<p>hi</p>").unwrap();
//! assert!(matches!(&fragment.children[0], Node::Element(el) if el.name == "p"));
//! ```

pub mod ast;
pub mod bridge;
pub mod diagnostic;
pub mod expr_lexer;
pub mod grammar;
pub mod header;
pub mod normalize;
pub mod parser;

use tracing::debug;

pub use ast::{Attribute, AttributeValue, DirectiveKind, Expression, ExpressionKind, Fragment, Node};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use duo_lexer::{Position, Span};
pub use grammar::{ExpressionGrammar, GrammarError, ScriptGrammar};
pub use normalize::normalize;
pub use parser::Parser;

/// Per-call parse settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Shown in diagnostic messages.
    pub filename: Option<String>,
    /// Run the whitespace normalizer over the result.
    pub normalize: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: None,
            normalize: true,
        }
    }
}

/// Parse with the default grammar and options.
pub fn parse(source: &str) -> Result<Fragment, Diagnostic> {
    parse_with(source, &ScriptGrammar, &ParseOptions::default())
}

pub fn parse_with(
    source: &str,
    grammar: &dyn ExpressionGrammar,
    options: &ParseOptions,
) -> Result<Fragment, Diagnostic> {
    debug!(len = source.len(), filename = ?options.filename, "parsing template");

    let mut parser = Parser::new(source, grammar, options.filename.as_deref());
    let fragment = parser.parse_document()?;
    debug!(
        nodes = fragment.children.len(),
        opened = parser.frames_opened(),
        closed = parser.frames_closed(),
        "parsed template"
    );

    if options.normalize {
        Ok(normalize(fragment))
    } else {
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Comment, Element, Text};
    use pretty_assertions::assert_eq;

    /// Drop every span so trees compare by shape alone.
    fn shape(fragment: &Fragment) -> serde_json::Value {
        fn strip(value: &mut serde_json::Value) {
            match value {
                serde_json::Value::Object(map) => {
                    map.remove("span");
                    map.values_mut().for_each(strip);
                }
                serde_json::Value::Array(items) => items.iter_mut().for_each(strip),
                _ => {}
            }
        }
        let mut value = serde_json::to_value(fragment).unwrap();
        strip(&mut value);
        value
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn test_paragraph() {
        let fragment = parse("<p>hi</p>").unwrap();
        assert_eq!(
            fragment.children,
            vec![Node::Element(Element {
                span: Span::new(0, 9),
                name: "p".into(),
                attributes: vec![],
                children: vec![Node::Text(Text {
                    span: Span::new(3, 5),
                    raw: "hi".into(),
                    data: "hi".into(),
                })],
                self_closing: false,
            })]
        );
    }

    #[test]
    fn test_unclosed_paragraph() {
        let e = parse("<p>hi").unwrap_err();
        assert_eq!(e.code, DiagnosticCode::UnclosedElement);
        assert_eq!(e.start.offset, 0);
    }

    #[test]
    fn test_if_else() {
        let fragment = parse("{#if x}a{:else}b{/if}").unwrap();
        let json = shape(&fragment);
        let block = &json["children"][0];
        assert_eq!(block["type"], "IfBlock");
        assert_eq!(block["condition"]["kind"]["type"], "Identifier");
        assert_eq!(block["condition"]["kind"]["name"], "x");
        assert_eq!(block["consequent"][0]["data"], "a");
        assert_eq!(block["alternate"][0]["data"], "b");
    }

    #[test]
    fn test_stray_closing_tag() {
        let e = parse("</p>").unwrap_err();
        assert_eq!(e.code, DiagnosticCode::UnexpectedClosingTag);
        assert_eq!(e.start.offset, 0);
    }

    #[test]
    fn test_binding_on_void_element() {
        let fragment = parse("<input bind:value={name}>").unwrap();
        let json = shape(&fragment);
        let input = &json["children"][0];
        assert_eq!(input["name"], "input");
        assert_eq!(input["children"], serde_json::json!([]));
        assert_eq!(
            input["attributes"][0],
            serde_json::json!({
                "name": "value",
                "kind": "binding",
                "modifiers": [],
                "value": {
                    "type": "Expression",
                    "value": {
                        "source": "name",
                        "kind": { "type": "Identifier", "name": "name" }
                    }
                }
            })
        );
    }

    #[test]
    fn test_comment() {
        let fragment = parse("<!-- note -->").unwrap();
        assert_eq!(
            fragment.children,
            vec![Node::Comment(Comment {
                span: Span::new(0, 13),
                data: "note".into(),
                ignores: vec![],
            })]
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    const SAMPLE: &str = r#"
<script>export let items = [];</script>
<ul class="list {kind}">
  {#each items as { id, label }, i (id)}
    <li on:click|once={() => pick(id)}>{i}: {label}</li>
  {:else}
    <li>none</li>
  {/each}
</ul>
{#await load() then data}{data}{/await}
"#;

    #[test]
    fn test_deterministic() {
        assert_eq!(parse(SAMPLE).unwrap(), parse(SAMPLE).unwrap());
    }

    #[test]
    fn test_order_preserved() {
        let fragment = parse(SAMPLE).unwrap();
        let starts: Vec<usize> = fragment.children.iter().map(|n| n.span().start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let fragment = parse(SAMPLE).unwrap();
        assert_eq!(normalize(fragment.clone()), fragment);
    }

    #[test]
    fn test_raw_option_keeps_whitespace() {
        let options = ParseOptions {
            normalize: false,
            ..ParseOptions::default()
        };
        let fragment = parse_with("  <p/>  ", &ScriptGrammar, &options).unwrap();
        assert_eq!(fragment.children.len(), 3);
        assert_eq!(fragment.span, Span::new(0, 8));
    }

    #[test]
    fn test_filename_option() {
        let options = ParseOptions {
            filename: Some("List.duo".into()),
            ..ParseOptions::default()
        };
        let e = parse_with("<ul>\n  <li>", &ScriptGrammar, &options).unwrap_err();
        assert_eq!(e.to_string(), "List.duo:2:3: <li> was left open (unclosed-element)");
    }

    #[test]
    fn test_parallel_parses() {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                std::thread::spawn(move || {
                    let source = format!("<p>{n}</p>{{#if a}}{n}{{/if}}");
                    parse(&source).map(|f| f.children.len())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(2));
        }
    }
}

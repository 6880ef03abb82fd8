//! WASM bindings for the duo template parser.
//!
//! Exposes `parse()` to JavaScript via wasm-bindgen.
//! Returns the syntax tree as a plain JS object or throws an `Error`
//! carrying the diagnostic's `code`, `start` and `end`.

use duo_parser::{Diagnostic, Position};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Parse template source into a syntax tree.
///
/// Throws a JS `Error` on the first syntax error. Its message is the
/// rendered diagnostic; `code`, `start` and `end` are attached as properties.
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let fragment = duo_parser::parse(source).map_err(|d| diagnostic_error(&d))?;
    to_js(&fragment)
}

/// Get the parser version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Properties copied onto the thrown `Error`.
#[derive(Debug, Serialize)]
struct ErrorInfo<'a> {
    code: &'static str,
    start: &'a Position,
    end: &'a Position,
}

impl<'a> From<&'a Diagnostic> for ErrorInfo<'a> {
    fn from(diagnostic: &'a Diagnostic) -> Self {
        Self {
            code: diagnostic.code.as_str(),
            start: &diagnostic.start,
            end: &diagnostic.end,
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(JsValue::from)
}

fn diagnostic_error(diagnostic: &Diagnostic) -> JsValue {
    let error = js_sys::Error::new(&diagnostic.to_string());
    if let Ok(info) = to_js(&ErrorInfo::from(diagnostic)) {
        js_sys::Object::assign(&error, info.unchecked_ref());
    }
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use duo_parser::{DiagnosticCode, Node};
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Native tests (non-WASM): the pipeline behind `parse`
    // =========================================================================

    #[test]
    fn test_empty_document() {
        let fragment = duo_parser::parse("").unwrap();
        assert!(fragment.children.is_empty());
    }

    #[test]
    fn test_component_template() {
        let fragment = duo_parser::parse(
            "<script>let count = 0;</script>\n<button on:click={() => count++}>{count}</button>",
        )
        .unwrap();
        assert!(matches!(fragment.children[0], Node::Script(_)));
        assert!(matches!(&fragment.children[2], Node::Element(el) if el.name == "button"));
    }

    #[test]
    fn test_tree_serializes() {
        let fragment = duo_parser::parse("<p>{name}</p>").unwrap();
        let json = serde_json::to_value(&fragment).unwrap();
        assert_eq!(json["children"][0]["type"], "Element");
        assert_eq!(json["children"][0]["children"][0]["type"], "MustacheTag");
    }

    #[test]
    fn test_error_info() {
        let diagnostic = duo_parser::parse("<div>\n</span>").unwrap_err();
        assert_eq!(diagnostic.code, DiagnosticCode::MismatchedClosingTag);
        let info = serde_json::to_value(ErrorInfo::from(&diagnostic)).unwrap();
        assert_eq!(
            info,
            serde_json::json!({
                "code": "mismatched-closing-tag",
                "start": { "offset": 6, "line": 2, "column": 1 },
                "end": { "offset": 12, "line": 2, "column": 7 },
            })
        );
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }

    #[test]
    fn test_multiple_parses() {
        // no state carried between parses
        let first = duo_parser::parse("{#if a}x{/if}").unwrap();
        let second = duo_parser::parse("{#key b}y{/key}").unwrap();
        assert!(matches!(first.children[0], Node::IfBlock(_)));
        assert!(matches!(second.children[0], Node::KeyBlock(_)));
    }
}

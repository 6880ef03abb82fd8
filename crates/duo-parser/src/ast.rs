//! Syntax tree for duo templates.
//!
//! Every node carries a byte [`Span`] into the source. Nodes serialize with
//! a `type` tag so consumers can read the tree as JSON.

use duo_lexer::Span;
use serde::Serialize;

/// The root of a parsed template: an ordered list of sibling nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub span: Span,
    pub children: Vec<Node>,
}

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    /// An element or component with attributes and children.
    Element(Element),

    /// Literal text between tags.
    Text(Text),

    /// A bare `{expression}` in markup.
    MustacheTag(MustacheTag),

    /// `<!-- ... -->`, `{}`, `{! ... }` or `{/* ... */}`.
    Comment(Comment),

    /// A `<script>` element with its raw body.
    Script(RawElement),

    /// A `<style>` element with its raw body.
    Style(RawElement),

    /// `<!doctype ...>`.
    Doctype(Doctype),

    IfBlock(IfBlock),
    EachBlock(EachBlock),
    AwaitBlock(AwaitBlock),
    KeyBlock(KeyBlock),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Element(n) => n.span,
            Node::Text(n) => n.span,
            Node::MustacheTag(n) => n.span,
            Node::Comment(n) => n.span,
            Node::Script(n) | Node::Style(n) => n.span,
            Node::Doctype(n) => n.span,
            Node::IfBlock(n) => n.span,
            Node::EachBlock(n) => n.span,
            Node::AwaitBlock(n) => n.span,
            Node::KeyBlock(n) => n.span,
        }
    }
}

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub span: Span,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Written as `<name/>`.
    pub self_closing: bool,
}

impl Element {
    /// Components are capitalized (`<Button>`) or namespaced (`<ui.Button>`).
    pub fn is_component(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase()) || self.name.contains('.')
    }
}

/// Text content. `raw` is the source slice, `data` has `\{` and `\}` unescaped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub span: Span,
    pub raw: String,
    pub data: String,
}

impl Text {
    pub fn is_whitespace(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MustacheTag {
    pub span: Span,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub span: Span,
    /// Comment body with surrounding whitespace trimmed.
    pub data: String,
    /// Diagnostic codes listed after a `duo-ignore` marker.
    pub ignores: Vec<String>,
}

/// `script` or `style`: attributes are parsed, the body is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawElement {
    pub span: Span,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub content: RawText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawText {
    pub span: Span,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctype {
    pub span: Span,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// An attribute on an element.
///
/// For directives `name` has the prefix stripped: `on:click|once` has
/// `name = "click"`, `kind = EventHandler` and `modifiers = ["once"]`.
/// A missing value (`disabled`, `bind:value`) is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub span: Span,
    pub name: String,
    pub kind: DirectiveKind,
    pub modifiers: Vec<String>,
    pub value: Option<AttributeValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Ordinary attribute, including unknown `prefix:name` forms.
    Plain,
    /// `on:`
    EventHandler,
    /// `bind:`
    Binding,
    /// `class:`
    Class,
    /// `transition:`, `in:` or `out:`
    Transition(TransitionDirection),
    /// `animate:`
    Animation,
    /// `use:`
    Action,
    /// `let:`
    Let,
    /// `{...props}`
    Spread,
}

impl DirectiveKind {
    pub fn is_directive(&self) -> bool {
        !matches!(self, DirectiveKind::Plain | DirectiveKind::Spread)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Both,
    In,
    Out,
}

impl TransitionDirection {
    pub fn intro(&self) -> bool {
        matches!(self, TransitionDirection::Both | TransitionDirection::In)
    }

    pub fn outro(&self) -> bool {
        matches!(self, TransitionDirection::Both | TransitionDirection::Out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    /// Quoted or bare text without expressions.
    Literal(String),
    /// `{expr}`, or a quoted value that is exactly one `{expr}`.
    Expression(Expression),
    /// Text interleaved with expressions: `"a {b} c"`.
    Template(Vec<ValuePart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ValuePart {
    Text { span: Span, data: String },
    Expression(Expression),
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// `{#if}`. An `{:else if}` chain nests as a single `IfBlock` with
/// `elseif = true` inside `alternate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfBlock {
    pub span: Span,
    pub condition: Expression,
    pub consequent: Vec<Node>,
    pub alternate: Option<Vec<Node>>,
    pub elseif: bool,
}

/// `{#each expression as context, index (key)}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EachBlock {
    pub span: Span,
    pub expression: Expression,
    pub context: Option<Expression>,
    pub index: Option<String>,
    pub key: Option<Expression>,
    pub body: Vec<Node>,
    pub fallback: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AwaitBlock {
    pub span: Span,
    pub expression: Expression,
    pub value: Option<Expression>,
    pub error: Option<Expression>,
    pub pending: Option<Vec<Node>>,
    pub then: Option<Vec<Node>>,
    pub catch: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyBlock {
    pub span: Span,
    pub expression: Expression,
    pub body: Vec<Node>,
}

// ---------------------------------------------------------------------------
// Embedded expressions
// ---------------------------------------------------------------------------

/// An embedded expression as handed back by the expression grammar.
/// `span` excludes the delimiters and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub span: Span,
    pub source: String,
    pub kind: ExpressionKind,
}

impl Expression {
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name")]
pub enum ExpressionKind {
    Identifier(String),
    /// `{ a, b }` or `[a, b]` binding pattern.
    Destructure,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str) -> Element {
        Element {
            span: Span::new(0, 1),
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    #[test]
    fn test_component_detection() {
        assert!(element("Button").is_component());
        assert!(element("ui.button").is_component());
        assert!(!element("button").is_component());
        assert!(!element("svelte:head").is_component());
    }

    #[test]
    fn test_transition_direction() {
        assert!(TransitionDirection::Both.intro());
        assert!(TransitionDirection::Both.outro());
        assert!(!TransitionDirection::In.outro());
        assert!(!TransitionDirection::Out.intro());
    }

    #[test]
    fn test_node_serializes_with_type_tag() {
        let node = Node::Text(Text {
            span: Span::new(0, 2),
            raw: "hi".into(),
            data: "hi".into(),
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Text");
        assert_eq!(json["data"], "hi");
        assert_eq!(json["span"]["end"], 2);
    }

    #[test]
    fn test_expression_kind_serialization() {
        let json = serde_json::to_value(ExpressionKind::Identifier("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Identifier", "name": "x"}));
        let json = serde_json::to_value(ExpressionKind::Other).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Other"}));
    }
}

//! Whitespace normalization over a parsed tree.
//!
//! The parser keeps every text node it sees. This pass merges adjacent
//! text, drops whitespace-only text next to a block and at block branch
//! and root edges, and restamps the root span. Running it twice changes
//! nothing.

use duo_lexer::Span;
use tracing::trace;

use crate::ast::{Fragment, Node, Text};

/// Elements whose children are kept exactly as written.
const PRESERVE_WHITESPACE: &[&str] = &["pre", "textarea"];

pub fn normalize(fragment: Fragment) -> Fragment {
    let mut children = normalize_children(fragment.children);
    trim_edges(&mut children);

    if let Some(Node::Text(text)) = children.first_mut() {
        trim_text_start(text);
    }
    if let Some(Node::Text(text)) = children.last_mut() {
        trim_text_end(text);
    }

    let span = match (children.first(), children.last()) {
        (Some(first), Some(last)) => Span::new(first.span().start, last.span().end),
        _ => Span::default(),
    };
    Fragment { span, children }
}

fn normalize_children(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = normalize_node(node);
        if let (Some(Node::Text(previous)), Node::Text(next)) = (out.last_mut(), &node) {
            previous.span = previous.span.to(next.span);
            previous.raw.push_str(&next.raw);
            previous.data.push_str(&next.data);
            continue;
        }
        out.push(node);
    }
    drop_block_padding(out)
}

/// Remove whitespace-only text sitting directly before or after a block.
fn drop_block_padding(nodes: Vec<Node>) -> Vec<Node> {
    let padding: Vec<bool> = (0..nodes.len())
        .map(|i| {
            is_blank_text(&nodes[i])
                && ((i > 0 && is_block(&nodes[i - 1])) || nodes.get(i + 1).is_some_and(is_block))
        })
        .collect();

    nodes
        .into_iter()
        .zip(padding)
        .filter_map(|(node, padding)| {
            if padding {
                trace!(span = ?node.span(), "dropped whitespace beside block");
                None
            } else {
                Some(node)
            }
        })
        .collect()
}

fn normalize_node(node: Node) -> Node {
    match node {
        Node::Element(mut element) => {
            let preserve = PRESERVE_WHITESPACE
                .iter()
                .any(|name| element.name.eq_ignore_ascii_case(name));
            if !preserve {
                element.children = normalize_children(element.children);
            }
            Node::Element(element)
        }
        Node::IfBlock(mut block) => {
            block.consequent = branch(block.consequent);
            block.alternate = block.alternate.map(branch);
            Node::IfBlock(block)
        }
        Node::EachBlock(mut block) => {
            block.body = branch(block.body);
            block.fallback = block.fallback.map(branch);
            Node::EachBlock(block)
        }
        Node::AwaitBlock(mut block) => {
            block.pending = block.pending.map(branch);
            block.then = block.then.map(branch);
            block.catch = block.catch.map(branch);
            Node::AwaitBlock(block)
        }
        Node::KeyBlock(mut block) => {
            block.body = branch(block.body);
            Node::KeyBlock(block)
        }
        other => other,
    }
}

/// A block branch: normalized, with whitespace-only text at both ends removed.
fn branch(nodes: Vec<Node>) -> Vec<Node> {
    let mut nodes = normalize_children(nodes);
    trim_edges(&mut nodes);
    nodes
}

fn is_block(node: &Node) -> bool {
    matches!(
        node,
        Node::IfBlock(_) | Node::EachBlock(_) | Node::AwaitBlock(_) | Node::KeyBlock(_)
    )
}

fn is_blank_text(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.is_whitespace())
}

fn trim_edges(nodes: &mut Vec<Node>) {
    while nodes.last().is_some_and(is_blank_text) {
        if let Some(node) = nodes.pop() {
            trace!(span = ?node.span(), "dropped trailing whitespace");
        }
    }
    let leading = nodes.iter().take_while(|n| is_blank_text(n)).count();
    if leading > 0 {
        trace!(count = leading, "dropped leading whitespace");
        nodes.drain(..leading);
    }
}

fn trim_text_start(text: &mut Text) {
    let trimmed = text.raw.trim_start();
    let cut = text.raw.len() - trimmed.len();
    if cut == 0 {
        return;
    }
    text.raw = trimmed.to_string();
    text.data = text.data.trim_start().to_string();
    text.span.start += cut;
}

fn trim_text_end(text: &mut Text) {
    let trimmed = text.raw.trim_end();
    let cut = text.raw.len() - trimmed.len();
    if cut == 0 {
        return;
    }
    text.raw = trimmed.to_string();
    text.data = text.data.trim_end().to_string();
    text.span.end -= cut;
}

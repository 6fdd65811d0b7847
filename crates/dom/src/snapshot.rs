//! Deterministic line-oriented serialization for test comparisons and
//! debug output. Not a stable public format.
//!
//! One line per node, two-space indentation:
//! - `#document`
//! - `<div id="app">` (attributes in document order; namespaced attributes
//!   as `ns|name`, namespaced elements as `<name xmlns=ns>`)
//! - `"text"` (escaped)
//! - `<!-- comment -->`
//!
//! With `include_ids` set, each line is prefixed `@<id> `, which makes node
//! identity changes visible to replay tests.

use crate::document::Document;
use crate::node::Node;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotOptions {
    pub include_ids: bool,
}

pub fn snapshot_lines(doc: &Document) -> Vec<String> {
    snapshot_lines_with(doc, SnapshotOptions::default())
}

pub fn snapshot_lines_with(doc: &Document, options: SnapshotOptions) -> Vec<String> {
    let mut lines = Vec::new();
    walk(doc.root(), 0, options, &mut lines);
    lines
}

pub fn render(doc: &Document) -> String {
    snapshot_lines(doc).join("\n")
}

fn walk(node: &Node, depth: usize, options: SnapshotOptions, out: &mut Vec<String>) {
    let mut line = String::new();
    for _ in 0..depth {
        line.push_str("  ");
    }
    if options.include_ids {
        let _ = write!(line, "@{} ", node.id().0);
    }

    match node {
        Node::Document { .. } => line.push_str("#document"),
        Node::Element {
            name,
            namespace,
            attributes,
            ..
        } => {
            let _ = write!(line, "<{name}");
            if let Some(ns) = namespace {
                let _ = write!(line, " xmlns={ns}");
            }
            for attr in attributes {
                match &attr.namespace {
                    Some(ns) => {
                        let _ = write!(line, r#" {ns}|{}="{}""#, attr.name, escape(&attr.value));
                    }
                    None => {
                        let _ = write!(line, r#" {}="{}""#, attr.name, escape(&attr.value));
                    }
                }
            }
            line.push('>');
        }
        Node::Text { text, .. } => {
            let _ = write!(line, "\"{}\"", escape(text));
        }
        Node::Comment { text, .. } => {
            let _ = write!(line, "<!-- {} -->", escape(text));
        }
    }
    out.push(line);

    for child in node.children().unwrap_or_default() {
        walk(child, depth + 1, options, out);
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

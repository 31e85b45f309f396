//! Rendering a tree into the text grammar.

use std::fmt::Write as _;

use crate::graph::{GraphNode, PrimitiveValue};

/// Renders the tree with two-space indentation per nesting level.
pub(super) fn render_tree(tree: &GraphNode) -> String {
    let mut out = String::new();
    render_value(&mut out, tree, 0);
    out.push('\n');
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_value(out: &mut String, node: &GraphNode, depth: usize) {
    match node {
        GraphNode::Null => out.push_str("null"),

        GraphNode::BackRef(handle) => {
            let _ = write!(out, "ref {handle}");
        }

        GraphNode::Primitive(value) => render_primitive(out, value),

        GraphNode::Str(bytes) => {
            out.push_str("string \"");
            escape_into(out, bytes);
            out.push('"');
        }

        GraphNode::Array {
            element_type,
            handle,
            elements,
        } => {
            let _ = write!(out, "array {element_type}");
            if let Some(handle) = handle {
                let _ = write!(out, " {handle}");
            }
            out.push_str(" [");
            for element in elements {
                out.push('\n');
                indent(out, depth + 1);
                render_value(out, element, depth + 1);
            }
            out.push('\n');
            indent(out, depth);
            out.push(']');
        }

        GraphNode::Object {
            type_name,
            handle,
            fields,
        } => {
            let _ = write!(out, "object {type_name}");
            if let Some(handle) = handle {
                let _ = write!(out, " {handle}");
            }
            out.push_str(" {");
            for (name, value) in fields {
                out.push('\n');
                indent(out, depth + 1);
                let _ = write!(out, "{name}: ");
                render_value(out, value, depth + 1);
            }
            out.push('\n');
            indent(out, depth);
            out.push('}');
        }
    }
}

fn render_primitive(out: &mut String, value: &PrimitiveValue) {
    let keyword = value.kind().keyword();
    let _ = match value {
        PrimitiveValue::Boolean(v) => write!(out, "{keyword} {v}"),
        PrimitiveValue::Byte(v) => write!(out, "{keyword} {v}"),
        PrimitiveValue::Short(v) => write!(out, "{keyword} {v}"),
        PrimitiveValue::Char(v) => write!(out, "{keyword} {v}"),
        PrimitiveValue::Int(v) => write!(out, "{keyword} {v}"),
        PrimitiveValue::Long(v) => write!(out, "{keyword} {v}"),
        // Debug formatting of floats is the shortest exact round-trip
        // representation, and prints NaN and infinities as parseable words.
        PrimitiveValue::Float(v) => write!(out, "{keyword} {v:?}"),
        PrimitiveValue::Double(v) => write!(out, "{keyword} {v:?}"),
    };
}

/// Escapes a byte run into a string literal body.
///
/// Valid UTF-8 keeps its non-ASCII characters readable; anything else
/// falls back to byte-wise `\xNN` escapes. Quotes, backslashes and all
/// control bytes (newlines in particular) are always escaped, so the edit
/// buffer never contains a raw newline inside a value.
pub(super) fn escape_into(out: &mut String, bytes: &[u8]) {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            for ch in text.chars() {
                escape_char(out, ch);
            }
        }
        Err(_) => {
            for byte in bytes {
                match byte {
                    0x20..=0x7E if *byte != b'"' && *byte != b'\\' => out.push(*byte as char),
                    _ => {
                        let _ = write!(out, "\\x{byte:02X}");
                    }
                }
            }
        }
    }
}

fn escape_char(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if (c as u32) < 0x20 || c as u32 == 0x7F => {
            let _ = write!(out, "\\x{:02X}", c as u32);
        }
        c => out.push(c),
    }
}

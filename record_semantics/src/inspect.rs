//! Record Semantics: Console Inspector
//!
//! Renders records the way a JavaScript console prints object literals:
//!
//!   { name: 'sandra', age: 23 }
//!
//! Short records stay on one line. Anything that would overflow
//! `break_length` is broken into one attribute per line, two spaces deep
//! per nesting level. Rendering only reads its input.

use serde::Serialize;
use serde_json::Value as Json;

use crate::error::CopyError;

/// Console rendering tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InspectOptions {
    /// Records nested deeper than this print as `[Object]` / `[Array]`.
    pub depth: usize,
    /// Maximum single-line width.
    pub break_length: usize,
    /// A record is only joined onto one line if fewer than this many
    /// nesting levels sit below it.
    pub compact: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            depth: 2,
            break_length: 80,
            compact: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Render tree
// ---------------------------------------------------------------------------

/// Intermediate tree handed to the formatter.
///
/// `reference` marks a record that some descendant points back to; it is
/// printed as a `<ref *N>` prefix, and the back-pointer as `[Circular *N]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    /// Already formatted literal: numbers and placeholders.
    Literal(String),
    Text(String),
    Function(String),
    Circular(usize),
    List {
        reference: Option<usize>,
        items: Vec<Node>,
    },
    Object {
        reference: Option<usize>,
        fields: Vec<(String, Node)>,
    },
}

impl Node {
    /// Build a render tree from a JSON value. Object order is preserved.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Node::Null,
            Json::Bool(b) => Node::Bool(*b),
            Json::Number(n) => {
                let literal = if let Some(i) = n.as_i64() {
                    i.to_string()
                } else if let Some(u) = n.as_u64() {
                    u.to_string()
                } else {
                    format_number(n.as_f64().unwrap_or(f64::NAN))
                };
                Node::Literal(literal)
            }
            Json::String(s) => Node::Text(s.clone()),
            Json::Array(items) => Node::List {
                reference: None,
                items: items.iter().map(Node::from_json).collect(),
            },
            Json::Object(map) => Node::Object {
                reference: None,
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), Node::from_json(v)))
                    .collect(),
            },
        }
    }
}

/// Format a number the way the console does: no trailing `.0`, named
/// non-finite values, signed zero.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        format!("{}", n)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render a render tree.
pub fn inspect_node(node: &Node, options: &InspectOptions) -> String {
    let mut formatter = Formatter {
        options,
        indentation: 0,
        current_depth: 0,
    };
    formatter.format(node, 0)
}

/// Render any serializable record.
///
/// Goes through `serde_json::Value`, so a non-finite float renders as
/// `null` here. Use the dynamic `Value` model to see such values as-is.
pub fn inspect_serialize<T: Serialize>(
    record: &T,
    options: &InspectOptions,
) -> Result<String, CopyError> {
    let json = serde_json::to_value(record).map_err(CopyError::Encode)?;
    Ok(inspect_node(&Node::from_json(&json), options))
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

struct Formatter<'a> {
    options: &'a InspectOptions,
    indentation: usize,
    /// Depth of the most recently entered list or object.
    current_depth: usize,
}

impl Formatter<'_> {
    fn format(&mut self, node: &Node, depth: usize) -> String {
        match node {
            Node::Null => "null".to_string(),
            Node::Bool(b) => b.to_string(),
            Node::Literal(literal) => literal.clone(),
            Node::Text(s) => quote(s),
            Node::Function(name) if name.is_empty() => "[Function (anonymous)]".to_string(),
            Node::Function(name) => format!("[Function: {}]", name),
            Node::Circular(index) => format!("[Circular *{}]", index),
            Node::List { reference, items } => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                if depth > self.options.depth {
                    return "[Array]".to_string();
                }
                self.current_depth = depth;
                let entries: Vec<String> = items
                    .iter()
                    .map(|item| self.format_nested(item, depth + 1))
                    .collect();
                self.reduce(entries, depth, &ref_label(*reference), ('[', ']'))
            }
            Node::Object { reference, fields } => {
                if fields.is_empty() {
                    return "{}".to_string();
                }
                if depth > self.options.depth {
                    return "[Object]".to_string();
                }
                self.current_depth = depth;
                let entries: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| {
                        format!("{}: {}", format_key(key), self.format_nested(value, depth + 1))
                    })
                    .collect();
                self.reduce(entries, depth, &ref_label(*reference), ('{', '}'))
            }
        }
    }

    fn format_nested(&mut self, node: &Node, depth: usize) -> String {
        self.indentation += 2;
        let rendered = self.format(node, depth);
        self.indentation -= 2;
        rendered
    }

    /// Join entries on one line if they fit, otherwise one per line.
    fn reduce(
        &self,
        entries: Vec<String>,
        depth: usize,
        base: &str,
        (open, close): (char, char),
    ) -> String {
        let prefix = if base.is_empty() {
            String::new()
        } else {
            format!("{} ", base)
        };

        if self.current_depth - depth < self.options.compact {
            let start = entries.len() + self.indentation + 1 + width(base) + 10;
            if self.below_break_length(&entries, start, base) {
                let joined = entries.join(", ");
                if !joined.contains('\n') {
                    return format!("{}{} {} {}", prefix, open, joined, close);
                }
            }
        }

        let indentation = format!("\n{}", " ".repeat(self.indentation));
        format!(
            "{}{}{}  {}{}{}",
            prefix,
            open,
            indentation,
            entries.join(&format!(",{}  ", indentation)),
            indentation,
            close
        )
    }

    fn below_break_length(&self, entries: &[String], start: usize, base: &str) -> bool {
        let limit = self.options.break_length;
        let mut total = entries.len() + start;
        if total + entries.len() > limit {
            return false;
        }
        for entry in entries {
            total += width(entry);
            if total > limit {
                return false;
            }
        }
        base.is_empty() || !base.contains('\n')
    }
}

fn ref_label(reference: Option<usize>) -> String {
    reference
        .map(|index| format!("<ref *{}>", index))
        .unwrap_or_default()
}

/// Console width counts UTF-16 code units.
fn width(s: &str) -> usize {
    s.encode_utf16().count()
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Quote a string, preferring `'`, then `"`, then a backtick, whichever
/// avoids escaping a quote.
pub fn quote(text: &str) -> String {
    let delimiter = if !text.contains('\'') {
        '\''
    } else if !text.contains('"') {
        '"'
    } else if !text.contains('`') && !text.contains("${") {
        '`'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(delimiter);
    for ch in text.chars() {
        match ch {
            '\'' if delimiter == '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || (0x7f..=0x9f).contains(&(c as u32)) => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

// src/generator/format.rs
// Deterministic rendering of option maps as a Nix attribute set

use super::value::ConfigValue;
use std::collections::BTreeMap;

const INDENT: &str = "  ";

/// Header line placed above every generated file
pub const HEADER: &str = "# This file is generated for testing";

/// Render a whole configuration file.
pub fn render_config(attrs: &BTreeMap<String, ConfigValue>) -> String {
    format!("\n{}\n{}\n", HEADER, render_attrs(attrs, 0))
}

/// Render a single value. Booleans lowercase, lists as quoted strings,
/// maps recurse with sorted keys, null as `null`, everything else quoted.
pub fn render_value(value: &ConfigValue, depth: usize) -> String {
    match value {
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Null => "null".to_string(),
        ConfigValue::List(items) => {
            if items.is_empty() {
                "[ ]".to_string()
            } else {
                let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
                format!("[ {} ]", quoted.join(" "))
            }
        }
        ConfigValue::Map(map) => render_attrs(map, depth),
        ConfigValue::Int(n) => quote(&n.to_string()),
        ConfigValue::Str(s) => quote(s),
    }
}

fn render_attrs(attrs: &BTreeMap<String, ConfigValue>, depth: usize) -> String {
    let inner = INDENT.repeat(depth + 1);
    let closing = INDENT.repeat(depth);
    let mut lines = vec!["{".to_string()];
    // BTreeMap iteration is already key-sorted
    for (key, value) in attrs {
        lines.push(format!(
            "{}{} = {};",
            inner,
            render_key(key),
            render_value(value, depth + 1)
        ));
    }
    lines.push(format!("{}}}", closing));
    lines.join("\n")
}

fn render_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\''))
}

fn quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{}\"", escaped)
}

//! Restricted literal interpreter.
//!
//! Turns an object/array/string/number/boolean syntax node into a
//! `serde_json::Value` by walking the tree directly. Nothing is executed: any
//! construct that would need evaluation (calls, identifiers, spreads,
//! interpolation, computed keys) is rejected with its position.

use anyhow::{anyhow, bail, Context};
use serde_json::{Map, Number, Value};
use tree_sitter::Node;

use super::syntax::{named_children, node_text, unwrap_expression};
use crate::manifest::HttpMethod;

/// Evaluate a literal expression node
pub fn evaluate(node: Node<'_>, source: &[u8]) -> anyhow::Result<Value> {
    let node = unwrap_expression(node);
    match node.kind() {
        "object" => evaluate_object(node, source),
        "array" => named_children(node)
            .into_iter()
            .map(|element| evaluate(element, source))
            .collect::<anyhow::Result<Vec<_>>>()
            .map(Value::Array),
        "string" | "template_string" => string_value(node, source).map(Value::String),
        "number" => number_value(node_text(node, source)?),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" | "undefined" => Ok(Value::Null),
        "unary_expression" => evaluate_unary(node, source),
        "member_expression" => enum_member(node, source),
        _ => Err(unsupported(node, source)),
    }
}

fn evaluate_object(node: Node<'_>, source: &[u8]) -> anyhow::Result<Value> {
    let mut map = Map::new();
    for member in named_children(node) {
        if member.kind() != "pair" {
            return Err(unsupported(member, source));
        }
        let key = member
            .child_by_field_name("key")
            .ok_or_else(|| unsupported(member, source))?;
        let key = match key.kind() {
            "property_identifier" | "number" => node_text(key, source)?.to_string(),
            "string" => string_value(key, source)?,
            _ => return Err(unsupported(key, source)),
        };
        let value = member
            .child_by_field_name("value")
            .ok_or_else(|| unsupported(member, source))?;
        map.insert(key, evaluate(value, source)?);
    }
    Ok(Value::Object(map))
}

fn evaluate_unary(node: Node<'_>, source: &[u8]) -> anyhow::Result<Value> {
    let operator = node
        .child_by_field_name("operator")
        .map(|op| node_text(op, source))
        .transpose()?;
    let argument = node
        .child_by_field_name("argument")
        .ok_or_else(|| unsupported(node, source))?;
    let value = evaluate(argument, source)?;
    match (operator, &value) {
        (Some("+"), Value::Number(_)) => Ok(value),
        (Some("-"), Value::Number(n)) => negate(n).ok_or_else(|| unsupported(node, source)),
        _ => Err(unsupported(node, source)),
    }
}

fn negate(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return i.checked_neg().map(Value::from);
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .map(Value::Number)
}

/// `HttpMethod.POST` style references evaluate to the verb itself
fn enum_member(node: Node<'_>, source: &[u8]) -> anyhow::Result<Value> {
    let object = node.child_by_field_name("object");
    let property = node.child_by_field_name("property");
    if let (Some(object), Some(property)) = (object, property) {
        if object.kind() == "identifier" && property.kind() == "property_identifier" {
            let verb = node_text(property, source)?;
            if verb.parse::<HttpMethod>().is_ok() {
                return Ok(Value::String(verb.to_string()));
            }
        }
    }
    Err(unsupported(node, source))
}

fn string_value(node: Node<'_>, source: &[u8]) -> anyhow::Result<String> {
    let mut out = String::new();
    for part in named_children(node) {
        match part.kind() {
            "string_fragment" => out.push_str(node_text(part, source)?),
            "escape_sequence" => out.push_str(&decode_escape(node_text(part, source)?)?),
            _ => return Err(unsupported(part, source)),
        }
    }
    Ok(out)
}

fn decode_escape(sequence: &str) -> anyhow::Result<String> {
    let body = sequence
        .strip_prefix('\\')
        .ok_or_else(|| anyhow!("malformed escape sequence `{sequence}`"))?;
    let mut chars = body.chars();
    let decoded = match chars.next() {
        Some('n') => "\n".to_string(),
        Some('t') => "\t".to_string(),
        Some('r') => "\r".to_string(),
        Some('b') => "\u{8}".to_string(),
        Some('f') => "\u{c}".to_string(),
        Some('v') => "\u{b}".to_string(),
        Some('0') if body.len() == 1 => "\0".to_string(),
        Some('x') => code_point(&body[1..], sequence)?.to_string(),
        Some('u') => {
            let hex = body[1..].trim_start_matches('{').trim_end_matches('}');
            code_point(hex, sequence)?.to_string()
        }
        Some('\n') | Some('\r') | Some('\u{2028}') | Some('\u{2029}') => String::new(),
        Some(other) => other.to_string(),
        None => bail!("malformed escape sequence `{sequence}`"),
    };
    Ok(decoded)
}

fn code_point(hex: &str, sequence: &str) -> anyhow::Result<char> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .with_context(|| format!("invalid escape sequence `{sequence}`"))
}

fn number_value(text: &str) -> anyhow::Result<Value> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();
    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| cleaned.strip_prefix(prefix).map(|digits| (digits, radix)));
    if let Some((digits, radix)) = radix {
        let digits = digits.trim_end_matches('n');
        return i64::from_str_radix(digits, radix)
            .map(Value::from)
            .with_context(|| format!("number literal `{text}` is out of range"));
    }
    if let Some(bigint) = cleaned.strip_suffix('n') {
        return bigint
            .parse::<i64>()
            .map(Value::from)
            .with_context(|| format!("number literal `{text}` is out of range"));
    }
    let float: f64 = cleaned
        .parse()
        .with_context(|| format!("invalid number literal `{text}`"))?;
    if float.fract() == 0.0 && float.abs() < 9_007_199_254_740_992.0 {
        return Ok(Value::from(float as i64));
    }
    Number::from_f64(float)
        .map(Value::Number)
        .with_context(|| format!("number literal `{text}` is not finite"))
}

fn unsupported(node: Node<'_>, source: &[u8]) -> anyhow::Error {
    let pos = node.start_position();
    let text = node_text(node, source).unwrap_or("<non-utf8>");
    let mut snippet: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        snippet.push('…');
    }
    anyhow!(
        "unsupported expression `{snippet}` at line {}, column {} (only literal values are allowed)",
        pos.row + 1,
        pos.column + 1
    )
}

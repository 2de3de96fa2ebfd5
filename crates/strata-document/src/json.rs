//! JSON conversion
//!
//! Scalars are converted according to their resolved tag; mapping key order
//! is preserved (`serde_json` is built with `preserve_order`).

use crate::document::ResourceDocument;
use crate::node::{Node, NodeValue, Scalar, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG};
use serde_json::{Map, Number, Value};

/// Convert a node tree to a JSON value
#[must_use]
pub fn node_to_json(node: &Node) -> Value {
    match &node.value {
        NodeValue::Mapping(pairs) => {
            let map: Map<String, Value> = pairs
                .iter()
                .map(|(key, value)| (key_string(key), node_to_json(value)))
                .collect();
            Value::Object(map)
        }
        NodeValue::Sequence(items) => Value::Array(items.iter().map(node_to_json).collect()),
        NodeValue::Scalar(scalar) => scalar_to_json(scalar),
    }
}

fn key_string(key: &Node) -> String {
    match key.as_str() {
        Some(text) => text.to_string(),
        None => node_to_json(key).to_string(),
    }
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    let text = scalar.value.as_str();
    match scalar.tag.as_str() {
        NULL_TAG => Value::Null,
        BOOL_TAG => Value::Bool(matches!(text, "true" | "True" | "TRUE")),
        INT_TAG => parse_int(text).unwrap_or_else(|| Value::String(text.to_string())),
        FLOAT_TAG => parse_float(text).unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<Value> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()?
    } else if let Some(octal) = digits.strip_prefix("0o") {
        u64::from_str_radix(octal, 8).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };

    if negative {
        let signed = i64::try_from(magnitude).ok()?.checked_neg()?;
        Some(Value::Number(Number::from(signed)))
    } else {
        Some(Value::Number(Number::from(magnitude)))
    }
}

fn parse_float(text: &str) -> Option<Value> {
    let value: f64 = text.parse().ok()?;
    Number::from_f64(value).map(Value::Number)
}

/// Wrap documents in a `{apiVersion, kind, items}` list object
#[must_use]
pub fn wrap(api_version: &str, kind: &str, documents: &[ResourceDocument]) -> Value {
    let mut map = Map::new();
    map.insert("apiVersion".to_string(), Value::String(api_version.to_string()));
    map.insert("kind".to_string(), Value::String(kind.to_string()));
    map.insert(
        "items".to_string(),
        Value::Array(documents.iter().map(ResourceDocument::to_json).collect()),
    );
    Value::Object(map)
}

impl ResourceDocument {
    /// JSON form of the document, annotations included
    #[must_use]
    pub fn to_json(&self) -> Value {
        node_to_json(&self.to_node())
    }
}

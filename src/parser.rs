//! Parses token document text into the validated tree in [`crate::document`].
//!
//! serde_json does the lexing (with `preserve_order`, so group children
//! keep the document's key order); this pass applies the DTCG shape
//! rules on top: `$`-prefixed keys are metadata, an object with a
//! `$value` is a token, any other object is a group.

use miette::NamedSource;
use serde_json::Value;

use crate::document::{Group, Scalar, ShadowValue, Token, TokenDocument, TokenNode, TokenValue};
use crate::error::ParseError;

/// Parses a token document. Malformed JSON or a non-object root abort
/// immediately; no partial tree is produced.
pub fn parse_document(source: &str) -> Result<TokenDocument, ParseError> {
    let value: Value = serde_json::from_str(source).map_err(|e| {
        let offset = offset_of(source, e.line(), e.column());
        ParseError::InvalidJson {
            src: NamedSource::new("tokens.json", source.to_string()),
            span: (offset, 0).into(),
            message: e.to_string(),
        }
    })?;

    let Value::Object(map) = value else {
        return Err(ParseError::InvalidRoot {
            src: NamedSource::new("tokens.json", source.to_string()),
            span: (0, source.len()).into(),
        });
    };

    let name = map
        .get("$name")
        .and_then(Value::as_str)
        .map(str::to_string);
    let root = parse_group(&map);

    Ok(TokenDocument { name, root })
}

fn parse_group(map: &serde_json::Map<String, Value>) -> Group {
    let mut group = Group {
        group_type: string_meta(map, "$type"),
        description: string_meta(map, "$description"),
        children: Vec::new(),
    };

    for (key, value) in map {
        if key.starts_with('$') {
            continue;
        }
        let Value::Object(child) = value else {
            // A bare string/number under a group is not valid DTCG;
            // skipped silently.
            continue;
        };

        if child.contains_key("$value") {
            group
                .children
                .push((key.clone(), TokenNode::Token(parse_token(child))));
        } else {
            group
                .children
                .push((key.clone(), TokenNode::Group(parse_group(child))));
        }
    }

    group
}

fn parse_token(map: &serde_json::Map<String, Value>) -> Token {
    let raw = map.get("$value").cloned().unwrap_or(Value::Null);
    Token {
        value: parse_value(raw),
        token_type: string_meta(map, "$type"),
        description: string_meta(map, "$description"),
    }
}

fn parse_value(raw: Value) -> TokenValue {
    match raw {
        Value::String(s) => TokenValue::Text(s),
        Value::Number(n) => match n.as_f64() {
            Some(f) => TokenValue::Number(f),
            None => TokenValue::Other(Value::Number(n)),
        },
        Value::Array(items) => {
            let strings: Option<Vec<String>> = items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            match strings {
                Some(stack) => TokenValue::FontStack(stack),
                None => TokenValue::Other(Value::Array(items)),
            }
        }
        Value::Object(map) => match parse_shadow_shape(&map) {
            Some(shadow) => TokenValue::Shadow(shadow),
            None => TokenValue::Other(Value::Object(map)),
        },
        other => TokenValue::Other(other),
    }
}

/// Structural shadow check: the four keys `offsetX`, `offsetY`, `blur`
/// and `color` must be present (with a string color) for a value object
/// to count as shadow-shaped. `spread` is optional and defaults to 0.
/// Whether the values themselves are valid is decided later, by
/// [`crate::codec::parse_shadow`], so the two failure modes warn
/// differently.
fn parse_shadow_shape(map: &serde_json::Map<String, Value>) -> Option<ShadowValue> {
    let color = map.get("color")?.as_str()?.to_string();
    Some(ShadowValue {
        offset_x: scalar(map.get("offsetX")?)?,
        offset_y: scalar(map.get("offsetY")?)?,
        blur: scalar(map.get("blur")?)?,
        spread: map
            .get("spread")
            .and_then(scalar)
            .unwrap_or(Scalar::Number(0.0)),
        color,
    })
}

fn scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::String(s) => Some(Scalar::Text(s.clone())),
        Value::Number(n) => n.as_f64().map(Scalar::Number),
        _ => None,
    }
}

fn string_meta(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Byte offset for serde_json's 1-based line/column error coordinates.
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let mut remaining_lines = line.saturating_sub(1);
    let mut offset = 0;
    for (i, c) in source.char_indices() {
        if remaining_lines == 0 {
            break;
        }
        if c == '\n' {
            remaining_lines -= 1;
            offset = i + 1;
        }
    }
    (offset + column.saturating_sub(1)).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_and_group_are_distinguished_by_dollar_value() {
        let doc = parse_document(
            r##"{
                "color": {
                    "$type": "color",
                    "brand": { "$value": "#FF0000" }
                }
            }"##,
        )
        .unwrap();

        let (key, node) = &doc.root.children[0];
        assert_eq!(key, "color");
        let TokenNode::Group(group) = node else {
            panic!("expected a group");
        };
        assert_eq!(group.group_type.as_deref(), Some("color"));
        assert!(matches!(group.children[0].1, TokenNode::Token(_)));
    }

    #[test]
    fn reserved_keys_are_metadata_not_children() {
        let doc = parse_document(
            r#"{
                "$name": "Design Tokens",
                "$description": "top level",
                "spacing": { "sm": { "$value": "8px", "$type": "dimension" } }
            }"#,
        )
        .unwrap();

        assert_eq!(doc.name.as_deref(), Some("Design Tokens"));
        assert_eq!(doc.root.description.as_deref(), Some("top level"));
        assert_eq!(doc.root.children.len(), 1);
    }

    #[test]
    fn shadow_shape_requires_the_structural_keys() {
        let doc = parse_document(
            r##"{
                "shadow": {
                    "$type": "shadow",
                    "card": { "$value": { "offsetX": "0px", "offsetY": "2px", "blur": "4px", "color": "#00000040" } },
                    "broken": { "$value": { "offsetX": "0px", "color": "#000" } }
                }
            }"##,
        )
        .unwrap();

        let TokenNode::Group(group) = &doc.root.children[0].1 else {
            panic!("expected a group");
        };
        let TokenNode::Token(card) = &group.children[0].1 else {
            panic!("expected a token");
        };
        assert!(matches!(card.value, TokenValue::Shadow(_)));

        let TokenNode::Token(broken) = &group.children[1].1 else {
            panic!("expected a token");
        };
        assert!(matches!(broken.value, TokenValue::Other(_)));
    }

    #[test]
    fn invalid_json_reports_a_parse_error() {
        let err = parse_document("{ not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = parse_document("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ParseError::InvalidRoot { .. }));
    }

    #[test]
    fn children_keep_document_order() {
        let doc = parse_document(
            r#"{
                "b": { "$value": 1, "$type": "number" },
                "a": { "$value": 2, "$type": "number" }
            }"#,
        )
        .unwrap();
        let keys: Vec<&str> = doc.root.children.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}

//! Depth-first traversal of the token tree: flattens nested groups into
//! typed leaf tokens, propagating inherited `$type` annotations, and
//! classifies each leaf into its destination category.

use std::collections::HashSet;

use crate::document::{Group, TokenDocument, TokenNode, TokenValue};

/// The six destination buckets a token can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Colors,
    Typography,
    Spacing,
    Border,
    Effects,
    Layout,
}

/// Fixed processing order. Collection creation and lookup walk this
/// list, so import output is deterministic for a given document.
pub const CATEGORY_ORDER: [Category; 6] = [
    Category::Colors,
    Category::Typography,
    Category::Spacing,
    Category::Border,
    Category::Effects,
    Category::Layout,
];

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Colors => "Colors",
            Category::Typography => "Typography",
            Category::Spacing => "Spacing",
            Category::Border => "Border",
            Category::Effects => "Effects",
            Category::Layout => "Layout",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flattened leaf token with its resolved type and category.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken {
    pub path: Vec<String>,
    pub name: String,
    pub token_type: String,
    pub value: TokenValue,
    pub category: Category,
}

/// Flattens the document into leaf tokens, in document order.
///
/// A leaf's effective type is its own `$type` if present, else the
/// nearest ancestor group's. Leaves with no resolvable type are dropped
/// silently, not reported.
pub fn flatten(document: &TokenDocument) -> Vec<ParsedToken> {
    let mut tokens = Vec::new();
    walk(&document.root, &mut Vec::new(), None, &mut tokens);
    tokens
}

fn walk(
    group: &Group,
    path: &mut Vec<String>,
    inherited_type: Option<&str>,
    out: &mut Vec<ParsedToken>,
) {
    let current_type = group.group_type.as_deref().or(inherited_type);

    for (key, node) in &group.children {
        match node {
            TokenNode::Token(token) => {
                let Some(token_type) = token.token_type.as_deref().or(current_type) else {
                    continue;
                };
                let mut token_path = path.clone();
                token_path.push(key.clone());
                let name = token_path.join("/");
                let category = category_for(&token_path, token_type);
                out.push(ParsedToken {
                    path: token_path,
                    name,
                    token_type: token_type.to_string(),
                    value: token.value.clone(),
                    category,
                });
            }
            TokenNode::Group(child) => {
                path.push(key.clone());
                walk(child, path, current_type, out);
                path.pop();
            }
        }
    }
}

/// Category is a pure function of the first path segment and the
/// resolved type; first match wins.
pub fn category_for(path: &[String], token_type: &str) -> Category {
    let root = path.first().map(String::as_str).unwrap_or("");
    match root {
        "color" => Category::Colors,
        "fontFamily" | "fontSize" | "fontWeight" | "lineHeight" | "letterSpacing" => {
            Category::Typography
        }
        "spacing" => Category::Spacing,
        "borderRadius" | "borderWidth" => Category::Border,
        "opacity" | "duration" | "shadow" => Category::Effects,
        "breakpoint" => Category::Layout,
        _ => match token_type {
            "color" => Category::Colors,
            _ => Category::Effects,
        },
    }
}

/// Splits the flat list into the variable-bearing and shadow-bearing
/// subsets. The two are merged independently, each with its own
/// conflict-resolution scope.
pub fn split_shadow_tokens(tokens: Vec<ParsedToken>) -> (Vec<ParsedToken>, Vec<ParsedToken>) {
    let mut variables = Vec::new();
    let mut shadows = Vec::new();
    for token in tokens {
        if token.token_type == "shadow" {
            shadows.push(token);
        } else {
            variables.push(token);
        }
    }
    (variables, shadows)
}

pub fn used_categories(tokens: &[ParsedToken]) -> HashSet<Category> {
    tokens.iter().map(|t| t.category).collect()
}

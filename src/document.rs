//! The validated token tree produced by the parse pass.
//!
//! A DTCG document is a recursive object: keys starting with `$` are
//! metadata, any other key maps to either a further group or a token
//! (an object carrying a `$value`). The parser builds this tree once;
//! everything downstream works on it without re-inspecting raw JSON.

/// A parsed token document. `name` comes from the root-level `$name`
/// key when present.
#[derive(Debug, PartialEq, Clone)]
pub struct TokenDocument {
    pub name: Option<String>,
    pub root: Group,
}

/// A namespace node. Children keep the document's own key order, which
/// determines traversal order and therefore the order in which merge
/// decisions are made.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Group {
    pub group_type: Option<String>,
    pub description: Option<String>,
    pub children: Vec<(String, TokenNode)>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenNode {
    Group(Group),
    Token(Token),
}

/// A single named, typed design value.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub value: TokenValue,
    pub token_type: Option<String>,
    pub description: Option<String>,
}

/// The `$value` of a token.
///
/// `Other` holds anything the engine cannot interpret (booleans, nulls,
/// objects that are not shadow-shaped). Such values survive to the merge
/// stage so it can warn about them by token name instead of dropping
/// them silently at parse time.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenValue {
    Text(String),
    Number(f64),
    FontStack(Vec<String>),
    Shadow(ShadowValue),
    Other(serde_json::Value),
}

/// A shadow `$value`. Offsets, blur and spread are dimension scalars
/// (`"2px"`, `"0.5rem"` or a bare number); the color is a hex string.
#[derive(Debug, PartialEq, Clone)]
pub struct ShadowValue {
    pub offset_x: Scalar,
    pub offset_y: Scalar,
    pub blur: Scalar,
    pub spread: Scalar,
    pub color: String,
}

/// A value that may be written either as a JSON number or as a unit
/// string, as DTCG allows for dimension-like fields.
#[derive(Debug, PartialEq, Clone)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

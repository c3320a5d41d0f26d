//! The export serializer: rebuilds a nested token document from host
//! state, inverting the value codecs.
//!
//! Alias-valued variables are skipped, not dereferenced. Dimension-typed
//! numbers always come back with a `px` suffix, so a document that went
//! in as `rem` comes out as `px`; that unit loss is documented behavior.

use log::debug;
use serde_json::{Map, Value};

use crate::codec::{rgba_to_hex, DropShadow};
use crate::flatten::Category;
use crate::host::{Effect, HostError, HostValue, VariableStore, VariableType};

/// The rebuilt document plus counts of what it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput {
    pub document: Value,
    pub variable_count: usize,
    pub effect_count: usize,
}

impl ExportOutput {
    /// Pretty-printed JSON text of the document.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }

    /// YAML text of the document.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.document)
    }
}

/// Enumerates every collection and effect style in the store and
/// re-nests them into one document.
pub fn export_document<S: VariableStore + ?Sized>(
    store: &S,
    progress: &mut dyn FnMut(&str),
) -> Result<ExportOutput, HostError> {
    let mut root = Map::new();
    let mut variable_count = 0;
    let mut effect_count = 0;

    progress("Reading variable collections...");
    for collection in store.collections()? {
        progress(&format!("Processing collection: {}", collection.name));
        let category = category_from_collection_name(&collection.name);

        for variable in store.variables_in(collection.id)? {
            let Some(value) = variable.value else {
                continue;
            };
            if matches!(value, HostValue::Alias(_)) {
                debug!("skipping alias-valued variable: {}", variable.name);
                continue;
            }

            let dtcg_value = host_value_to_json(&value, variable.variable_type);
            let dtcg_type = if variable.variable_type == VariableType::Color {
                "color"
            } else {
                type_from_category(category)
            };

            let mut token = Map::new();
            token.insert("$value".to_string(), dtcg_value);
            token.insert("$type".to_string(), Value::String(dtcg_type.to_string()));
            if let Some(description) = variable.description {
                token.insert("$description".to_string(), Value::String(description));
            }

            let path: Vec<&str> = variable.name.split('/').collect();
            set_nested(&mut root, &path, Value::Object(token));
            variable_count += 1;
        }
    }

    progress("Reading effect styles...");
    for style in store.effect_styles()? {
        let shadows: Vec<&DropShadow> = style
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::DropShadow(shadow) if shadow.visible => Some(shadow),
                _ => None,
            })
            .collect();

        if shadows.is_empty() {
            continue;
        }

        let value = if shadows.len() == 1 {
            shadow_to_json(shadows[0])
        } else {
            Value::Array(shadows.into_iter().map(shadow_to_json).collect())
        };

        let mut token = Map::new();
        token.insert("$value".to_string(), value);
        token.insert("$type".to_string(), Value::String("shadow".to_string()));
        if let Some(description) = style.description {
            token.insert("$description".to_string(), Value::String(description));
        }

        let path: Vec<&str> = style.name.split('/').collect();
        set_nested(&mut root, &path, Value::Object(token));
        effect_count += 1;
    }

    Ok(ExportOutput {
        document: Value::Object(root),
        variable_count,
        effect_count,
    })
}

/// Keyword categorization of a collection by name, for deriving export
/// type tags. Mirrors the import-side category names but tolerates
/// arbitrary user-named collections.
pub fn category_from_collection_name(name: &str) -> Category {
    let normalized = name.to_lowercase();
    if normalized.contains("color") {
        Category::Colors
    } else if normalized.contains("typography") || normalized.contains("font") {
        Category::Typography
    } else if normalized.contains("spacing") {
        Category::Spacing
    } else if normalized.contains("border") {
        Category::Border
    } else if normalized.contains("effect") || normalized.contains("shadow") {
        Category::Effects
    } else if normalized.contains("layout") || normalized.contains("breakpoint") {
        Category::Layout
    } else {
        Category::Effects
    }
}

fn type_from_category(category: Category) -> &'static str {
    match category {
        Category::Colors => "color",
        Category::Typography | Category::Spacing | Category::Border | Category::Layout => {
            "dimension"
        }
        Category::Effects => "number",
    }
}

fn host_value_to_json(value: &HostValue, variable_type: VariableType) -> Value {
    match value {
        HostValue::Color(rgba) => Value::String(rgba_to_hex(rgba)),
        HostValue::Number(n) => {
            if variable_type == VariableType::Float {
                json_number(*n)
            } else {
                Value::String(format_px(*n))
            }
        }
        HostValue::Text(s) => Value::String(s.clone()),
        // Callers skip aliases before getting here.
        HostValue::Alias(_) => Value::Null,
    }
}

fn shadow_to_json(shadow: &DropShadow) -> Value {
    let mut map = Map::new();
    map.insert("offsetX".to_string(), Value::String(format_px(shadow.offset_x)));
    map.insert("offsetY".to_string(), Value::String(format_px(shadow.offset_y)));
    map.insert("blur".to_string(), Value::String(format_px(shadow.radius)));
    map.insert("spread".to_string(), Value::String(format_px(shadow.spread)));
    map.insert("color".to_string(), Value::String(rgba_to_hex(&shadow.color)));
    Value::Object(map)
}

/// Walks `path` through `root`, creating intermediate groups on demand,
/// and writes the token at the last segment. A non-group node in the way
/// is replaced; later writers win deterministically.
fn set_nested(root: &mut Map<String, Value>, path: &[&str], token: Value) {
    let Some((last, intermediate)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for segment in intermediate {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
    current.insert(last.to_string(), token);
}

fn format_px(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}px", n as i64)
    } else {
        format!("{n}px")
    }
}

fn json_number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

//! Komga search condition trees.
//!
//! Each filter value becomes a leaf `{field: {"operator": "is", "value": v}}`.
//! One leaf is sent bare, several are wrapped in `{"allOf": [...]}`.

use serde_json::{json, Map, Value};

#[derive(Debug, Default)]
pub struct ConditionBuilder {
    leaves: Vec<Value>,
}

/// `{field: {"operator": "is", "value": value}}`
pub fn is_leaf(field: &str, value: &str) -> Value {
    let mut leaf = Map::new();
    leaf.insert(field.to_string(), json!({ "operator": "is", "value": value }));
    Value::Object(leaf)
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `is` leaf per value.
    pub fn is_each(mut self, field: &str, values: &[String]) -> Self {
        self.leaves.extend(values.iter().map(|value| is_leaf(field, value)));
        self
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn build(mut self) -> Option<Value> {
        match self.leaves.len() {
            0 => None,
            1 => self.leaves.pop(),
            _ => Some(json!({ "allOf": self.leaves })),
        }
    }
}

/// Request body for the `/list` search endpoints. Full-text search sits beside
/// the condition, not inside it.
pub fn search_body(condition: Option<Value>, full_text: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(condition) = condition {
        body.insert("condition".to_string(), condition);
    }
    if let Some(text) = full_text.filter(|t| !t.trim().is_empty()) {
        body.insert("fullTextSearch".to_string(), Value::String(text.to_string()));
    }
    Value::Object(body)
}

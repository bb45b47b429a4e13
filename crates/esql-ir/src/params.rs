//! Named query parameters collected during one translation

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// How captured values reach the rendered query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    /// Embed captured values as literals
    #[default]
    Inline,
    /// Emit `?name` placeholders and collect the values
    Parameterized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

/// Parameter slots in first-seen order.
///
/// Distinct values sharing a base name get `_2`, `_3`, ... suffixes; an
/// identical (name, value) pair reuses its existing slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    entries: Vec<Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `base` and return the slot name to reference.
    pub fn register(&mut self, base: &str, value: &Value) -> String {
        let base = sanitize(base);
        let mut candidate = base.clone();
        let mut suffix = 1;

        loop {
            match self.entries.iter().find(|p| p.name == candidate) {
                None => {
                    self.entries.push(Parameter {
                        name: candidate.clone(),
                        value: value.clone(),
                    });
                    return candidate;
                }
                Some(existing) if existing.value == *value => return candidate,
                Some(_) => {
                    suffix += 1;
                    candidate = format!("{}_{}", base, suffix);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_vec(self) -> Vec<Parameter> {
        self.entries
    }
}

/// Parameter names must be identifiers.
fn sanitize(base: &str) -> String {
    let mut name: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "p_");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_values_get_suffixes_in_order() {
        let mut table = ParameterTable::new();

        assert_eq!(table.register("threshold", &Value::Int(500)), "threshold");
        assert_eq!(table.register("threshold", &Value::Int(100)), "threshold_2");
        assert_eq!(table.register("threshold", &Value::Int(7)), "threshold_3");

        let names: Vec<_> = table.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["threshold", "threshold_2", "threshold_3"]);
    }

    #[test]
    fn test_identical_pair_reuses_slot() {
        let mut table = ParameterTable::new();

        table.register("threshold", &Value::Int(500));
        table.register("threshold", &Value::Int(100));
        assert_eq!(table.register("threshold", &Value::Int(100)), "threshold_2");
        assert_eq!(table.register("threshold", &Value::Int(500)), "threshold");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_names_are_sanitized() {
        let mut table = ParameterTable::new();

        assert_eq!(table.register("min-level", &Value::Int(1)), "min_level");
        assert_eq!(table.register("1st", &Value::Int(1)), "p_1st");
        assert_eq!(table.register("", &Value::Int(1)), "p_");
    }

    #[test]
    fn test_clear_resets_numbering() {
        let mut table = ParameterTable::new();
        table.register("x", &Value::Int(1));
        table.register("x", &Value::Int(2));
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.register("x", &Value::Int(2)), "x");
    }
}

//! Type system for the query IR

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static type of a document member or literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    // Primitives
    Bool,
    Int,
    Long,
    Double,

    // Text
    /// Exact-match string
    Keyword,
    /// Analysed full-text string
    Text,

    // Temporal
    DateTime,
    Duration,

    // Network
    Ip,

    // Complex
    Enum(EnumType),
    List(Box<ValueType>),
    /// Nested document of the named type
    Object(String),

    // Special
    Unknown,
}

impl ValueType {
    pub fn is_string(&self) -> bool {
        matches!(self, ValueType::Keyword | ValueType::Text)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Int | ValueType::Long | ValueType::Double
        )
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match self {
            ValueType::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// An enumeration stored by the backing store under its symbolic names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    /// Variant names indexed by ordinal
    pub variants: Vec<String>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variant(&self, ordinal: i64) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    /// Build the value for the named variant, if it exists.
    pub fn value(&self, name: &str) -> Option<Value> {
        let ordinal = self.variants.iter().position(|v| v == name)?;
        Some(Value::Enum(EnumValue {
            type_name: self.name.clone(),
            name: name.to_string(),
            ordinal: ordinal as i64,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub type_name: String,
    pub name: String,
    pub ordinal: i64,
}

/// Typed literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    /// Time span in milliseconds
    Duration(i64),
    Enum(EnumValue),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Unknown,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Long,
            Value::Float(_) => ValueType::Double,
            Value::String(_) => ValueType::Keyword,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Duration(_) => ValueType::Duration,
            Value::Enum(e) => ValueType::Enum(EnumType {
                name: e.type_name.clone(),
                variants: Vec::new(),
            }),
            Value::List(items) => ValueType::List(Box::new(
                items
                    .first()
                    .map(Value::value_type)
                    .unwrap_or(ValueType::Unknown),
            )),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_variant_lookup() {
        let level = EnumType::new("LogLevel", ["Debug", "Info", "Warning", "Error"]);
        assert_eq!(level.variant(3), Some("Error"));
        assert_eq!(level.variant(4), None);
        assert_eq!(level.variant(-1), None);

        match level.value("Info") {
            Some(Value::Enum(v)) => assert_eq!(v.ordinal, 1),
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(5), Value::Int(5));
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
    }
}

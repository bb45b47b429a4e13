//! Field metadata contract used to resolve document members at translation time

use std::collections::HashMap;

use crate::error::ResolveError;

/// Serialized form of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Stored field name, possibly dotted
    pub name: String,
    /// Analysed text field that needs the exact-match sub-field for comparisons
    pub full_text: bool,
}

impl FieldInfo {
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_text: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_text: true,
        }
    }
}

/// Trait for resolving document members at translation time
pub trait FieldMetadata {
    /// Stored name of `member` declared on `declaring_type`
    fn resolve(&self, declaring_type: &str, member: &str) -> Result<String, ResolveError>;

    /// Whether `member` is a full-text field
    fn is_full_text(&self, declaring_type: &str, member: &str) -> bool;
}

/// Registration table keyed by (declaring type, member)
#[derive(Debug, Clone, Default)]
pub struct StaticFieldMetadata {
    fields: HashMap<(String, String), FieldInfo>,
}

impl StaticFieldMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        info: FieldInfo,
    ) {
        self.fields
            .insert((declaring_type.into(), member.into()), info);
    }

    pub fn with_field(
        mut self,
        declaring_type: impl Into<String>,
        member: impl Into<String>,
        info: FieldInfo,
    ) -> Self {
        self.register(declaring_type, member, info);
        self
    }

    pub fn get(&self, declaring_type: &str, member: &str) -> Option<&FieldInfo> {
        self.fields
            .get(&(declaring_type.to_string(), member.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge another table into this one; entries in `other` win.
    pub fn extend(&mut self, other: StaticFieldMetadata) {
        self.fields.extend(other.fields);
    }
}

impl FieldMetadata for StaticFieldMetadata {
    fn resolve(&self, declaring_type: &str, member: &str) -> Result<String, ResolveError> {
        self.get(declaring_type, member)
            .map(|info| info.name.clone())
            .ok_or_else(|| ResolveError::UnknownMember {
                type_name: declaring_type.to_string(),
                member: member.to_string(),
            })
    }

    fn is_full_text(&self, declaring_type: &str, member: &str) -> bool {
        self.get(declaring_type, member)
            .map(|info| info.full_text)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_member_resolves() {
        let metadata = StaticFieldMetadata::new()
            .with_field("LogEntry", "Message", FieldInfo::text("message"))
            .with_field("LogEntry", "Timestamp", FieldInfo::keyword("@timestamp"));

        assert_eq!(metadata.resolve("LogEntry", "Timestamp").unwrap(), "@timestamp");
        assert!(metadata.is_full_text("LogEntry", "Message"));
        assert!(!metadata.is_full_text("LogEntry", "Timestamp"));
    }

    #[test]
    fn test_unknown_member_is_an_error() {
        let metadata = StaticFieldMetadata::new();

        let err = metadata.resolve("LogEntry", "Level").unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownMember {
                type_name: "LogEntry".to_string(),
                member: "Level".to_string(),
            }
        );
        assert!(!metadata.is_full_text("LogEntry", "Level"));
    }
}

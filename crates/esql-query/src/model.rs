//! Document models
//!
//! A [`DocumentModel`] declares the members of one document type with their
//! stored names, and registers them into a [`StaticFieldMetadata`] table the
//! compiler resolves against.

use esql_compile::{FieldInfo, StaticFieldMetadata};
use esql_ir::{Expr, FieldRef, Member, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub member: String,
    pub stored: String,
    pub value_type: ValueType,
    pub full_text: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentModel {
    type_name: String,
    fields: Vec<FieldDef>,
}

impl DocumentModel {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a member. `Text` members are full-text.
    pub fn declare(
        mut self,
        member: impl Into<String>,
        stored: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let full_text = value_type == ValueType::Text;
        self.fields.push(FieldDef {
            member: member.into(),
            stored: stored.into(),
            value_type,
            full_text,
        });
        self
    }

    pub fn keyword(self, member: impl Into<String>, stored: impl Into<String>) -> Self {
        self.declare(member, stored, ValueType::Keyword)
    }

    pub fn text(self, member: impl Into<String>, stored: impl Into<String>) -> Self {
        self.declare(member, stored, ValueType::Text)
    }

    /// Object member whose own members are declared on `model`.
    pub fn nested(
        self,
        member: impl Into<String>,
        stored: impl Into<String>,
        model: &DocumentModel,
    ) -> Self {
        self.declare(member, stored, ValueType::Object(model.type_name.clone()))
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn register(&self, metadata: &mut StaticFieldMetadata) {
        for field in &self.fields {
            let info = FieldInfo {
                name: field.stored.clone(),
                full_text: field.full_text,
            };
            metadata.register(self.type_name.clone(), field.member.clone(), info);
        }
    }

    pub fn metadata(&self) -> StaticFieldMetadata {
        let mut metadata = StaticFieldMetadata::new();
        self.register(&mut metadata);
        metadata
    }

    /// Undeclared members carry `Unknown` and fail at translation.
    pub fn member(&self, name: &str) -> Member {
        let value_type = self
            .fields
            .iter()
            .find(|f| f.member == name)
            .map(|f| f.value_type.clone())
            .unwrap_or(ValueType::Unknown);
        Member::new(self.type_name.clone(), name, value_type)
    }

    pub fn field(&self, name: &str) -> Expr {
        Expr::Field(FieldRef::new(self.member(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_compile::FieldMetadata;

    fn log_model() -> DocumentModel {
        DocumentModel::new("Log")
            .keyword("Level", "log.level")
            .text("Message", "message")
            .declare("Duration", "duration_ms", ValueType::Long)
    }

    #[test]
    fn test_register_fields() {
        let metadata = log_model().metadata();

        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.resolve("Log", "Level").unwrap(), "log.level");
        assert!(metadata.is_full_text("Log", "Message"));
        assert!(!metadata.is_full_text("Log", "Duration"));
    }

    #[test]
    fn test_field_carries_declared_type() {
        let model = log_model();
        assert_eq!(model.field("Duration").static_type(), ValueType::Long);
        assert_eq!(model.member("Missing").value_type, ValueType::Unknown);
    }

    #[test]
    fn test_nested_member_type() {
        let host = DocumentModel::new("Host").keyword("Name", "name");
        let log = log_model().nested("Host", "host", &host);

        assert_eq!(
            log.member("Host").value_type,
            ValueType::Object("Host".to_string())
        );
    }
}

//! WHERE translation

use esql_ir::{Command, Expr, QueryIr, ValueType};

use crate::error::TranslateError;
use crate::expression::ExprTranslator;
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;

/// Translate a boolean-valued expression into one `WHERE` command.
pub(crate) fn translate_where(
    ir: &mut QueryIr,
    metadata: &dyn FieldMetadata,
    options: &CompileOptions,
    predicate: &Expr,
) -> Result<(), TranslateError> {
    match predicate.static_type() {
        ValueType::Bool | ValueType::Unknown => {}
        other => {
            return Err(TranslateError::unsupported(format!(
                "filter predicate of type {:?}",
                other
            )))
        }
    }

    let condition = ExprTranslator::new(metadata, options, &mut ir.params).translate(predicate)?;
    ir.push(Command::Where { condition });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldInfo, StaticFieldMetadata};
    use esql_ir::{Member, ParameterMode};

    #[test]
    fn test_where_command_appended() {
        let metadata = StaticFieldMetadata::new()
            .with_field("Log", "Status", FieldInfo::keyword("http.status"));
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);

        let status: Expr = Member::new("Log", "Status", ValueType::Long).into();
        translate_where(&mut ir, &metadata, &options, &status.ge(500)).unwrap();

        assert_eq!(ir.commands.len(), 1);
        assert_eq!(ir.commands[0].to_string(), "WHERE http.status >= 500");
    }

    #[test]
    fn test_non_boolean_predicate_rejected() {
        let metadata = StaticFieldMetadata::new();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);

        let err = translate_where(&mut ir, &metadata, &options, &Expr::constant(5)).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(_)));
    }
}

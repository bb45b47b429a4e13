//! GROUP BY translation into one `STATS ... BY` command

use esql_ir::{Assignment, ByField, Command, Expr, QueryIr};
use esql_registry::FunctionRegistry;

use crate::error::TranslateError;
use crate::expression::ExprTranslator;
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;
use crate::projection::output_names;

/// One BY field, tagged with its member name when the key is composite.
struct KeyField {
    member: Option<String>,
    by: ByField,
}

pub(crate) fn translate_group_by(
    ir: &mut QueryIr,
    metadata: &dyn FieldMetadata,
    options: &CompileOptions,
    key: &Expr,
    result: Option<&Expr>,
) -> Result<(), TranslateError> {
    let mut translator = ExprTranslator::new(metadata, options, &mut ir.params);

    // Grouping keys
    let mut keys = Vec::new();
    match key.unwrap_convert() {
        // Constant key aggregates over everything
        Expr::Constant(_) => {}
        Expr::NewShape(shape) => {
            for member in &shape.members {
                keys.push(KeyField {
                    member: Some(member.name.clone()),
                    by: by_field(&mut translator, &member.value)?,
                });
            }
        }
        other => keys.push(KeyField {
            member: None,
            by: by_field(&mut translator, other)?,
        }),
    }

    // Result shape
    let mut aggregations = Vec::new();
    match result.map(Expr::unwrap_convert) {
        None => {}
        Some(Expr::NewShape(shape)) => {
            let names = output_names(metadata, options, shape)?;
            for (member, name) in shape.members.iter().zip(names) {
                match member.value.unwrap_convert() {
                    Expr::GroupKey(None) => match keys.as_mut_slice() {
                        [only] => only.by.alias = Some(name),
                        _ => {
                            return Err(TranslateError::unsupported(
                                "projecting a composite group key as one value",
                            ))
                        }
                    },
                    Expr::GroupKey(Some(member_name)) => {
                        let key = keys
                            .iter_mut()
                            .find(|k| k.member.as_deref() == Some(member_name.as_str()))
                            .ok_or_else(|| {
                                TranslateError::unsupported(format!(
                                    "group key has no member {}",
                                    member_name
                                ))
                            })?;
                        key.by.alias = Some(name);
                    }
                    value if contains_aggregate(value)? => {
                        let rendered = translator.translate(value)?;
                        aggregations.push(Assignment::new(name, rendered));
                    }
                    other => {
                        return Err(TranslateError::unsupported(format!(
                            "non-aggregate {:?} in aggregation result",
                            other
                        )))
                    }
                }
            }
        }
        // A lone aggregation is named after its function
        Some(Expr::Call(call)) if FunctionRegistry::global().lookup(&call.function)?.is_aggregate() => {
            let name = FunctionRegistry::global().lookup(&call.function)?.name;
            let rendered = translator.translate(&Expr::Call(call.clone()))?;
            aggregations.push(Assignment::new(name, rendered));
        }
        Some(other) => {
            return Err(TranslateError::unsupported(format!(
                "aggregation result {:?}",
                other
            )))
        }
    }

    if aggregations.is_empty() {
        aggregations.push(Assignment::new("count", "COUNT(*)"));
    }

    ir.push(Command::Stats {
        aggregations,
        by: keys.into_iter().map(|k| k.by).collect(),
    });
    Ok(())
}

fn by_field(translator: &mut ExprTranslator<'_>, expr: &Expr) -> Result<ByField, TranslateError> {
    match expr.unwrap_convert() {
        Expr::Field(_) | Expr::Call(_) | Expr::Binary { .. } | Expr::Unary { .. } => Ok(ByField {
            expression: translator.translate_exact(expr)?,
            alias: None,
        }),
        other => Err(TranslateError::unsupported(format!(
            "grouping by {:?}",
            other
        ))),
    }
}

/// Whether any call inside `expr` is an aggregation.
fn contains_aggregate(expr: &Expr) -> Result<bool, TranslateError> {
    match expr.unwrap_convert() {
        Expr::Call(call) => {
            if FunctionRegistry::global().lookup(&call.function)?.is_aggregate() {
                return Ok(true);
            }
            for arg in &call.args {
                if contains_aggregate(arg)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::Binary { left, right, .. } => {
            Ok(contains_aggregate(left)? || contains_aggregate(right)?)
        }
        Expr::Unary { operand, .. } => contains_aggregate(operand),
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => Ok(contains_aggregate(test)?
            || contains_aggregate(if_true)?
            || contains_aggregate(if_false)?),
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldInfo, StaticFieldMetadata};
    use esql_ir::{Member, ParameterMode, Shape, ValueType};

    fn metadata() -> StaticFieldMetadata {
        StaticFieldMetadata::new()
            .with_field("Log", "Level", FieldInfo::keyword("level"))
            .with_field("Log", "Message", FieldInfo::text("message"))
            .with_field("Log", "Host", FieldInfo::keyword("host"))
            .with_field("Log", "Duration", FieldInfo::keyword("duration_ms"))
            .with_field("Log", "Timestamp", FieldInfo::keyword("@timestamp"))
    }

    fn field(name: &str, value_type: ValueType) -> Expr {
        Member::new("Log", name, value_type).into()
    }

    fn render(key: Expr, result: Option<Expr>) -> Result<String, TranslateError> {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);
        translate_group_by(&mut ir, &metadata, &options, &key, result.as_ref())?;
        Ok(ir.commands[0].to_string())
    }

    #[test]
    fn test_key_alias_applied_to_by_field() {
        let result = Shape::anonymous()
            .member("Severity", Expr::group_key())
            .member("Count", Expr::call("count", vec![]));

        assert_eq!(
            render(field("Level", ValueType::Keyword), Some(result.into())).unwrap(),
            "STATS count = COUNT(*) BY severity = level"
        );
    }

    #[test]
    fn test_default_count_without_result() {
        assert_eq!(
            render(field("Level", ValueType::Keyword), None).unwrap(),
            "STATS count = COUNT(*) BY level"
        );
    }

    #[test]
    fn test_full_text_key_uses_exact_field() {
        assert_eq!(
            render(field("Message", ValueType::Text), None).unwrap(),
            "STATS count = COUNT(*) BY message.keyword"
        );
    }

    #[test]
    fn test_composite_key_members() {
        let key = Shape::anonymous()
            .member("Level", field("Level", ValueType::Keyword))
            .member("Host", field("Host", ValueType::Keyword));
        let result = Shape::anonymous()
            .member("Server", Expr::group_key_member("Host"))
            .member("Level", Expr::group_key_member("Level"))
            .member("AvgDuration", Expr::call("avg", vec![field("Duration", ValueType::Long)]));

        assert_eq!(
            render(key.into(), Some(result.into())).unwrap(),
            "STATS avgDuration = AVG(duration_ms) BY level, server = host"
        );
    }

    #[test]
    fn test_constant_key_has_no_by_clause() {
        let result = Shape::anonymous()
            .member("Total", Expr::call("count", vec![]))
            .member("Max", Expr::call("max", vec![field("Duration", ValueType::Long)]));

        assert_eq!(
            render(Expr::constant(1), Some(result.into())).unwrap(),
            "STATS total = COUNT(*), max = MAX(duration_ms)"
        );
    }

    #[test]
    fn test_bucket_key() {
        let bucket = Expr::call(
            "bucket",
            vec![
                field("Timestamp", ValueType::DateTime),
                Expr::call("from_hours", vec![1.into()]),
            ],
        );
        let result = Shape::anonymous()
            .member("Hour", Expr::group_key())
            .member("Errors", Expr::call("count", vec![]));

        assert_eq!(
            render(bucket, Some(result.into())).unwrap(),
            "STATS errors = COUNT(*) BY hour = BUCKET(@timestamp, 1 hour)"
        );
    }

    #[test]
    fn test_non_aggregate_result_member_rejected() {
        let result = Shape::anonymous().member("Host", field("Host", ValueType::Keyword));
        let err = render(field("Level", ValueType::Keyword), Some(result.into())).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(_)));
    }
}

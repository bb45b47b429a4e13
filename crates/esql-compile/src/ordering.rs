//! SORT and LIMIT translation

use esql_ir::{
    Assignment, Cardinality, Command, Expr, NullsOrder, QueryIr, SortDirection, SortField, Terminal,
};
use esql_registry::{FunctionId, FunctionRegistry};

use crate::error::TranslateError;
use crate::expression::{constant_int, ExprTranslator};
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;

/// Append a sort key. `then` extends the immediately preceding `SORT`.
pub(crate) fn translate_order_by(
    ir: &mut QueryIr,
    metadata: &dyn FieldMetadata,
    options: &CompileOptions,
    key: &Expr,
    direction: SortDirection,
    nulls: Option<NullsOrder>,
    then: bool,
) -> Result<(), TranslateError> {
    let field = {
        let mut translator = ExprTranslator::new(metadata, options, &mut ir.params);
        sort_key(&mut translator, key)?
    };
    let entry = SortField {
        field,
        direction,
        nulls,
    };

    if !then {
        ir.push(Command::Sort {
            fields: vec![entry],
        });
        return Ok(());
    }

    match ir.last_mut() {
        Some(Command::Sort { fields }) => {
            fields.push(entry);
            Ok(())
        }
        _ => Err(TranslateError::unsupported(
            "then_by without an immediately preceding order_by",
        )),
    }
}

fn sort_key(translator: &mut ExprTranslator<'_>, key: &Expr) -> Result<String, TranslateError> {
    match key.unwrap_convert() {
        Expr::Field(field) if field.accessor.is_none() => translator.translate_exact(key),
        Expr::Call(call) => {
            let def = FunctionRegistry::global().resolve(&call.function, call.args.len())?;
            match def.id {
                FunctionId::ToLower | FunctionId::ToUpper => {
                    let arg = translator.translate_exact(&call.args[0])?;
                    def.render(&[arg]).ok_or_else(|| {
                        TranslateError::unsupported(format!("sort key {}", def.name))
                    })
                }
                _ => Err(TranslateError::unsupported(format!(
                    "sort key function {}",
                    def.name
                ))),
            }
        }
        other => Err(TranslateError::unsupported(format!("sort key {:?}", other))),
    }
}

/// Literal row count into `LIMIT`.
pub(crate) fn translate_take(ir: &mut QueryIr, count: &Expr) -> Result<(), TranslateError> {
    let n = constant_int(count)
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| {
            TranslateError::unsupported(format!("take count {:?}; expected a non-negative integer", count))
        })?;
    ir.push(Command::Limit { count: n });
    Ok(())
}

pub(crate) fn translate_skip(_count: &Expr) -> Result<(), TranslateError> {
    Err(TranslateError::unsupported("skip: row offsets are not expressible"))
}

/// Result-shaping terminal: LIMIT guards or a count.
pub(crate) fn translate_terminal(ir: &mut QueryIr, terminal: Terminal) -> Result<(), TranslateError> {
    match terminal {
        Terminal::First | Terminal::FirstOrDefault => {
            ir.push(Command::Limit { count: 1 });
            ir.cardinality = if terminal == Terminal::First {
                Cardinality::First
            } else {
                Cardinality::FirstOrDefault
            };
        }
        // Two rows let the caller detect a multiplicity violation
        Terminal::Single | Terminal::SingleOrDefault => {
            ir.push(Command::Limit { count: 2 });
            ir.cardinality = if terminal == Terminal::Single {
                Cardinality::Single
            } else {
                Cardinality::SingleOrDefault
            };
        }
        Terminal::Count => {
            ir.push(Command::Stats {
                aggregations: vec![Assignment::new("count", "COUNT(*)")],
                by: Vec::new(),
            });
            ir.cardinality = Cardinality::Single;
            ir.result_type = None;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldInfo, StaticFieldMetadata};
    use esql_ir::{Member, ParameterMode, ValueType};

    fn metadata() -> StaticFieldMetadata {
        StaticFieldMetadata::new()
            .with_field("Log", "Message", FieldInfo::text("message"))
            .with_field("Log", "Timestamp", FieldInfo::keyword("@timestamp"))
    }

    fn message() -> Expr {
        Member::new("Log", "Message", ValueType::Text).into()
    }

    fn timestamp() -> Expr {
        Member::new("Log", "Timestamp", ValueType::DateTime).into()
    }

    #[test]
    fn test_then_by_extends_sort() {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);

        translate_order_by(&mut ir, &metadata, &options, &timestamp(), SortDirection::Descending, None, false)
            .unwrap();
        translate_order_by(&mut ir, &metadata, &options, &message(), SortDirection::Ascending, Some(NullsOrder::Last), true)
            .unwrap();

        assert_eq!(ir.commands.len(), 1);
        assert_eq!(
            ir.commands[0].to_string(),
            "SORT @timestamp DESC, message.keyword NULLS LAST"
        );
    }

    #[test]
    fn test_then_by_without_order_by_fails() {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);
        ir.push(Command::Limit { count: 5 });

        let err = translate_order_by(&mut ir, &metadata, &options, &message(), SortDirection::Ascending, None, true)
            .unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(_)));
    }

    #[test]
    fn test_case_conversion_sort_key() {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);
        let key = Expr::call("to_lower", vec![message()]);

        translate_order_by(&mut ir, &metadata, &options, &key, SortDirection::Ascending, None, false).unwrap();
        assert_eq!(ir.commands[0].to_string(), "SORT TO_LOWER(message.keyword)");

        let bad = Expr::call("abs", vec![timestamp()]);
        assert!(translate_order_by(&mut ir, &metadata, &options, &bad, SortDirection::Ascending, None, false).is_err());
    }

    #[test]
    fn test_limits_and_terminals() {
        let mut ir = QueryIr::new(ParameterMode::Inline);

        translate_take(&mut ir, &Expr::constant(5)).unwrap();
        translate_terminal(&mut ir, Terminal::Single).unwrap();
        assert_eq!(ir.commands[0].to_string(), "LIMIT 5");
        assert_eq!(ir.commands[1].to_string(), "LIMIT 2");
        assert_eq!(ir.cardinality, Cardinality::Single);

        translate_terminal(&mut ir, Terminal::FirstOrDefault).unwrap();
        assert_eq!(ir.commands[2].to_string(), "LIMIT 1");
        assert_eq!(ir.cardinality, Cardinality::FirstOrDefault);

        assert!(translate_take(&mut ir, &Expr::constant(-1)).is_err());
        assert!(translate_skip(&Expr::constant(10)).is_err());
    }
}

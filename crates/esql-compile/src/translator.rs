//! Core translator: operation chain → command list

use esql_ir::{
    Assignment, Command, Expr, Operation, Pipeline, QueryIr, ShapeKind, Source, Value,
};
use tracing::{debug, trace};

use crate::aggregation::translate_group_by;
use crate::assemble::{assemble, CompiledQuery};
use crate::error::TranslateError;
use crate::expression::{resolve_field, ExprTranslator};
use crate::format;
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;
use crate::ordering::{translate_order_by, translate_skip, translate_take, translate_terminal};
use crate::predicate::translate_where;
use crate::projection::translate_select;

/// Translator for operation chains → ES|QL
pub struct Compiler<'a> {
    metadata: &'a dyn FieldMetadata,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {
    pub fn new(metadata: &'a dyn FieldMetadata) -> Self {
        Self::with_options(metadata, CompileOptions::default())
    }

    pub fn with_options(metadata: &'a dyn FieldMetadata, options: CompileOptions) -> Self {
        Self { metadata, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Translate a pipeline into a fresh command list.
    pub fn translate(&self, pipeline: &Pipeline) -> Result<QueryIr, TranslateError> {
        let mut ir = QueryIr::new(self.options.mode);
        self.translate_source(&mut ir, &pipeline.source)?;

        let mut terminated = false;
        for op in &pipeline.ops {
            if terminated {
                return Err(TranslateError::InvalidPipeline(format!(
                    "{} after a terminal operation",
                    op.name()
                )));
            }
            trace!(op = op.name(), commands = ir.commands.len(), "Translating operation");
            self.translate_operation(&mut ir, op)?;
            terminated = matches!(op, Operation::Terminal { .. });
        }

        Ok(ir)
    }

    /// Translate and render a pipeline.
    pub fn compile(&self, pipeline: &Pipeline) -> Result<CompiledQuery, TranslateError> {
        let ir = self.translate(pipeline)?;
        let commands = ir.commands.len();
        let compiled = assemble(ir)?;

        debug!(
            commands,
            params = compiled.params.len(),
            mode = ?self.options.mode,
            fingerprint = %pipeline.fingerprint(),
            "Compiled query"
        );
        Ok(compiled)
    }

    fn translate_source(&self, ir: &mut QueryIr, source: &Source) -> Result<(), TranslateError> {
        match source {
            Source::From {
                pattern,
                metadata,
                document_type,
            } => {
                if pattern.trim().is_empty() {
                    return Err(TranslateError::InvalidPipeline(
                        "FROM requires an index pattern".to_string(),
                    ));
                }
                ir.push(Command::From {
                    pattern: pattern.clone(),
                    metadata: metadata.clone(),
                });
                ir.result_type = document_type.clone();
            }
            Source::Row {
                assignments,
                document_type,
            } => {
                if assignments.is_empty() {
                    return Err(TranslateError::InvalidPipeline(
                        "ROW requires at least one column".to_string(),
                    ));
                }
                let mut translator = ExprTranslator::new(self.metadata, &self.options, &mut ir.params);
                let mut rendered = Vec::with_capacity(assignments.len());
                for assignment in assignments {
                    let value = translator.translate(&assignment.value)?;
                    rendered.push(Assignment::new(assignment.name.clone(), value));
                }
                ir.push(Command::Row {
                    assignments: rendered,
                });
                ir.result_type = document_type.clone();
            }
        }
        Ok(())
    }

    fn translate_operation(&self, ir: &mut QueryIr, op: &Operation) -> Result<(), TranslateError> {
        match op {
            Operation::Where { predicate } => {
                translate_where(ir, self.metadata, &self.options, predicate)
            }
            Operation::Select { projection } => {
                translate_select(ir, self.metadata, &self.options, projection)?;
                ir.result_type = shape_type(projection);
                Ok(())
            }
            Operation::GroupBy { key, result } => {
                translate_group_by(ir, self.metadata, &self.options, key, result.as_ref())?;
                ir.result_type = result.as_ref().and_then(shape_type);
                Ok(())
            }
            Operation::OrderBy {
                key,
                direction,
                nulls,
                then,
            } => translate_order_by(
                ir,
                self.metadata,
                &self.options,
                key,
                *direction,
                *nulls,
                *then,
            ),
            Operation::Take { count } => translate_take(ir, count),
            Operation::Skip { count } => translate_skip(count),
            Operation::Keep { fields } => {
                let fields = self.field_list(fields)?;
                ir.push(Command::Keep { fields });
                Ok(())
            }
            Operation::Drop { fields } => {
                let fields = self.field_list(fields)?;
                ir.push(Command::Drop { fields });
                Ok(())
            }
            Operation::LookupJoin {
                lookup,
                outer_key,
                inner_key,
            } => self.translate_lookup_join(ir, lookup, outer_key, inner_key),
            Operation::Completion {
                prompt,
                inference_id,
                output,
            } => self.translate_completion(ir, prompt, inference_id, output.as_deref()),
            Operation::Terminal { kind } => translate_terminal(ir, *kind),
        }
    }

    fn field_list(&self, fields: &[Expr]) -> Result<Vec<String>, TranslateError> {
        if fields.is_empty() {
            return Err(TranslateError::InvalidPipeline(
                "KEEP and DROP require at least one field".to_string(),
            ));
        }
        fields.iter().map(|f| self.bare_field(f)).collect()
    }

    fn bare_field(&self, expr: &Expr) -> Result<String, TranslateError> {
        match expr.as_field() {
            Some(field) if field.is_simple() => resolve_field(self.metadata, field),
            _ => Err(TranslateError::unsupported(format!(
                "expected a field reference, got {:?}",
                expr
            ))),
        }
    }

    fn translate_lookup_join(
        &self,
        ir: &mut QueryIr,
        lookup: &Pipeline,
        outer_key: &Expr,
        inner_key: &Expr,
    ) -> Result<(), TranslateError> {
        // Independent command list so the source-only check sees only the lookup side
        let nested = self.translate(lookup)?;
        let index = match nested.commands.as_slice() {
            [Command::From { pattern, metadata }] if metadata.is_empty() => pattern.clone(),
            _ => {
                return Err(TranslateError::unsupported(
                    "lookup join side must be a bare index reference",
                ))
            }
        };

        let outer = self.bare_field(outer_key)?;
        let inner = self.bare_field(inner_key)?;
        let on = if outer == inner {
            outer
        } else {
            format!("{} == {}", outer, inner)
        };

        ir.push(Command::LookupJoin { index, on });
        Ok(())
    }

    fn translate_completion(
        &self,
        ir: &mut QueryIr,
        prompt: &Expr,
        inference_id: &str,
        output: Option<&str>,
    ) -> Result<(), TranslateError> {
        if inference_id.trim().is_empty() {
            return Err(TranslateError::InvalidPipeline(
                "COMPLETION requires an inference endpoint id".to_string(),
            ));
        }

        let prompt = match prompt.unwrap_convert() {
            Expr::Field(_) => self.bare_field(prompt)?,
            Expr::Constant(Value::String(text)) => format::quote(text),
            Expr::Captured(captured) => match &captured.value {
                Value::String(text) => format::quote(text),
                other => {
                    return Err(TranslateError::unsupported(format!(
                        "completion prompt value {:?}",
                        other
                    )))
                }
            },
            other => {
                return Err(TranslateError::unsupported(format!(
                    "completion prompt {:?}",
                    other
                )))
            }
        };

        ir.push(Command::Completion {
            prompt,
            inference_id: inference_id.to_string(),
            output: output.map(str::to_string),
        });
        Ok(())
    }
}

/// Element type named by a typed output shape.
fn shape_type(expr: &Expr) -> Option<String> {
    match expr.unwrap_convert() {
        Expr::NewShape(shape) => match &shape.kind {
            ShapeKind::Typed(name) => Some(name.clone()),
            ShapeKind::Anonymous => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldInfo, StaticFieldMetadata};
    use esql_ir::{Cardinality, Member, ParameterMode, RowAssignment, SortDirection, Terminal, ValueType};

    fn metadata() -> StaticFieldMetadata {
        StaticFieldMetadata::new()
            .with_field("Log", "Level", FieldInfo::keyword("level"))
            .with_field("Log", "Status", FieldInfo::keyword("http.status"))
            .with_field("Log", "Host", FieldInfo::keyword("host.name"))
            .with_field("Log", "Message", FieldInfo::text("message"))
            .with_field("Hosts", "Name", FieldInfo::keyword("host.name"))
    }

    fn logs() -> Source {
        Source::From {
            pattern: "logs-*".to_string(),
            metadata: vec![],
            document_type: Some("Log".to_string()),
        }
    }

    fn status() -> Expr {
        Member::new("Log", "Status", ValueType::Long).into()
    }

    #[test]
    fn test_filter_sort_limit() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);

        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::Where {
            predicate: status().ge(500),
        });
        pipeline.ops.push(Operation::OrderBy {
            key: status(),
            direction: SortDirection::Descending,
            nulls: None,
            then: false,
        });
        pipeline.ops.push(Operation::Take {
            count: Expr::constant(5),
        });

        let compiled = compiler.compile(&pipeline).unwrap();
        assert_eq!(
            compiled.text,
            "FROM logs-*\n| WHERE http.status >= 500\n| SORT http.status DESC\n| LIMIT 5"
        );
        assert_eq!(compiled.result_type.as_deref(), Some("Log"));
    }

    #[test]
    fn test_row_source_with_parameters() {
        let metadata = metadata();
        let compiler = Compiler::with_options(&metadata, CompileOptions::parameterized());

        let pipeline = Pipeline::new(Source::Row {
            assignments: vec![
                RowAssignment {
                    name: "a".to_string(),
                    value: Expr::constant(1),
                },
                RowAssignment {
                    name: "b".to_string(),
                    value: Expr::captured("name", "x"),
                },
            ],
            document_type: None,
        });

        let compiled = compiler.compile(&pipeline).unwrap();
        assert_eq!(compiled.text, "ROW a = 1, b = ?name");
        assert_eq!(compiled.params_json(), vec![serde_json::json!({"name": "x"})]);
    }

    #[test]
    fn test_lookup_join_requires_bare_source() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);
        let host: Expr = Member::new("Log", "Host", ValueType::Keyword).into();
        let inner: Expr = Member::new("Hosts", "Name", ValueType::Keyword).into();

        let lookup = Pipeline::new(Source::From {
            pattern: "hosts".to_string(),
            metadata: vec![],
            document_type: Some("Hosts".to_string()),
        });
        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::LookupJoin {
            lookup: Box::new(lookup.clone()),
            outer_key: host.clone(),
            inner_key: inner.clone(),
        });
        assert_eq!(
            compiler.compile(&pipeline).unwrap().text,
            "FROM logs-*\n| LOOKUP JOIN hosts ON host.name"
        );

        let mut filtered = lookup;
        filtered.ops.push(Operation::Take {
            count: Expr::constant(1),
        });
        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::LookupJoin {
            lookup: Box::new(filtered),
            outer_key: host,
            inner_key: inner,
        });
        assert!(matches!(
            compiler.compile(&pipeline).unwrap_err(),
            TranslateError::Unsupported(_)
        ));
    }

    #[test]
    fn test_completion_and_terminal() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);
        let message: Expr = Member::new("Log", "Message", ValueType::Text).into();

        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::Completion {
            prompt: message,
            inference_id: "my-llm".to_string(),
            output: Some("summary".to_string()),
        });
        pipeline.ops.push(Operation::Terminal {
            kind: Terminal::Single,
        });

        let compiled = compiler.compile(&pipeline).unwrap();
        assert_eq!(
            compiled.text,
            "FROM logs-*\n| COMPLETION summary = message WITH { \"inference_id\": \"my-llm\" }\n| LIMIT 2"
        );
        assert_eq!(compiled.cardinality, Cardinality::Single);
    }

    #[test]
    fn test_operations_after_terminal_rejected() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);

        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::Terminal {
            kind: Terminal::Count,
        });
        pipeline.ops.push(Operation::Take {
            count: Expr::constant(1),
        });

        assert!(matches!(
            compiler.translate(&pipeline).unwrap_err(),
            TranslateError::InvalidPipeline(_)
        ));
    }

    #[test]
    fn test_unknown_member_propagates() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);
        let unknown: Expr = Member::new("Log", "Missing", ValueType::Keyword).into();

        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::Where {
            predicate: unknown.equals("x"),
        });

        assert!(matches!(
            compiler.compile(&pipeline).unwrap_err(),
            TranslateError::Resolve(_)
        ));
    }

    #[test]
    fn test_inline_mode_has_no_parameters() {
        let metadata = metadata();
        let compiler = Compiler::new(&metadata);
        assert_eq!(compiler.options().mode, ParameterMode::Inline);

        let mut pipeline = Pipeline::new(logs());
        pipeline.ops.push(Operation::Where {
            predicate: status().gt(Expr::captured("threshold", 500)),
        });

        let compiled = compiler.compile(&pipeline).unwrap();
        assert_eq!(compiled.text, "FROM logs-*\n| WHERE http.status > 500");
        assert!(compiled.params.is_empty());
    }
}

//! SELECT translation into RENAME, EVAL and KEEP
//!
//! Two passes. The classify pass decides per output member whether it is a
//! kept field, a renamed field, or a computed value. The resolve pass
//! renders computed values against the post-rename field names, since
//! `RENAME` runs before `EVAL` in the assembled pipeline.

use std::collections::{HashMap, HashSet};

use esql_ir::{Assignment, BinaryOp, Command, Expr, FieldRef, QueryIr, RenamePair, Shape, ShapeKind};

use crate::error::TranslateError;
use crate::expression::{resolve_field, ExprTranslator};
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;

/// Classification of one output member.
#[derive(Debug)]
enum Slot<'e> {
    Field(&'e FieldRef),
    Computed(&'e Expr),
    /// Computed value behind a null guard that cannot be collapsed
    Guarded(&'e Expr),
}

#[derive(Debug)]
enum Output<'e> {
    Keep,
    Rename { source: String },
    Eval(&'e Expr),
    /// Field copied under a new name where a rename would clobber another use
    Copy(&'e FieldRef),
    Guarded(&'e Expr),
}

pub(crate) fn translate_select(
    ir: &mut QueryIr,
    metadata: &dyn FieldMetadata,
    options: &CompileOptions,
    projection: &Expr,
) -> Result<(), TranslateError> {
    let shape = match projection.unwrap_convert() {
        Expr::NewShape(shape) => shape,
        Expr::Field(field) if field.is_simple() => {
            let name = resolve_field(metadata, field)?;
            ir.push(Command::Keep { fields: vec![name] });
            return Ok(());
        }
        other => {
            return Err(TranslateError::unsupported(format!(
                "projection of {:?}",
                other
            )))
        }
    };

    let names = output_names(metadata, options, shape)?;

    // Classify pass
    let mut slots = Vec::with_capacity(shape.members.len());
    for member in &shape.members {
        slots.push(classify(&member.value)?);
    }

    let mut resolved = Vec::with_capacity(slots.len());
    let mut referenced = HashSet::new();
    for slot in &slots {
        match slot {
            Slot::Field(field) => {
                let name = resolve_field(metadata, field)?;
                referenced.insert(name.clone());
                resolved.push(Some(name));
            }
            Slot::Computed(expr) | Slot::Guarded(expr) => {
                for field in fields_in(expr) {
                    referenced.insert(resolve_field(metadata, field)?);
                }
                resolved.push(None);
            }
        }
    }

    let kept: HashSet<&str> = names
        .iter()
        .zip(&resolved)
        .filter_map(|(out, source)| match source {
            Some(source) if source == out => Some(source.as_str()),
            _ => None,
        })
        .collect();

    let mut renames: HashMap<String, String> = HashMap::new();
    let mut outputs = Vec::with_capacity(slots.len());
    for ((slot, name), source) in slots.iter().zip(&names).zip(&resolved) {
        let output = match (slot, source) {
            (Slot::Field(_), Some(source)) if source == name => Output::Keep,
            (Slot::Field(field), Some(source)) => {
                let conflict = kept.contains(source.as_str())
                    || renames.contains_key(source)
                    || referenced.contains(name);
                if conflict {
                    Output::Copy(*field)
                } else {
                    renames.insert(source.clone(), name.clone());
                    Output::Rename {
                        source: source.clone(),
                    }
                }
            }
            (Slot::Field(field), None) => Output::Copy(*field),
            (Slot::Computed(expr), _) => Output::Eval(*expr),
            (Slot::Guarded(expr), _) => Output::Guarded(*expr),
        };
        outputs.push(output);
    }

    // Resolve pass
    let mut pairs = Vec::new();
    let mut assignments = Vec::new();
    {
        let mut translator =
            ExprTranslator::new(metadata, options, &mut ir.params).with_renames(&renames);

        for (output, name) in outputs.iter().zip(&names) {
            match output {
                Output::Keep => {}
                Output::Rename { source } => pairs.push(RenamePair {
                    source: source.clone(),
                    target: name.clone(),
                }),
                Output::Eval(expr) => {
                    let rendered = translator.translate(expr)?;
                    let reads = read_names(&translator, expr)?;
                    assignments.push(Pending::new(name, rendered, reads));
                }
                Output::Copy(field) => {
                    let rendered = translator.field_name(field)?;
                    assignments.push(Pending::new(name, rendered.clone(), vec![rendered]));
                }
                Output::Guarded(expr) => {
                    let checks = read_names(&translator, expr)?;
                    let rendered = translator.translate(expr)?;
                    let value = if checks.is_empty() {
                        rendered
                    } else {
                        let guard = checks
                            .iter()
                            .map(|c| format!("{} IS NOT NULL", c))
                            .collect::<Vec<_>>()
                            .join(" AND ");
                        format!("CASE WHEN {} THEN {} ELSE NULL END", guard, rendered)
                    };
                    assignments.push(Pending::new(name, value, checks));
                }
            }
        }
    }

    if !pairs.is_empty() {
        ir.push(Command::Rename { pairs });
    }
    if !assignments.is_empty() {
        let (assignments, deferred) = order_assignments(assignments);
        ir.push(Command::Eval { assignments });
        if !deferred.is_empty() {
            ir.push(Command::Rename { pairs: deferred });
        }
    }
    ir.push(Command::Keep { fields: names });
    Ok(())
}

/// One EVAL assignment with the column names its expression reads.
#[derive(Debug)]
struct Pending {
    assignment: Assignment,
    reads: Vec<String>,
}

impl Pending {
    fn new(name: &str, expression: String, reads: Vec<String>) -> Self {
        Self {
            assignment: Assignment::new(name, expression),
            reads,
        }
    }
}

/// Column names read by `expr`, after renames, deduplicated in visit order.
fn read_names(translator: &ExprTranslator<'_>, expr: &Expr) -> Result<Vec<String>, TranslateError> {
    let mut names: Vec<String> = Vec::new();
    for field in fields_in(expr) {
        let name = translator.field_name(field)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// EVAL assigns left to right, so an assignment must not overwrite a column
/// that another pending assignment still reads. Assignments are emitted in
/// member order whenever that holds; a cycle is broken by computing one
/// target under a temporary name that is renamed once the EVAL is done.
fn order_assignments(mut pending: Vec<Pending>) -> (Vec<Assignment>, Vec<RenamePair>) {
    let mut ordered = Vec::with_capacity(pending.len());
    let mut deferred = Vec::new();

    while !pending.is_empty() {
        let ready = (0..pending.len()).find(|&i| {
            let target = &pending[i].assignment.name;
            pending
                .iter()
                .enumerate()
                .all(|(j, other)| j == i || !other.reads.contains(target))
        });
        match ready {
            Some(i) => ordered.push(pending.remove(i).assignment),
            None => {
                let mut assignment = pending.remove(0).assignment;
                let temporary = format!("__{}", assignment.name);
                let target = std::mem::replace(&mut assignment.name, temporary.clone());
                deferred.push(RenamePair {
                    source: temporary,
                    target,
                });
                ordered.push(assignment);
            }
        }
    }
    (ordered, deferred)
}

/// Output column names for each member of a shape.
pub(crate) fn output_names(
    metadata: &dyn FieldMetadata,
    options: &CompileOptions,
    shape: &Shape,
) -> Result<Vec<String>, TranslateError> {
    shape
        .members
        .iter()
        .map(|m| match &shape.kind {
            ShapeKind::Anonymous => Ok(options.naming.apply(&m.name)),
            ShapeKind::Typed(type_name) => Ok(metadata.resolve(type_name, &m.name)?),
        })
        .collect()
}

fn classify(expr: &Expr) -> Result<Slot<'_>, TranslateError> {
    let expr = expr.unwrap_convert();
    match expr {
        Expr::Field(field) if field.is_simple() => Ok(Slot::Field(field)),
        Expr::Conditional { .. } => match null_guarded_branch(expr) {
            Some(branch) => match classify(branch)? {
                Slot::Field(field) => Ok(Slot::Field(field)),
                Slot::Guarded(inner) => Ok(Slot::Guarded(inner)),
                Slot::Computed(_) => Ok(Slot::Guarded(branch)),
            },
            None => Ok(Slot::Computed(expr)),
        },
        Expr::NewShape(_) => Err(TranslateError::unsupported(
            "nested object construction in a projection",
        )),
        Expr::Collection(_) => Err(TranslateError::unsupported("collection in a projection")),
        Expr::GroupKey(_) => Err(TranslateError::unsupported(
            "group key outside an aggregation result",
        )),
        _ => Ok(Slot::Computed(expr)),
    }
}

/// Non-null branch of `r == null ? null : e` or `r != null ? e : null`.
fn null_guarded_branch(expr: &Expr) -> Option<&Expr> {
    let Expr::Conditional {
        test,
        if_true,
        if_false,
    } = expr
    else {
        return None;
    };
    let Expr::Binary { op, left, right } = test.unwrap_convert() else {
        return None;
    };

    let guards_field = (left.is_null_literal() && right.as_field().is_some())
        || (right.is_null_literal() && left.as_field().is_some());
    if !guards_field {
        return None;
    }

    match op {
        BinaryOp::Eq if if_true.is_null_literal() => Some(if_false.as_ref()),
        BinaryOp::Ne if if_false.is_null_literal() => Some(if_true.as_ref()),
        _ => None,
    }
}

/// Every field access inside an expression, in visit order.
fn fields_in(expr: &Expr) -> Vec<&FieldRef> {
    fn walk<'e>(expr: &'e Expr, out: &mut Vec<&'e FieldRef>) {
        match expr {
            Expr::Field(field) => out.push(field),
            Expr::Unary { operand, .. } => walk(operand, out),
            Expr::Binary { left, right, .. } => {
                walk(left, out);
                walk(right, out);
            }
            Expr::Call(call) => call.args.iter().for_each(|a| walk(a, out)),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                walk(test, out);
                walk(if_true, out);
                walk(if_false, out);
            }
            Expr::Collection(items) => items.iter().for_each(|i| walk(i, out)),
            Expr::NewShape(shape) => shape.members.iter().for_each(|m| walk(&m.value, out)),
            Expr::Constant(_) | Expr::Captured(_) | Expr::GroupKey(_) => {}
        }
    }

    let mut out = Vec::new();
    walk(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldInfo, StaticFieldMetadata};
    use esql_ir::{Member, ParameterMode, ValueType};

    fn metadata() -> StaticFieldMetadata {
        StaticFieldMetadata::new()
            .with_field("Log", "Level", FieldInfo::keyword("log.level"))
            .with_field("Log", "Message", FieldInfo::text("message"))
            .with_field("Log", "Host", FieldInfo::keyword("host"))
            .with_field("Host", "Name", FieldInfo::keyword("name"))
            .with_field("Host", "Ip", FieldInfo::keyword("ip"))
            .with_field("Summary", "Level", FieldInfo::keyword("severity"))
            .with_field("Log", "Status", FieldInfo::keyword("status"))
            .with_field("Log", "Code", FieldInfo::keyword("code"))
    }

    fn status() -> Expr {
        Member::new("Log", "Status", ValueType::Long).into()
    }

    fn code() -> Expr {
        Member::new("Log", "Code", ValueType::Long).into()
    }

    fn level() -> Expr {
        Member::new("Log", "Level", ValueType::Keyword).into()
    }

    fn message() -> Expr {
        Member::new("Log", "Message", ValueType::Text).into()
    }

    fn host() -> Member {
        Member::new("Log", "Host", ValueType::Object("Host".to_string()))
    }

    fn host_name() -> Expr {
        host()
            .then(Member::new("Host", "Name", ValueType::Keyword))
            .into()
    }

    fn host_ip() -> Expr {
        host().then(Member::new("Host", "Ip", ValueType::Ip)).into()
    }

    fn render(projection: Expr) -> Vec<String> {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);
        translate_select(&mut ir, &metadata, &options, &projection).unwrap();
        ir.commands.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_rename_runs_before_eval() {
        let shape = Shape::anonymous()
            .member("Level", level())
            .member("Combined", Expr::call("concat", vec![level(), message()]));

        assert_eq!(
            render(shape.into()),
            [
                "RENAME log.level AS level",
                "EVAL combined = CONCAT(level, message)",
                "KEEP level, combined",
            ]
        );
    }

    #[test]
    fn test_same_name_is_kept() {
        let shape = Shape::anonymous().member("Message", message());
        assert_eq!(render(shape.into()), ["KEEP message"]);
    }

    #[test]
    fn test_null_guard_collapses_to_field() {
        let host_ref: Expr = host().into();
        let guarded = Expr::conditional(host_ref.equals(Expr::null()), Expr::null(), host_name());
        let direct = Shape::anonymous().member("HostName", host_name());

        let collapsed = render(Shape::anonymous().member("HostName", guarded).into());
        assert_eq!(collapsed, render(direct.into()));
        assert_eq!(collapsed, ["RENAME host.name AS hostName", "KEEP hostName"]);
    }

    #[test]
    fn test_computed_null_guard_renders_case_when() {
        let host_ref: Expr = host().into();
        let label = host_name() + "@" + host_ip();
        let guarded = Expr::conditional(host_ref.not_equals(Expr::null()), label, Expr::null());

        assert_eq!(
            render(Shape::anonymous().member("Label", guarded).into()),
            [
                r#"EVAL label = CASE WHEN host.name IS NOT NULL AND host.ip IS NOT NULL THEN CONCAT(host.name, "@", host.ip) ELSE NULL END"#,
                "KEEP label",
            ]
        );
    }

    #[test]
    fn test_typed_shape_resolves_target_names() {
        let shape = Shape::typed("Summary").member("Level", level());
        assert_eq!(
            render(shape.into()),
            ["RENAME log.level AS severity", "KEEP severity"]
        );
    }

    #[test]
    fn test_conflicting_renames_become_evals() {
        // the same source projected twice
        let shape = Shape::anonymous()
            .member("First", level())
            .member("Second", level());
        assert_eq!(
            render(shape.into()),
            [
                "RENAME log.level AS first",
                "EVAL second = first",
                "KEEP first, second",
            ]
        );
    }

    #[test]
    fn test_eval_does_not_overwrite_a_column_still_read() {
        let shape = Shape::anonymous()
            .member("Status", status() + 1)
            .member("Double", status() * 2);
        assert_eq!(
            render(shape.into()),
            [
                "EVAL double = status * 2, status = status + 1",
                "KEEP status, double",
            ]
        );
    }

    #[test]
    fn test_eval_cycle_uses_temporary_column() {
        let shape = Shape::anonymous()
            .member("Status", code() + 1)
            .member("Code", status() + 1);
        assert_eq!(
            render(shape.into()),
            [
                "EVAL __status = code + 1, code = status + 1",
                "RENAME __status AS status",
                "KEEP status, code",
            ]
        );
    }

    #[test]
    fn test_bare_field_projection_keeps() {
        assert_eq!(render(message()), ["KEEP message"]);
    }

    #[test]
    fn test_nested_shape_unsupported() {
        let metadata = metadata();
        let options = CompileOptions::default();
        let mut ir = QueryIr::new(ParameterMode::Inline);
        let nested = Shape::anonymous().member("Inner", Shape::anonymous().member("A", level()));

        let err = translate_select(&mut ir, &metadata, &options, &nested.into()).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported(_)));
    }
}

//! Shared expression grammar
//!
//! Every translator renders scalar sub-expressions through [`ExprTranslator`]
//! so field resolution, the exact-match suffix, parameter collection and
//! function dispatch behave the same in WHERE, EVAL, STATS and SORT.

use std::collections::HashMap;

use esql_ir::{
    Accessor, BinaryOp, Call, Captured, EnumType, Expr, FieldRef, ParameterMode, ParameterTable,
    UnaryOp, Value,
};
use esql_registry::{FunctionRegistry, LikeKind, Template};
use tracing::debug;

use crate::error::{ResolveError, TranslateError};
use crate::format;
use crate::metadata::FieldMetadata;
use crate::options::CompileOptions;

pub(crate) struct ExprTranslator<'a> {
    metadata: &'a dyn FieldMetadata,
    options: &'a CompileOptions,
    params: &'a mut ParameterTable,
    /// Rename sources mapped to their targets
    renames: Option<&'a HashMap<String, String>>,
    /// Field operands need the exact-match sub-field
    exact: bool,
    /// Inside a null check or full-text search call
    suppress_suffix: bool,
}

impl<'a> ExprTranslator<'a> {
    pub fn new(
        metadata: &'a dyn FieldMetadata,
        options: &'a CompileOptions,
        params: &'a mut ParameterTable,
    ) -> Self {
        Self {
            metadata,
            options,
            params,
            renames: None,
            exact: false,
            suppress_suffix: false,
        }
    }

    pub fn with_renames(mut self, renames: &'a HashMap<String, String>) -> Self {
        self.renames = Some(renames);
        self
    }

    fn scoped<T>(
        &mut self,
        exact: bool,
        suppress_suffix: bool,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved = (self.exact, self.suppress_suffix);
        self.exact = exact;
        self.suppress_suffix = suppress_suffix;
        let out = f(self);
        (self.exact, self.suppress_suffix) = saved;
        out
    }

    /// Translate with full-text field operands routed to the exact-match sub-field.
    pub fn translate_exact(&mut self, expr: &Expr) -> Result<String, TranslateError> {
        let suppress = self.suppress_suffix;
        self.scoped(true, suppress, |t| t.translate(expr))
    }

    pub fn translate(&mut self, expr: &Expr) -> Result<String, TranslateError> {
        match expr {
            Expr::Field(field) => self.field(field),
            Expr::Constant(value) => format::literal(value),
            Expr::Captured(captured) => self.captured(captured),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Convert(_) => self.translate(operand),
                UnaryOp::Negate => {
                    let inner = self.translate(operand)?;
                    if matches!(operand.unwrap_convert(), Expr::Binary { .. }) {
                        Ok(format!("-({})", inner))
                    } else {
                        Ok(format!("-{}", inner))
                    }
                }
                UnaryOp::Not => self.negation(operand),
            },
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Call(call) => self.call(call, false),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let test = self.scoped(false, false, |t| t.translate(test))?;
                let if_true = self.translate(if_true)?;
                let if_false = self.translate(if_false)?;
                Ok(format!("CASE({}, {}, {})", test, if_true, if_false))
            }
            Expr::Collection(_) => Err(TranslateError::unsupported(
                "collection outside a membership test",
            )),
            Expr::NewShape(_) => Err(TranslateError::unsupported(
                "object construction inside a scalar expression",
            )),
            Expr::GroupKey(_) => Err(TranslateError::unsupported(
                "group key outside an aggregation result",
            )),
        }
    }

    /// Dotted stored name of a field, with projection renames applied.
    pub fn field_name(&self, field: &FieldRef) -> Result<String, TranslateError> {
        let name = resolve_field(self.metadata, field)?;
        if let Some(target) = self.renames.and_then(|r| r.get(&name)) {
            return Ok(target.clone());
        }
        Ok(name)
    }

    fn is_full_text(&self, field: &FieldRef) -> bool {
        field
            .leaf()
            .map(|m| self.metadata.is_full_text(&m.declaring_type, &m.name))
            .unwrap_or(false)
    }

    fn field(&mut self, field: &FieldRef) -> Result<String, TranslateError> {
        let base = self.field_name(field)?;
        match field.accessor {
            Some(Accessor::DatePart(part)) => {
                Ok(format!("DATE_EXTRACT(\"{}\", {})", part.extract_name(), base))
            }
            Some(Accessor::Length) => Ok(format!("LENGTH({})", base)),
            None if self.exact && !self.suppress_suffix && self.is_full_text(field) => {
                Ok(format!("{}{}", base, self.options.keyword_suffix))
            }
            None => Ok(base),
        }
    }

    fn captured(&mut self, captured: &Captured) -> Result<String, TranslateError> {
        self.value(Some(captured.name()), &captured.value)
    }

    /// Literal, or a `?name` placeholder when parameterizing a captured value.
    fn value(&mut self, name: Option<&str>, value: &Value) -> Result<String, TranslateError> {
        let parameterizable = !matches!(value, Value::Null | Value::Duration(_) | Value::List(_));
        match (self.options.mode, name) {
            (ParameterMode::Parameterized, Some(name)) if parameterizable => {
                let slot = self.params.register(name, value);
                Ok(format!("?{}", slot))
            }
            _ => format::literal(value),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<String, TranslateError> {
        if op.is_logical() {
            let mut operands = Vec::new();
            flatten(op, left, &mut operands);
            flatten(op, right, &mut operands);
            let parts = operands
                .into_iter()
                .map(|e| self.scoped(false, false, |t| t.translate(e)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(format!("({})", parts.join(&format!(" {} ", op.symbol()))));
        }

        if op.is_comparison() {
            if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
                if right.is_null_literal() {
                    return self.null_check(left, op == BinaryOp::Eq);
                }
                if left.is_null_literal() {
                    return self.null_check(right, op == BinaryOp::Eq);
                }
            }
            if let Some(rendered) = self.enum_comparison(op, left, right)? {
                return Ok(rendered);
            }
            let l = self.operand(left, op, false, true)?;
            let r = self.operand(right, op, true, true)?;
            return Ok(format!("{} {} {}", l, op.symbol(), r));
        }

        if op == BinaryOp::Add && (left.static_type().is_string() || right.static_type().is_string())
        {
            let mut parts = Vec::new();
            collect_concat(left, &mut parts);
            collect_concat(right, &mut parts);
            let suppress = self.suppress_suffix;
            let args = parts
                .into_iter()
                .map(|e| self.scoped(false, suppress, |t| t.translate(e)))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(format!("CONCAT({})", args.join(", ")));
        }

        let l = self.operand(left, op, false, false)?;
        let r = self.operand(right, op, true, false)?;
        Ok(format!("{} {} {}", l, op.symbol(), r))
    }

    /// Operand of a non-logical operator, parenthesized when it binds looser.
    fn operand(
        &mut self,
        expr: &Expr,
        parent: BinaryOp,
        is_right: bool,
        exact: bool,
    ) -> Result<String, TranslateError> {
        let rendered = if exact {
            self.translate_exact(expr)?
        } else {
            let suppress = self.suppress_suffix;
            self.scoped(false, suppress, |t| t.translate(expr))?
        };

        if let Expr::Binary { op: child, .. } = expr.unwrap_convert() {
            let looser = child.precedence() < parent.precedence()
                || (child.precedence() == parent.precedence()
                    && (is_right || parent.is_comparison()));
            if !child.is_logical() && looser {
                return Ok(format!("({})", rendered));
            }
        }
        Ok(rendered)
    }

    fn null_check(&mut self, operand: &Expr, is_null: bool) -> Result<String, TranslateError> {
        let inner = self.scoped(false, true, |t| t.translate(operand))?;
        let inner = match operand.unwrap_convert() {
            Expr::Binary { op, .. } if !op.is_logical() => format!("({})", inner),
            _ => inner,
        };
        if is_null {
            Ok(format!("{} IS NULL", inner))
        } else {
            Ok(format!("{} IS NOT NULL", inner))
        }
    }

    /// Comparison between an enum field and a value renders the variant name.
    fn enum_comparison(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Option<String>, TranslateError> {
        let left_enum = enum_type_of(left);
        let right_enum = enum_type_of(right);

        let rendered = match (left_enum, right_enum) {
            (Some(et), None) if is_value(right) => {
                let field = self.translate_exact(left)?;
                let value = self.enum_value(&et, right)?;
                format!("{} {} {}", field, op.symbol(), value)
            }
            (None, Some(et)) if is_value(left) => {
                let value = self.enum_value(&et, left)?;
                let field = self.translate_exact(right)?;
                format!("{} {} {}", value, op.symbol(), field)
            }
            _ => return Ok(None),
        };
        Ok(Some(rendered))
    }

    fn enum_value(&mut self, enum_type: &EnumType, expr: &Expr) -> Result<String, TranslateError> {
        match expr.unwrap_convert() {
            Expr::Constant(v) => format::literal(&enum_name(enum_type, v)?),
            Expr::Captured(c) => {
                let named = enum_name(enum_type, &c.value)?;
                self.value(Some(c.name()), &named)
            }
            other => Err(TranslateError::unsupported(format!(
                "enum comparison against {:?}",
                other
            ))),
        }
    }

    fn negation(&mut self, operand: &Expr) -> Result<String, TranslateError> {
        match operand.unwrap_convert() {
            Expr::Call(call) => self.call(call, true),
            Expr::Unary {
                op: UnaryOp::Not,
                operand: inner,
            } => self.translate(inner),
            Expr::Binary { op, left, right }
                if matches!(op, BinaryOp::Eq | BinaryOp::Ne)
                    && (left.is_null_literal() || right.is_null_literal()) =>
            {
                let target = if right.is_null_literal() { left } else { right };
                self.null_check(target, *op == BinaryOp::Ne)
            }
            inner => {
                let rendered = self.translate(inner)?;
                match inner {
                    Expr::Binary { op, .. } if !op.is_logical() => {
                        Ok(format!("NOT ({})", rendered))
                    }
                    _ => Ok(format!("NOT {}", rendered)),
                }
            }
        }
    }

    fn call(&mut self, call: &Call, negated: bool) -> Result<String, TranslateError> {
        let def = FunctionRegistry::global().resolve(&call.function, call.args.len())?;
        let args = &call.args;

        match def.template {
            Template::NullCheck(is_null) => self.null_check(&args[0], is_null != negated),
            Template::Membership => self.membership(&args[0], &args[1], negated),
            Template::Like(LikeKind::Contains) if is_list(&args[0]) => {
                self.membership(&args[1], &args[0], negated)
            }
            Template::Like(kind) => self.like(kind, &args[0], &args[1], negated),
            Template::Interval(unit) => {
                let n = constant_int(&args[0]).ok_or_else(|| {
                    TranslateError::unsupported(format!(
                        "{} requires a literal count",
                        def.name
                    ))
                })?;
                Ok(format::interval(n, unit))
            }
            Template::Call(_) | Template::Format(_) | Template::Aggregate(_) => {
                let bare = def.bare_fields;
                let rendered_args = args
                    .iter()
                    .map(|a| self.scoped(false, bare, |t| t.translate(a)))
                    .collect::<Result<Vec<_>, _>>()?;
                let rendered = def.render(&rendered_args).ok_or_else(|| {
                    TranslateError::unsupported(format!("function {}", def.name))
                })?;
                if negated {
                    Ok(format!("NOT {}", rendered))
                } else {
                    Ok(rendered)
                }
            }
        }
    }

    fn membership(
        &mut self,
        value: &Expr,
        collection: &Expr,
        negated: bool,
    ) -> Result<String, TranslateError> {
        let enum_type = enum_type_of(value);
        let lhs = self.translate_exact(value)?;

        let items = match collection.unwrap_convert() {
            Expr::Collection(items) => items
                .iter()
                .map(|item| match item.unwrap_convert() {
                    Expr::Constant(v) => item_literal(enum_type.as_ref(), v),
                    Expr::Captured(c) => item_literal(enum_type.as_ref(), &c.value),
                    other => self.translate(other),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Expr::Constant(Value::List(values)) => values
                .iter()
                .map(|v| item_literal(enum_type.as_ref(), v))
                .collect::<Result<Vec<_>, _>>()?,
            Expr::Captured(Captured {
                value: Value::List(values),
                path,
            }) => {
                if self.options.mode == ParameterMode::Parameterized {
                    debug!(list = ?path, items = values.len(), "Inlining membership list");
                }
                values
                    .iter()
                    .map(|v| item_literal(enum_type.as_ref(), v))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => {
                return Err(TranslateError::unsupported(format!(
                    "membership test over {:?}",
                    other
                )))
            }
        };

        if items.is_empty() {
            return Ok(if negated { "true" } else { "false" }.to_string());
        }
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} ({})", lhs, keyword, items.join(", ")))
    }

    fn like(
        &mut self,
        kind: LikeKind,
        target: &Expr,
        pattern: &Expr,
        negated: bool,
    ) -> Result<String, TranslateError> {
        let text = match pattern.unwrap_convert() {
            Expr::Constant(Value::String(s)) => s,
            Expr::Captured(Captured {
                value: Value::String(s),
                ..
            }) => s,
            other => {
                return Err(TranslateError::unsupported(format!(
                    "pattern match against non-literal {:?}",
                    other
                )))
            }
        };
        let lhs = self.translate_exact(target)?;
        let keyword = if negated { "NOT LIKE" } else { "LIKE" };
        Ok(format!("{} {} {}", lhs, keyword, format::like_pattern(kind, text)))
    }
}

/// Dotted stored name of a field path, ignoring any pseudo-property.
pub(crate) fn resolve_field(
    metadata: &dyn FieldMetadata,
    field: &FieldRef,
) -> Result<String, TranslateError> {
    if field.path.is_empty() {
        return Err(ResolveError::EmptyPath.into());
    }
    let parts = field
        .path
        .iter()
        .map(|m| metadata.resolve(&m.declaring_type, &m.name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("."))
}

fn flatten<'e>(op: BinaryOp, expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr.unwrap_convert() {
        Expr::Binary {
            op: inner,
            left,
            right,
        } if *inner == op => {
            flatten(op, left, out);
            flatten(op, right, out);
        }
        other => out.push(other),
    }
}

fn collect_concat<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr.unwrap_convert() {
        Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } if expr.static_type().is_string() => {
            collect_concat(left, out);
            collect_concat(right, out);
        }
        other => out.push(other),
    }
}

fn enum_type_of(expr: &Expr) -> Option<EnumType> {
    expr.as_field()
        .filter(|f| f.accessor.is_none())
        .and_then(|f| f.value_type().as_enum().cloned())
}

fn is_value(expr: &Expr) -> bool {
    matches!(
        expr.unwrap_convert(),
        Expr::Constant(_) | Expr::Captured(_)
    )
}

fn is_list(expr: &Expr) -> bool {
    match expr.unwrap_convert() {
        Expr::Collection(_) => true,
        Expr::Constant(v) => matches!(v, Value::List(_)),
        Expr::Captured(c) => matches!(c.value, Value::List(_)),
        _ => false,
    }
}

/// Symbolic name of an enum value given as ordinal, variant, or name.
fn enum_name(enum_type: &EnumType, value: &Value) -> Result<Value, TranslateError> {
    match value {
        Value::Int(ordinal) => enum_type
            .variant(*ordinal)
            .map(Value::from)
            .ok_or_else(|| {
                TranslateError::unsupported(format!(
                    "{} is not an ordinal of {}",
                    ordinal, enum_type.name
                ))
            }),
        Value::Enum(e) => Ok(Value::String(e.name.clone())),
        Value::String(_) | Value::Null => Ok(value.clone()),
        other => Err(TranslateError::unsupported(format!(
            "{:?} compared with enum {}",
            other, enum_type.name
        ))),
    }
}

fn item_literal(enum_type: Option<&EnumType>, value: &Value) -> Result<String, TranslateError> {
    match enum_type {
        Some(et) => format::literal(&enum_name(et, value)?),
        None => format::literal(value),
    }
}

/// Integer from a literal or captured value.
pub(crate) fn constant_int(expr: &Expr) -> Option<i64> {
    match expr.unwrap_convert() {
        Expr::Constant(v) => v.as_i64(),
        Expr::Captured(c) => c.value.as_i64(),
        _ => None,
    }
}

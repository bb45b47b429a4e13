//! Operation AST
//!
//! Every argument handed to a query operation (a predicate, a projection,
//! a grouping key, an ordering key) is captured as an [`Expr`] tree. The
//! tree is never evaluated; translators only read its shape.

use serde::{Deserialize, Serialize};
use std::ops;

use crate::types::{Value, ValueType};

/// A member of a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub declaring_type: String,
    pub name: String,
    pub value_type: ValueType,
}

impl Member {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            value_type,
        }
    }

    /// Access `child` through this member (`parent.child`).
    pub fn then(self, child: Member) -> FieldRef {
        FieldRef::new(self).then(child)
    }
}

/// Pseudo-properties computed from a field rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accessor {
    DatePart(DatePart),
    /// Character length of a string field
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DayOfWeek,
    DayOfYear,
}

impl DatePart {
    /// Name of the field understood by `DATE_EXTRACT`.
    pub fn extract_name(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Month => "month_of_year",
            DatePart::Day => "day_of_month",
            DatePart::Hour => "hour_of_day",
            DatePart::Minute => "minute_of_hour",
            DatePart::Second => "second_of_minute",
            DatePart::DayOfWeek => "day_of_week",
            DatePart::DayOfYear => "day_of_year",
        }
    }
}

/// Reference to a (possibly nested) document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub path: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<Accessor>,
}

impl FieldRef {
    pub fn new(member: Member) -> Self {
        Self {
            path: vec![member],
            accessor: None,
        }
    }

    pub fn then(mut self, child: Member) -> Self {
        self.path.push(child);
        self
    }

    pub fn leaf(&self) -> Option<&Member> {
        self.path.last()
    }

    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = Some(accessor);
        self
    }

    /// `field.Year`, `field.Hour`, ...
    pub fn date_part(self, part: DatePart) -> Expr {
        Expr::Field(self.with_accessor(Accessor::DatePart(part)))
    }

    /// `field.Length`
    pub fn length(self) -> Expr {
        Expr::Field(self.with_accessor(Accessor::Length))
    }

    /// True when this is a plain stored-field access without pseudo-property.
    pub fn is_simple(&self) -> bool {
        self.accessor.is_none() && !self.path.is_empty()
    }

    pub fn value_type(&self) -> ValueType {
        match self.accessor {
            Some(_) => ValueType::Int,
            None => self
                .leaf()
                .map(|m| m.value_type.clone())
                .unwrap_or(ValueType::Unknown),
        }
    }
}

/// A value resolved from the calling scope rather than written as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Captured {
    /// Member chain from the captured variable, e.g. `["filter", "min_level"]`
    pub path: Vec<String>,
    pub value: Value,
}

impl Captured {
    /// Human-readable name: the innermost member of the chain.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("p")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Negate,
    /// Type coercion; transparent to translation
    Convert(ValueType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 0,
            BinaryOp::And => 1,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 4,
        }
    }

    /// Swapped operator for `a op b` rewritten as `b op' a`.
    pub fn mirrored(&self) -> BinaryOp {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => *other,
        }
    }
}

/// Named function invocation with positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Output members named by their declared names
    Anonymous,
    /// Output members resolved through the field metadata of the named type
    Typed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMember {
    pub name: String,
    pub value: Expr,
}

/// Construction of an output record from named assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub members: Vec<ShapeMember>,
}

impl Shape {
    pub fn anonymous() -> Self {
        Self {
            kind: ShapeKind::Anonymous,
            members: Vec::new(),
        }
    }

    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            kind: ShapeKind::Typed(type_name.into()),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.members.push(ShapeMember {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// Expression types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Field(FieldRef),
    Constant(Value),
    Captured(Captured),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call(Call),
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Collection(Vec<Expr>),
    NewShape(Shape),
    /// The grouping key (`None`) or one member of a composite key.
    /// Only meaningful inside an aggregation result shape.
    GroupKey(Option<String>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn null() -> Self {
        Expr::Constant(Value::Null)
    }

    pub fn captured(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Captured(Captured {
            path: vec![name.into()],
            value: value.into(),
        })
    }

    pub fn captured_path<I, S>(path: I, value: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::Captured(Captured {
            path: path.into_iter().map(Into::into).collect(),
            value: value.into(),
        })
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(Call {
            function: function.into(),
            args,
        })
    }

    pub fn collection<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Collection(items.into_iter().map(Into::into).collect())
    }

    pub fn conditional(
        test: impl Into<Expr>,
        if_true: impl Into<Expr>,
        if_false: impl Into<Expr>,
    ) -> Self {
        Expr::Conditional {
            test: Box::new(test.into()),
            if_true: Box::new(if_true.into()),
            if_false: Box::new(if_false.into()),
        }
    }

    pub fn group_key() -> Self {
        Expr::GroupKey(None)
    }

    pub fn group_key_member(name: impl Into<String>) -> Self {
        Expr::GroupKey(Some(name.into()))
    }

    pub fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left.into()),
            right: Box::new(right.into()),
        }
    }

    pub fn equals(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    pub fn not_equals(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    pub fn lt(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    pub fn le(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    pub fn gt(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    pub fn ge(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    pub fn and(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: impl Into<Expr>) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    pub fn convert(self, value_type: ValueType) -> Self {
        Expr::Unary {
            op: UnaryOp::Convert(value_type),
            operand: Box::new(self),
        }
    }

    /// Strip any type coercions wrapping this expression.
    pub fn unwrap_convert(&self) -> &Expr {
        let mut current = self;
        while let Expr::Unary {
            op: UnaryOp::Convert(_),
            operand,
        } = current
        {
            current = operand;
        }
        current
    }

    /// Literal or captured `null`.
    pub fn is_null_literal(&self) -> bool {
        match self.unwrap_convert() {
            Expr::Constant(v) => v.is_null(),
            Expr::Captured(c) => c.value.is_null(),
            _ => false,
        }
    }

    pub fn as_field(&self) -> Option<&FieldRef> {
        match self.unwrap_convert() {
            Expr::Field(f) => Some(f),
            _ => None,
        }
    }

    /// Best-effort static type; `Unknown` where the tree does not say.
    pub fn static_type(&self) -> ValueType {
        match self {
            Expr::Field(f) => f.value_type(),
            Expr::Constant(v) => v.value_type(),
            Expr::Captured(c) => c.value.value_type(),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => ValueType::Bool,
                UnaryOp::Negate => operand.static_type(),
                UnaryOp::Convert(t) => t.clone(),
            },
            Expr::Binary { op, left, right } => {
                if op.is_logical() || op.is_comparison() {
                    return ValueType::Bool;
                }
                let (l, r) = (left.static_type(), right.static_type());
                if *op == BinaryOp::Add && (l.is_string() || r.is_string()) {
                    ValueType::Keyword
                } else if l == ValueType::Unknown {
                    r
                } else {
                    l
                }
            }
            Expr::Call(_) => ValueType::Unknown,
            Expr::Conditional {
                if_true, if_false, ..
            } => match if_true.static_type() {
                ValueType::Unknown => if_false.static_type(),
                t => t,
            },
            Expr::Collection(items) => ValueType::List(Box::new(
                items
                    .first()
                    .map(Expr::static_type)
                    .unwrap_or(ValueType::Unknown),
            )),
            Expr::NewShape(shape) => match &shape.kind {
                ShapeKind::Typed(t) => ValueType::Object(t.clone()),
                ShapeKind::Anonymous => ValueType::Unknown,
            },
            Expr::GroupKey(_) => ValueType::Unknown,
        }
    }
}

impl From<FieldRef> for Expr {
    fn from(f: FieldRef) -> Self {
        Expr::Field(f)
    }
}

impl From<Member> for Expr {
    fn from(m: Member) -> Self {
        Expr::Field(FieldRef::new(m))
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Constant(v)
    }
}

impl From<Shape> for Expr {
    fn from(s: Shape) -> Self {
        Expr::NewShape(s)
    }
}

impl From<Call> for Expr {
    fn from(c: Call) -> Self {
        Expr::Call(c)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::constant(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::constant(s)
    }
}

impl From<i32> for Expr {
    fn from(i: i32) -> Self {
        Expr::constant(i)
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Self {
        Expr::constant(i)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Expr::constant(f)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::constant(b)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(self),
        }
    }
}

macro_rules! arithmetic_ops {
    ($($trait:ident, $method:ident, $op:expr;)*) => {
        $(
            impl<T: Into<Expr>> ops::$trait<T> for Expr {
                type Output = Expr;

                fn $method(self, rhs: T) -> Expr {
                    Expr::binary($op, self, rhs)
                }
            }
        )*
    };
}

arithmetic_ops! {
    Add, add, BinaryOp::Add;
    Sub, sub, BinaryOp::Sub;
    Mul, mul, BinaryOp::Mul;
    Div, div, BinaryOp::Div;
    Rem, rem, BinaryOp::Mod;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> Expr {
        Member::new("LogEntry", "Level", ValueType::Keyword).into()
    }

    #[test]
    fn test_combinators_build_binary_nodes() {
        let expr = level().equals("Error").and(Expr::captured("min", 3).lt(5));

        match expr {
            Expr::Binary { op, left, .. } => {
                assert_eq!(op, BinaryOp::And);
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Eq, .. }));
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_static_type_of_string_concatenation() {
        let concat = level() + " suffix";
        assert_eq!(concat.static_type(), ValueType::Keyword);

        let sum = Expr::constant(1) + 2;
        assert_eq!(sum.static_type(), ValueType::Long);
    }

    #[test]
    fn test_unwrap_convert_and_null_literal() {
        let wrapped = Expr::null().convert(ValueType::Int).convert(ValueType::Long);
        assert!(wrapped.is_null_literal());
        assert_eq!(wrapped.unwrap_convert(), &Expr::null());
    }

    #[test]
    fn test_captured_name_is_innermost_member() {
        let expr = Expr::captured_path(["filter", "threshold"], 10);
        match expr {
            Expr::Captured(c) => assert_eq!(c.name(), "threshold"),
            other => panic!("unexpected node: {:?}", other),
        }
    }
}

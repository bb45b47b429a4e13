//! Function helpers
//!
//! Thin constructors over [`Expr::call`] named after the registry entries,
//! so query code reads like the ES|QL it produces.

use esql_ir::{Expr, Shape};

fn call1(name: &str, a: impl Into<Expr>) -> Expr {
    Expr::call(name, vec![a.into()])
}

fn call2(name: &str, a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::call(name, vec![a.into(), b.into()])
}

fn call3(name: &str, a: impl Into<Expr>, b: impl Into<Expr>, c: impl Into<Expr>) -> Expr {
    Expr::call(name, vec![a.into(), b.into(), c.into()])
}

fn call_n<I, E>(name: &str, args: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::call(name, args.into_iter().map(Into::into).collect())
}

// String

pub fn trim(s: impl Into<Expr>) -> Expr {
    call1("trim", s)
}

pub fn to_lower(s: impl Into<Expr>) -> Expr {
    call1("to_lower", s)
}

pub fn to_upper(s: impl Into<Expr>) -> Expr {
    call1("to_upper", s)
}

pub fn length(s: impl Into<Expr>) -> Expr {
    call1("length", s)
}

pub fn substring(s: impl Into<Expr>, start: impl Into<Expr>, len: impl Into<Expr>) -> Expr {
    call3("substring", s, start, len)
}

pub fn replace(s: impl Into<Expr>, pattern: impl Into<Expr>, with: impl Into<Expr>) -> Expr {
    call3("replace", s, pattern, with)
}

pub fn left(s: impl Into<Expr>, n: impl Into<Expr>) -> Expr {
    call2("left", s, n)
}

pub fn right(s: impl Into<Expr>, n: impl Into<Expr>) -> Expr {
    call2("right", s, n)
}

pub fn concat<I, E>(parts: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    call_n("concat", parts)
}

/// `s LIKE "*text*"`, or `s IN (...)` when `s` is a list.
pub fn contains(s: impl Into<Expr>, text: impl Into<Expr>) -> Expr {
    call2("contains", s, text)
}

pub fn starts_with(s: impl Into<Expr>, prefix: impl Into<Expr>) -> Expr {
    call2("starts_with", s, prefix)
}

pub fn ends_with(s: impl Into<Expr>, suffix: impl Into<Expr>) -> Expr {
    call2("ends_with", s, suffix)
}

pub fn md5(s: impl Into<Expr>) -> Expr {
    call1("md5", s)
}

pub fn sha256(s: impl Into<Expr>) -> Expr {
    call1("sha256", s)
}

pub fn url_encode(s: impl Into<Expr>) -> Expr {
    call1("url_encode", s)
}

pub fn url_decode(s: impl Into<Expr>) -> Expr {
    call1("url_decode", s)
}

// Math

pub fn abs(x: impl Into<Expr>) -> Expr {
    call1("abs", x)
}

pub fn ceil(x: impl Into<Expr>) -> Expr {
    call1("ceil", x)
}

pub fn floor(x: impl Into<Expr>) -> Expr {
    call1("floor", x)
}

pub fn round(x: impl Into<Expr>, digits: impl Into<Expr>) -> Expr {
    call2("round", x, digits)
}

pub fn sqrt(x: impl Into<Expr>) -> Expr {
    call1("sqrt", x)
}

pub fn pow(base: impl Into<Expr>, exponent: impl Into<Expr>) -> Expr {
    call2("pow", base, exponent)
}

pub fn signum(x: impl Into<Expr>) -> Expr {
    call1("signum", x)
}

/// `GREATEST(LEAST(x, max), min)`
pub fn clamp(x: impl Into<Expr>, min: impl Into<Expr>, max: impl Into<Expr>) -> Expr {
    call3("clamp", x, min, max)
}

pub fn greatest<I, E>(values: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    call_n("greatest", values)
}

pub fn least<I, E>(values: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    call_n("least", values)
}

// Date

pub fn now() -> Expr {
    Expr::call("now", vec![])
}

pub fn date_trunc(interval: impl Into<Expr>, date: impl Into<Expr>) -> Expr {
    call2("date_trunc", interval, date)
}

pub fn date_format(pattern: impl Into<Expr>, date: impl Into<Expr>) -> Expr {
    call2("date_format", pattern, date)
}

pub fn date_diff(unit: impl Into<Expr>, start: impl Into<Expr>, end: impl Into<Expr>) -> Expr {
    call3("date_diff", unit, start, end)
}

pub fn date_extract(part: impl Into<Expr>, date: impl Into<Expr>) -> Expr {
    call2("date_extract", part, date)
}

// Interval literals; the count must be a literal integer.

pub fn weeks(n: i64) -> Expr {
    call1("from_weeks", n)
}

pub fn days(n: i64) -> Expr {
    call1("from_days", n)
}

pub fn hours(n: i64) -> Expr {
    call1("from_hours", n)
}

pub fn minutes(n: i64) -> Expr {
    call1("from_minutes", n)
}

pub fn seconds(n: i64) -> Expr {
    call1("from_seconds", n)
}

pub fn milliseconds(n: i64) -> Expr {
    call1("from_milliseconds", n)
}

// Full-text search. Field arguments stay bare.

pub fn match_text(field: impl Into<Expr>, query: impl Into<Expr>) -> Expr {
    call2("match", field, query)
}

pub fn match_phrase(field: impl Into<Expr>, phrase: impl Into<Expr>) -> Expr {
    call2("match_phrase", field, phrase)
}

pub fn kql(query: impl Into<Expr>) -> Expr {
    call1("kql", query)
}

pub fn qstr(query: impl Into<Expr>) -> Expr {
    call1("qstr", query)
}

// IP

pub fn cidr_match<I, E>(ip: impl Into<Expr>, blocks: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    let mut args = vec![ip.into()];
    args.extend(blocks.into_iter().map(Into::into));
    Expr::call("cidr_match", args)
}

pub fn ip_prefix(
    ip: impl Into<Expr>,
    v4_length: impl Into<Expr>,
    v6_length: impl Into<Expr>,
) -> Expr {
    call3("ip_prefix", ip, v4_length, v6_length)
}

// Casts

pub fn to_integer(x: impl Into<Expr>) -> Expr {
    call1("to_integer", x)
}

pub fn to_long(x: impl Into<Expr>) -> Expr {
    call1("to_long", x)
}

pub fn to_double(x: impl Into<Expr>) -> Expr {
    call1("to_double", x)
}

pub fn to_string(x: impl Into<Expr>) -> Expr {
    call1("to_string", x)
}

pub fn to_datetime(x: impl Into<Expr>) -> Expr {
    call1("to_datetime", x)
}

pub fn to_ip(x: impl Into<Expr>) -> Expr {
    call1("to_ip", x)
}

// Conditionals

pub fn coalesce<I, E>(values: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    call_n("coalesce", values)
}

pub fn is_null(x: impl Into<Expr>) -> Expr {
    call1("is_null", x)
}

pub fn is_not_null(x: impl Into<Expr>) -> Expr {
    call1("is_not_null", x)
}

/// `value IN (items...)`
pub fn is_in<I, E>(value: impl Into<Expr>, items: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::call("in", vec![value.into(), Expr::collection(items)])
}

/// `CASE(test, a, b)`
pub fn if_else(test: impl Into<Expr>, a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Expr::conditional(test, a, b)
}

// Multi-value

pub fn mv_count(x: impl Into<Expr>) -> Expr {
    call1("mv_count", x)
}

pub fn mv_first(x: impl Into<Expr>) -> Expr {
    call1("mv_first", x)
}

pub fn mv_last(x: impl Into<Expr>) -> Expr {
    call1("mv_last", x)
}

pub fn mv_min(x: impl Into<Expr>) -> Expr {
    call1("mv_min", x)
}

pub fn mv_max(x: impl Into<Expr>) -> Expr {
    call1("mv_max", x)
}

pub fn mv_sum(x: impl Into<Expr>) -> Expr {
    call1("mv_sum", x)
}

pub fn mv_dedupe(x: impl Into<Expr>) -> Expr {
    call1("mv_dedupe", x)
}

pub fn mv_concat(x: impl Into<Expr>, delimiter: impl Into<Expr>) -> Expr {
    call2("mv_concat", x, delimiter)
}

// Grouping

pub fn bucket(field: impl Into<Expr>, span: impl Into<Expr>) -> Expr {
    call2("bucket", field, span)
}

pub fn categorize(field: impl Into<Expr>) -> Expr {
    call1("categorize", field)
}

// Aggregates

/// `COUNT(*)`
pub fn count() -> Expr {
    Expr::call("count", vec![])
}

pub fn count_of(x: impl Into<Expr>) -> Expr {
    call1("count", x)
}

pub fn count_distinct(x: impl Into<Expr>) -> Expr {
    call1("count_distinct", x)
}

pub fn sum(x: impl Into<Expr>) -> Expr {
    call1("sum", x)
}

pub fn avg(x: impl Into<Expr>) -> Expr {
    call1("avg", x)
}

pub fn min(x: impl Into<Expr>) -> Expr {
    call1("min", x)
}

pub fn max(x: impl Into<Expr>) -> Expr {
    call1("max", x)
}

pub fn median(x: impl Into<Expr>) -> Expr {
    call1("median", x)
}

pub fn percentile(x: impl Into<Expr>, p: impl Into<Expr>) -> Expr {
    call2("percentile", x, p)
}

pub fn std_dev(x: impl Into<Expr>) -> Expr {
    call1("std_dev", x)
}

pub fn variance(x: impl Into<Expr>) -> Expr {
    call1("variance", x)
}

pub fn values(x: impl Into<Expr>) -> Expr {
    call1("values", x)
}

pub fn top(x: impl Into<Expr>, limit: impl Into<Expr>, order: impl Into<Expr>) -> Expr {
    call3("top", x, limit, order)
}

// Shapes

/// The grouping key inside an aggregation result.
pub fn key() -> Expr {
    Expr::group_key()
}

/// One member of a composite grouping key.
pub fn key_member(name: impl Into<String>) -> Expr {
    Expr::group_key_member(name)
}

pub fn shape() -> Shape {
    Shape::anonymous()
}

pub fn typed_shape(type_name: impl Into<String>) -> Shape {
    Shape::typed(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_ir::{Call, Value};
    use esql_registry::FunctionRegistry;

    fn function_name(expr: &Expr) -> &str {
        match expr {
            Expr::Call(Call { function, .. }) => function.as_str(),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_helpers_name_registered_functions() {
        let field = Expr::constant("x");
        let helpers = [
            to_lower(field.clone()),
            clamp(field.clone(), 1, 2),
            hours(1),
            match_text(field.clone(), "q"),
            cidr_match(field.clone(), ["10.0.0.0/8"]),
            mv_dedupe(field.clone()),
            bucket(field.clone(), hours(1)),
            count(),
            percentile(field.clone(), 95),
            is_in(field.clone(), ["a", "b"]),
        ];

        let registry = FunctionRegistry::global();
        for helper in &helpers {
            let name = function_name(helper);
            assert!(registry.lookup(name).is_ok(), "{} is not registered", name);
        }
    }

    #[test]
    fn test_is_in_wraps_collection() {
        let expr = is_in(Expr::constant("x"), [1, 2]);
        match expr {
            Expr::Call(Call { args, .. }) => {
                assert_eq!(args[0], Expr::Constant(Value::from("x")));
                assert!(matches!(&args[1], Expr::Collection(items) if items.len() == 2));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }
}

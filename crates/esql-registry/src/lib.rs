//! Function registry shared by every translator
//!
//! One table maps builder-level function names to their ES|QL textual
//! template. WHERE, EVAL, STATS and SORT translation all dispatch through
//! [`FunctionRegistry::lookup`].

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Arity mismatch for function {func}: expected {expected}, got {actual}")]
    ArityMismatch {
        func: String,
        expected: Arity,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionFamily {
    String,
    Math,
    Date,
    Interval,
    Search,
    Ip,
    Cast,
    Conditional,
    MultiValue,
    Grouping,
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionId {
    // String
    Trim,
    Ltrim,
    Rtrim,
    ToLower,
    ToUpper,
    Substring,
    Replace,
    Locate,
    Split,
    Length,
    ByteLength,
    Concat,
    Left,
    Right,
    Reverse,
    Repeat,
    Space,
    Hash,
    Md5,
    Sha1,
    Sha256,
    ToBase64,
    FromBase64,
    UrlEncode,
    UrlEncodeComponent,
    UrlDecode,
    Contains,
    StartsWith,
    EndsWith,
    // Math
    Abs,
    Ceil,
    Floor,
    Round,
    Sqrt,
    Cbrt,
    Pow,
    Exp,
    Log,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Signum,
    Clamp,
    Pi,
    E,
    Greatest,
    Least,
    // Date
    Now,
    DateTrunc,
    DateFormat,
    DateDiff,
    DateParse,
    DateExtract,
    // Interval
    FromWeeks,
    FromDays,
    FromHours,
    FromMinutes,
    FromSeconds,
    FromMilliseconds,
    // Search
    Match,
    MatchPhrase,
    Kql,
    Qstr,
    Score,
    Decay,
    // Ip
    CidrMatch,
    IpPrefix,
    // Cast
    ToInteger,
    ToLong,
    ToDouble,
    ToBoolean,
    ToStringValue,
    ToKeyword,
    ToDatetime,
    ToIp,
    ToVersion,
    ToUnsignedLong,
    // Conditional
    Coalesce,
    IsNull,
    IsNotNull,
    In,
    // Multi-value
    MvCount,
    MvFirst,
    MvLast,
    MvMin,
    MvMax,
    MvSum,
    MvAvg,
    MvMedian,
    MvDedupe,
    MvConcat,
    // Grouping
    Bucket,
    TBucket,
    Categorize,
    // Aggregate
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    Median,
    MedianAbsoluteDeviation,
    Percentile,
    StdDev,
    Variance,
    WeightedAvg,
    Top,
    Values,
    First,
    Last,
    Sample,
    Present,
    Absent,
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(e) => n == e,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(lo) => n >= lo,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(e) => write!(f, "{}", e),
            Arity::Between(lo, hi) => write!(f, "{}..={}", lo, hi),
            Arity::AtLeast(lo) => write!(f, "at least {}", lo),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LikeKind {
    Contains,
    StartsWith,
    EndsWith,
}

/// How a call renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Template {
    /// `NAME(arg, ...)`
    Call(&'static str),
    /// Positional placeholders `{0}`, `{1}`, ...
    Format(&'static str),
    /// Aggregation; no arguments renders `NAME(*)`
    Aggregate(&'static str),
    /// Duration constructor rendering `<n> <unit>`
    Interval(&'static str),
    /// Pattern-match sugar over `LIKE`
    Like(LikeKind),
    /// `value IN (...)`
    Membership,
    /// `IS NULL` when true, `IS NOT NULL` when false
    NullCheck(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub id: FunctionId,
    pub name: &'static str,
    pub family: FunctionFamily,
    pub arity: Arity,
    pub template: Template,
    /// Field arguments must not carry the exact-match sub-field suffix
    pub bare_fields: bool,
}

impl FunctionDef {
    pub fn is_aggregate(&self) -> bool {
        self.family == FunctionFamily::Aggregate
    }

    pub fn is_grouping(&self) -> bool {
        self.family == FunctionFamily::Grouping
    }

    /// Render already-translated arguments through the template.
    ///
    /// Only `Call`, `Format` and `Aggregate` templates render from plain
    /// argument text; the others need the argument trees and return `None`.
    pub fn render(&self, args: &[String]) -> Option<String> {
        match self.template {
            Template::Call(name) => Some(format!("{}({})", name, args.join(", "))),
            Template::Aggregate(name) if args.is_empty() => Some(format!("{}(*)", name)),
            Template::Aggregate(name) => Some(format!("{}({})", name, args.join(", "))),
            Template::Format(pattern) => Some(substitute(pattern, args)),
            _ => None,
        }
    }
}

/// Replace `{n}` placeholders in one left-to-right pass, so argument text
/// is never rescanned. Placeholders without a matching argument stay as-is.
fn substitute(pattern: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let placeholder = tail.find('}').and_then(|close| {
            let index: usize = tail[..close].parse().ok()?;
            args.get(index).map(|arg| (arg, close))
        });
        match placeholder {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

const fn def(
    id: FunctionId,
    name: &'static str,
    family: FunctionFamily,
    arity: Arity,
    template: Template,
) -> FunctionDef {
    FunctionDef {
        id,
        name,
        family,
        arity,
        template,
        bare_fields: false,
    }
}

const fn bare(d: FunctionDef) -> FunctionDef {
    FunctionDef {
        bare_fields: true,
        ..d
    }
}

use Arity::{AtLeast, Between, Exact};
use FunctionFamily as F;
use FunctionId as Id;
use Template::{Aggregate, Call, Format, Interval, Like, Membership, NullCheck};

static BUILTINS: &[FunctionDef] = &[
    // String
    def(Id::Trim, "trim", F::String, Exact(1), Call("TRIM")),
    def(Id::Ltrim, "ltrim", F::String, Exact(1), Call("LTRIM")),
    def(Id::Rtrim, "rtrim", F::String, Exact(1), Call("RTRIM")),
    def(Id::ToLower, "to_lower", F::String, Exact(1), Call("TO_LOWER")),
    def(Id::ToUpper, "to_upper", F::String, Exact(1), Call("TO_UPPER")),
    def(Id::Substring, "substring", F::String, Between(2, 3), Call("SUBSTRING")),
    def(Id::Replace, "replace", F::String, Exact(3), Call("REPLACE")),
    def(Id::Locate, "locate", F::String, Between(2, 3), Call("LOCATE")),
    def(Id::Split, "split", F::String, Exact(2), Call("SPLIT")),
    def(Id::Length, "length", F::String, Exact(1), Call("LENGTH")),
    def(Id::ByteLength, "byte_length", F::String, Exact(1), Call("BYTE_LENGTH")),
    def(Id::Concat, "concat", F::String, AtLeast(2), Call("CONCAT")),
    def(Id::Left, "left", F::String, Exact(2), Call("LEFT")),
    def(Id::Right, "right", F::String, Exact(2), Call("RIGHT")),
    def(Id::Reverse, "reverse", F::String, Exact(1), Call("REVERSE")),
    def(Id::Repeat, "repeat", F::String, Exact(2), Call("REPEAT")),
    def(Id::Space, "space", F::String, Exact(1), Call("SPACE")),
    def(Id::Hash, "hash", F::String, Exact(2), Call("HASH")),
    def(Id::Md5, "md5", F::String, Exact(1), Call("MD5")),
    def(Id::Sha1, "sha1", F::String, Exact(1), Call("SHA1")),
    def(Id::Sha256, "sha256", F::String, Exact(1), Call("SHA256")),
    def(Id::ToBase64, "to_base64", F::String, Exact(1), Call("TO_BASE64")),
    def(Id::FromBase64, "from_base64", F::String, Exact(1), Call("FROM_BASE64")),
    def(Id::UrlEncode, "url_encode", F::String, Exact(1), Call("URL_ENCODE")),
    def(Id::UrlEncodeComponent, "url_encode_component", F::String, Exact(1), Call("URL_ENCODE_COMPONENT")),
    def(Id::UrlDecode, "url_decode", F::String, Exact(1), Call("URL_DECODE")),
    def(Id::Contains, "contains", F::String, Exact(2), Like(LikeKind::Contains)),
    def(Id::StartsWith, "starts_with", F::String, Exact(2), Like(LikeKind::StartsWith)),
    def(Id::EndsWith, "ends_with", F::String, Exact(2), Like(LikeKind::EndsWith)),
    // Math
    def(Id::Abs, "abs", F::Math, Exact(1), Call("ABS")),
    def(Id::Ceil, "ceil", F::Math, Exact(1), Call("CEIL")),
    def(Id::Floor, "floor", F::Math, Exact(1), Call("FLOOR")),
    def(Id::Round, "round", F::Math, Between(1, 2), Call("ROUND")),
    def(Id::Sqrt, "sqrt", F::Math, Exact(1), Call("SQRT")),
    def(Id::Cbrt, "cbrt", F::Math, Exact(1), Call("CBRT")),
    def(Id::Pow, "pow", F::Math, Exact(2), Call("POW")),
    def(Id::Exp, "exp", F::Math, Exact(1), Call("EXP")),
    def(Id::Log, "log", F::Math, Between(1, 2), Call("LOG")),
    def(Id::Log10, "log10", F::Math, Exact(1), Call("LOG10")),
    def(Id::Sin, "sin", F::Math, Exact(1), Call("SIN")),
    def(Id::Cos, "cos", F::Math, Exact(1), Call("COS")),
    def(Id::Tan, "tan", F::Math, Exact(1), Call("TAN")),
    def(Id::Asin, "asin", F::Math, Exact(1), Call("ASIN")),
    def(Id::Acos, "acos", F::Math, Exact(1), Call("ACOS")),
    def(Id::Atan, "atan", F::Math, Exact(1), Call("ATAN")),
    def(Id::Atan2, "atan2", F::Math, Exact(2), Call("ATAN2")),
    def(Id::Sinh, "sinh", F::Math, Exact(1), Call("SINH")),
    def(Id::Cosh, "cosh", F::Math, Exact(1), Call("COSH")),
    def(Id::Tanh, "tanh", F::Math, Exact(1), Call("TANH")),
    def(Id::Signum, "signum", F::Math, Exact(1), Call("SIGNUM")),
    // clamp(value, min, max)
    def(Id::Clamp, "clamp", F::Math, Exact(3), Format("GREATEST(LEAST({0}, {2}), {1})")),
    def(Id::Pi, "pi", F::Math, Exact(0), Call("PI")),
    def(Id::E, "e", F::Math, Exact(0), Call("E")),
    def(Id::Greatest, "greatest", F::Math, AtLeast(1), Call("GREATEST")),
    def(Id::Least, "least", F::Math, AtLeast(1), Call("LEAST")),
    // Date
    def(Id::Now, "now", F::Date, Exact(0), Call("NOW")),
    def(Id::DateTrunc, "date_trunc", F::Date, Exact(2), Call("DATE_TRUNC")),
    def(Id::DateFormat, "date_format", F::Date, Between(1, 2), Call("DATE_FORMAT")),
    def(Id::DateDiff, "date_diff", F::Date, Exact(3), Call("DATE_DIFF")),
    def(Id::DateParse, "date_parse", F::Date, Between(1, 2), Call("DATE_PARSE")),
    def(Id::DateExtract, "date_extract", F::Date, Exact(2), Call("DATE_EXTRACT")),
    // Interval
    def(Id::FromWeeks, "from_weeks", F::Interval, Exact(1), Interval("weeks")),
    def(Id::FromDays, "from_days", F::Interval, Exact(1), Interval("days")),
    def(Id::FromHours, "from_hours", F::Interval, Exact(1), Interval("hours")),
    def(Id::FromMinutes, "from_minutes", F::Interval, Exact(1), Interval("minutes")),
    def(Id::FromSeconds, "from_seconds", F::Interval, Exact(1), Interval("seconds")),
    def(Id::FromMilliseconds, "from_milliseconds", F::Interval, Exact(1), Interval("milliseconds")),
    // Search
    bare(def(Id::Match, "match", F::Search, Between(2, 3), Call("MATCH"))),
    bare(def(Id::MatchPhrase, "match_phrase", F::Search, Between(2, 3), Call("MATCH_PHRASE"))),
    def(Id::Kql, "kql", F::Search, Between(1, 2), Call("KQL")),
    def(Id::Qstr, "qstr", F::Search, Between(1, 2), Call("QSTR")),
    def(Id::Score, "score", F::Search, Exact(1), Call("SCORE")),
    def(Id::Decay, "decay", F::Search, Between(3, 4), Call("DECAY")),
    // Ip
    def(Id::CidrMatch, "cidr_match", F::Ip, AtLeast(2), Call("CIDR_MATCH")),
    def(Id::IpPrefix, "ip_prefix", F::Ip, Exact(3), Call("IP_PREFIX")),
    // Cast
    def(Id::ToInteger, "to_integer", F::Cast, Exact(1), Call("TO_INTEGER")),
    def(Id::ToLong, "to_long", F::Cast, Exact(1), Call("TO_LONG")),
    def(Id::ToDouble, "to_double", F::Cast, Exact(1), Call("TO_DOUBLE")),
    def(Id::ToBoolean, "to_boolean", F::Cast, Exact(1), Call("TO_BOOLEAN")),
    def(Id::ToStringValue, "to_string", F::Cast, Exact(1), Call("TO_STRING")),
    def(Id::ToKeyword, "to_keyword", F::Cast, Exact(1), Call("TO_STRING")),
    def(Id::ToDatetime, "to_datetime", F::Cast, Exact(1), Call("TO_DATETIME")),
    def(Id::ToIp, "to_ip", F::Cast, Exact(1), Call("TO_IP")),
    def(Id::ToVersion, "to_version", F::Cast, Exact(1), Call("TO_VERSION")),
    def(Id::ToUnsignedLong, "to_unsigned_long", F::Cast, Exact(1), Call("TO_UNSIGNED_LONG")),
    // Conditional
    def(Id::Coalesce, "coalesce", F::Conditional, AtLeast(1), Call("COALESCE")),
    def(Id::IsNull, "is_null", F::Conditional, Exact(1), NullCheck(true)),
    def(Id::IsNotNull, "is_not_null", F::Conditional, Exact(1), NullCheck(false)),
    def(Id::In, "in", F::Conditional, Exact(2), Membership),
    // Multi-value
    def(Id::MvCount, "mv_count", F::MultiValue, Exact(1), Call("MV_COUNT")),
    def(Id::MvFirst, "mv_first", F::MultiValue, Exact(1), Call("MV_FIRST")),
    def(Id::MvLast, "mv_last", F::MultiValue, Exact(1), Call("MV_LAST")),
    def(Id::MvMin, "mv_min", F::MultiValue, Exact(1), Call("MV_MIN")),
    def(Id::MvMax, "mv_max", F::MultiValue, Exact(1), Call("MV_MAX")),
    def(Id::MvSum, "mv_sum", F::MultiValue, Exact(1), Call("MV_SUM")),
    def(Id::MvAvg, "mv_avg", F::MultiValue, Exact(1), Call("MV_AVG")),
    def(Id::MvMedian, "mv_median", F::MultiValue, Exact(1), Call("MV_MEDIAN")),
    def(Id::MvDedupe, "mv_dedupe", F::MultiValue, Exact(1), Call("MV_DEDUPE")),
    def(Id::MvConcat, "mv_concat", F::MultiValue, Exact(2), Call("MV_CONCAT")),
    // Grouping
    def(Id::Bucket, "bucket", F::Grouping, Between(2, 4), Call("BUCKET")),
    def(Id::TBucket, "tbucket", F::Grouping, Exact(1), Call("TBUCKET")),
    def(Id::Categorize, "categorize", F::Grouping, Exact(1), Call("CATEGORIZE")),
    // Aggregate
    def(Id::Count, "count", F::Aggregate, Between(0, 1), Aggregate("COUNT")),
    def(Id::CountDistinct, "count_distinct", F::Aggregate, Between(1, 2), Aggregate("COUNT_DISTINCT")),
    def(Id::Sum, "sum", F::Aggregate, Exact(1), Aggregate("SUM")),
    def(Id::Avg, "avg", F::Aggregate, Exact(1), Aggregate("AVG")),
    def(Id::Min, "min", F::Aggregate, Exact(1), Aggregate("MIN")),
    def(Id::Max, "max", F::Aggregate, Exact(1), Aggregate("MAX")),
    def(Id::Median, "median", F::Aggregate, Exact(1), Aggregate("MEDIAN")),
    def(Id::MedianAbsoluteDeviation, "median_absolute_deviation", F::Aggregate, Exact(1), Aggregate("MEDIAN_ABSOLUTE_DEVIATION")),
    def(Id::Percentile, "percentile", F::Aggregate, Exact(2), Aggregate("PERCENTILE")),
    def(Id::StdDev, "std_dev", F::Aggregate, Exact(1), Aggregate("STD_DEV")),
    def(Id::Variance, "variance", F::Aggregate, Exact(1), Aggregate("VARIANCE")),
    def(Id::WeightedAvg, "weighted_avg", F::Aggregate, Exact(2), Aggregate("WEIGHTED_AVG")),
    def(Id::Top, "top", F::Aggregate, Exact(3), Aggregate("TOP")),
    def(Id::Values, "values", F::Aggregate, Exact(1), Aggregate("VALUES")),
    def(Id::First, "first", F::Aggregate, Exact(2), Aggregate("FIRST")),
    def(Id::Last, "last", F::Aggregate, Exact(2), Aggregate("LAST")),
    def(Id::Sample, "sample", F::Aggregate, Exact(2), Aggregate("SAMPLE")),
    def(Id::Present, "present", F::Aggregate, Exact(1), Aggregate("PRESENT")),
    def(Id::Absent, "absent", F::Aggregate, Exact(1), Aggregate("ABSENT")),
];

/// Alternate spellings accepted by [`FunctionRegistry::lookup`].
static ALIASES: &[(&str, &str)] = &[
    ("average", "avg"),
    ("mean", "avg"),
    ("stddev", "std_dev"),
    ("sign", "signum"),
    ("tolower", "to_lower"),
    ("toupper", "to_upper"),
    ("startswith", "starts_with"),
    ("endswith", "ends_with"),
    ("indexof", "locate"),
    ("distinct_count", "count_distinct"),
    ("countdistinct", "count_distinct"),
    ("to_int", "to_integer"),
    ("to_bool", "to_boolean"),
];

static GLOBAL: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::builtin);

pub struct FunctionRegistry {
    functions: HashMap<&'static str, FunctionDef>,
    by_id: HashMap<FunctionId, &'static str>,
}

impl FunctionRegistry {
    /// The shared registry holding every builtin.
    pub fn global() -> &'static FunctionRegistry {
        &GLOBAL
    }

    fn builtin() -> Self {
        let mut registry = Self {
            functions: HashMap::with_capacity(BUILTINS.len() + ALIASES.len()),
            by_id: HashMap::with_capacity(BUILTINS.len()),
        };
        for def in BUILTINS {
            registry.functions.insert(def.name, *def);
            registry.by_id.insert(def.id, def.name);
        }
        for &(alias, target) in ALIASES {
            if let Some(def) = registry.functions.get(target).copied() {
                registry.functions.insert(alias, def);
            }
        }
        registry
    }

    /// Case-insensitive lookup by name or alias.
    pub fn lookup(&self, name: &str) -> Result<&FunctionDef, RegistryError> {
        let normalized = name.to_ascii_lowercase();
        self.functions
            .get(normalized.as_str())
            .ok_or_else(|| RegistryError::FunctionNotFound(name.to_string()))
    }

    /// Lookup that also validates the argument count.
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<&FunctionDef, RegistryError> {
        let def = self.lookup(name)?;
        if !def.arity.accepts(arg_count) {
            return Err(RegistryError::ArityMismatch {
                func: def.name.to_string(),
                expected: def.arity,
                actual: arg_count,
            });
        }
        Ok(def)
    }

    pub fn get(&self, id: FunctionId) -> Option<&FunctionDef> {
        self.by_id.get(&id).and_then(|name| self.functions.get(name))
    }

    pub fn family(&self, family: FunctionFamily) -> impl Iterator<Item = &FunctionDef> {
        BUILTINS.iter().filter(move |d| d.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = FunctionRegistry::global();

        let def = registry.lookup("to_lower").unwrap();
        assert_eq!(def.id, FunctionId::ToLower);
        assert_eq!(def.render(&["message".to_string()]).unwrap(), "TO_LOWER(message)");
    }

    #[test]
    fn test_lookup_is_case_insensitive_and_honours_aliases() {
        let registry = FunctionRegistry::global();

        assert_eq!(registry.lookup("ToUpper").unwrap().id, FunctionId::ToUpper);
        assert_eq!(registry.lookup("Average").unwrap().id, FunctionId::Avg);
        assert_eq!(registry.lookup("StdDev").unwrap().id, FunctionId::StdDev);
    }

    #[test]
    fn test_unknown_function() {
        let err = FunctionRegistry::global().lookup("frobnicate").unwrap_err();
        assert_eq!(err, RegistryError::FunctionNotFound("frobnicate".to_string()));
    }

    #[test]
    fn test_arity_checked() {
        let registry = FunctionRegistry::global();

        assert!(registry.resolve("round", 1).is_ok());
        assert!(registry.resolve("round", 2).is_ok());
        let err = registry.resolve("round", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Arity mismatch for function round: expected 1..=2, got 3"
        );
    }

    #[test]
    fn test_aggregate_templates() {
        let registry = FunctionRegistry::global();

        let count = registry.lookup("count").unwrap();
        assert!(count.is_aggregate());
        assert_eq!(count.render(&[]).unwrap(), "COUNT(*)");
        assert_eq!(count.render(&["host".to_string()]).unwrap(), "COUNT(host)");
    }

    #[test]
    fn test_format_template() {
        let clamp = FunctionRegistry::global().get(FunctionId::Clamp).unwrap();
        let args = ["x".to_string(), "0".to_string(), "10".to_string()];
        assert_eq!(clamp.render(&args).unwrap(), "GREATEST(LEAST(x, 10), 0)");
    }

    #[test]
    fn test_format_template_leaves_argument_text_alone() {
        let clamp = FunctionRegistry::global().get(FunctionId::Clamp).unwrap();
        let args = ["\"{2}\"".to_string(), "0".to_string(), "10".to_string()];
        assert_eq!(
            clamp.render(&args).unwrap(),
            "GREATEST(LEAST(\"{2}\", 10), 0)"
        );
        assert_eq!(substitute("{0} {1}", &["a".to_string()]), "a {1}");
    }

    #[test]
    fn test_search_functions_keep_fields_bare() {
        let registry = FunctionRegistry::global();

        assert!(registry.lookup("match").unwrap().bare_fields);
        assert!(registry.lookup("match_phrase").unwrap().bare_fields);
        assert!(!registry.lookup("kql").unwrap().bare_fields);
    }

    #[test]
    fn test_every_builtin_reachable_by_id() {
        let registry = FunctionRegistry::global();
        for def in BUILTINS {
            assert_eq!(registry.get(def.id).unwrap().name, def.name);
        }
        assert!(registry.family(FunctionFamily::Grouping).count() >= 3);
    }
}

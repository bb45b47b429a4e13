//! ES|QL compiler
//!
//! Translates an operation chain ([`esql_ir::Pipeline`]) into pipe-delimited
//! ES|QL text, either with captured values inlined as literals or extracted
//! into named, deduplicated `?name` parameters.

mod aggregation;
pub mod assemble;
mod error;
mod expression;
pub mod format;
mod metadata;
mod options;
mod ordering;
mod predicate;
mod projection;
mod translator;

pub use assemble::CompiledQuery;
pub use error::{ResolveError, TranslateError};
pub use metadata::{FieldInfo, FieldMetadata, StaticFieldMetadata};
pub use options::{CompileOptions, NamingPolicy};
pub use translator::Compiler;

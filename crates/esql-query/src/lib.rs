//! Fluent ES|QL queries
//!
//! Builds operation chains against declared document models, compiles them
//! with [`esql_compile::Compiler`] and hands them to an
//! [`esql_exec::QueryExecutor`].
//!
//! ```ignore
//! use esql_query::{functions::*, DocumentModel, Query};
//!
//! let log = DocumentModel::new("Log").keyword("Level", "log.level");
//! let text = Query::from("logs-*")
//!     .filter(log.field("Level").equals("Error"))
//!     .take(10)
//!     .to_esql(&log.metadata())?;
//! ```

pub mod builder;
pub mod config;
pub mod functions;
pub mod logging;
pub mod model;

use esql_compile::TranslateError;
use esql_exec::ExecutionError;
use thiserror::Error;

pub use builder::{GroupedQuery, Query};
pub use config::{Config, ConfigError};
pub use model::{DocumentModel, FieldDef};

pub use esql_compile::{CompileOptions, CompiledQuery, Compiler, NamingPolicy, StaticFieldMetadata};
pub use esql_exec::{QueryExecutor, QueryOptions, QueryResponse};
pub use esql_ir::{DatePart, Expr, NullsOrder, ParameterMode, Shape, SortDirection, ValueType};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

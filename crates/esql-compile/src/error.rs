use esql_registry::RegistryError;
use thiserror::Error;

/// Failure to map a member of the document model to a stored field name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown member {type_name}.{member}")]
    UnknownMember { type_name: String, member: String },

    #[error("Field reference has an empty member path")]
    EmptyPath,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
}

impl TranslateError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        TranslateError::Unsupported(what.into())
    }
}

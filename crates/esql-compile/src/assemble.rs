//! Pipeline assembly
//!
//! Validates the command list and renders it as
//! `FROM idx\n| WHERE ...\n| LIMIT n`.

use esql_ir::{Cardinality, Command, Parameter, ParameterMode, QueryIr};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::TranslateError;
use crate::format::parameter_json;

/// Separator placed between rendered commands.
pub const COMMAND_SEPARATOR: &str = "\n| ";

/// Rendered query plus everything the execution layer needs alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub text: String,
    /// Parameter slots in reference order; empty in inline mode
    pub params: Vec<Parameter>,
    pub result_type: Option<String>,
    pub cardinality: Cardinality,
}

impl CompiledQuery {
    /// Ordered `[{name: value}, ...]` list for the request body.
    pub fn params_json(&self) -> Vec<serde_json::Value> {
        self.params
            .iter()
            .map(|p| {
                let mut entry = serde_json::Map::with_capacity(1);
                entry.insert(p.name.clone(), parameter_json(&p.value));
                serde_json::Value::Object(entry)
            })
            .collect()
    }

    /// SHA-256 over the text and the parameter list.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        hasher.update(b"\n");
        hasher.update(serde_json::Value::Array(self.params_json()).to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Check that exactly one source command exists and comes first.
pub fn validate(commands: &[Command]) -> Result<(), TranslateError> {
    match commands.first() {
        Some(first) if first.is_source() => {}
        Some(first) => {
            return Err(TranslateError::InvalidPipeline(format!(
                "pipeline starts with {} instead of FROM or ROW",
                first.keyword()
            )))
        }
        None => {
            return Err(TranslateError::InvalidPipeline(
                "empty command list".to_string(),
            ))
        }
    }

    if let Some(extra) = commands.iter().skip(1).find(|c| c.is_source()) {
        return Err(TranslateError::InvalidPipeline(format!(
            "second source command {}",
            extra.keyword()
        )));
    }
    Ok(())
}

pub fn render(commands: &[Command]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(COMMAND_SEPARATOR)
}

pub fn assemble(ir: QueryIr) -> Result<CompiledQuery, TranslateError> {
    validate(&ir.commands)?;

    let params = match ir.mode {
        ParameterMode::Inline => Vec::new(),
        ParameterMode::Parameterized => ir.params.into_vec(),
    };

    Ok(CompiledQuery {
        text: render(&ir.commands),
        params,
        result_type: ir.result_type,
        cardinality: ir.cardinality,
    })
}

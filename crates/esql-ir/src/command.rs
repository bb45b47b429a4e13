//! Command nodes of the rendered pipeline
//!
//! Each [`Command`] is one stage of the output query. Translators append
//! commands to a [`QueryIr`]; the assembler validates and renders them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::{ParameterMode, ParameterTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// `name = expression`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub expression: String,
}

impl Assignment {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.expression)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub source: String,
    pub target: String,
}

impl fmt::Display for RenamePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.source, self.target)
    }
}

/// Grouping key of a STATS command, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByField {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl fmt::Display for ByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) if *alias != self.expression => {
                write!(f, "{} = {}", alias, self.expression)
            }
            _ => f.write_str(&self.expression),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nulls: Option<NullsOrder>,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        if self.direction == SortDirection::Descending {
            f.write_str(" DESC")?;
        }
        match self.nulls {
            Some(NullsOrder::First) => f.write_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => f.write_str(" NULLS LAST"),
            None => Ok(()),
        }
    }
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    From {
        pattern: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        metadata: Vec<String>,
    },
    Row {
        assignments: Vec<Assignment>,
    },
    Where {
        condition: String,
    },
    Keep {
        fields: Vec<String>,
    },
    Drop {
        fields: Vec<String>,
    },
    Rename {
        pairs: Vec<RenamePair>,
    },
    Eval {
        assignments: Vec<Assignment>,
    },
    Stats {
        aggregations: Vec<Assignment>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        by: Vec<ByField>,
    },
    Sort {
        fields: Vec<SortField>,
    },
    Limit {
        count: u64,
    },
    LookupJoin {
        index: String,
        on: String,
    },
    Completion {
        /// Rendered prompt: a field name or a quoted literal
        prompt: String,
        inference_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
}

impl Command {
    /// `FROM` and `ROW` start a pipeline.
    pub fn is_source(&self) -> bool {
        matches!(self, Command::From { .. } | Command::Row { .. })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Command::From { .. } => "FROM",
            Command::Row { .. } => "ROW",
            Command::Where { .. } => "WHERE",
            Command::Keep { .. } => "KEEP",
            Command::Drop { .. } => "DROP",
            Command::Rename { .. } => "RENAME",
            Command::Eval { .. } => "EVAL",
            Command::Stats { .. } => "STATS",
            Command::Sort { .. } => "SORT",
            Command::Limit { .. } => "LIMIT",
            Command::LookupJoin { .. } => "LOOKUP JOIN",
            Command::Completion { .. } => "COMPLETION",
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.keyword();
        match self {
            Command::From { pattern, metadata } => {
                write!(f, "{} {}", keyword, pattern)?;
                if !metadata.is_empty() {
                    write!(f, " METADATA {}", metadata.join(", "))?;
                }
                Ok(())
            }
            Command::Row { assignments } => write!(f, "{} {}", keyword, join(assignments)),
            Command::Where { condition } => write!(f, "{} {}", keyword, condition),
            Command::Keep { fields } | Command::Drop { fields } => {
                write!(f, "{} {}", keyword, fields.join(", "))
            }
            Command::Rename { pairs } => write!(f, "{} {}", keyword, join(pairs)),
            Command::Eval { assignments } => write!(f, "{} {}", keyword, join(assignments)),
            Command::Stats { aggregations, by } => {
                write!(f, "{} {}", keyword, join(aggregations))?;
                if !by.is_empty() {
                    write!(f, " BY {}", join(by))?;
                }
                Ok(())
            }
            Command::Sort { fields } => write!(f, "{} {}", keyword, join(fields)),
            Command::Limit { count } => write!(f, "{} {}", keyword, count),
            Command::LookupJoin { index, on } => write!(f, "{} {} ON {}", keyword, index, on),
            Command::Completion {
                prompt,
                inference_id,
                output,
            } => {
                f.write_str(keyword)?;
                match output {
                    Some(column) => write!(f, " {} = {}", column, prompt)?,
                    None => write!(f, " {}", prompt)?,
                }
                // The options block is a JSON map
                let id = serde_json::Value::String(inference_id.clone());
                write!(f, " WITH {{ \"inference_id\": {} }}", id)
            }
        }
    }
}

/// Multiplicity the caller expects from the result rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    #[default]
    Many,
    First,
    FirstOrDefault,
    Single,
    SingleOrDefault,
}

/// Commands plus the state collected while translating one operation chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIr {
    pub commands: Vec<Command>,
    /// Element type of the result rows, set from the source
    pub result_type: Option<String>,
    pub params: ParameterTable,
    pub mode: ParameterMode,
    pub cardinality: Cardinality,
}

impl QueryIr {
    pub fn new(mode: ParameterMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn last_mut(&mut self) -> Option<&mut Command> {
        self.commands.last_mut()
    }

    pub fn source(&self) -> Option<&Command> {
        self.commands.first().filter(|c| c.is_source())
    }
}

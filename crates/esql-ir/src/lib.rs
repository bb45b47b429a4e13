//! ES|QL query IR
//!
//! Typed operation chain captured from the query builder, the command
//! model the translators produce, and the parameter table collected along
//! the way. All types serialize deterministically for caching.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod command;
mod expr;
mod params;
mod types;

pub use command::*;
pub use expr::*;
pub use params::*;
pub use types::*;

/// Source + chain of operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub source: Source,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<Operation>,
}

impl Pipeline {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            ops: Vec::new(),
        }
    }

    /// Calculate fingerprint (SHA-256) for deterministic caching
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("IR should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// No operations beyond the source.
    pub fn is_bare_source(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Source {
    From {
        pattern: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        metadata: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_type: Option<String>,
    },
    Row {
        assignments: Vec<RowAssignment>,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_type: Option<String>,
    },
}

impl Source {
    pub fn document_type(&self) -> Option<&str> {
        match self {
            Source::From { document_type, .. } | Source::Row { document_type, .. } => {
                document_type.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAssignment {
    pub name: String,
    pub value: Expr,
}

/// Pipeline operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Operation {
    Where {
        predicate: Expr,
    },
    Select {
        projection: Expr,
    },
    GroupBy {
        key: Expr,
        /// Projection over the grouped rows, if one followed
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Expr>,
    },
    OrderBy {
        key: Expr,
        #[serde(default)]
        direction: SortDirection,
        #[serde(skip_serializing_if = "Option::is_none")]
        nulls: Option<NullsOrder>,
        /// Secondary key extending the preceding ordering
        #[serde(default)]
        then: bool,
    },
    Take {
        count: Expr,
    },
    Skip {
        count: Expr,
    },
    Keep {
        fields: Vec<Expr>,
    },
    Drop {
        fields: Vec<Expr>,
    },
    LookupJoin {
        lookup: Box<Pipeline>,
        outer_key: Expr,
        inner_key: Expr,
    },
    Completion {
        prompt: Expr,
        inference_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    Terminal {
        kind: Terminal,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Where { .. } => "where",
            Operation::Select { .. } => "select",
            Operation::GroupBy { .. } => "group_by",
            Operation::OrderBy { then: false, .. } => "order_by",
            Operation::OrderBy { then: true, .. } => "then_by",
            Operation::Take { .. } => "take",
            Operation::Skip { .. } => "skip",
            Operation::Keep { .. } => "keep",
            Operation::Drop { .. } => "drop",
            Operation::LookupJoin { .. } => "lookup_join",
            Operation::Completion { .. } => "completion",
            Operation::Terminal { .. } => "terminal",
        }
    }
}

/// Result-shaping calls that end a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    First,
    FirstOrDefault,
    Single,
    SingleOrDefault,
    Count,
}

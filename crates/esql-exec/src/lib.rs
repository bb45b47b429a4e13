//! Execution boundary for compiled ES|QL
//!
//! The compiler never talks to the backing store. This crate defines the
//! request and response shapes of the `_query` endpoint, the
//! [`QueryExecutor`] trait a transport implements, and [`fetch`], which runs
//! a compiled query and enforces the multiplicity it was compiled for.

use async_trait::async_trait;
use esql_compile::CompiledQuery;
use esql_ir::Cardinality;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Expected {expected}, got {actual} rows")]
    Multiplicity { expected: &'static str, actual: usize },

    #[error("Query returned no rows")]
    Empty,

    #[error("Response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Per-query options sent alongside the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Column-major `values` in the response
    #[serde(default)]
    pub columnar: bool,
    #[serde(default)]
    pub profile: bool,
}

/// Body of a `_query` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<serde_json::Value>,
    #[serde(flatten)]
    pub options: QueryOptions,
}

impl QueryRequest {
    pub fn new(compiled: &CompiledQuery, options: QueryOptions) -> Self {
        Self {
            query: compiled.text.clone(),
            params: compiled.params_json(),
            options,
        }
    }

    pub fn to_json(&self) -> Result<String, ExecutionError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Body of a `_query` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub columns: Vec<Column>,
    pub values: Vec<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub took: Option<u64>,
    /// Layout of `values`, taken from the request
    #[serde(skip)]
    pub columnar: bool,
}

impl QueryResponse {
    pub fn from_json(body: &str) -> Result<Self, ExecutionError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn row_count(&self) -> usize {
        if self.columnar {
            self.values.first().map(Vec::len).unwrap_or(0)
        } else {
            self.values.len()
        }
    }

    /// Rows keyed by column name.
    pub fn rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        (0..self.row_count())
            .map(|r| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(c, column)| {
                        let cell = if self.columnar {
                            self.values.get(c).and_then(|col| col.get(r))
                        } else {
                            self.values.get(r).and_then(|row| row.get(c))
                        };
                        (
                            column.name.clone(),
                            cell.cloned().unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect()
            })
            .collect()
    }

    fn truncate(&mut self, rows: usize) {
        if self.columnar {
            for column in &mut self.values {
                column.truncate(rows);
            }
        } else {
            self.values.truncate(rows);
        }
    }
}

/// Transport that submits a request to the backing store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: QueryRequest) -> Result<QueryResponse, ExecutionError>;
}

/// Run a compiled query and enforce the multiplicity it was compiled for.
pub async fn fetch(
    executor: &dyn QueryExecutor,
    compiled: &CompiledQuery,
    options: QueryOptions,
) -> Result<QueryResponse, ExecutionError> {
    let columnar = options.columnar;
    let request = QueryRequest::new(compiled, options);
    debug!(
        query = %request.query,
        params = request.params.len(),
        cardinality = ?compiled.cardinality,
        "Executing query"
    );

    let mut response = executor.execute(request).await?;
    response.columnar = columnar;
    let rows = response.row_count();

    match compiled.cardinality {
        Cardinality::Many | Cardinality::FirstOrDefault => {}
        Cardinality::First if rows == 0 => return Err(ExecutionError::Empty),
        Cardinality::First => {}
        Cardinality::Single if rows == 0 => return Err(ExecutionError::Empty),
        Cardinality::Single | Cardinality::SingleOrDefault if rows > 1 => {
            return Err(ExecutionError::Multiplicity {
                expected: "at most one row",
                actual: rows,
            })
        }
        Cardinality::Single | Cardinality::SingleOrDefault => {}
    }

    if compiled.cardinality != Cardinality::Many {
        response.truncate(1);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_ir::{Parameter, Value};

    fn compiled() -> CompiledQuery {
        CompiledQuery {
            text: "FROM logs-*\n| WHERE status > ?threshold".to_string(),
            params: vec![Parameter {
                name: "threshold".to_string(),
                value: Value::Int(500),
            }],
            result_type: None,
            cardinality: Cardinality::Many,
        }
    }

    #[test]
    fn test_request_body() {
        let options = QueryOptions {
            time_zone: Some("Europe/Paris".to_string()),
            ..QueryOptions::default()
        };
        let request = QueryRequest::new(&compiled(), options);

        let body: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "query": "FROM logs-*\n| WHERE status > ?threshold",
                "params": [{"threshold": 500}],
                "time_zone": "Europe/Paris",
                "columnar": false,
                "profile": false,
            })
        );
    }

    #[test]
    fn test_response_rows() {
        let body = r#"{
            "took": 12,
            "columns": [{"name": "level", "type": "keyword"}, {"name": "count", "type": "long"}],
            "values": [["Error", 3], ["Info", 10]]
        }"#;
        let response = QueryResponse::from_json(body).unwrap();

        assert_eq!(response.row_count(), 2);
        let rows = response.rows();
        assert_eq!(rows[1]["level"], serde_json::json!("Info"));
        assert_eq!(rows[0]["count"], serde_json::json!(3));
    }

    #[test]
    fn test_columnar_rows() {
        let mut response = QueryResponse::from_json(
            r#"{"columns": [{"name": "a", "type": "long"}], "values": [[1, 2, 3]]}"#,
        )
        .unwrap();
        response.columnar = true;

        assert_eq!(response.row_count(), 3);
        assert_eq!(response.rows()[2]["a"], serde_json::json!(3));
    }

    #[test]
    fn test_decode_error() {
        assert!(matches!(
            QueryResponse::from_json("not json"),
            Err(ExecutionError::Decode(_))
        ));
    }
}

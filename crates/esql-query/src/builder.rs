//! Fluent query builder
//!
//! Each call appends one [`Operation`] to the chain; nothing is translated
//! until [`Query::compile`] or [`Query::to_esql`].

use esql_compile::{CompiledQuery, Compiler, FieldMetadata, TranslateError};
use esql_exec::{QueryExecutor, QueryOptions, QueryResponse};
use esql_ir::{
    Expr, NullsOrder, Operation, Pipeline, RowAssignment, SortDirection, Source, Terminal,
};
use crate::{log_event, QueryError};

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pipeline: Pipeline,
}

impl Query {
    /// `FROM pattern`
    #[allow(clippy::should_implement_trait)]
    pub fn from(pattern: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(Source::From {
                pattern: pattern.into(),
                metadata: Vec::new(),
                document_type: None,
            }),
        }
    }

    /// `ROW a = 1, b = "x"`
    pub fn row<I, S, E>(assignments: I) -> Self
    where
        I: IntoIterator<Item = (S, E)>,
        S: Into<String>,
        E: Into<Expr>,
    {
        let assignments = assignments
            .into_iter()
            .map(|(name, value)| RowAssignment {
                name: name.into(),
                value: value.into(),
            })
            .collect();
        Self {
            pipeline: Pipeline::new(Source::Row {
                assignments,
                document_type: None,
            }),
        }
    }

    /// Metadata fields requested on a `FROM` source. Ignored on `ROW`.
    pub fn metadata<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Source::From { metadata, .. } = &mut self.pipeline.source {
            metadata.extend(fields.into_iter().map(Into::into));
        }
        self
    }

    /// Document type whose members the source rows carry.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        let type_name = Some(type_name.into());
        match &mut self.pipeline.source {
            Source::From { document_type, .. } | Source::Row { document_type, .. } => {
                *document_type = type_name
            }
        }
        self
    }

    fn push(mut self, op: Operation) -> Self {
        self.pipeline.ops.push(op);
        self
    }

    pub fn filter(self, predicate: impl Into<Expr>) -> Self {
        self.push(Operation::Where {
            predicate: predicate.into(),
        })
    }

    pub fn select(self, projection: impl Into<Expr>) -> Self {
        self.push(Operation::Select {
            projection: projection.into(),
        })
    }

    pub fn group_by(self, key: impl Into<Expr>) -> GroupedQuery {
        GroupedQuery {
            query: self,
            key: key.into(),
        }
    }

    fn order(self, key: Expr, direction: SortDirection, then: bool) -> Self {
        self.push(Operation::OrderBy {
            key,
            direction,
            nulls: None,
            then,
        })
    }

    pub fn order_by(self, key: impl Into<Expr>) -> Self {
        self.order(key.into(), SortDirection::Ascending, false)
    }

    pub fn order_by_descending(self, key: impl Into<Expr>) -> Self {
        self.order(key.into(), SortDirection::Descending, false)
    }

    pub fn then_by(self, key: impl Into<Expr>) -> Self {
        self.order(key.into(), SortDirection::Ascending, true)
    }

    pub fn then_by_descending(self, key: impl Into<Expr>) -> Self {
        self.order(key.into(), SortDirection::Descending, true)
    }

    /// Null placement for the most recent ordering key.
    pub fn nulls(mut self, order: NullsOrder) -> Self {
        if let Some(Operation::OrderBy { nulls, .. }) = self.pipeline.ops.last_mut() {
            *nulls = Some(order);
        }
        self
    }

    pub fn take(self, count: impl Into<Expr>) -> Self {
        self.push(Operation::Take {
            count: count.into(),
        })
    }

    pub fn skip(self, count: impl Into<Expr>) -> Self {
        self.push(Operation::Skip {
            count: count.into(),
        })
    }

    pub fn keep<I, E>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.push(Operation::Keep {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    pub fn drop<I, E>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.push(Operation::Drop {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    /// `LOOKUP JOIN` against the index `lookup` reads from.
    pub fn lookup_join(
        self,
        lookup: Query,
        outer_key: impl Into<Expr>,
        inner_key: impl Into<Expr>,
    ) -> Self {
        self.push(Operation::LookupJoin {
            lookup: Box::new(lookup.pipeline),
            outer_key: outer_key.into(),
            inner_key: inner_key.into(),
        })
    }

    pub fn completion(
        self,
        prompt: impl Into<Expr>,
        inference_id: impl Into<String>,
        output: Option<&str>,
    ) -> Self {
        self.push(Operation::Completion {
            prompt: prompt.into(),
            inference_id: inference_id.into(),
            output: output.map(str::to_string),
        })
    }

    fn terminal(self, kind: Terminal) -> Self {
        self.push(Operation::Terminal { kind })
    }

    pub fn first(self) -> Self {
        self.terminal(Terminal::First)
    }

    pub fn first_or_default(self) -> Self {
        self.terminal(Terminal::FirstOrDefault)
    }

    pub fn single(self) -> Self {
        self.terminal(Terminal::Single)
    }

    pub fn single_or_default(self) -> Self {
        self.terminal(Terminal::SingleOrDefault)
    }

    pub fn count(self) -> Self {
        self.terminal(Terminal::Count)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }

    pub fn compile(&self, compiler: &Compiler<'_>) -> Result<CompiledQuery, TranslateError> {
        compiler.compile(&self.pipeline)
    }

    /// Inline-mode text with default options.
    pub fn to_esql(&self, metadata: &dyn FieldMetadata) -> Result<String, TranslateError> {
        Ok(Compiler::new(metadata).compile(&self.pipeline)?.text)
    }

    /// Compile and run through `executor`.
    pub async fn fetch(
        &self,
        compiler: &Compiler<'_>,
        executor: &dyn QueryExecutor,
        options: QueryOptions,
    ) -> Result<QueryResponse, QueryError> {
        let compiled = self.compile(compiler)?;
        let response = esql_exec::fetch(executor, &compiled, options).await?;
        log_event!(
            level: tracing::Level::DEBUG,
            event: "query_fetched",
            rows: response.row_count(),
            took: response.took,
            fingerprint: compiled.fingerprint()
        );
        Ok(response)
    }
}

impl From<Query> for Pipeline {
    fn from(query: Query) -> Self {
        query.pipeline
    }
}

/// A query waiting for the projection over its groups.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedQuery {
    query: Query,
    key: Expr,
}

impl GroupedQuery {
    pub fn select(self, result: impl Into<Expr>) -> Query {
        self.query.push(Operation::GroupBy {
            key: self.key,
            result: Some(result.into()),
        })
    }

    /// Group without a projection; the rows become `count = COUNT(*)`.
    pub fn into_query(self) -> Query {
        self.query.push(Operation::GroupBy {
            key: self.key,
            result: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esql_ir::{Member, ValueType};

    fn level() -> Expr {
        Member::new("Log", "Level", ValueType::Keyword).into()
    }

    #[test]
    fn test_chain_records_operations_in_order() {
        let query = Query::from("logs-*")
            .of_type("Log")
            .filter(level().equals("Error"))
            .order_by(level())
            .then_by_descending(level())
            .take(10);

        let names: Vec<_> = query.pipeline().ops.iter().map(Operation::name).collect();
        assert_eq!(names, ["where", "order_by", "then_by", "take"]);
        assert_eq!(query.pipeline().source.document_type(), Some("Log"));
    }

    #[test]
    fn test_metadata_only_on_from() {
        let query = Query::from("logs-*").metadata(["_id", "_score"]);
        assert!(matches!(
            &query.pipeline().source,
            Source::From { metadata, .. } if metadata == &["_id", "_score"]
        ));

        let row = Query::row([("a", 1)]).metadata(["_id"]);
        assert!(matches!(row.pipeline().source, Source::Row { .. }));
    }

    #[test]
    fn test_nulls_applies_to_last_ordering() {
        let query = Query::from("logs-*")
            .order_by_descending(level())
            .nulls(NullsOrder::Last);

        assert!(matches!(
            query.pipeline().ops.last(),
            Some(Operation::OrderBy {
                nulls: Some(NullsOrder::Last),
                direction: SortDirection::Descending,
                ..
            })
        ));
    }

    #[test]
    fn test_group_by_without_projection() {
        let query = Query::from("logs-*").group_by(level()).into_query();
        assert!(matches!(
            query.pipeline().ops.last(),
            Some(Operation::GroupBy { result: None, .. })
        ));
    }
}

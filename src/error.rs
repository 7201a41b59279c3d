use thiserror::Error;

use crate::{
    binder::BindError, executor::ExecutionError, parser::ParseError, resolver::ResolveError,
};

/// Errors raised by the query builder and by materialization.
///
/// The two builder errors are raised synchronously by the offending
/// [`include`](crate::Query::include) or [`select`](crate::Query::select)
/// call, never deferred until the query runs.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid include expression `{expression}`: {source}")]
    InvalidIncludeExpression {
        expression: String,
        #[source]
        source: ResolveError,
    },

    #[error("invalid select expression `{expression}`: {reason}")]
    InvalidSelectExpression {
        expression: String,
        reason: &'static str,
    },

    #[error("could not parse projection: {0}")]
    Parse(#[from] ParseError),

    #[error("query execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("could not apply selector to row {row}: {source}")]
    Binding {
        row: usize,
        #[source]
        source: BindError,
    },

    #[error("could not deserialize row {row}: {source}")]
    Deserialize {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("query `{query}` returned no rows")]
    EmptyResult { query: String },
}

//! Run a query against rows supplied as JSON

use std::sync::Arc;

use super::{CliError, QueryOptions};
use crate::{context::Context, executor::StaticExecutor};

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub query: QueryOptions,
    /// JSON rows: an array is one row per element
    pub rows: Option<String>,
}

/// Builds the query, serves `rows` through a [`StaticExecutor`] and returns
/// the materialized result: one value for an item query, an array for a
/// collection.
pub fn execute_run(options: &RunOptions) -> Result<serde_json::Value, CliError> {
    let rows = options.rows.as_deref().ok_or(CliError::NoInput)?;
    let executor = StaticExecutor::from_json_str(rows)?;
    let context = Context::new(options.query.config.clone())
        .with_executor(Arc::new(executor))
        .shared();

    let query = &options.query;
    let arguments = query.arguments()?;
    let output = if query.item {
        query
            .build(context.item_with(query.name.as_str(), arguments))?
            .to_item()?
    } else {
        let items = query
            .build(context.collection_with(query.name.as_str(), arguments))?
            .to_vec()?;
        serde_json::Value::Array(items)
    };
    Ok(output)
}

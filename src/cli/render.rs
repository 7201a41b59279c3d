//! Build a query from command-line options and render its document

use std::sync::Arc;

use super::{CliError, parse_argument};
use crate::{
    context::{Context, ContextConfig},
    document::{Arguments, Document},
    query::{Family, Query},
};

/// Options shared by the render and run commands
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Root field name
    pub name: String,
    /// Build a single-result query instead of a collection
    pub item: bool,
    /// Raw `NAME=VALUE` arguments
    pub arguments: Vec<String>,
    /// Include expressions, applied in order
    pub includes: Vec<String>,
    /// Selector expression
    pub select: Option<String>,
    pub config: ContextConfig,
}

impl QueryOptions {
    pub(super) fn arguments(&self) -> Result<Arguments, CliError> {
        self.arguments.iter().map(|raw| parse_argument(raw)).collect()
    }

    /// Applies the includes and the selector to a fresh node.
    pub(super) fn build<F: Family>(
        &self,
        query: Query<serde_json::Value, F>,
    ) -> Result<Query<serde_json::Value, F>, CliError> {
        let mut query = query;
        for include in &self.includes {
            query = query.include(include)?;
        }
        if let Some(select) = &self.select {
            query = query.select(select)?;
        }
        Ok(query)
    }
}

/// Result of a render operation
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    pub document: Document,
}

pub fn execute_render(options: &QueryOptions) -> Result<RenderOutput, CliError> {
    let context = Context::new(options.config.clone()).shared();
    let document = render_with(&context, options)?;
    Ok(RenderOutput { document })
}

fn render_with(context: &Arc<Context>, options: &QueryOptions) -> Result<Document, CliError> {
    let arguments = options.arguments()?;
    let document = if options.item {
        let query = options.build(context.item_with(options.name.as_str(), arguments))?;
        query.document().clone()
    } else {
        let query = options.build(context.collection_with(options.name.as_str(), arguments))?;
        query.document().clone()
    };
    Ok(document)
}

//! Resolve include expressions to paths

use super::CliError;
use crate::{
    operators::OperatorRegistry,
    parser::parse,
    resolver::{IncludePath, build_include},
};

/// Options for the resolve command
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Include expression, e.g. `x => x.Comments.Take(5)`
    pub expression: String,
}

/// Resolves one include expression against the standard operators.
pub fn execute_resolve(options: &ResolveOptions) -> Result<IncludePath, CliError> {
    let expr = parse(&options.expression)?;
    Ok(build_include(&expr, &OperatorRegistry::standard())?)
}

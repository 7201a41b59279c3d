//! CLI support for navql
//!
//! Provides programmatic access to the `resolve`, `render` and `run`
//! commands so other tools can embed them.

mod render;
mod resolve;
mod run;

pub use render::{QueryOptions, RenderOutput, execute_render};
pub use resolve::{ResolveOptions, execute_resolve};
pub use run::{RunOptions, execute_run};

use std::{fs, io, path::Path};

use thiserror::Error;

use crate::{
    context::ContextConfig, document::FieldNaming, error::QueryError, parser::ParseError,
    resolver::ResolveError,
};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid include expression: {0}")]
    Resolve(#[from] ResolveError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid argument `{0}`; expected NAME=VALUE")]
    InvalidArgument(String),

    #[error("no rows provided. Use --rows or pipe JSON to stdin.")]
    NoInput,
}

/// Loads a [`ContextConfig`] from a JSON file, or the default when no path
/// is given. `camel_case` forces [`FieldNaming::CamelCase`].
pub fn load_config(path: Option<&Path>, camel_case: bool) -> Result<ContextConfig, CliError> {
    let mut config = match path {
        Some(path) => ContextConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => ContextConfig::default(),
    };
    if camel_case {
        config.field_naming = FieldNaming::CamelCase;
    }
    Ok(config)
}

/// Splits `NAME=VALUE`. The value is read as JSON when it parses, and as a
/// plain string otherwise, so `first=10` binds an integer and `tag=rust` a
/// string.
pub fn parse_argument(raw: &str) -> Result<(String, serde_json::Value), CliError> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| CliError::InvalidArgument(raw.to_string()))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_argument() {
        assert_eq!(
            parse_argument("first=10").unwrap(),
            ("first".to_string(), serde_json::json!(10))
        );
        assert_eq!(
            parse_argument("tag=rust").unwrap(),
            ("tag".to_string(), serde_json::json!("rust"))
        );
        assert!(matches!(
            parse_argument("=5"),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_argument("novalue"),
            Err(CliError::InvalidArgument(_))
        ));
    }
}

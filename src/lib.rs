//! Navigation-path resolution and immutable query building for a
//! GraphQL-style backend.
//!
//! Include and select projections are lambdas over a row, written as text
//! (`x => x.Comments.Take(5)`) or built with the [`ast`] helpers. Include
//! projections are resolved to dotted paths plus the operators applied along
//! them; select projections are stored and applied to every returned row.
//!
//! ```
//! use navql::{Context, ContextConfig, StaticExecutor};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let executor = StaticExecutor::new(vec![json!({ "Title": "Hello", "Votes": 3 })]);
//! let context = Context::new(ContextConfig::default())
//!     .with_executor(Arc::new(executor))
//!     .shared();
//!
//! let titles = context
//!     .collection::<serde_json::Value>("posts")
//!     .include("x => x.Comments.Take(5)")
//!     .unwrap()
//!     .select::<String>("p => p.Title")
//!     .unwrap();
//!
//! assert_eq!(titles.to_vec().unwrap(), vec!["Hello".to_string()]);
//! assert!(titles.query_text().contains("Comments(take: 5)"));
//! ```

pub mod ast;
pub mod binder;
pub mod cli;
pub mod context;
pub mod document;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod query;
pub mod resolver;
pub mod value;

pub use ast::{BinOp, Expr, Lambda, Literal, Token};
pub use binder::{BindError, Binder};
pub use context::{Context, ContextConfig};
pub use document::{
    Arguments, Document, DocumentGenerator, DocumentRequest, FieldNaming, GraphQlGenerator,
};
pub use error::QueryError;
pub use executor::{ExecutionError, Executor, RowStream, StaticExecutor, UnconfiguredExecutor};
pub use lexer::{LexError, Lexer, Position};
pub use operators::{IncludeOperator, OperatorRegistry, RegistryError};
pub use parser::{ParseError, Parser, parse, parse_lambda};
pub use query::{
    Collection, CollectionQuery, Family, IntoProjection, Item, ItemQuery, Query, QueryKind, Rows,
};
pub use resolver::{IncludePath, MethodInclude, ResolveError, build_include, resolve};
pub use value::Value;

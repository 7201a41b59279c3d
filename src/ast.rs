//! # navql - Projection Expression AST
//!
//! This module defines the Abstract Syntax Tree for projection lambdas, the
//! expressions callers hand to [`Query::include`](crate::Query::include) and
//! [`Query::select`](crate::Query::select).
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, member access, calls, lambdas)
//! - **[operators]** - Binary operators (comparison, arithmetic, logical)
//!
//! ## Quick Start
//!
//! ```text
//! x => x.Author.Books
//! x => x.Comments.Take(5)
//! p => { title: p.Title, authors: p.Authors.Select(a => a.Name) }
//! ```
//!
//! ## Core Concepts
//!
//! ### Lambdas are data
//!
//! A projection is never evaluated while a query is being built. Include
//! expressions are walked by the [resolver](crate::resolver) to produce
//! dotted paths; select expressions are stored untouched and only interpreted
//! by the [binder](crate::binder) once rows come back.
//!
//! ### Programmatic construction
//!
//! Every expression can also be built without parsing:
//!
//! ```
//! use navql::ast::{Expr, Lambda};
//!
//! let include = Lambda::new("x", Expr::param("x").field("Comments").call("Take", vec![Expr::Integer(5)]));
//! assert_eq!(include.to_string(), "x => x.Comments.Take(5)");
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Lambda, Literal};
pub use operators::BinOp;
pub use tokens::Token;

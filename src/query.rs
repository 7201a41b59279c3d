//! Immutable query nodes.
//!
//! A [`Query`] describes a root field, its bound arguments, the nested
//! include paths to fetch, and an optional selector applied to each returned
//! row. Every builder call returns a new node; the receiver is never
//! modified. The document is generated lazily, at most once per node.
//!
//! # Examples
//!
//! ```
//! use navql::{Context, ContextConfig};
//!
//! struct Post;
//!
//! let context = Context::new(ContextConfig::default()).shared();
//! let posts = context.collection::<Post>("posts");
//! let with_comments = posts.include("x => x.Comments.Take(5)").unwrap();
//!
//! assert!(posts.includes().is_empty());
//! assert_eq!(with_comments.includes()[0].path.as_deref(), Some("Comments.Take"));
//! ```

use std::{
    collections::BTreeSet,
    fmt,
    marker::PhantomData,
    sync::{Arc, OnceLock},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, trace};

use crate::{
    ast::{Expr, Lambda},
    binder::Binder,
    context::Context,
    document::{Arguments, Document, DocumentRequest},
    error::QueryError,
    executor::RowStream,
    parser::{ParseError, parse},
    resolver::{IncludePath, build_include},
};

/// Whether a query materializes to one row or to a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Item,
    Collection,
}

/// Marker for a query family; the associated tag travels with every node of
/// the family and is handed to the generator and executor.
pub trait Family: Send + Sync + 'static {
    const KIND: QueryKind;
}

/// Single-result family.
#[derive(Debug)]
pub enum Item {}

/// Multi-result family.
#[derive(Debug)]
pub enum Collection {}

impl Family for Item {
    const KIND: QueryKind = QueryKind::Item;
}

impl Family for Collection {
    const KIND: QueryKind = QueryKind::Collection;
}

pub type ItemQuery<T> = Query<T, Item>;
pub type CollectionQuery<T> = Query<T, Collection>;

/// Anything that can stand for a projection lambda: an AST or source text.
pub trait IntoProjection {
    fn into_projection(self) -> Result<Expr, ParseError>;
}

impl IntoProjection for Expr {
    fn into_projection(self) -> Result<Expr, ParseError> {
        Ok(self)
    }
}

impl IntoProjection for Lambda {
    fn into_projection(self) -> Result<Expr, ParseError> {
        Ok(Expr::Lambda(self))
    }
}

impl IntoProjection for &str {
    fn into_projection(self) -> Result<Expr, ParseError> {
        parse(self)
    }
}

impl IntoProjection for String {
    fn into_projection(self) -> Result<Expr, ParseError> {
        parse(&self)
    }
}

impl IntoProjection for &String {
    fn into_projection(self) -> Result<Expr, ParseError> {
        parse(self)
    }
}

pub struct Query<T, F> {
    context: Arc<Context>,
    name: Arc<str>,
    arguments: Arc<Arguments>,
    selector: Option<Arc<Lambda>>,
    includes: Vec<IncludePath>,
    document: OnceLock<Document>,
    _marker: PhantomData<fn() -> (T, F)>,
}

impl<T, F: Family> Query<T, F> {
    pub(crate) fn new(context: Arc<Context>, name: String, arguments: Arguments) -> Self {
        Query {
            context,
            name: name.into(),
            arguments: Arc::new(arguments),
            selector: None,
            includes: vec![],
            document: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Builds a node of this family over `R`, sharing context, name and
    /// arguments with `self`.
    fn derive<R>(&self, selector: Option<Arc<Lambda>>, includes: Vec<IncludePath>) -> Query<R, F> {
        Query {
            context: Arc::clone(&self.context),
            name: Arc::clone(&self.name),
            arguments: Arc::clone(&self.arguments),
            selector,
            includes,
            document: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// A node of the same family declared over `R`. Context, name, arguments
    /// and selector are shared; the include list is copied.
    pub fn clone_as<R>(&self) -> Query<R, F> {
        trace!(query = %self.name, kind = ?F::KIND, "cloning query node");
        self.derive(self.selector.clone(), self.includes.clone())
    }

    /// Adds a nested include path.
    ///
    /// The projection must be a single-parameter lambda made of field
    /// accesses, `Select` projections over nested collections, and
    /// registered include operators with literal arguments.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidIncludeExpression`] when the expression does not
    /// resolve to a path; [`QueryError::Parse`] when source text does not
    /// parse. `self` is unchanged either way.
    pub fn include(&self, projection: impl IntoProjection) -> Result<Self, QueryError> {
        let expr = projection.into_projection()?;
        let resolved = build_include(&expr, self.context.operators()).map_err(|source| {
            QueryError::InvalidIncludeExpression {
                expression: expr.to_string(),
                source,
            }
        })?;

        debug!(
            query = %self.name,
            path = resolved.path.as_deref(),
            methods = resolved.methods.len(),
            "include resolved"
        );

        let mut includes = self.includes.clone();
        includes.push(resolved);
        Ok(self.derive(self.selector.clone(), includes))
    }

    /// Re-declares the node over the selector's result type `R`.
    ///
    /// The selector is stored, not evaluated; it runs against every row at
    /// materialization. Selecting from a node that already has a selector
    /// composes the two.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidSelectExpression`] unless the projection is a
    /// function literal with exactly one parameter.
    pub fn select<R>(&self, projection: impl IntoProjection) -> Result<Query<R, F>, QueryError> {
        let lambda = match projection.into_projection()? {
            Expr::Lambda(lambda) if lambda.params.len() == 1 => lambda,
            Expr::Lambda(lambda) => {
                return Err(QueryError::InvalidSelectExpression {
                    expression: lambda.to_string(),
                    reason: "a selector takes exactly one parameter",
                });
            }
            other => {
                return Err(QueryError::InvalidSelectExpression {
                    expression: other.to_string(),
                    reason: "expected a function literal such as `x => x.Field`",
                });
            }
        };

        let selector = match &self.selector {
            Some(previous) => compose(previous, &lambda),
            None => lambda,
        };
        debug!(query = %self.name, selector = %selector, "selector stored");

        Ok(self.derive(Some(Arc::new(selector)), self.includes.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> QueryKind {
        F::KIND
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn selector(&self) -> Option<&Lambda> {
        self.selector.as_deref()
    }

    pub fn includes(&self) -> &[IncludePath] {
        &self.includes
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// The generated document, computed on first use and cached for the
    /// lifetime of this node. Concurrent first callers block until it is
    /// ready.
    pub fn document(&self) -> &Document {
        self.document.get_or_init(|| {
            let request = DocumentRequest {
                name: &self.name,
                kind: F::KIND,
                arguments: &self.arguments,
                includes: &self.includes,
                selector: self.selector.as_deref(),
            };
            let document = self.context.generator().generate(&request);
            debug!(
                query = %self.name,
                variables = document.variables.len(),
                "generated query document"
            );
            document
        })
    }

    pub fn query_text(&self) -> &str {
        &self.document().text
    }

    pub fn variables(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.document().variables
    }
}

impl<T: DeserializeOwned, F: Family> Query<T, F> {
    /// Executes the document and streams its rows.
    fn rows(&self) -> Result<Rows<T>, QueryError> {
        let stream = self.context.executor().execute(self.document(), F::KIND)?;
        debug!(query = %self.name, kind = ?F::KIND, "executing query");
        Ok(Rows {
            stream,
            selector: self.selector.clone(),
            binder: Binder::new(),
            index: 0,
            _marker: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Query<T, Item> {
    /// Executes the query and returns its single result.
    ///
    /// # Errors
    ///
    /// [`QueryError::EmptyResult`] when the backend returns no rows, plus any
    /// execution, binding, or deserialization failure.
    pub fn to_item(&self) -> Result<T, QueryError> {
        self.rows()?.next().unwrap_or_else(|| {
            Err(QueryError::EmptyResult {
                query: self.name.to_string(),
            })
        })
    }
}

impl<T: DeserializeOwned> Query<T, Collection> {
    /// Executes the query and returns a lazy iterator over its results.
    /// Every call runs the query again.
    pub fn iter(&self) -> Result<Rows<T>, QueryError> {
        self.rows()
    }

    pub fn to_vec(&self) -> Result<Vec<T>, QueryError> {
        self.rows()?.collect()
    }
}

impl<T, F: Family> Clone for Query<T, F> {
    fn clone(&self) -> Self {
        self.clone_as()
    }
}

impl<T, F: Family> fmt::Display for Query<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_text())
    }
}

impl<T, F: Family> fmt::Debug for Query<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("name", &self.name)
            .field("kind", &F::KIND)
            .field("arguments", &self.arguments)
            .field("includes", &self.includes)
            .field("selector", &self.selector.as_ref().map(|s| s.to_string()))
            .finish()
    }
}

/// Materialized rows of a query, in backend order.
pub struct Rows<T> {
    stream: RowStream,
    selector: Option<Arc<Lambda>>,
    binder: Binder,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Rows<T> {
    fn materialize(&self, row: usize, raw: serde_json::Value) -> Result<T, QueryError> {
        let value = match &self.selector {
            Some(selector) => self
                .binder
                .bind_json(selector, raw)
                .map_err(|source| QueryError::Binding { row, source })?,
            None => raw,
        };
        trace!(row, "materialized row");
        serde_json::from_value(value).map_err(|source| QueryError::Deserialize { row, source })
    }
}

impl<T: DeserializeOwned> Iterator for Rows<T> {
    type Item = Result<T, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.stream.next()? {
            Ok(raw) => raw,
            Err(error) => return Some(Err(error.into())),
        };
        let row = self.index;
        self.index += 1;
        Some(self.materialize(row, raw))
    }
}

// ============================================================================
// Selector composition
// ============================================================================

/// `first` then `then`, as a single lambda over the raw row.
///
/// `first`'s parameter is renamed to a name unused in `then` before its body
/// is substituted for `then`'s parameter, so no nested lambda in `then` can
/// capture it.
fn compose(first: &Lambda, then: &Lambda) -> Lambda {
    let (Some(first_param), Some(then_param)) = (first.single_param(), then.single_param()) else {
        return then.clone();
    };

    let mut taken = BTreeSet::new();
    collect_names(&first.body, &mut taken);
    collect_names(&then.body, &mut taken);
    taken.insert(then_param.to_string());
    let mut fresh = format!("{first_param}_");
    while taken.contains(&fresh) {
        fresh.push('_');
    }

    let renamed = substitute(&first.body, first_param, &Expr::Identifier(fresh.clone()));
    let body = substitute(&then.body, then_param, &renamed);
    Lambda::new(fresh, body)
}

fn collect_names(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Identifier(name) => {
            names.insert(name.clone());
        }
        Expr::Member { object, .. } => collect_names(object, names),
        Expr::Index { object, index } => {
            collect_names(object, names);
            collect_names(index, names);
        }
        Expr::MethodCall { object, args, .. } => {
            collect_names(object, names);
            args.iter().for_each(|arg| collect_names(arg, names));
        }
        Expr::Lambda(lambda) => {
            names.extend(lambda.params.iter().cloned());
            collect_names(&lambda.body, names);
        }
        Expr::Not(operand) => collect_names(operand, names),
        Expr::BinaryOp { left, right, .. } => {
            collect_names(left, names);
            collect_names(right, names);
        }
        Expr::Object(pairs) => pairs.iter().for_each(|(_, v)| collect_names(v, names)),
        Expr::Array(items) => items.iter().for_each(|item| collect_names(item, names)),
        Expr::Float(_) | Expr::Integer(_) | Expr::String(_) | Expr::Boolean(_) | Expr::Null => {}
    }
}

/// Replaces free occurrences of `name` with `replacement`.
fn substitute(expr: &Expr, name: &str, replacement: &Expr) -> Expr {
    let sub = |e: &Expr| Box::new(substitute(e, name, replacement));
    match expr {
        Expr::Identifier(n) if n == name => replacement.clone(),
        Expr::Member { object, name: member } => Expr::Member {
            object: sub(object),
            name: member.clone(),
        },
        Expr::Index { object, index } => Expr::Index {
            object: sub(object),
            index: sub(index),
        },
        Expr::MethodCall {
            object,
            method,
            args,
        } => Expr::MethodCall {
            object: sub(object),
            method: method.clone(),
            args: args
                .iter()
                .map(|arg| substitute(arg, name, replacement))
                .collect(),
        },
        // Shadowed inside
        Expr::Lambda(lambda) if lambda.params.iter().any(|p| p == name) => expr.clone(),
        Expr::Lambda(lambda) => Expr::Lambda(Lambda {
            params: lambda.params.clone(),
            body: sub(&lambda.body),
        }),
        Expr::Not(operand) => Expr::Not(sub(operand)),
        Expr::BinaryOp { op, left, right } => Expr::BinaryOp {
            op: *op,
            left: sub(left),
            right: sub(right),
        },
        Expr::Object(pairs) => Expr::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), substitute(v, name, replacement)))
                .collect(),
        ),
        Expr::Array(items) => Expr::Array(
            items
                .iter()
                .map(|item| substitute(item, name, replacement))
                .collect(),
        ),
        Expr::Identifier(_)
        | Expr::Float(_)
        | Expr::Integer(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Null => expr.clone(),
    }
}

//! Include-path resolution.
//!
//! Turns the body of an include lambda into a dotted path plus the include
//! operators applied along it, without evaluating anything:
//!
//! ```text
//! x => x.Author.Books                    → "Author.Books", []
//! x => x.Comments.Take(5)                → "Comments.Take", [Take { count: 5 }]
//! x => x.Posts.Select(p => p.Tags)       → "Posts.Tags", []
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{Expr, Lambda, Literal},
    operators::{OperatorRegistry, PROJECTION_METHOD},
};

/// Why an include expression could not be turned into a path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("`{expression}` is not a field access, projection, or registered include operator")]
    Unsupported { expression: String },

    #[error("the expression never reaches a field")]
    UnresolvedRoot,

    #[error(
        "argument `{parameter}` of `{operator}` must be a literal, got `{expression}`"
    )]
    NonLiteralArgument {
        operator: String,
        parameter: String,
        expression: String,
    },

    #[error("`{operator}` takes {expected} argument(s), got {found}")]
    ArgumentCount {
        operator: String,
        expected: usize,
        found: usize,
    },

    #[error("expected a lambda expression")]
    NotALambda,

    #[error("expected a lambda with exactly one parameter, got {0}")]
    ParameterCount(usize),
}

/// One application of a registered include operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInclude {
    /// Registered operator name.
    pub operator: String,
    /// Declared parameter name → bound literal.
    pub arguments: BTreeMap<String, Literal>,
}

/// A resolved (or partially resolved) include chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IncludePath {
    /// Dotted member path; `None` while still at the lambda parameter.
    pub path: Option<String>,
    /// Operators along the path, most recently applied first.
    pub methods: Vec<MethodInclude>,
    /// `(segment index, method index)` for every operator segment of `path`.
    #[serde(skip)]
    placements: Vec<(usize, usize)>,
}

impl IncludePath {
    /// The unresolved chain root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path segments in source order (empty for the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.as_deref().into_iter().flat_map(|p| p.split('.'))
    }

    /// The operator applied at path segment `segment`, if that segment is an
    /// operator rather than a member.
    pub fn operator_at(&self, segment: usize) -> Option<&MethodInclude> {
        self.placements
            .iter()
            .find(|(at, _)| *at == segment)
            .and_then(|&(_, method)| self.methods.get(method))
    }

    fn extend(&self, name: &str) -> String {
        match &self.path {
            Some(path) => format!("{path}.{name}"),
            None => name.to_string(),
        }
    }
}

/// Resolve an include expression and require it to reach a field.
///
/// The expression must be a single-parameter lambda; anything that resolves
/// to the bare parameter (`x => x`) is rejected with
/// [`ResolveError::UnresolvedRoot`].
pub fn build_include(
    expr: &Expr,
    operators: &OperatorRegistry,
) -> Result<IncludePath, ResolveError> {
    let Expr::Lambda(lambda) = expr else {
        return Err(ResolveError::NotALambda);
    };
    let resolved = resolve(lambda, operators)?;
    if resolved.path.is_none() {
        return Err(ResolveError::UnresolvedRoot);
    }
    Ok(resolved)
}

/// Resolve the body of a single-parameter lambda.
pub fn resolve(lambda: &Lambda, operators: &OperatorRegistry) -> Result<IncludePath, ResolveError> {
    let param = lambda
        .single_param()
        .ok_or(ResolveError::ParameterCount(lambda.params.len()))?;
    resolve_expr(&lambda.body, param, operators)
}

fn unsupported(expr: &Expr) -> ResolveError {
    ResolveError::Unsupported {
        expression: expr.to_string(),
    }
}

fn resolve_expr(
    expr: &Expr,
    param: &str,
    operators: &OperatorRegistry,
) -> Result<IncludePath, ResolveError> {
    match expr {
        // The chain root adds no segment
        Expr::Identifier(name) if name == param => Ok(IncludePath::root()),

        Expr::Member { object, name } => {
            let source = resolve_expr(object, param, operators)?;
            Ok(IncludePath {
                path: Some(source.extend(name)),
                ..source
            })
        }

        Expr::MethodCall {
            object,
            method,
            args,
        } => match args.as_slice() {
            [Expr::Lambda(element)] if method == PROJECTION_METHOD => {
                resolve_projection(object, element, param, operators)
            }
            _ => resolve_operator(expr, object, method, args, param, operators),
        },

        // Captured variables, literals, arithmetic, construction: none name a path
        Expr::Identifier(_)
        | Expr::Float(_)
        | Expr::Integer(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Null
        | Expr::Index { .. }
        | Expr::Lambda(_)
        | Expr::Not(_)
        | Expr::BinaryOp { .. }
        | Expr::Object(_)
        | Expr::Array(_) => Err(unsupported(expr)),
    }
}

/// `source.Select(e => ...)`: both sides must name a field.
fn resolve_projection(
    source: &Expr,
    element: &Lambda,
    param: &str,
    operators: &OperatorRegistry,
) -> Result<IncludePath, ResolveError> {
    let source = resolve_expr(source, param, operators)?;
    let element = resolve(element, operators)?;

    let (Some(source_path), Some(element_path)) = (&source.path, &element.path) else {
        return Err(ResolveError::UnresolvedRoot);
    };

    let path = format!("{source_path}.{element_path}");
    let offset = source.segments().count();

    let mut methods = source.methods.clone();
    let mut merged = Vec::with_capacity(element.methods.len());
    for method in element.methods {
        let index = match methods.iter().position(|m| *m == method) {
            Some(index) => index,
            None => {
                methods.push(method);
                methods.len() - 1
            }
        };
        merged.push(index);
    }

    let mut placements = source.placements.clone();
    placements.extend(
        element
            .placements
            .iter()
            .filter_map(|&(at, method)| merged.get(method).map(|&index| (offset + at, index))),
    );

    Ok(IncludePath {
        path: Some(path),
        methods,
        placements,
    })
}

fn resolve_operator(
    call: &Expr,
    source: &Expr,
    method: &str,
    args: &[Expr],
    param: &str,
    operators: &OperatorRegistry,
) -> Result<IncludePath, ResolveError> {
    let Some(operator) = operators.get(method) else {
        return Err(unsupported(call));
    };

    let source = resolve_expr(source, param, operators)?;

    if args.len() != operator.arity() {
        return Err(ResolveError::ArgumentCount {
            operator: operator.name().to_string(),
            expected: operator.arity(),
            found: args.len(),
        });
    }

    let mut arguments = BTreeMap::new();
    for (parameter, arg) in operator.parameters().iter().zip(args) {
        let value = arg.as_literal().ok_or_else(|| ResolveError::NonLiteralArgument {
            operator: operator.name().to_string(),
            parameter: parameter.clone(),
            expression: arg.to_string(),
        })?;
        arguments.insert(parameter.clone(), value);
    }

    trace!(operator = operator.name(), ?arguments, "bound include operator");

    let mut methods = Vec::with_capacity(source.methods.len() + 1);
    methods.push(MethodInclude {
        operator: operator.name().to_string(),
        arguments,
    });
    methods.extend(source.methods.iter().cloned());

    let mut placements: Vec<_> = source.placements.iter().map(|&(at, method)| (at, method + 1)).collect();
    placements.push((source.segments().count(), 0));

    Ok(IncludePath {
        path: Some(source.extend(operator.name())),
        methods,
        placements,
    })
}

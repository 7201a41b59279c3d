// tests/resolver_tests.rs

use std::collections::BTreeMap;

use navql::ast::{Expr, Lambda, Literal};
use navql::operators::{IncludeOperator, OperatorRegistry};
use navql::parser::parse;
use navql::resolver::{IncludePath, MethodInclude, ResolveError, build_include};
use rstest::rstest;
use serde_json::json;

fn include(source: &str) -> Result<IncludePath, ResolveError> {
    build_include(&parse(source).unwrap(), &OperatorRegistry::standard())
}

fn method(operator: &str, pairs: &[(&str, Literal)]) -> MethodInclude {
    MethodInclude {
        operator: operator.to_string(),
        arguments: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

// ============================================================================
// Paths
// ============================================================================

#[rstest]
#[case("x => x.Author", "Author")]
#[case("x => x.Author.Books", "Author.Books")]
#[case("x => x.Posts.Select(p => p.Tags)", "Posts.Tags")]
#[case("x => x.Blog.Posts.Select(p => p.Author.Books)", "Blog.Posts.Author.Books")]
#[case("item => item.Owner", "Owner")]
fn test_member_paths(#[case] source: &str, #[case] path: &str) {
    let resolved = include(source).unwrap();
    assert_eq!(resolved.path.as_deref(), Some(path));
    assert!(resolved.methods.is_empty());
}

#[test]
fn test_segments() {
    let resolved = include("x => x.Author.Books").unwrap();
    assert_eq!(resolved.segments().collect::<Vec<_>>(), vec!["Author", "Books"]);
    assert_eq!(IncludePath::root().segments().count(), 0);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_take_binds_count() {
    let resolved = include("x => x.Comments.Take(5)").unwrap();
    assert_eq!(resolved.path.as_deref(), Some("Comments.Take"));
    assert_eq!(
        resolved.methods,
        vec![method("Take", &[("count", Literal::Integer(5))])]
    );
}

#[test]
fn test_operators_are_listed_most_recent_first() {
    let resolved = include("x => x.Comments.Skip(10).Take(5)").unwrap();
    assert_eq!(resolved.path.as_deref(), Some("Comments.Skip.Take"));
    assert_eq!(
        resolved.methods,
        vec![
            method("Take", &[("count", Literal::Integer(5))]),
            method("Skip", &[("count", Literal::Integer(10))]),
        ]
    );
}

#[test]
fn test_literal_kinds() {
    let resolved = include("x => x.Comments.Where(\"approved\")").unwrap();
    assert_eq!(
        resolved.methods[0].arguments["filter"],
        Literal::String("approved".into())
    );

    let resolved = include("x => x.Comments.Skip(-1)").unwrap();
    assert_eq!(resolved.methods[0].arguments["count"], Literal::Integer(-1));
}

#[test]
fn test_operator_on_root() {
    let resolved = include("x => x.Take(3)").unwrap();
    assert_eq!(resolved.path.as_deref(), Some("Take"));
    assert_eq!(resolved.methods.len(), 1);
}

#[test]
fn test_projection_unions_methods() {
    let resolved = include("x => x.Posts.Take(3).Select(p => p.Comments.Take(3))").unwrap();
    assert_eq!(resolved.path.as_deref(), Some("Posts.Take.Comments.Take"));
    assert_eq!(
        resolved.methods,
        vec![method("Take", &[("count", Literal::Integer(3))])]
    );

    let resolved = include("x => x.Posts.Take(3).Select(p => p.Comments.Skip(1))").unwrap();
    assert_eq!(
        resolved.methods,
        vec![
            method("Take", &[("count", Literal::Integer(3))]),
            method("Skip", &[("count", Literal::Integer(1))]),
        ]
    );
}

#[test]
fn test_operator_at_maps_segments_to_methods() {
    let resolved = include("x => x.Posts.Take(3).Select(p => p.Comments.Take(3))").unwrap();
    let take = method("Take", &[("count", Literal::Integer(3))]);
    assert_eq!(resolved.operator_at(0), None);
    assert_eq!(resolved.operator_at(1), Some(&take));
    assert_eq!(resolved.operator_at(2), None);
    assert_eq!(resolved.operator_at(3), Some(&take));

    let resolved = include("x => x.Posts.Select(p => p.Comments.Take(3)).Take(2)").unwrap();
    assert_eq!(resolved.path.as_deref(), Some("Posts.Comments.Take.Take"));
    assert_eq!(resolved.operator_at(2), Some(&method("Take", &[("count", Literal::Integer(3))])));
    assert_eq!(resolved.operator_at(3), Some(&method("Take", &[("count", Literal::Integer(2))])));
}

#[test]
fn test_multi_parameter_operator() {
    let mut registry = OperatorRegistry::standard();
    registry
        .register(IncludeOperator::new("Page", ["offset", "limit"]))
        .unwrap();

    let resolved = build_include(&parse("x => x.Posts.Page(20, 10)").unwrap(), &registry).unwrap();
    assert_eq!(
        resolved.methods,
        vec![method(
            "Page",
            &[("offset", Literal::Integer(20)), ("limit", Literal::Integer(10))]
        )]
    );
}

#[test]
fn test_programmatic_expression() {
    let expr: Expr = Lambda::new(
        "x",
        Expr::param("x")
            .field("Comments")
            .call("Take", vec![Expr::Integer(5)]),
    )
    .into();
    let resolved = build_include(&expr, &OperatorRegistry::standard()).unwrap();
    assert_eq!(resolved, include("x => x.Comments.Take(5)").unwrap());
}

#[test]
fn test_serializes_to_json() {
    let resolved = include("x => x.Comments.Take(5)").unwrap();
    assert_eq!(
        serde_json::to_value(&resolved).unwrap(),
        json!({
            "path": "Comments.Take",
            "methods": [{ "operator": "Take", "arguments": { "count": 5 } }]
        })
    );
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_non_literal_argument_fails_fast() {
    assert_eq!(
        include("x => x.Comments.Where(c => c.Author)"),
        Err(ResolveError::NonLiteralArgument {
            operator: "Where".into(),
            parameter: "filter".into(),
            expression: "c => c.Author".into(),
        })
    );
    assert!(matches!(
        include("x => x.Comments.Take(n)"),
        Err(ResolveError::NonLiteralArgument { .. })
    ));
    assert!(matches!(
        include("x => x.Comments.Take(1 + 2)"),
        Err(ResolveError::NonLiteralArgument { .. })
    ));
}

#[test]
fn test_argument_count() {
    assert_eq!(
        include("x => x.Comments.Take()"),
        Err(ResolveError::ArgumentCount {
            operator: "Take".into(),
            expected: 1,
            found: 0,
        })
    );
}

#[rstest]
#[case("x => x.Comments.Frobnicate(1)")]
#[case("x => y.Author")]
#[case("x => x.Price * 2")]
#[case("x => x.Tags[0]")]
#[case("x => { a: x.Author }")]
fn test_unsupported(#[case] source: &str) {
    assert!(matches!(include(source), Err(ResolveError::Unsupported { .. })));
}

#[test]
fn test_unregistered_operator_is_unsupported() {
    let result = build_include(
        &parse("x => x.Comments.Take(5)").unwrap(),
        &OperatorRegistry::empty(),
    );
    assert_eq!(
        result,
        Err(ResolveError::Unsupported {
            expression: "x.Comments.Take(5)".into()
        })
    );
}

#[test]
fn test_unresolved_root() {
    assert_eq!(include("x => x"), Err(ResolveError::UnresolvedRoot));
    assert_eq!(
        include("x => x.Posts.Select(p => p)"),
        Err(ResolveError::UnresolvedRoot)
    );
}

#[test]
fn test_lambda_shape() {
    assert_eq!(include("x.Author"), Err(ResolveError::NotALambda));
    assert_eq!(
        include("(a, b) => a.Author"),
        Err(ResolveError::ParameterCount(2))
    );
}

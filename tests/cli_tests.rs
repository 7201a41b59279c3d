// tests/cli_tests.rs

use navql::cli::{
    CliError, QueryOptions, ResolveOptions, RunOptions, execute_render, execute_resolve,
    execute_run,
};
use navql::{ContextConfig, QueryError};
use serde_json::json;

fn options(name: &str) -> QueryOptions {
    QueryOptions {
        name: name.to_string(),
        config: ContextConfig::default(),
        ..QueryOptions::default()
    }
}

#[test]
fn test_resolve() {
    let path = execute_resolve(&ResolveOptions {
        expression: "x => x.Comments.Take(5)".into(),
    })
    .unwrap();
    assert_eq!(path.path.as_deref(), Some("Comments.Take"));
}

#[test]
fn test_resolve_rejects_non_literal() {
    let err = execute_resolve(&ResolveOptions {
        expression: "x => x.Comments.Where(c => c.Author)".into(),
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Resolve(_)));
}

#[test]
fn test_render() {
    let mut opts = options("posts");
    opts.arguments = vec!["first=2".into()];
    opts.includes = vec!["x => x.Author".into()];

    let output = execute_render(&opts).unwrap();
    assert_eq!(
        output.document.text,
        "query($first: Int) {\n  posts(first: $first) {\n    Author\n  }\n}\n"
    );
    assert_eq!(output.document.variables["first"], json!(2));
}

#[test]
fn test_render_invalid_argument() {
    let mut opts = options("posts");
    opts.arguments = vec!["first".into()];
    assert!(matches!(
        execute_render(&opts),
        Err(CliError::InvalidArgument(_))
    ));
}

#[test]
fn test_run_collection_with_select() {
    let mut query = options("posts");
    query.select = Some("p => p.Title.ToUpper()".into());

    let output = execute_run(&RunOptions {
        query,
        rows: Some(r#"[{"Title": "a"}, {"Title": "b"}]"#.into()),
    })
    .unwrap();
    assert_eq!(output, json!(["A", "B"]));
}

#[test]
fn test_run_item() {
    let mut query = options("post");
    query.item = true;

    let output = execute_run(&RunOptions {
        query,
        rows: Some(r#"{"Title": "only"}"#.into()),
    })
    .unwrap();
    assert_eq!(output, json!({ "Title": "only" }));
}

#[test]
fn test_run_item_without_rows_is_empty() {
    let mut query = options("post");
    query.item = true;

    let err = execute_run(&RunOptions {
        query,
        rows: Some("[]".into()),
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Query(QueryError::EmptyResult { .. })));
}

#[test]
fn test_run_requires_rows() {
    let err = execute_run(&RunOptions {
        query: options("posts"),
        rows: None,
    })
    .unwrap_err();
    assert!(matches!(err, CliError::NoInput));
}

// tests/parser_tests.rs

use navql::ast::{BinOp, Expr, Lambda};
use navql::parser::{ParseError, parse, parse_lambda};
use rstest::rstest;

// ============================================================================
// Lambdas
// ============================================================================

#[test]
fn test_simple_lambda() {
    let lambda = parse_lambda("x => x.Author").unwrap();
    assert_eq!(lambda.params, vec!["x".to_string()]);
    assert_eq!(*lambda.body, Expr::param("x").field("Author"));
}

#[test]
fn test_parenthesized_lambda() {
    let lambda = parse_lambda("(a, b) => a.Total + b").unwrap();
    assert_eq!(lambda.params, vec!["a".to_string(), "b".to_string()]);
    assert!(matches!(*lambda.body, Expr::BinaryOp { op: BinOp::Add, .. }));
}

#[test]
fn test_nested_lambda_argument() {
    let expr = parse("x => x.Posts.Select(p => p.Tags)").unwrap();
    let expected = Lambda::new(
        "x",
        Expr::param("x").field("Posts").call(
            "Select",
            vec![Lambda::new("p", Expr::param("p").field("Tags")).into()],
        ),
    );
    assert_eq!(expr, Expr::Lambda(expected));
}

#[test]
fn test_grouping_is_not_a_lambda() {
    let expr = parse("(x) + 1").unwrap();
    assert!(matches!(expr, Expr::BinaryOp { op: BinOp::Add, .. }));
}

#[test]
fn test_parse_lambda_rejects_other_expressions() {
    assert_eq!(
        parse_lambda("x.Author"),
        Err(ParseError::NotALambda {
            found: "x.Author".into()
        })
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_precedence() {
    let expr = parse("1 + 2 * 3").unwrap();
    let Expr::BinaryOp { op, right, .. } = expr else {
        panic!("expected binary op");
    };
    assert_eq!(op, BinOp::Add);
    assert!(matches!(*right, Expr::BinaryOp { op: BinOp::Multiply, .. }));
}

#[test]
fn test_logical_and_coalesce() {
    let expr = parse("a ?? b || c && d").unwrap();
    let Expr::BinaryOp { op, right, .. } = expr else {
        panic!("expected binary op");
    };
    assert_eq!(op, BinOp::NullCoalesce);
    let Expr::BinaryOp { op, right, .. } = *right else {
        panic!("expected binary op");
    };
    assert_eq!(op, BinOp::Or);
    assert!(matches!(*right, Expr::BinaryOp { op: BinOp::And, .. }));
}

#[test]
fn test_negative_literals() {
    assert_eq!(parse("-5").unwrap(), Expr::Integer(-5));
    assert_eq!(parse("-2.5").unwrap(), Expr::Float(-2.5));
    assert!(matches!(
        parse("-x").unwrap(),
        Expr::BinaryOp { op: BinOp::Subtract, .. }
    ));
}

#[test]
fn test_not() {
    assert!(matches!(parse("!x.Hidden").unwrap(), Expr::Not(_)));
}

// ============================================================================
// Literals and construction
// ============================================================================

#[test]
fn test_object_literal() {
    let expr = parse("p => { title: p.Title, 'n': 1 }").unwrap();
    let Expr::Lambda(lambda) = expr else {
        panic!("expected lambda");
    };
    let Expr::Object(pairs) = *lambda.body else {
        panic!("expected object");
    };
    assert_eq!(pairs[0].0, "title");
    assert_eq!(pairs[1], ("n".to_string(), Expr::Integer(1)));
}

#[test]
fn test_index_and_array() {
    assert_eq!(
        parse("x.Tags[0]").unwrap(),
        Expr::param("x").field("Tags").index(Expr::Integer(0))
    );
    assert_eq!(
        parse("[1, 'a']").unwrap(),
        Expr::Array(vec![Expr::Integer(1), Expr::string("a")])
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_trailing_tokens() {
    assert!(matches!(
        parse("x => x.Author )"),
        Err(ParseError::UnexpectedToken { .. })
    ));
}

#[test]
fn test_missing_member_name() {
    assert!(matches!(
        parse("x => x."),
        Err(ParseError::Expected {
            expected: "member name after '.'",
            ..
        })
    ));
}

#[test]
fn test_lex_error_propagates() {
    assert!(matches!(parse("x => x = 1"), Err(ParseError::Lex(_))));
}

// ============================================================================
// Round trip through Display
// ============================================================================

#[rstest]
#[case("x => x.Author.Books")]
#[case("x => x.Comments.Take(5)")]
#[case("x => x.Posts.Select(p => p.Comments.Where(\"approved\"))")]
#[case("p => { title: p.Title, score: (p.Votes + 1) * 2 }")]
#[case("(a, b) => a ?? b")]
#[case("p => !p.Hidden && p.Price >= 2.0")]
#[case("p => p.Tags[0].ToUpper()")]
fn test_display_reparses(#[case] source: &str) {
    let expr = parse(source).unwrap();
    assert_eq!(expr.to_string(), source);
    assert_eq!(parse(&expr.to_string()).unwrap(), expr);
}

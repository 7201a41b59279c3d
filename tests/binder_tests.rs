// tests/binder_tests.rs

use navql::binder::{BindError, Binder};
use navql::parser::parse_lambda;
use rstest::rstest;
use serde_json::{Value as JsonValue, json};

fn post() -> JsonValue {
    json!({
        "Title": "Hello World",
        "Votes": 3,
        "Price": 100,
        "Author": { "Name": "Ann", "Nick": null },
        "Tags": ["rust", "graphql", "api"],
        "Comments": [
            { "Body": "first", "Votes": 5 },
            { "Body": "second", "Votes": 1 },
            { "Body": "third", "Votes": 3 }
        ]
    })
}

fn bind(selector: &str) -> Result<JsonValue, BindError> {
    Binder::new().bind_json(&parse_lambda(selector).unwrap(), post())
}

// ============================================================================
// Member access and construction
// ============================================================================

#[rstest]
#[case("p => p.Title", json!("Hello World"))]
#[case("p => p.title", json!("Hello World"))]
#[case("p => p.Author.Name", json!("Ann"))]
#[case("p => p.Author.Missing", json!(null))]
#[case("p => p.Author.Missing.Deeper", json!(null))]
#[case("p => p.Tags[1]", json!("graphql"))]
#[case("p => p.Tags[-1]", json!("api"))]
#[case("p => p.Tags.Count", json!(3))]
#[case("p => p.Title.Length", json!(11))]
#[case("p => p.Author.Nick ?? p.Author.Name", json!("Ann"))]
fn test_member_access(#[case] selector: &str, #[case] expected: JsonValue) {
    assert_eq!(bind(selector).unwrap(), expected);
}

#[test]
fn test_object_construction() {
    assert_eq!(
        bind("p => { title: p.Title, author: p.Author.Name, tags: [p.Tags[0], 'x'] }").unwrap(),
        json!({ "title": "Hello World", "author": "Ann", "tags": ["rust", "x"] })
    );
}

// ============================================================================
// Arithmetic and comparison
// ============================================================================

#[rstest]
#[case("p => p.Votes * 2 + 1", json!(7))]
#[case("p => p.Votes / 2", json!(1.5))]
#[case("p => p.Votes % 2", json!(1))]
#[case("p => p.Price * 1.1 == 110", json!(true))]
#[case("p => p.Votes > 2 && !(p.Votes > 5)", json!(true))]
#[case("p => p.Title + '!'", json!("Hello World!"))]
#[case("p => p.Votes == 3.0", json!(true))]
fn test_operators(#[case] selector: &str, #[case] expected: JsonValue) {
    assert_eq!(bind(selector).unwrap(), expected);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(bind("p => p.Votes / 0"), Err(BindError::DivisionByZero));
}

#[test]
fn test_incomparable_values() {
    assert!(matches!(bind("p => p.Tags < 3"), Err(BindError::Type(_))));
}

// ============================================================================
// Collection methods
// ============================================================================

#[rstest]
#[case("p => p.Comments.Select(c => c.Body)", json!(["first", "second", "third"]))]
#[case("p => p.Comments.Where(c => c.Votes > 2).Count()", json!(2))]
#[case("p => p.Comments.Count(c => c.Votes == 1)", json!(1))]
#[case("p => p.Comments.OrderBy(c => c.Votes).Select(c => c.Body)", json!(["second", "third", "first"]))]
#[case("p => p.Comments.OrderByDescending(c => c.Votes).First().Body", json!("first"))]
#[case("p => p.Comments.Skip(1).Take(1).Select(c => c.Body)", json!(["second"]))]
#[case("p => p.Comments.Sum(c => c.Votes)", json!(9))]
#[case("p => p.Comments.Max(c => c.Votes)", json!(5))]
#[case("p => p.Comments.Min(c => c.Votes)", json!(1))]
#[case("p => p.Comments.Any(c => c.Votes > 4)", json!(true))]
#[case("p => p.Comments.All(c => c.Votes > 4)", json!(false))]
#[case("p => p.Comments.Last(c => c.Votes > 2).Body", json!("third"))]
#[case("p => p.Tags.Contains('rust')", json!(true))]
fn test_collection_methods(#[case] selector: &str, #[case] expected: JsonValue) {
    assert_eq!(bind(selector).unwrap(), expected);
}

#[test]
fn test_nested_lambda_sees_outer_parameter() {
    assert_eq!(
        bind("p => p.Comments.Where(c => c.Votes > p.Votes).Select(c => p.Author.Name + ':' + c.Body)")
            .unwrap(),
        json!(["Ann:first"])
    );
}

// ============================================================================
// String methods
// ============================================================================

#[rstest]
#[case("p => p.Title.ToUpper()", json!("HELLO WORLD"))]
#[case("p => p.Title.ToLower()", json!("hello world"))]
#[case("p => '  x  '.Trim()", json!("x"))]
#[case("p => p.Title.StartsWith('Hello')", json!(true))]
#[case("p => p.Title.EndsWith('Hello')", json!(false))]
#[case("p => p.Title.Contains('o W')", json!(true))]
#[case("p => p.Title.Matches('^H.*d$')", json!(true))]
fn test_string_methods(#[case] selector: &str, #[case] expected: JsonValue) {
    assert_eq!(bind(selector).unwrap(), expected);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unbound_identifier() {
    assert_eq!(
        bind("p => q.Title"),
        Err(BindError::UnboundIdentifier("q".into()))
    );
}

#[test]
fn test_unknown_method() {
    assert_eq!(
        bind("p => p.Title.Reverse()"),
        Err(BindError::UnknownMethod("Reverse".into()))
    );
}

#[test]
fn test_selector_parameter_count() {
    let selector = parse_lambda("(a, b) => a").unwrap();
    assert_eq!(
        Binder::new().bind_json(&selector, post()),
        Err(BindError::ParameterCount(2))
    );
}

#[test]
fn test_member_on_scalar() {
    assert!(matches!(bind("p => p.Votes.Name"), Err(BindError::Type(_))));
}

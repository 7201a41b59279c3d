// tests/lexer_tests.rs

use navql::ast::Token;
use navql::lexer::{LexError, Lexer};

fn tokens(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut out = vec![];
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            break;
        }
        out.push(token);
    }
    out
}

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("!", Token::Bang),
        ("<", Token::Lt),
        (">", Token::Gt),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (".", Token::Dot),
        (",", Token::Comma),
        (":", Token::Colon),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token(), Ok(expected), "Failed for input: {}", input);
        assert_eq!(lexer.next_token(), Ok(Token::Eof));
    }
}

// ============================================================================
// Two Character Tokens
// ============================================================================

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("=>", Token::Arrow),
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
        ("&&", Token::And),
        ("||", Token::Or),
        ("??", Token::QuestionQuestion),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token(), Ok(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_incomplete_operators() {
    for input in ["=", "&", "|", "?"] {
        let mut lexer = Lexer::new(input);
        assert!(
            matches!(lexer.next_token(), Err(LexError::IncompleteOperator { position: 0, .. })),
            "Failed for input: {}",
            input
        );
    }
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(tokens("42"), vec![Token::Integer(42)]);
    assert_eq!(tokens("3.25"), vec![Token::Float(3.25)]);
    // A dot not followed by a digit is member access
    assert_eq!(
        tokens("5.Foo"),
        vec![Token::Integer(5), Token::Dot, Token::Identifier("Foo".into())]
    );
}

#[test]
fn test_integer_overflow() {
    let mut lexer = Lexer::new("99999999999999999999");
    assert!(matches!(lexer.next_token(), Err(LexError::InvalidNumber { position: 0, .. })));
}

#[test]
fn test_strings() {
    assert_eq!(tokens(r#""hello""#), vec![Token::String("hello".into())]);
    assert_eq!(tokens("'hello'"), vec![Token::String("hello".into())]);
    assert_eq!(tokens(r#""a\"b\n""#), vec![Token::String("a\"b\n".into())]);
    assert_eq!(tokens(r#"'it\'s'"#), vec![Token::String("it's".into())]);
}

#[test]
fn test_string_errors() {
    let mut lexer = Lexer::new("x == \"open");
    lexer.next_token().unwrap();
    lexer.next_token().unwrap();
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnterminatedString { position: 5 })
    );

    let mut lexer = Lexer::new(r#""bad \q""#);
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidEscape { ch: 'q', .. })
    ));
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        tokens("and or true false null Author _id"),
        vec![
            Token::And,
            Token::Or,
            Token::Boolean(true),
            Token::Boolean(false),
            Token::Null,
            Token::Identifier("Author".into()),
            Token::Identifier("_id".into()),
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let mut lexer = Lexer::new("x => x#");
    for _ in 0..3 {
        lexer.next_token().unwrap();
    }
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnexpectedCharacter { ch: '#', position: 6 })
    );
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_include_projection() {
    assert_eq!(
        tokens("x => x.Comments.Where(c => c.Votes >= 2)"),
        vec![
            Token::Identifier("x".into()),
            Token::Arrow,
            Token::Identifier("x".into()),
            Token::Dot,
            Token::Identifier("Comments".into()),
            Token::Dot,
            Token::Identifier("Where".into()),
            Token::LParen,
            Token::Identifier("c".into()),
            Token::Arrow,
            Token::Identifier("c".into()),
            Token::Dot,
            Token::Identifier("Votes".into()),
            Token::GtEq,
            Token::Integer(2),
            Token::RParen,
        ]
    );
}

#[test]
fn test_position_tracks_consumed_input() {
    let mut lexer = Lexer::new("  abc  ");
    lexer.next_token().unwrap();
    assert_eq!(lexer.position(), 5);
}

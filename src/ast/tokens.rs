/// Lexical tokens of the projection language.
///
/// Keywords `and`/`or` lex to the same tokens as `&&`/`||`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// `0.5`, `3.25`; a digit is required after the dot
    Float(f64),
    /// `5`, `42`; negative values are produced by the parser
    Integer(i64),
    /// `"text"` or `'text'`, escapes already decoded
    String(String),
    /// `true` / `false`
    Boolean(bool),
    /// `null`
    Null,

    /// Parameter, member or method name: `x`, `Author`, `_id`
    Identifier(String),

    /// `=>` between lambda parameters and body
    Arrow,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Arithmetic
    /// `+`, also string concatenation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Logical
    And,
    Or,
    /// `!` prefix negation
    Bang,
    /// `??` null-coalescing
    QuestionQuestion,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    /// Opens an object construction `{ key: value }`
    LBrace,
    RBrace,
    Dot,
    Comma,
    Colon,

    Eof,
}

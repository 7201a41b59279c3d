use std::fmt;

use serde::Serialize;

use crate::ast::BinOp;

/// Abstract Syntax Tree node representing a projection expression.
///
/// The AST is the internal representation of a lambda body after parsing (or
/// after being assembled with the builder helpers). It is a closed set of
/// shapes so every walker over it matches exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 4.5
    /// ```
    Float(f64),

    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 5
    /// -1
    /// ```
    Integer(i64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "Title"
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Null literal
    Null,

    // References
    /// A bare name: a lambda parameter when it matches one in scope,
    /// otherwise a captured (non-literal) variable.
    Identifier(String),

    // Access
    /// Member (field) access
    ///
    /// # Examples
    /// ```text
    /// x.Author
    /// x.Author.Books
    /// ```
    Member { object: Box<Expr>, name: String },

    /// Index access
    ///
    /// # Examples
    /// ```text
    /// p.Tags[0]
    /// p.Tags[-1]
    /// ```
    Index { object: Box<Expr>, index: Box<Expr> },

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// x.Comments.Take(5)
    /// x.Posts.Select(p => p.Title)
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Nested function literal, typically a method argument
    Lambda(Lambda),

    // Operations
    /// Logical negation (`!`)
    Not(Box<Expr>),

    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // Object and Array Literals
    /// Object construction
    ///
    /// # Example
    /// ```text
    /// { title: p.Title, author: p.Author.Name }
    /// ```
    Object(Vec<(String, Expr)>),

    /// Array construction
    ///
    /// # Example
    /// ```text
    /// [p.First, p.Last]
    /// ```
    Array(Vec<Expr>),
}

/// A function literal: `x => body` or `(a, b) => body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Box<Expr>,
}

/// A compile-time constant, the only thing an include operator accepts as an
/// argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Expr {
    /// Reference to a lambda parameter (or any bare name).
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    /// `self.name`
    pub fn field(self, name: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(self),
            name: name.into(),
        }
    }

    /// `self.method(args...)`
    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            object: Box::new(self),
            method: method.into(),
            args,
        }
    }

    /// `self[index]`
    pub fn index(self, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The constant value of this expression, if it is a literal.
    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Expr::Null => Some(Literal::Null),
            Expr::Boolean(b) => Some(Literal::Boolean(*b)),
            Expr::Integer(n) => Some(Literal::Integer(*n)),
            Expr::Float(n) => Some(Literal::Float(*n)),
            Expr::String(s) => Some(Literal::String(s.clone())),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expr::Null | Expr::Boolean(_) | Expr::Integer(_) | Expr::Float(_) | Expr::String(_)
        )
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Lambda(_) => 0,
            Expr::BinaryOp { op, .. } => op.precedence(),
            Expr::Not(_) => 7,
            Expr::Integer(n) if *n < 0 => 7,
            Expr::Float(n) if n.is_sign_negative() => 7,
            _ => 8,
        }
    }
}

impl Lambda {
    /// Single-parameter lambda `param => body`.
    pub fn new(param: impl Into<String>, body: Expr) -> Self {
        Lambda {
            params: vec![param.into()],
            body: Box::new(body),
        }
    }

    pub fn with_params(params: Vec<String>, body: Expr) -> Self {
        Lambda {
            params,
            body: Box::new(body),
        }
    }

    /// The parameter name when this lambda takes exactly one.
    pub fn single_param(&self) -> Option<&str> {
        match self.params.as_slice() {
            [param] => Some(param.as_str()),
            _ => None,
        }
    }
}

impl From<Lambda> for Expr {
    fn from(lambda: Lambda) -> Self {
        Expr::Lambda(lambda)
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => Expr::Null,
            Literal::Boolean(b) => Expr::Boolean(b),
            Literal::Integer(n) => Expr::Integer(n),
            Literal::Float(n) => Expr::Float(n),
            Literal::String(s) => Expr::String(s),
        }
    }
}

// ============================================================================
// Source rendering
// ============================================================================

fn write_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 {
        write!(f, "{n:.1}")
    } else {
        write!(f, "{n}")
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min_precedence: u8) -> fmt::Result {
    if expr.precedence() < min_precedence {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Float(n) => write_float(f, *n),
            Expr::Integer(n) => write!(f, "{n}"),
            Expr::String(s) => write_quoted(f, s),
            Expr::Boolean(b) => write!(f, "{b}"),
            Expr::Null => f.write_str("null"),
            Expr::Identifier(name) => f.write_str(name),
            Expr::Member { object, name } => {
                write_operand(f, object, 8)?;
                write!(f, ".{name}")
            }
            Expr::Index { object, index } => {
                write_operand(f, object, 8)?;
                write!(f, "[{index}]")
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                write_operand(f, object, 8)?;
                write!(f, ".{method}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Lambda(lambda) => write!(f, "{lambda}"),
            Expr::Not(operand) => {
                f.write_str("!")?;
                write_operand(f, operand, 7)
            }
            Expr::BinaryOp { op, left, right } => {
                let precedence = op.precedence();
                write_operand(f, left, precedence)?;
                write!(f, " {op} ")?;
                write_operand(f, right, precedence + 1)
            }
            Expr::Object(pairs) => {
                if pairs.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if is_identifier(key) {
                        f.write_str(key)?;
                    } else {
                        write_quoted(f, key)?;
                    }
                    write!(f, ": {value}")?;
                }
                f.write_str(" }")
            }
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params.as_slice() {
            [param] => write!(f, "{param} => {}", self.body),
            params => write!(f, "({}) => {}", params.join(", "), self.body),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Float(n) => write_float(f, *n),
            Literal::String(s) => write_quoted(f, s),
        }
    }
}

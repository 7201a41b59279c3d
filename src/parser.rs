use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Lambda, Token},
    lexer::{LexError, Lexer, Position},
};

/// Errors raised while parsing projection source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected} at position {position}, got {found:?}")]
    Expected {
        expected: &'static str,
        found: Token,
        position: Position,
    },

    #[error("unexpected token {found:?} at position {position}")]
    UnexpectedToken { found: Token, position: Position },

    #[error("expected a lambda expression such as `x => x.Field`, got `{found}`")]
    NotALambda { found: String },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    /// Offset where `current_token` ends, used for error positions.
    position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let position = lexer.position();
        Ok(Parser {
            lexer,
            current_token,
            position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.position();
        Ok(())
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(ParseError::Expected {
                expected: description,
                found: self.current_token.clone(),
                position: self.position,
            });
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.current_token.clone(),
            position: self.position,
        }
    }

    fn take_identifier(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Identifier(name) => {
                self.advance()?;
                Ok(name)
            }
            found => Err(ParseError::Expected {
                expected,
                found,
                position: self.position,
            }),
        }
    }

    /// Whether the upcoming tokens are `ident =>`.
    fn at_simple_lambda(&self) -> bool {
        if !matches!(self.current_token, Token::Identifier(_)) {
            return false;
        }
        let mut lookahead = self.lexer.clone();
        matches!(lookahead.next_token(), Ok(Token::Arrow))
    }

    /// Whether the upcoming tokens are `( ident, ... ) =>`.
    fn at_parenthesized_lambda(&self) -> bool {
        if !self.check(&Token::LParen) {
            return false;
        }
        let mut lookahead = self.lexer.clone();
        let mut expect_name = true;
        loop {
            match lookahead.next_token() {
                Ok(Token::Identifier(_)) if expect_name => expect_name = false,
                Ok(Token::Comma) if !expect_name => expect_name = true,
                Ok(Token::RParen) => break,
                _ => return false,
            }
        }
        matches!(lookahead.next_token(), Ok(Token::Arrow))
    }

    fn parse_lambda(&mut self) -> Result<Lambda, ParseError> {
        let mut params = vec![];

        if self.check(&Token::LParen) {
            self.advance()?;
            while !self.check(&Token::RParen) {
                params.push(self.take_identifier("lambda parameter name")?);
                if !self.check(&Token::RParen) {
                    self.expect(Token::Comma, "',' between lambda parameters")?;
                }
            }
            self.expect(Token::RParen, "')'")?;
        } else {
            params.push(self.take_identifier("lambda parameter name")?);
        }

        self.expect(Token::Arrow, "'=>'")?;
        let body = self.parse_expression()?;

        Ok(Lambda::with_params(params, body))
    }

    /// Parse primary expressions (atoms): literals, names, groups, object and array literals
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Float(n) => {
                self.advance()?;
                Ok(Expr::Float(n))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(Expr::Integer(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Expr::Boolean(b))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }

            Token::Identifier(name) => {
                self.advance()?;
                Ok(Expr::Identifier(name))
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }

            Token::LBrace => {
                self.advance()?;
                self.parse_object_literal()
            }

            Token::LBracket => {
                self.advance()?;
                self.parse_array_literal()
            }

            found => Err(ParseError::UnexpectedToken {
                found,
                position: self.position,
            }),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut pairs = vec![];

        while !self.check(&Token::RBrace) {
            let key = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::String(s) | Token::Identifier(s) => s,
                found => {
                    return Err(ParseError::Expected {
                        expected: "string or identifier as object key",
                        found,
                        position: self.position,
                    });
                }
            };
            self.advance()?;

            self.expect(Token::Colon, "':' after object key")?;

            let value = self.parse_expression()?;
            pairs.push((key, value));

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma, "',' between object entries")?;
            }
        }

        self.expect(Token::RBrace, "'}'")?;
        Ok(Expr::Object(pairs))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ParseError> {
        let mut elements = vec![];

        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression()?);

            if !self.check(&Token::RBracket) {
                self.expect(Token::Comma, "',' between array elements")?;
            }
        }

        self.expect(Token::RBracket, "']'")?;
        Ok(Expr::Array(elements))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma, "',' between arguments")?;
            }
        }

        self.expect(Token::RParen, "')'")?;
        Ok(args)
    }

    /// Parse member access, method calls and indexing
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.advance()?;
                let name = self.take_identifier("member name after '.'")?;

                if self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_arguments()?;
                    expr = Expr::MethodCall {
                        object: Box::new(expr),
                        method: name,
                        args,
                    };
                } else {
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
            } else if self.check(&Token::LBracket) {
                self.advance()?;
                let index = self.parse_expression()?;
                self.expect(Token::RBracket, "']'")?;

                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.current_token {
            Token::Minus => {
                self.advance()?;
                // Negative numeric literals stay literals
                match self.current_token {
                    Token::Integer(n) => {
                        self.advance()?;
                        Ok(Expr::Integer(-n))
                    }
                    Token::Float(n) => {
                        self.advance()?;
                        Ok(Expr::Float(-n))
                    }
                    _ => {
                        let operand = self.parse_unary()?;
                        Ok(Expr::binary(BinOp::Subtract, Expr::Integer(0), operand))
                    }
                }
            }
            Token::Bang => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Expr::Not(Box::new(operand)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;

        let op = match &self.current_token {
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::Gt => BinOp::GreaterThan,
            Token::LtEq => BinOp::LessEqual,
            Token::GtEq => BinOp::GreaterEqual,
            _ => return Ok(left),
        };

        self.advance()?;
        let right = self.parse_additive()?;
        Ok(Expr::binary(op, left, right))
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Expr::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;
            left = Expr::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_coalesce(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_or()?;

        while self.check(&Token::QuestionQuestion) {
            self.advance()?;
            let right = self.parse_or()?;
            left = Expr::binary(BinOp::NullCoalesce, left, right);
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        if self.at_simple_lambda() || self.at_parenthesized_lambda() {
            return self.parse_lambda().map(Expr::Lambda);
        }
        self.parse_coalesce()
    }

    /// Parse a complete expression, requiring all input to be consumed.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected());
        }
        Ok(expr)
    }
}

/// Parse projection source text into an expression.
///
/// # Examples
///
/// ```
/// use navql::parser::parse;
/// use navql::ast::Expr;
///
/// let expr = parse("x => x.Author.Books").unwrap();
/// assert!(matches!(expr, Expr::Lambda(_)));
/// ```
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}

/// Parse projection source text that must be a lambda.
pub fn parse_lambda(source: &str) -> Result<Lambda, ParseError> {
    match parse(source)? {
        Expr::Lambda(lambda) => Ok(lambda),
        other => Err(ParseError::NotALambda {
            found: other.to_string(),
        }),
    }
}

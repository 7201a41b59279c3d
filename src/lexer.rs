use std::ops::Range;

use thiserror::Error;

use crate::ast::Token;

/// Character offset into the source text.
pub type Position = usize;

/// Errors raised while splitting projection source into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: Position },

    #[error("unexpected '{ch}' at position {position} (did you mean '{hint}'?)")]
    IncompleteOperator {
        ch: char,
        position: Position,
        hint: &'static str,
    },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{ch}' at position {position}")]
    InvalidEscape { ch: char, position: Position },

    #[error("invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: Position },
}

#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Offset of the next unread character.
    pub fn position(&self) -> Position {
        self.position
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consumes characters while `accept` holds; returns the consumed span.
    fn eat_while(&mut self, accept: impl Fn(char) -> bool) -> Range<usize> {
        let start = self.position;
        while self.current_char().is_some_and(&accept) {
            self.position += 1;
        }
        start..self.position
    }

    fn text(&self, span: Range<usize>) -> String {
        self.input[span].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    fn read_identifier(&mut self) -> String {
        let span = self.eat_while(|c| c.is_alphanumeric() || c == '_');
        self.text(span)
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return Err(LexError::InvalidEscape {
                                ch,
                                position: self.position,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        self.eat_while(|c| c.is_ascii_digit());

        // A dot only continues the number when a digit follows: `5.Foo` is a member
        let is_float = self.current_char() == Some('.')
            && self.peek_char(1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            self.advance();
            self.eat_while(|c| c.is_ascii_digit());
        }

        let text = self.text(start..self.position);
        let parsed = if is_float {
            text.parse::<f64>().ok().map(Token::Float)
        } else {
            text.parse::<i64>().ok().map(Token::Integer)
        };
        parsed.ok_or(LexError::InvalidNumber {
            text,
            position: start,
        })
    }

    /// Consumes `width` characters and yields `token`.
    fn single(&mut self, token: Token, width: usize) -> Result<Token, LexError> {
        self.position += width;
        Ok(token)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let position = self.position;
        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };
        let next = self.peek_char(1);

        match ch {
            '.' => self.single(Token::Dot, 1),
            ',' => self.single(Token::Comma, 1),
            ':' => self.single(Token::Colon, 1),
            '+' => self.single(Token::Plus, 1),
            '-' => self.single(Token::Minus, 1),
            '*' => self.single(Token::Star, 1),
            '/' => self.single(Token::Slash, 1),
            '%' => self.single(Token::Percent, 1),
            '(' => self.single(Token::LParen, 1),
            ')' => self.single(Token::RParen, 1),
            '[' => self.single(Token::LBracket, 1),
            ']' => self.single(Token::RBracket, 1),
            '{' => self.single(Token::LBrace, 1),
            '}' => self.single(Token::RBrace, 1),
            '=' => match next {
                Some('>') => self.single(Token::Arrow, 2),
                Some('=') => self.single(Token::EqEq, 2),
                _ => Err(LexError::IncompleteOperator {
                    ch,
                    position,
                    hint: "==' or '=>",
                }),
            },
            '!' => match next {
                Some('=') => self.single(Token::NotEq, 2),
                _ => self.single(Token::Bang, 1),
            },
            '<' => match next {
                Some('=') => self.single(Token::LtEq, 2),
                _ => self.single(Token::Lt, 1),
            },
            '>' => match next {
                Some('=') => self.single(Token::GtEq, 2),
                _ => self.single(Token::Gt, 1),
            },
            '&' => match next {
                Some('&') => self.single(Token::And, 2),
                _ => Err(LexError::IncompleteOperator {
                    ch,
                    position,
                    hint: "&&",
                }),
            },
            '|' => match next {
                Some('|') => self.single(Token::Or, 2),
                _ => Err(LexError::IncompleteOperator {
                    ch,
                    position,
                    hint: "||",
                }),
            },
            '?' => match next {
                Some('?') => self.single(Token::QuestionQuestion, 2),
                _ => Err(LexError::IncompleteOperator {
                    ch,
                    position,
                    hint: "??",
                }),
            },
            '"' | '\'' => self.read_string(ch).map(Token::String),
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();

                Ok(match ident.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Identifier(ident),
                })
            }
            c if c.is_ascii_digit() => self.read_number(),
            ch => Err(LexError::UnexpectedCharacter { ch, position }),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or true false null");
    assert_eq!(lexer.next_token(), Ok(Token::And));
    assert_eq!(lexer.next_token(), Ok(Token::Or));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
}

#[test]
fn test_lambda() {
    let mut lexer = Lexer::new("x => x.Take(5)");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("x".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Arrow));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("x".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("Take".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::LParen));
    assert_eq!(lexer.next_token(), Ok(Token::Integer(5)));
    assert_eq!(lexer.next_token(), Ok(Token::RParen));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

//! Criteria expression syntax.
//!
//! ```text
//! expression := literal | path | SIZE '(' path ')'
//! path       := identifier ('.' identifier)*
//! literal    := integer | decimal | 'string' | TRUE | FALSE | NULL
//! ```
//!
//! Keywords and function names are case-insensitive. Inside a string literal a quote
//! is written twice (`'it''s'`).

use crate::error::CatteryError;
use crate::value::Value;
use std::fmt;

/// A dotted attribute path such as `c.kittens` or `name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<String>,
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Null,
    Path(Path),
    /// Cardinality of a collection attribute
    Size(Path),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", literal_text(value)),
            Expression::Null => f.write_str("NULL"),
            Expression::Path(path) => write!(f, "{path}"),
            Expression::Size(path) => write!(f, "SIZE({path})"),
        }
    }
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(Some(s)) => format!("'{}'", s.replace('\'', "''")),
        Value::Bool(Some(b)) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::TinyInt(Some(v)) => v.to_string(),
        Value::SmallInt(Some(v)) => v.to_string(),
        Value::Int(Some(v)) => v.to_string(),
        Value::BigInt(Some(v)) => v.to_string(),
        Value::TinyUnsigned(Some(v)) => v.to_string(),
        Value::SmallUnsigned(Some(v)) => v.to_string(),
        Value::Unsigned(Some(v)) => v.to_string(),
        Value::BigUnsigned(Some(v)) => v.to_string(),
        Value::Float(Some(v)) => v.to_string(),
        Value::Double(Some(v)) => v.to_string(),
        _ => "NULL".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Identifier(String),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Dot,
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "'{s}'"),
            Token::Integer(v) => write!(f, "{v}"),
            Token::Decimal(v) => write!(f, "{v}"),
            Token::Text(s) => write!(f, "'{s}'"),
            Token::Dot => f.write_str("'.'"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
        }
    }
}

fn syntax_error(input: &str, message: impl fmt::Display) -> CatteryError {
    CatteryError::illegal_argument(format!("invalid expression \"{input}\": {message}"))
}

fn tokenize(input: &str) -> Result<Vec<Token>, CatteryError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RightParen);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            if matches!(chars.peek(), Some((_, '\''))) {
                                chars.next();
                                text.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, ch)) => text.push(ch),
                        None => return Err(syntax_error(input, "unterminated string literal")),
                    }
                }
                tokens.push(Token::Text(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                let mut end = start + c.len_utf8();
                let mut seen_dot = false;
                while let Some(&(i, ch)) = chars.peek() {
                    // A dot only belongs to the number when a digit follows it
                    let digit_follows = input[i + ch.len_utf8()..]
                        .chars()
                        .next()
                        .is_some_and(|next| next.is_ascii_digit());
                    if ch.is_ascii_digit() || (ch == '.' && !seen_dot && digit_follows) {
                        seen_dot |= ch == '.';
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let token = if seen_dot {
                    literal.parse().map(Token::Decimal).ok()
                } else {
                    literal.parse().map(Token::Integer).ok()
                };
                tokens.push(token.ok_or_else(|| {
                    syntax_error(input, format!("'{literal}' is not a valid number"))
                })?);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Identifier(input[start..end].to_string()));
            }
            other => {
                return Err(syntax_error(input, format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn expect(&mut self, expected: Token) -> Result<(), CatteryError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(syntax_error(
                self.input,
                format!("expected {expected}, found {token}"),
            )),
            None => Err(syntax_error(self.input, format!("expected {expected}"))),
        }
    }

    fn expression(&mut self) -> Result<Expression, CatteryError> {
        match self.next() {
            Some(Token::Integer(v)) => Ok(Expression::Literal(Value::BigInt(Some(v)))),
            Some(Token::Decimal(v)) => Ok(Expression::Literal(Value::Double(Some(v)))),
            Some(Token::Text(s)) => Ok(Expression::Literal(Value::String(Some(s)))),
            Some(Token::Identifier(name)) => {
                if self.peek() == Some(&Token::LeftParen) {
                    return self.function(&name);
                }
                match name.to_ascii_uppercase().as_str() {
                    "TRUE" => Ok(Expression::Literal(Value::Bool(Some(true)))),
                    "FALSE" => Ok(Expression::Literal(Value::Bool(Some(false)))),
                    "NULL" => Ok(Expression::Null),
                    _ => self.path(name).map(Expression::Path),
                }
            }
            Some(token) => Err(syntax_error(self.input, format!("unexpected {token}"))),
            None => Err(syntax_error(self.input, "expression is empty")),
        }
    }

    fn function(&mut self, name: &str) -> Result<Expression, CatteryError> {
        if !name.eq_ignore_ascii_case("SIZE") {
            return Err(syntax_error(self.input, format!("unknown function '{name}'")));
        }
        self.expect(Token::LeftParen)?;
        let argument = match self.next() {
            Some(Token::Identifier(first)) => self.path(first)?,
            _ => return Err(syntax_error(self.input, "SIZE expects an attribute path")),
        };
        self.expect(Token::RightParen)?;
        Ok(Expression::Size(argument))
    }

    fn path(&mut self, first: String) -> Result<Path, CatteryError> {
        let mut segments = vec![first];
        while self.peek() == Some(&Token::Dot) {
            self.next();
            match self.next() {
                Some(Token::Identifier(segment)) => segments.push(segment),
                _ => {
                    return Err(syntax_error(self.input, "expected an attribute name after '.'"));
                }
            }
        }
        Ok(Path { segments })
    }
}

/// Parse a criteria expression
pub fn parse(input: &str) -> Result<Expression, CatteryError> {
    let mut parser = Parser {
        input,
        tokens: tokenize(input)?,
        position: 0,
    };
    let expression = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(syntax_error(input, format!("unexpected {token} after expression")));
    }
    Ok(expression)
}

/// Whether `alias` can name a query root
pub fn is_valid_alias(alias: &str) -> bool {
    let mut chars = alias.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !["SIZE", "TRUE", "FALSE", "NULL"]
            .iter()
            .any(|keyword| alias.eq_ignore_ascii_case(keyword))
}

//! Filter expressions for scans over stored entries.
//!
//! A small subset of the OData `$filter` language, evaluated against the
//! JSON form of each entry:
//!
//! - comparisons: `sku eq 'MS122-32'`, `productList.dailyTurn gt 0.5`
//!   (`eq ne gt ge lt le`)
//! - string functions: `startswith(sku,'MS')`, `endswith(..)`, `contains(..)`
//! - `and`, `or`, `not` and parentheses
//!
//! Paths walk through arrays, so `productList.metadata.color eq 'red'` holds
//! when any product of the entry is red.

use std::cmp::Ordering;

use serde_json::Value;

use super::StoreError;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expr: Expr,
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(input: &str) -> Result<Self, StoreError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(invalid("empty filter expression"));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected {} after expression", token.describe())));
        }
        Ok(Self { expr })
    }

    /// Evaluate the filter against a JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        self.expr.eval(document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringFn {
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare {
        path: Vec<String>,
        op: CompareOp,
        literal: Literal,
    },
    Call {
        func: StringFn,
        path: Vec<String>,
        arg: String,
    },
}

impl Expr {
    fn eval(&self, document: &Value) -> bool {
        match self {
            Expr::And(left, right) => left.eval(document) && right.eval(document),
            Expr::Or(left, right) => left.eval(document) || right.eval(document),
            Expr::Not(inner) => !inner.eval(document),
            Expr::Compare { path, op, literal } => {
                let values = resolve(document, path);
                match op {
                    CompareOp::Ne => !values.iter().any(|v| equals(v, literal)),
                    CompareOp::Eq => values.iter().any(|v| equals(v, literal)),
                    ordered => values.iter().any(|v| match compare(v, literal) {
                        Some(ordering) => match ordered {
                            CompareOp::Gt => ordering == Ordering::Greater,
                            CompareOp::Ge => ordering != Ordering::Less,
                            CompareOp::Lt => ordering == Ordering::Less,
                            CompareOp::Le => ordering != Ordering::Greater,
                            CompareOp::Eq | CompareOp::Ne => false,
                        },
                        None => false,
                    }),
                }
            }
            Expr::Call { func, path, arg } => resolve(document, path).iter().any(|v| {
                let Some(text) = v.as_str() else {
                    return false;
                };
                match func {
                    StringFn::StartsWith => text.starts_with(arg.as_str()),
                    StringFn::EndsWith => text.ends_with(arg.as_str()),
                    StringFn::Contains => text.contains(arg.as_str()),
                }
            }),
        }
    }
}

/// Collect every value reached by `path`, descending into arrays.
/// A path that reaches nothing yields a single `null`.
fn resolve<'a>(document: &'a Value, path: &[String]) -> Vec<&'a Value> {
    fn walk<'a>(value: &'a Value, path: &[String], out: &mut Vec<&'a Value>) {
        match (path.split_first(), value) {
            (_, Value::Array(items)) => {
                for item in items {
                    walk(item, path, out);
                }
            }
            (None, _) => out.push(value),
            (Some((head, rest)), Value::Object(map)) => {
                if let Some(child) = map.get(head) {
                    walk(child, rest, out);
                }
            }
            (Some(_), _) => {}
        }
    }

    let mut out = Vec::new();
    walk(document, path, &mut out);
    if out.is_empty() {
        out.push(&Value::Null);
    }
    out
}

fn equals(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::String(s), Literal::String(l)) => s == l,
        (Value::Number(n), Literal::Number(l)) => n.as_f64() == Some(*l),
        (Value::Bool(b), Literal::Bool(l)) => b == l,
        (Value::Null, Literal::Null) => true,
        _ => false,
    }
}

fn compare(value: &Value, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (Value::String(s), Literal::String(l)) => Some(s.as_str().cmp(l.as_str())),
        (Value::Number(n), Literal::Number(l)) => n.as_f64()?.partial_cmp(l),
        _ => None,
    }
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidFilter(message.into())
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Str(String),
    Num(f64),
    Word(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Str(s) => format!("string '{}'", s),
            Token::Num(n) => format!("number {}", n),
            Token::Word(w) => format!("'{}'", w),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, StoreError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '\'' => {
                // '' inside a literal is an escaped quote
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(invalid("unterminated string literal")),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            text.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&other) => {
                            text.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Num(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            other => return Err(invalid(format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == keyword)
    }

    fn expect(&mut self, expected: Token) -> Result<(), StoreError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(invalid(format!(
                "expected {} but found {}",
                expected.describe(),
                token.describe()
            ))),
            None => Err(invalid(format!(
                "expected {} at end of expression",
                expected.describe()
            ))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, StoreError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, StoreError> {
        let mut left = self.parse_unary()?;
        while self.peek_keyword("and") {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, StoreError> {
        if self.peek_keyword("not") {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, StoreError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Word(word)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.parse_call(&word)
                } else {
                    self.parse_comparison(word)
                }
            }
            Some(token) => Err(invalid(format!("unexpected {}", token.describe()))),
            None => Err(invalid("unexpected end of expression")),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<Expr, StoreError> {
        let func = match name {
            "startswith" => StringFn::StartsWith,
            "endswith" => StringFn::EndsWith,
            "contains" | "substringof" => StringFn::Contains,
            other => return Err(invalid(format!("unknown function '{}'", other))),
        };
        self.expect(Token::LParen)?;
        let path = match self.next() {
            Some(Token::Word(word)) => split_path(&word)?,
            Some(token) => {
                return Err(invalid(format!(
                    "expected a field name in {} but found {}",
                    name,
                    token.describe()
                )))
            }
            None => return Err(invalid("unexpected end of expression")),
        };
        self.expect(Token::Comma)?;
        let arg = match self.next() {
            Some(Token::Str(text)) => text,
            Some(token) => {
                return Err(invalid(format!(
                    "expected a string argument in {} but found {}",
                    name,
                    token.describe()
                )))
            }
            None => return Err(invalid("unexpected end of expression")),
        };
        self.expect(Token::RParen)?;
        Ok(Expr::Call { func, path, arg })
    }

    fn parse_comparison(&mut self, field: String) -> Result<Expr, StoreError> {
        let path = split_path(&field)?;
        let op = match self.next() {
            Some(Token::Word(word)) => match word.as_str() {
                "eq" => CompareOp::Eq,
                "ne" => CompareOp::Ne,
                "gt" => CompareOp::Gt,
                "ge" => CompareOp::Ge,
                "lt" => CompareOp::Lt,
                "le" => CompareOp::Le,
                other => return Err(invalid(format!("unknown operator '{}'", other))),
            },
            Some(token) => {
                return Err(invalid(format!(
                    "expected an operator after '{}' but found {}",
                    field,
                    token.describe()
                )))
            }
            None => return Err(invalid(format!("missing operator after '{}'", field))),
        };
        let literal = match self.next() {
            Some(Token::Str(text)) => Literal::String(text),
            Some(Token::Num(n)) => Literal::Number(n),
            Some(Token::Word(word)) => match word.as_str() {
                "true" => Literal::Bool(true),
                "false" => Literal::Bool(false),
                "null" => Literal::Null,
                other => return Err(invalid(format!("expected a literal but found '{}'", other))),
            },
            Some(token) => {
                return Err(invalid(format!(
                    "expected a literal but found {}",
                    token.describe()
                )))
            }
            None => return Err(invalid(format!("missing value after '{}'", field))),
        };
        Ok(Expr::Compare { path, op, literal })
    }
}

fn split_path(field: &str) -> Result<Vec<String>, StoreError> {
    let segments: Vec<String> = field.split('.').map(str::to_string).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid(format!("invalid field path '{}'", field)));
    }
    Ok(segments)
}

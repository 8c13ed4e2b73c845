// Parser for the constructor-call syntax

use super::lexer::Lexer;
use super::token::Token;
use crate::expression::{Expression, Tag};
use crate::value::{Map, Value};
use anyhow::{bail, Context, Result};

/// Deepest nesting accepted, matching serde_json's recursion limit
const MAX_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize();
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse a single value and require the input to end there
    pub fn parse(&mut self) -> Result<Value> {
        let value = self.parse_value()?;
        if !self.match_token(&Token::Eof) {
            bail!("Unexpected trailing input at {:?}", self.current_token());
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            bail!("Expression nested deeper than {} levels", MAX_DEPTH);
        }
        let value = self.parse_value_inner();
        self.depth -= 1;
        value
    }

    fn parse_value_inner(&mut self) -> Result<Value> {
        match self.current_token() {
            Token::True => {
                self.advance();
                Ok(Value::Boolean(true))
            }
            Token::False => {
                self.advance();
                Ok(Value::Boolean(false))
            }
            Token::Null => {
                self.advance();
                Ok(Value::Null)
            }
            Token::Number(number) => {
                self.advance();
                parse_number(&number)
            }
            Token::Minus => {
                self.advance();
                match self.current_token() {
                    Token::Number(number) => {
                        self.advance();
                        parse_number(&format!("-{}", number))
                    }
                    other => bail!("Expected number after '-', found {:?}", other),
                }
            }
            Token::String(s) => {
                self.advance();
                Ok(Value::String(s))
            }
            Token::LeftBracket => self.parse_list(),
            Token::LeftBrace => self.parse_map(),
            Token::Identifier(name) => self.parse_call(&name),
            Token::Invalid(message) => bail!("{}", message),
            other => bail!("Expected a value, found {:?}", other),
        }
    }

    /// Parse `[a, b, ...]`
    fn parse_list(&mut self) -> Result<Value> {
        self.expect_token(Token::LeftBracket)?;
        let items = self.parse_value_list(Token::RightBracket)?;
        Ok(Value::List(items))
    }

    /// Parse `{key: value, ...}`; numeric keys are spelled as strings
    fn parse_map(&mut self) -> Result<Value> {
        self.expect_token(Token::LeftBrace)?;
        let mut map = Map::new();

        while !self.match_token(&Token::RightBrace) {
            let key = match self.current_token() {
                Token::String(key) | Token::Number(key) => key,
                other => bail!("Expected a mapping key, found {:?}", other),
            };
            self.advance();
            self.expect_token(Token::Colon)?;
            let value = self.parse_value()?;
            map.insert(key, value);

            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_token(Token::RightBrace)?;
        Ok(Value::Map(map))
    }

    /// Parse `Tag(arg, ...)`
    fn parse_call(&mut self, name: &str) -> Result<Value> {
        let Some(tag) = Tag::from_name(name) else {
            bail!("Unknown expression '{}'", name);
        };
        self.advance();
        self.expect_token(Token::LeftParen)?;
        let arguments = self.parse_value_list(Token::RightParen)?;
        let expr = Expression::from_arguments(tag, arguments)
            .with_context(|| format!("Invalid {} expression", tag))?;
        Ok(expr.into())
    }

    /// Parse comma-separated values up to and including `end`.
    /// A trailing comma is accepted.
    fn parse_value_list(&mut self, end: Token) -> Result<Vec<Value>> {
        let mut values = vec![];

        while !self.match_token(&end) {
            values.push(self.parse_value()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect_token(end)?;
        Ok(values)
    }

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("Expected {:?}, found {:?}", token, self.current_token())
        }
    }
}

fn parse_number(text: &str) -> Result<Value> {
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Integer(i));
        }
    }
    let f = text
        .parse::<f64>()
        .with_context(|| format!("Invalid number '{}'", text))?;
    Ok(Value::Float(f))
}

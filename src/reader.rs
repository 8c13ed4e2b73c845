// Reader for the canonical constructor-call syntax, e.g. `And(True, Eval('x', 0))`

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use crate::value::Value;
use anyhow::Result;

/// Parse constructor-call text into a value graph
pub fn parse_expression(input: &str) -> Result<Value> {
    Parser::new(input).parse()
}

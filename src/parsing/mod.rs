//! The language front end: tokens, AST, and the recursive descent parser.

pub mod ast;
mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse source text into a relational expression. Purely syntactic: names
/// are not resolved and nothing is evaluated.
pub fn parse(source: &str) -> Result<ast::RelExpr> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

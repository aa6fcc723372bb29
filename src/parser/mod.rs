//! GCode Parser
//!
//! Clean, fast parsing of GCode with minimal allocations.
//! Focused solely on tokenization and AST construction.

pub mod ast;
pub mod lexer;

pub use ast::{Command, Comment, Parameter, ParseError, ParsedLine};
pub use lexer::{tokenize_line, Token, TokenKind};

/// Parse a single line of GCode into structured data
///
/// This is the main entry point for parsing. It tokenizes the line
/// and constructs a simple AST representation.
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let tokens = lexer::tokenize_line(line);
    ast::tokens_to_parsed_line(tokens)
}

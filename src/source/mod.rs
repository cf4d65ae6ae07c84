//! Lexing and parsing of the source language.

pub mod ast;
pub mod parser;
pub mod token;

use slog::Logger;

pub use self::ast::Program;
pub use self::parser::{ParseError, Parser};
pub use self::token::{tokenize, LexError, Token, TokenKind};

use crate::error::TranslateError;

/// Parses a source file into a [Program].
///
/// # Errors
/// Fails on the first lexical error, or with every syntax error found in the input.
pub fn parse(source: &str) -> Result<Program, TranslateError> {
    parse_with_logger(source, None)
}

pub fn parse_with_logger<L>(source: &str, logger: L) -> Result<Program, TranslateError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger.into();

    let tokens = token::tokenize_with_logger(source, logger.clone())?;
    let (program, errors) = Parser::with_logger(tokens, logger).parse();

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(TranslateError::Parse(errors))
    }
}

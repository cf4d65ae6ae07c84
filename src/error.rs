//! Errors of the whole translation pipeline.
//!
//! Each stage has its own error type next to the code that produces it:
//! [LexError](crate::source::LexError), [ParseError](crate::source::ParseError) and
//! [CompileError](crate::compiler::CompileError). [TranslateError] collects them for
//! callers that run every stage at once.

use itertools::Itertools;

use std::fmt;

use crate::compiler::CompileError;
use crate::parsing::line_location;
use crate::source::{LexError, ParseError};

#[derive(Clone, Debug, PartialEq)]
pub enum TranslateError {
    /// Lexing stops at the first unrecognized input.
    Lex(LexError),
    Parse(Vec<ParseError>),
    Compile(Vec<CompileError>),
}

impl TranslateError {
    /// Renders every contained error prefixed with its line and column in `source`.
    pub fn verbose(&self, source: &str) -> Vec<String> {
        match self {
            TranslateError::Lex(err) => vec![format!("{}: {}", err.location(source), err)],
            TranslateError::Parse(errors) => errors
                .iter()
                .map(|err| format!("{}: {}", err.location(source), err))
                .collect(),
            TranslateError::Compile(errors) => errors
                .iter()
                .map(|err| format!("{}: {}", line_location(source, err.span().start), err))
                .collect(),
        }
    }

    /// Number of individual errors.
    pub fn len(&self) -> usize {
        match self {
            TranslateError::Lex(_) => 1,
            TranslateError::Parse(errors) => errors.len(),
            TranslateError::Compile(errors) => errors.len(),
        }
    }
}

impl From<LexError> for TranslateError {
    fn from(err: LexError) -> TranslateError {
        TranslateError::Lex(err)
    }
}

impl From<Vec<ParseError>> for TranslateError {
    fn from(errors: Vec<ParseError>) -> TranslateError {
        TranslateError::Parse(errors)
    }
}

impl From<Vec<CompileError>> for TranslateError {
    fn from(errors: Vec<CompileError>) -> TranslateError {
        TranslateError::Compile(errors)
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TranslateError::Lex(err) => write!(f, "{}", err),
            TranslateError::Parse(errors) => write!(f, "{}", errors.iter().join("\n")),
            TranslateError::Compile(errors) => write!(f, "{}", errors.iter().join("\n")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::translate;

    use super::TranslateError;

    #[test]
    fn test_lex_error_location() {
        let source = "let a = 1;\nlet b = $;";
        let err = translate(source).unwrap_err();

        assert!(matches!(err, TranslateError::Lex(_)));
        assert_eq!(err.verbose(source), vec!["2:9: unrecognized input at 19: '$;'"]);
    }

    #[test]
    fn test_compile_errors_are_collected() {
        let source = "print(a);\nprint(b);";
        let err = translate(source).unwrap_err();

        assert_eq!(err.len(), 2);

        let lines = err.verbose(source);
        assert!(lines[0].starts_with("1:1: undeclared variable 'a'"));
        assert!(lines[1].starts_with("2:1: undeclared variable 'b'"));
    }
}

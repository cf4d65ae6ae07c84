//! Tokens and a tokenizer for the source language.

use logos::Logos;
use slog::{o, trace, Discard, Logger};

use std::fmt;

use crate::parsing::{excerpt, line_location, LineLocation, Span};

/// Enumeration of all token kinds of the source language.
///
/// Fixed symbols and reserved words are matched as literal tokens which take
/// priority over the general patterns, so `==` wins over `=` and `while` over an
/// identifier while `whilst` is still an identifier.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Input that could not be interpreted as any of the other variants.
    #[error]
    #[regex(r"[ \t\n\r\f]+", logos::skip)]
    #[regex(r"//[^\n]*", logos::skip)]
    Error,

    /// A decimal or `0x` prefixed hexadecimal number literal.
    #[regex("0x[0-9a-fA-F]+|[0-9]+")]
    Number,

    /// A double-quoted string literal. Escapes are resolved by [unescape].
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("print")]
    Print,
    #[token("read")]
    Read,
    #[token("list")]
    List,
    #[token("inter")]
    Inter,
    #[token("intOn")]
    IntOn,
    #[token("intOff")]
    IntOff,

    #[token("=")]
    Assign,
    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    /// Appended by [tokenize] after the last real token.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            TokenKind::Error => "<error>",
            TokenKind::Number => "NUMBER",
            TokenKind::Str => "STRING",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Let => "LET",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Print => "PRINT",
            TokenKind::Read => "READ",
            TokenKind::List => "LIST",
            TokenKind::Inter => "INTER",
            TokenKind::IntOn => "INTON",
            TokenKind::IntOff => "INTOFF",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Equal => "EQ",
            TokenKind::NotEqual => "NOT_EQ",
            TokenKind::Less => "LT",
            TokenKind::Greater => "GT",
            TokenKind::LessEqual => "LE",
            TokenKind::GreaterEqual => "GE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Bang => "BANG",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMI",
            TokenKind::Eof => "EOF",
        };

        write!(f, "{}", text)
    }
}

/// A single token together with the source text it was produced from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::Number | TokenKind::Str | TokenKind::Identifier => {
                write!(f, "{}({})", self.kind, self.text)
            }
            kind => write!(f, "{}", kind),
        }
    }
}

/// Returned when a part of the input matches none of the token rules.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub text: String,
}

impl LexError {
    /// Line and column of the unmatched input.
    pub fn location(&self, source: &str) -> LineLocation {
        line_location(source, self.span.start)
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unrecognized input at {}: '{}'", self.span.start, self.text)
    }
}

/// Splits `source` into tokens. The returned vector always ends with an
/// [Eof](TokenKind::Eof) token.
///
/// # Errors
/// Tokenization stops at the first input that matches no rule.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    tokenize_with_logger(source, None)
}

pub fn tokenize_with_logger<L>(source: &str, logger: L) -> Result<Vec<Token>, LexError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or_else(|| Logger::root(Discard, o!()))
        .new(o!("stage" => "lexing"));

    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let span = lexer.span();

        if kind == TokenKind::Error {
            return Err(LexError {
                text: excerpt(source, span.start).to_string(),
                span,
            });
        }

        trace!(logger, "token"; "kind" => %kind, "start" => span.start);

        tokens.push(Token {
            kind,
            text: lexer.slice(),
            span,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: "",
        span: source.len()..source.len(),
    });

    Ok(tokens)
}

/// Resolves the escape sequences of a string literal token. The surrounding
/// quotes are removed.
pub fn unescape(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("could not tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_let_statement() {
        let tokens = tokenize("let a = 5 + 3;").unwrap();

        let rendered = tokens.iter().map(ToString::to_string).collect::<Vec<_>>();

        assert_eq!(
            rendered,
            vec!["LET", "IDENTIFIER(a)", "ASSIGN", "NUMBER(5)", "PLUS", "NUMBER(3)", "SEMI", "EOF"],
        );
    }

    #[test]
    fn test_longest_match() {
        use TokenKind::*;

        assert_eq!(kinds("a == b"), vec![Identifier, Equal, Identifier, Eof]);
        assert_eq!(kinds("a <= b"), vec![Identifier, LessEqual, Identifier, Eof]);
        assert_eq!(kinds("letter whilst intOnly"), vec![Identifier, Identifier, Identifier, Eof]);
        assert_eq!(kinds("intOn; intOff;"), vec![IntOn, Semicolon, IntOff, Semicolon, Eof]);
    }

    #[test]
    fn test_comments_and_whitespace() {
        use TokenKind::*;

        let source = "// header\nprint(x); // trailing\n\t// more\n";
        assert_eq!(kinds(source), vec![Print, LParen, Identifier, RParen, Semicolon, Eof]);
    }

    #[test]
    fn test_literals() {
        let tokens = tokenize(r#"0x1F 42 "a \"b\"\n""#).unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "0x1F");
        assert_eq!(tokens[1].text, "42");
        assert_eq!(tokens[2].kind, TokenKind::Str);
        assert_eq!(unescape(tokens[2].text), "a \"b\"\n");
    }

    #[test]
    fn test_lex_error() {
        let source = "let a = 1;\nlet b = #;";
        let err = tokenize(source).unwrap_err();

        assert_eq!(err.span.start, 19);
        assert_eq!(err.location(source), LineLocation { line: 2, column: 9 });
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}

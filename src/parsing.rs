//! Source spans and helpers shared by the lexer, the parser and the compiler.

use std::fmt;
use std::ops::Range;

/// Byte offsets into the source text.
pub type Span = Range<usize>;

/// A human readable position in the source text. Both fields are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LineLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

pub type LineSpan = Range<LineLocation>;

/// Converts byte offsets into line and column numbers.
pub trait AsLineSpan {
    fn as_line_span(&self, source: &str) -> LineSpan;
}

/// Calculates the line and column of the byte offset `offset` in `source`.
///
/// Offsets past the end of the input are clamped to the end.
pub fn line_location(source: &str, offset: usize) -> LineLocation {
    let mut line = 1;
    let mut column = 1;

    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }

        if ch == '\n' {
            line += 1;
            column = 0;
        }

        column += 1;
    }

    LineLocation { line, column }
}

impl AsLineSpan for Span {
    fn as_line_span(&self, source: &str) -> LineSpan {
        line_location(source, self.start)..line_location(source, self.end)
    }
}

/// Returns at most 20 characters of the line starting at `offset`.
/// Used to show the offending input in error messages.
pub fn excerpt(source: &str, offset: usize) -> &str {
    let start = std::cmp::min(offset, source.len());
    let rest = &source[start..];

    let end = rest
        .char_indices()
        .find_map(|(i, c)| match c {
            '\n' => Some(i),
            _ => None,
        })
        .unwrap_or_else(|| rest.len());

    let end = rest
        .char_indices()
        .nth(20)
        .map(|(i, _)| std::cmp::min(i, end))
        .unwrap_or(end);

    &rest[..end]
}

/// Attaches context descriptions to errors that carry a context stack.
pub trait ErrorExt<C> {
    fn context<T>(self, ctx: T) -> Self
    where
        T: Into<C>;
}

#[test]
fn test_line_location() {
    let source = "let a = 1;\nlet b = 2;\n  print(b);";

    assert_eq!(line_location(source, 0), LineLocation { line: 1, column: 1 });
    assert_eq!(line_location(source, 4), LineLocation { line: 1, column: 5 });
    assert_eq!(line_location(source, 11), LineLocation { line: 2, column: 1 });
    assert_eq!(line_location(source, 24), LineLocation { line: 3, column: 3 });

    let span: Span = 15..16;
    let lines = span.as_line_span(source);
    assert_eq!(lines.start, LineLocation { line: 2, column: 5 });
}

#[test]
fn test_excerpt() {
    let source = "let a = 1;\nlet b = 2;";
    assert_eq!(excerpt(source, 4), "a = 1;");
    assert_eq!(excerpt("x".repeat(40).as_str(), 0).len(), 20);
    assert_eq!(excerpt(source, 100), "");
}

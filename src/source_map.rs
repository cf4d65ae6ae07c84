//! Mapping between instruction addresses and source code spans.

use std::collections::BTreeMap;
use std::iter::FromIterator;

use crate::parsing::{AsLineSpan, LineSpan, Span};

/// Mapping from instruction addresses into source code spans. This type is generic
/// over the span type. Most common types for the generic `V` are [Span] and [LineSpan].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMap<V> {
    inner: BTreeMap<u32, V>,
}

impl<V> Default for SourceMap<V> {
    fn default() -> Self {
        SourceMap {
            inner: BTreeMap::new(),
        }
    }
}

impl<V> FromIterator<(u32, V)> for SourceMap<V> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (u32, V)>,
    {
        SourceMap {
            inner: BTreeMap::from_iter(iter),
        }
    }
}

impl<V> SourceMap<V> {
    pub(crate) fn insert(&mut self, addr: u32, span: V) {
        self.inner.insert(addr, span);
    }

    /// Returns the span of the statement that generated the word at `addr`.
    pub fn get_source_span(&self, addr: u32) -> Option<&V> {
        self.inner.get(&addr)
    }

    /// Iterates the mappings in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &V)> {
        self.inner.iter().map(|(addr, span)| (*addr, span))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SourceMap<Span> {
    /// Converts a [SourceMap] containing character offset based spans ([Span])
    /// into one containing line and column number based spans ([LineSpan]).
    pub fn into_line_based(self, source: &str) -> SourceMap<LineSpan> {
        SourceMap {
            inner: self
                .inner
                .into_iter()
                .map(|(addr, span)| (addr, span.as_line_span(source)))
                .collect(),
        }
    }
}

#[test]
fn test_into_line_based() {
    let source = "let a = 1;\nprint(a);\n";
    let map: SourceMap<Span> = vec![(6, 11..20), (7, 11..20)].into_iter().collect();

    let lines = map.into_line_based(source);
    let span = lines.get_source_span(7).unwrap();

    assert_eq!(span.start.line, 2);
    assert_eq!(span.start.column, 1);
    assert!(lines.get_source_span(0).is_none());
}

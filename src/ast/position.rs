//! Line and column lookup for error messages
//!
//! Syntax errors carry byte ranges into the snippet. Players read line and column
//! numbers, and the editor counts columns in characters, not bytes.

use super::span::Position;

/// Line start table over one snippet
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(at, _)| at + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Zero-based line and character column of a byte offset
    ///
    /// Offsets past the end of the snippet are clamped to it.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map_or(offset - start, |text| text.chars().count());
        Position::new(line, column)
    }
}

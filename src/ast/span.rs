//! Source ranges and positions
//!
//! A [`SourceRange`] is a half-open byte range into the exact text handed to the
//! parser. A [`Position`] is the human-facing line/column form of one offset, used
//! when reporting syntax errors.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Represents a position in source code (zero-based line and byte column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    /// Displays one-based, the way editors number lines and columns
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Half-open byte range `[begin, end)` of a node or token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct SourceRange {
    pub begin: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Smallest range covering both `self` and `other`
    pub fn join(self, other: SourceRange) -> Self {
        Self::new(self.begin.min(other.begin), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// Check if a byte offset falls inside this range
    pub fn contains(&self, offset: usize) -> bool {
        self.begin <= offset && offset < self.end
    }

    /// Check if two ranges share at least one byte
    pub fn overlaps(&self, other: SourceRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Check if `other` lies entirely within this range
    pub fn encloses(&self, other: SourceRange) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

impl From<Range<usize>> for SourceRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...{}", self.begin, self.end)
    }
}

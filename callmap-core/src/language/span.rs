//! Language-agnostic source span representation

use serde::{Deserialize, Serialize};

/// Language-agnostic source code span
///
/// Represents a contiguous region of source code, independent of the parser used.
/// All front-ends must convert their native span types to this representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Byte offset of the start of the span (inclusive)
    pub start: usize,
    /// Byte offset of the end of the span (exclusive)
    pub end: usize,
    /// Line number of the start (1-indexed)
    pub start_line: u32,
    /// Line number of the end (1-indexed)
    pub end_line: u32,
    /// Column number of the start (0-indexed, in bytes)
    pub start_col: u32,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize, start_line: u32, end_line: u32, start_col: u32) -> Self {
        SourceSpan {
            start,
            end,
            start_line,
            end_line,
            start_col,
        }
    }
}

/// Byte offset to line/column lookup for one source text
///
/// Lines are 1-indexed, columns are 0-indexed byte offsets from the line start.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { line_starts }
    }

    /// Line (1-indexed) and column (0-indexed) of a byte offset
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col as u32)
    }

    /// Build a span for `start..end`
    ///
    /// The end line is the line holding the last byte of the span, so a span
    /// ending right after a closing brace reports the brace's line.
    pub fn span(&self, start: usize, end: usize) -> SourceSpan {
        let (start_line, start_col) = self.line_col(start);
        let last = if end > start { end - 1 } else { start };
        let (end_line, _) = self.line_col(last);
        SourceSpan::new(start, end, start_line, end_line, start_col)
    }
}

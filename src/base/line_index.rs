//! Conversion between byte offsets and line/column positions.
//!
//! Byte offsets are the native coordinate of the syntax tree; editors speak
//! in lines and columns. [`LineIndex`] is built once per text and answers
//! both directions in O(log n).

use text_size::{TextRange, TextSize};

/// A line/column position (0-indexed, columns in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Maps byte offsets to [`LineCol`] positions and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Offset of the first byte of each line. Always starts with 0.
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::new(i as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Total length of the indexed text.
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }

    /// Number of lines (a trailing newline starts a final empty line).
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Convert a byte offset into a line/column position.
    ///
    /// Offsets past the end of the text clamp to the final position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = u32::from(offset) - u32::from(self.line_starts[line]);
        LineCol {
            line: line as u32,
            col,
        }
    }

    /// Convert a line/column position back into a byte offset.
    ///
    /// Returns `None` if the line does not exist or the column runs past the
    /// end of the text.
    pub fn offset(&self, pos: LineCol) -> Option<TextSize> {
        let start = *self.line_starts.get(pos.line as usize)?;
        let offset = start + TextSize::new(pos.col);
        (offset <= self.len).then_some(offset)
    }

    /// Byte range of the given line, excluding its terminating newline.
    pub fn line_range(&self, line: u32) -> Option<TextRange> {
        let start = *self.line_starts.get(line as usize)?;
        let end = match self.line_starts.get(line as usize + 1) {
            // Exclude the '\n' that opened the next line
            Some(&next) => next - TextSize::new(1),
            None => self.len,
        };
        Some(TextRange::new(start, end))
    }
}

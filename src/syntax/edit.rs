//! Edit descriptors for incremental reparsing.

use text_size::{TextRange, TextSize};

use crate::base::{LineCol, LineIndex};

/// A single text edit: the byte range that was replaced and the length of
/// its replacement, with the corresponding line/column positions.
///
/// An `Edit` is only an input to [`crate::parser::reparse`]; it is not
/// retained by the resulting tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    /// Start of the replaced range, in both old and new coordinates.
    pub start: TextSize,
    /// End of the replaced range in the old text.
    pub old_end: TextSize,
    /// End of the replacement in the new text.
    pub new_end: TextSize,
    pub start_pos: LineCol,
    pub old_end_pos: LineCol,
    pub new_end_pos: LineCol,
}

impl Edit {
    /// Build an edit from byte offsets, deriving line/column positions from
    /// the old and new texts.
    pub fn from_offsets(
        start: TextSize,
        old_end: TextSize,
        new_end: TextSize,
        old_text: &str,
        new_text: &str,
    ) -> Edit {
        let old_index = LineIndex::new(old_text);
        let new_index = LineIndex::new(new_text);
        Edit {
            start,
            old_end,
            new_end,
            start_pos: old_index.line_col(start),
            old_end_pos: old_index.line_col(old_end),
            new_end_pos: new_index.line_col(new_end),
        }
    }

    /// Replace `range` of `old_text` with `replacement`, returning the new
    /// text together with the matching edit descriptor.
    pub fn replace_range(old_text: &str, range: TextRange, replacement: &str) -> (String, Edit) {
        let mut new_text = String::with_capacity(old_text.len() + replacement.len());
        new_text.push_str(&old_text[..usize::from(range.start())]);
        new_text.push_str(replacement);
        new_text.push_str(&old_text[usize::from(range.end())..]);
        let new_end = range.start() + TextSize::of(replacement);
        let edit = Edit::from_offsets(range.start(), range.end(), new_end, old_text, &new_text);
        (new_text, edit)
    }

    /// The range this edit damaged in the old text.
    pub fn old_range(&self) -> TextRange {
        TextRange::new(self.start, self.old_end)
    }

    /// The range the replacement occupies in the new text.
    pub fn new_range(&self) -> TextRange {
        TextRange::new(self.start, self.new_end)
    }

    /// Signed length difference introduced by the edit.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end)) - i64::from(u32::from(self.old_end))
    }

    /// Map an offset at or after the old edit end into new-text coordinates.
    pub(crate) fn map_offset_after(&self, offset: TextSize) -> TextSize {
        debug_assert!(offset >= self.old_end);
        offset + self.new_end - self.old_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_range() {
        let (new_text, edit) = Edit::replace_range(
            "1+2",
            TextRange::new(TextSize::new(2), TextSize::new(3)),
            "3",
        );
        assert_eq!(new_text, "1+3");
        assert_eq!(edit.start, TextSize::new(2));
        assert_eq!(edit.old_end, TextSize::new(3));
        assert_eq!(edit.new_end, TextSize::new(3));
        assert_eq!(edit.delta(), 0);
    }

    #[test]
    fn test_insertion_positions() {
        let (new_text, edit) = Edit::replace_range(
            "ab\ncd",
            TextRange::empty(TextSize::new(4)),
            "xx\ny",
        );
        assert_eq!(new_text, "ab\ncxx\nyd");
        assert_eq!(edit.start_pos, LineCol::new(1, 1));
        assert_eq!(edit.old_end_pos, LineCol::new(1, 1));
        assert_eq!(edit.new_end_pos, LineCol::new(2, 1));
        assert_eq!(edit.delta(), 4);
    }

    #[test]
    fn test_map_after() {
        let (_, edit) = Edit::replace_range(
            "abcdef",
            TextRange::new(TextSize::new(1), TextSize::new(3)),
            "xxxx",
        );
        assert_eq!(edit.delta(), 2);
        assert_eq!(edit.map_offset_after(TextSize::new(3)), TextSize::new(5));
        assert_eq!(edit.map_offset_after(TextSize::new(6)), TextSize::new(8));
    }
}

use serde::{Deserialize, Serialize};

use super::grapheme::{byte_index, char_len, grapheme_boundaries};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("offset {offset} is out of range (length {len})")]
    OutOfRange { offset: usize, len: usize },
    #[error("offset {offset} falls inside a grapheme cluster")]
    SplitsGrapheme { offset: usize },
}

/// Character formatting carried by a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
        underline: false,
        code: false,
    };

    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::PLAIN
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::PLAIN
        }
    }
}

/// A styled piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub style: Style,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::PLAIN)
    }

    fn char_len(&self) -> usize {
        char_len(&self.text)
    }
}

/// The styled content of one content block.
///
/// Fragments are kept in canonical form: no empty fragments and no two
/// neighbours sharing a style. Two runs with the same visible text and the same
/// per-character styling therefore compare equal.
///
/// Public offsets count `char`s and must sit on grapheme boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRuns {
    fragments: Vec<TextFragment>,
}

impl TextRuns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_fragments([TextFragment::plain(text)])
    }

    pub fn from_fragments(fragments: impl IntoIterator<Item = TextFragment>) -> Self {
        let mut runs = Self {
            fragments: fragments.into_iter().collect(),
        };
        runs.normalize();
        runs
    }

    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Length in `char`s.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(TextFragment::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn grapheme_count(&self) -> usize {
        super::grapheme::grapheme_count(&self.text())
    }

    /// Style that text typed at `offset` picks up: the fragment to the left wins.
    pub fn style_at(&self, offset: usize) -> Style {
        let mut position = 0;
        let mut style = self.fragments.first().map(|f| f.style).unwrap_or_default();
        for fragment in &self.fragments {
            if position >= offset {
                break;
            }
            style = fragment.style;
            position += fragment.char_len();
        }
        style
    }

    /// Inserts `text` at `offset` with the style of the preceding character.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), TextError> {
        let style = self.style_at(offset);
        self.insert_styled(offset, text, style)
    }

    pub fn insert_styled(&mut self, offset: usize, text: &str, style: Style) -> Result<(), TextError> {
        self.check_boundary(offset)?;
        self.insert_runs_raw(offset, TextRuns::from_fragments([TextFragment::new(text, style)]));
        Ok(())
    }

    /// Deletes `grapheme_count` whole clusters starting at `offset`, returning what was removed.
    pub fn delete_text(&mut self, offset: usize, grapheme_count: usize) -> Result<TextRuns, TextError> {
        self.check_boundary(offset)?;
        let boundaries = grapheme_boundaries(&self.text());
        let start = boundaries.binary_search(&offset).unwrap_or_default();
        let end = boundaries
            .get(start + grapheme_count)
            .copied()
            .ok_or(TextError::OutOfRange {
                offset: offset + grapheme_count,
                len: self.len(),
            })?;
        Ok(self.remove_range_raw(offset..end))
    }

    /// Deletes a boundary-aligned `char` range.
    pub fn delete_range(&mut self, range: std::ops::Range<usize>) -> Result<TextRuns, TextError> {
        self.check_boundary(range.start)?;
        self.check_boundary(range.end)?;
        if range.start > range.end {
            return Err(TextError::OutOfRange {
                offset: range.start,
                len: range.end,
            });
        }
        Ok(self.remove_range_raw(range))
    }

    /// Splits into two independent sequences at `offset`.
    pub fn split(&self, offset: usize) -> Result<(TextRuns, TextRuns), TextError> {
        let mut left = self.clone();
        let right = left.split_off(offset)?;
        Ok((left, right))
    }

    /// Keeps everything before `offset` and returns the remainder.
    pub fn split_off(&mut self, offset: usize) -> Result<TextRuns, TextError> {
        self.check_boundary(offset)?;
        Ok(self.split_off_raw(offset))
    }

    pub fn append_fragment(&mut self, fragment: TextFragment) {
        self.fragments.push(fragment);
        self.normalize();
    }

    /// Concatenates `other` onto the end, keeping style boundaries intact.
    pub fn merge_with(&mut self, other: TextRuns) {
        self.fragments.extend(other.fragments);
        self.normalize();
    }

    /// Copy of the `char` range, without boundary checks.
    pub fn slice(&self, range: std::ops::Range<usize>) -> TextRuns {
        let mut copy = self.clone();
        let mut middle = copy.split_off_raw(range.start.min(copy.len()));
        middle.split_off_raw(range.end.saturating_sub(range.start).min(middle.len()));
        middle
    }

    /// Rewrites the style of every fragment in the range.
    pub fn restyle(
        &mut self,
        range: std::ops::Range<usize>,
        change: impl Fn(Style) -> Style,
    ) -> Result<TextRuns, TextError> {
        self.check_boundary(range.start)?;
        self.check_boundary(range.end)?;
        let original = self.slice(range.clone());
        let restyled = TextRuns::from_fragments(
            original
                .fragments
                .iter()
                .map(|f| TextFragment::new(f.text.clone(), change(f.style))),
        );
        self.replace_range_raw(range, restyled);
        Ok(original)
    }

    /// Whether every character in the range satisfies `predicate`.
    pub fn all_styled(&self, range: std::ops::Range<usize>, predicate: impl Fn(&Style) -> bool) -> bool {
        let slice = self.slice(range);
        !slice.is_empty() && slice.fragments.iter().all(|f| predicate(&f.style))
    }

    pub(crate) fn insert_runs_raw(&mut self, offset: usize, runs: TextRuns) {
        let tail = self.split_off_raw(offset);
        self.fragments.extend(runs.fragments);
        self.fragments.extend(tail.fragments);
        self.normalize();
    }

    pub(crate) fn remove_range_raw(&mut self, range: std::ops::Range<usize>) -> TextRuns {
        let mut removed = self.split_off_raw(range.start);
        let tail = removed.split_off_raw(range.end.saturating_sub(range.start));
        self.fragments.extend(tail.fragments);
        self.normalize();
        removed
    }

    pub(crate) fn replace_range_raw(&mut self, range: std::ops::Range<usize>, runs: TextRuns) -> TextRuns {
        let removed = self.remove_range_raw(range.clone());
        self.insert_runs_raw(range.start, runs);
        removed
    }

    fn split_off_raw(&mut self, offset: usize) -> TextRuns {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut position = 0;
        for fragment in std::mem::take(&mut self.fragments) {
            let len = fragment.char_len();
            if position + len <= offset {
                left.push(fragment);
            } else if position >= offset {
                right.push(fragment);
            } else {
                let cut = byte_index(&fragment.text, offset - position);
                let (head, tail) = fragment.text.split_at(cut);
                left.push(TextFragment::new(head, fragment.style));
                right.push(TextFragment::new(tail, fragment.style));
            }
            position += len;
        }
        self.fragments = left;
        self.normalize();
        TextRuns::from_fragments(right)
    }

    fn check_boundary(&self, offset: usize) -> Result<(), TextError> {
        let text = self.text();
        let len = char_len(&text);
        if offset > len {
            return Err(TextError::OutOfRange { offset, len });
        }
        if grapheme_boundaries(&text).binary_search(&offset).is_err() {
            return Err(TextError::SplitsGrapheme { offset });
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let mut normalized: Vec<TextFragment> = Vec::with_capacity(self.fragments.len());
        for fragment in std::mem::take(&mut self.fragments) {
            if fragment.text.is_empty() {
                continue;
            }
            match normalized.last_mut() {
                Some(last) if last.style == fragment.style => last.text.push_str(&fragment.text),
                _ => normalized.push(fragment),
            }
        }
        self.fragments = normalized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold_middle() -> TextRuns {
        TextRuns::from_fragments([
            TextFragment::plain("Hello "),
            TextFragment::new("bold", Style::bold()),
            TextFragment::plain(" world"),
        ])
    }

    #[test]
    fn empty_fragments_are_normalized_away() {
        let runs = TextRuns::from_fragments([
            TextFragment::plain(""),
            TextFragment::plain("ab"),
            TextFragment::plain("cd"),
            TextFragment::new("", Style::bold()),
        ]);
        assert_eq!(runs.fragments(), &[TextFragment::plain("abcd")]);
    }

    #[test]
    fn insert_inherits_left_style() {
        let mut runs = bold_middle();
        runs.insert_text(10, "er").unwrap();
        assert_eq!(runs.text(), "Hello bolder world");
        assert_eq!(runs.fragments()[1], TextFragment::new("bolder", Style::bold()));

        runs.insert_text(0, ">").unwrap();
        assert_eq!(runs.fragments()[0], TextFragment::plain(">Hello "));
    }

    #[test]
    fn insert_past_end_is_out_of_range() {
        let mut runs = TextRuns::from_text("abc");
        assert_eq!(
            runs.insert_text(4, "x"),
            Err(TextError::OutOfRange { offset: 4, len: 3 })
        );
    }

    #[test]
    fn delete_removes_whole_clusters() {
        let mut runs = TextRuns::from_text("xa\u{0301}\u{0302}y");
        let removed = runs.delete_text(1, 1).unwrap();
        assert_eq!(removed.text(), "a\u{0301}\u{0302}");
        assert_eq!(runs.text(), "xy");
    }

    #[test]
    fn delete_inside_cluster_is_rejected() {
        let mut runs = TextRuns::from_text("xa\u{0301}y");
        assert_eq!(
            runs.delete_text(2, 1),
            Err(TextError::SplitsGrapheme { offset: 2 })
        );
    }

    #[test]
    fn delete_more_than_available_is_out_of_range() {
        let mut runs = TextRuns::from_text("ab");
        assert!(matches!(
            runs.delete_text(1, 2),
            Err(TextError::OutOfRange { .. })
        ));
        assert_eq!(runs.text(), "ab");
    }

    #[test]
    fn delete_across_styles_returns_styled_runs() {
        let mut runs = bold_middle();
        let removed = runs.delete_text(4, 4).unwrap();
        assert_eq!(
            removed.fragments(),
            &[
                TextFragment::plain("o "),
                TextFragment::new("bo", Style::bold())
            ]
        );
        runs.insert_runs_raw(4, removed);
        assert_eq!(runs, bold_middle());
    }

    #[test]
    fn split_then_merge_restores_original() {
        let runs = bold_middle();
        let (mut left, right) = runs.split(8).unwrap();
        assert_eq!(left.text(), "Hello bo");
        assert_eq!(right.text(), "ld world");
        assert_eq!(right.fragments()[0], TextFragment::new("ld", Style::bold()));

        left.merge_with(right);
        assert_eq!(left, runs);
    }

    #[test]
    fn restyle_returns_previous_styling() {
        let mut runs = TextRuns::from_text("plain text");
        let previous = runs
            .restyle(0..5, |s| Style { italic: true, ..s })
            .unwrap();
        assert_eq!(runs.fragments()[0], TextFragment::new("plain", Style::italic()));
        assert!(runs.all_styled(0..5, |s| s.italic));
        assert!(!runs.all_styled(0..6, |s| s.italic));

        runs.replace_range_raw(0..5, previous);
        assert_eq!(runs, TextRuns::from_text("plain text"));
    }

    #[test]
    fn style_at_start_uses_first_fragment() {
        let runs = TextRuns::from_fragments([TextFragment::new("b", Style::bold())]);
        assert_eq!(runs.style_at(0), Style::bold());
        assert_eq!(TextRuns::new().style_at(0), Style::PLAIN);
    }
}

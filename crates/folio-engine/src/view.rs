//! Rendering capabilities the caret model calls into.
//!
//! Views are opaque to the engine: it only asks a block for the line holding a
//! caret and asks a line for the caret closest to an x position. The
//! [`MonospaceViews`] provider wraps text at a fixed number of graphemes and
//! serves terminal shells and tests.

use std::ops::Range;

use crate::document::{BlockId, Document};
use crate::editing::caret::TextCaret;
use crate::text::grapheme;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One visual line of a content block.
pub trait LineView {
    /// `char` range of the block text shown on this line.
    fn range(&self) -> Range<usize>;
    fn find_closest_to(&self, x: f32) -> TextCaret;
}

pub trait BlockView {
    fn measure(&self, caret: &TextCaret) -> Rect;
    fn line_for(&self, caret: &TextCaret) -> Option<Box<dyn LineView>>;
}

pub trait ViewProvider {
    fn view_for(&self, doc: &Document, block: BlockId) -> Option<Box<dyn BlockView>>;
}

/// The caret at the start of the visual line holding `caret`.
pub fn line_start(views: &dyn ViewProvider, doc: &Document, caret: &TextCaret) -> Option<TextCaret> {
    let line = views.view_for(doc, caret.block)?.line_for(caret)?;
    Some(line.find_closest_to(0.0))
}

/// The caret at the end of the visual line holding `caret`.
pub fn line_end(views: &dyn ViewProvider, doc: &Document, caret: &TextCaret) -> Option<TextCaret> {
    let line = views.view_for(doc, caret.block)?.line_for(caret)?;
    Some(line.find_closest_to(f32::INFINITY))
}

/// Soft-wraps every content block after `width` graphemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceViews {
    pub width: usize,
}

impl MonospaceViews {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }
}

impl ViewProvider for MonospaceViews {
    fn view_for(&self, doc: &Document, block: BlockId) -> Option<Box<dyn BlockView>> {
        let text = doc.text(block)?;
        Some(Box::new(MonospaceView::new(block, &text, self.width)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonospaceView {
    block: BlockId,
    width: usize,
    boundaries: Vec<usize>,
}

impl MonospaceView {
    pub fn new(block: BlockId, text: &str, width: usize) -> Self {
        Self {
            block,
            width: width.max(1),
            boundaries: grapheme::grapheme_boundaries(text),
        }
    }

    fn grapheme_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn line_count(&self) -> usize {
        self.grapheme_count().div_ceil(self.width).max(1)
    }

    /// `char` range of every visual line, in order.
    pub fn lines(&self) -> Vec<Range<usize>> {
        (0..self.line_count())
            .map(|line| {
                let first = line * self.width;
                let last = ((line + 1) * self.width).min(self.grapheme_count());
                self.boundaries[first]..self.boundaries[last]
            })
            .collect()
    }

    /// Line and column of the caret; the text end sits on the last line.
    fn locate(&self, caret: &TextCaret) -> Option<(usize, usize)> {
        if caret.block != self.block {
            return None;
        }
        let index = self.boundaries.binary_search(&caret.offset).ok()?;
        let line = (index / self.width).min(self.line_count() - 1);
        Some((line, index - line * self.width))
    }

    /// Caret positions a line can hold; wrapped lines stop before their last grapheme.
    fn line(&self, line: usize) -> MonospaceLine {
        let first = line * self.width;
        let last = if line + 1 == self.line_count() {
            self.grapheme_count()
        } else {
            first + self.width - 1
        };
        MonospaceLine {
            block: self.block,
            positions: self.boundaries[first..=last].to_vec(),
        }
    }
}

impl BlockView for MonospaceView {
    fn measure(&self, caret: &TextCaret) -> Rect {
        let (line, column) = self.locate(caret).unwrap_or_default();
        Rect {
            x: column as f32,
            y: line as f32,
            width: 1.0,
            height: 1.0,
        }
    }

    fn line_for(&self, caret: &TextCaret) -> Option<Box<dyn LineView>> {
        let (line, _) = self.locate(caret)?;
        Some(Box::new(self.line(line)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MonospaceLine {
    block: BlockId,
    positions: Vec<usize>,
}

impl LineView for MonospaceLine {
    fn range(&self) -> Range<usize> {
        let start = self.positions.first().copied().unwrap_or_default();
        let end = self.positions.last().copied().unwrap_or(start);
        start..end
    }

    fn find_closest_to(&self, x: f32) -> TextCaret {
        let last = self.positions.len().saturating_sub(1);
        let column = if x.is_finite() {
            (x.max(0.0).round() as usize).min(last)
        } else if x > 0.0 {
            last
        } else {
            0
        };
        TextCaret::new(
            self.block,
            self.positions.get(column).copied().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::paragraphs;
    use rstest::rstest;

    #[rstest]
    #[case("", 1)]
    #[case("abcd", 1)]
    #[case("abcde", 2)]
    #[case("abcdefghi", 3)]
    fn wraps_after_width_graphemes(#[case] text: &str, #[case] lines: usize) {
        let view = MonospaceView::new(BlockId::new(), text, 4);
        assert_eq!(view.line_count(), lines);
        assert_eq!(view.lines().len(), lines);
        assert_eq!(view.lines().last().map(|l| l.end), Some(text.chars().count()));
    }

    #[test]
    fn measures_column_and_line() {
        let block = BlockId::new();
        let view = MonospaceView::new(block, "abcdefghi", 4);
        let rect = view.measure(&TextCaret::new(block, 6));
        assert_eq!((rect.x, rect.y), (2.0, 1.0));
        let end = view.measure(&TextCaret::new(block, 9));
        assert_eq!((end.x, end.y), (1.0, 2.0));
    }

    #[test]
    fn line_edges_follow_wrapping() {
        let doc = paragraphs(&["abcdefghi"]);
        let block = doc.leaves()[0];
        let views = MonospaceViews::new(4);
        let middle = TextCaret::new(block, 5);
        assert_eq!(line_start(&views, &doc, &middle), Some(TextCaret::new(block, 4)));
        assert_eq!(line_end(&views, &doc, &middle), Some(TextCaret::new(block, 7)));
        let last = TextCaret::new(block, 8);
        assert_eq!(line_end(&views, &doc, &last), Some(TextCaret::new(block, 9)));
    }

    #[test]
    fn lines_count_graphemes_not_chars() {
        let block = BlockId::new();
        let view = MonospaceView::new(block, "e\u{0301}e\u{0301}e\u{0301}", 2);
        let line = view.line_for(&TextCaret::new(block, 4)).expect("line");
        assert_eq!(line.range(), 4..6);
        assert_eq!(line.find_closest_to(7.0), TextCaret::new(block, 6));
    }

    #[test]
    fn containers_have_no_view() {
        let doc = paragraphs(&["x"]);
        assert!(MonospaceViews::new(10).view_for(&doc, doc.root()).is_none());
    }
}

//! Lays the document out as prefixed, soft-wrapped terminal lines.

use std::ops::Range;

use folio_engine::document::{BlockId, BlockKind, Document};
use folio_engine::editing::EditorContext;
use folio_engine::text::Style;
use folio_engine::view::{BlockView, MonospaceView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualLine {
    pub prefix: String,
    pub segments: Vec<Segment>,
    pub heading: bool,
}

impl VisualLine {
    #[cfg(test)]
    pub fn plain(&self) -> String {
        let body: String = self.segments.iter().map(|s| s.text.as_str()).collect();
        format!("{}{body}", self.prefix)
    }
}

#[derive(Debug, Default)]
pub struct DocumentLayout {
    pub lines: Vec<VisualLine>,
    /// Column and row of the caret.
    pub cursor: Option<(usize, usize)>,
}

/// Marker shown before a block, plus one `> ` per enclosing quote.
fn block_prefix(doc: &Document, block: BlockId) -> String {
    let mut quotes = 0;
    let mut lists: usize = 0;
    let mut ancestor = doc.parent(block);
    while let Some(id) = ancestor {
        match doc.block(id).map(|b| b.kind()) {
            Some(BlockKind::BlockQuote) => quotes += 1,
            Some(BlockKind::List) => lists += 1,
            _ => {}
        }
        ancestor = doc.parent(id);
    }
    let marker = match doc.block(block).map(|b| b.kind()) {
        Some(BlockKind::Heading { level }) => format!("{} ", "#".repeat(usize::from(level))),
        Some(BlockKind::ListItem) => "• ".to_string(),
        _ => String::new(),
    };
    format!("{}{}{marker}", "> ".repeat(quotes), "  ".repeat(lists.saturating_sub(1)))
}

fn overlap(a: &Range<usize>, b: &Range<usize>) -> Range<usize> {
    a.start.max(b.start)..a.end.min(b.end)
}

/// The selected `char` range inside each block.
fn selected_ranges(ctx: &EditorContext, leaves: &[BlockId]) -> Vec<Range<usize>> {
    let doc = &ctx.document;
    let mut ranges = vec![0..0; leaves.len()];
    if !ctx.selection.has_selection() {
        return ranges;
    }
    let Some((first, last)) = ctx.selection.ordered_text(doc) else {
        return ranges;
    };
    let position = |block| leaves.iter().position(|&leaf| leaf == block);
    let (Some(from), Some(to)) = (position(first.block), position(last.block)) else {
        return ranges;
    };
    for (index, &block) in leaves.iter().enumerate().take(to + 1).skip(from) {
        let start = if index == from { first.offset } else { 0 };
        let end = if index == to { last.offset } else { doc.text_len(block) };
        ranges[index] = start..end;
    }
    ranges
}

pub fn layout_document(ctx: &EditorContext, width: usize) -> DocumentLayout {
    let doc = &ctx.document;
    let caret = ctx.caret().as_text();
    let leaves = doc.leaves();
    let selected = selected_ranges(ctx, &leaves);
    let mut layout = DocumentLayout::default();

    for (index, &block) in leaves.iter().enumerate() {
        let Some(runs) = doc.runs(block) else {
            continue;
        };
        let text = runs.text();
        let view = MonospaceView::new(block, &text, width);
        let prefix = block_prefix(doc, block);
        let indent = " ".repeat(prefix.chars().count());
        let heading = matches!(doc.block(block).map(|b| b.kind()), Some(BlockKind::Heading { .. }));
        let first_row = layout.lines.len();

        for (line_index, line) in view.lines().into_iter().enumerate() {
            let mut segments = Vec::new();
            let mut position = 0;
            for fragment in runs.fragments() {
                let len = fragment.text.chars().count();
                let fragment_range = position..position + len;
                position += len;
                let visible = overlap(&fragment_range, &line);
                if visible.is_empty() {
                    continue;
                }
                let chosen = overlap(&visible, &selected[index]);
                let pieces = if chosen.is_empty() {
                    vec![(visible, false)]
                } else {
                    vec![
                        (visible.start..chosen.start, false),
                        (chosen.clone(), true),
                        (chosen.end..visible.end, false),
                    ]
                };
                for (piece, is_selected) in pieces.into_iter().filter(|(r, _)| !r.is_empty()) {
                    let text: String = fragment
                        .text
                        .chars()
                        .skip(piece.start - fragment_range.start)
                        .take(piece.len())
                        .collect();
                    segments.push(Segment {
                        text,
                        style: fragment.style,
                        selected: is_selected,
                    });
                }
            }
            layout.lines.push(VisualLine {
                prefix: if line_index == 0 { prefix.clone() } else { indent.clone() },
                segments,
                heading,
            });
        }

        if let Some(caret) = caret.filter(|c| c.block == block) {
            let rect = view.measure(&caret);
            layout.cursor = Some((
                indent.chars().count() + rect.x as usize,
                first_row + rect.y as usize,
            ));
        }
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_engine::document::DocumentBuilder;
    use folio_engine::editing::{Caret, MoveMode};
    use folio_engine::text::{TextFragment, TextRuns};
    use pretty_assertions::assert_eq;

    fn plain_lines(layout: &DocumentLayout) -> Vec<String> {
        layout.lines.iter().map(VisualLine::plain).collect()
    }

    #[test]
    fn prefixes_follow_block_kinds() {
        let doc = DocumentBuilder::new()
            .heading(2, "Title")
            .container(BlockKind::BlockQuote, |q| {
                q.container(BlockKind::List, |l| l.list_item("item"))
            })
            .paragraph("body")
            .build()
            .unwrap();
        let layout = layout_document(&EditorContext::new(doc), 20);
        assert_eq!(plain_lines(&layout), vec!["## Title", "> • item", "body"]);
        assert!(layout.lines[0].heading);
        assert_eq!(layout.cursor, Some((3, 0)));
    }

    #[test]
    fn wrapped_lines_are_indented_and_carry_the_cursor() {
        let doc = DocumentBuilder::new().list_item("abcdefgh").build().unwrap();
        let mut ctx = EditorContext::new(doc);
        let block = ctx.document.leaves()[0];
        ctx.selection.move_to(Caret::text(block, 6), MoveMode::Replace);
        let layout = layout_document(&ctx, 5);
        assert_eq!(plain_lines(&layout), vec!["• abcde", "  fgh"]);
        assert_eq!(layout.cursor, Some((3, 1)));
    }

    #[test]
    fn selection_and_styles_split_segments() {
        let doc = DocumentBuilder::new()
            .content(
                BlockKind::Paragraph,
                TextRuns::from_fragments([TextFragment::plain("ab"), TextFragment::new("cd", Style::bold())]),
            )
            .build()
            .unwrap();
        let mut ctx = EditorContext::new(doc);
        let block = ctx.document.leaves()[0];
        ctx.selection.move_to(Caret::text(block, 1), MoveMode::Replace);
        ctx.selection.move_to(Caret::text(block, 3), MoveMode::Extend);
        let layout = layout_document(&ctx, 20);
        let segments: Vec<_> = layout.lines[0]
            .segments
            .iter()
            .map(|s| (s.text.as_str(), s.style.bold, s.selected))
            .collect();
        assert_eq!(
            segments,
            vec![("a", false, false), ("b", false, true), ("c", true, true), ("d", true, false)]
        );
    }
}

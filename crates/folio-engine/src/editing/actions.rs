//! Reversible document edits.
//!
//! An [`EditAction`] addresses the blocks it touches through [`CursorHandle`]s
//! captured when it was built, never through live ids, so it can be replayed
//! after undo has rebuilt the blocks it removed. `apply` and `revert` are
//! exact inverses: after `apply` then `revert` the document serializes to the
//! same tree it did before.

use crate::document::{BlockId, BlockKind, BlockTreeWalker, DetachedBlock, Document};
use crate::editing::caret::{Caret, TextCaret};
use crate::editing::handle::CursorHandle;
use crate::editing::{EditError, EditorContext};
use crate::text::{Style, TextRuns, grapheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    /// The caret sat after the removed text (backspace).
    Backward,
    /// The caret sat before the removed text (delete).
    Forward,
}

/// Style flags to force on or off; `None` leaves a flag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleChange {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub code: Option<bool>,
}

impl StyleChange {
    pub fn bold(on: bool) -> Self {
        Self {
            bold: Some(on),
            ..Self::default()
        }
    }

    pub fn italic(on: bool) -> Self {
        Self {
            italic: Some(on),
            ..Self::default()
        }
    }

    pub fn apply(&self, style: Style) -> Style {
        Style {
            bold: self.bold.unwrap_or(style.bold),
            italic: self.italic.unwrap_or(style.italic),
            underline: self.underline.unwrap_or(style.underline),
            code: self.code.unwrap_or(style.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertText {
    at: CursorHandle,
    text: String,
    style: Option<Style>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteText {
    at: CursorHandle,
    graphemes: usize,
    direction: DeleteDirection,
    removed: Option<TextRuns>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitBlock {
    at: CursorHandle,
    created: Option<CursorHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeBlocks {
    second: CursorHandle,
    joint: Option<CursorHandle>,
    detached: Option<DetachedBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetBlockKind {
    at: CursorHandle,
    kind: BlockKind,
    previous: Option<BlockKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyStyle {
    at: CursorHandle,
    len: usize,
    change: StyleChange,
    original: Option<TextRuns>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    InsertText(InsertText),
    DeleteText(DeleteText),
    /// Splits a content block in two at a text offset.
    SplitBlock(SplitBlock),
    /// Appends a content block to the previous leaf and removes it.
    MergeBlocks(MergeBlocks),
    SetBlockKind(SetBlockKind),
    ApplyStyle(ApplyStyle),
    /// Applied in order, reverted in reverse order.
    Batch(Vec<EditAction>),
}

fn text_location(handle: &CursorHandle, doc: &Document) -> Result<(BlockId, usize), EditError> {
    let block = handle.locate(doc).ok_or(EditError::UnresolvableTarget)?;
    let offset = handle.offset().ok_or(EditError::NotATextCaret)?;
    Ok((block, offset))
}

/// Smallest grapheme boundary at or after `offset`.
fn ceil_boundary(text: &str, offset: usize) -> usize {
    if grapheme::is_grapheme_boundary(text, offset) {
        offset
    } else {
        grapheme::next_boundary(text, offset).unwrap_or(offset)
    }
}

fn is_single_grapheme(text: &str) -> bool {
    grapheme::grapheme_count(text) == 1
}

fn ends_with_whitespace(text: &str) -> bool {
    text.chars().last().is_some_and(char::is_whitespace)
}

impl EditAction {
    pub fn insert_text(doc: &Document, at: TextCaret, text: impl Into<String>) -> Self {
        EditAction::InsertText(InsertText {
            at: CursorHandle::capture(&Caret::Text(at), doc),
            text: text.into(),
            style: None,
        })
    }

    pub fn insert_styled(doc: &Document, at: TextCaret, text: impl Into<String>, style: Style) -> Self {
        EditAction::InsertText(InsertText {
            at: CursorHandle::capture(&Caret::Text(at), doc),
            text: text.into(),
            style: Some(style),
        })
    }

    /// Removes `graphemes` clusters starting at `at`.
    pub fn delete_text(doc: &Document, at: TextCaret, graphemes: usize, direction: DeleteDirection) -> Self {
        EditAction::DeleteText(DeleteText {
            at: CursorHandle::capture(&Caret::Text(at), doc),
            graphemes,
            direction,
            removed: None,
        })
    }

    pub fn split_block(doc: &Document, at: TextCaret) -> Self {
        EditAction::SplitBlock(SplitBlock {
            at: CursorHandle::capture(&Caret::Text(at), doc),
            created: None,
        })
    }

    /// Merges `second` into the content block before it.
    pub fn merge_blocks(doc: &Document, second: BlockId) -> Self {
        EditAction::MergeBlocks(MergeBlocks {
            second: CursorHandle::capture(&Caret::text(second, 0), doc),
            joint: None,
            detached: None,
        })
    }

    pub fn set_block_kind(doc: &Document, block: BlockId, kind: BlockKind) -> Self {
        EditAction::SetBlockKind(SetBlockKind {
            at: CursorHandle::capture(&Caret::start_of(doc, block), doc),
            kind,
            previous: None,
        })
    }

    /// Restyles `len` chars of one block starting at `at`.
    pub fn apply_style(doc: &Document, at: TextCaret, len: usize, change: StyleChange) -> Self {
        EditAction::ApplyStyle(ApplyStyle {
            at: CursorHandle::capture(&Caret::Text(at), doc),
            len,
            change,
            original: None,
        })
    }

    /// Deletes everything between two text carets given in document order.
    ///
    /// Within one block this is a single [`DeleteText`]. Across blocks the text
    /// is removed from the last block back to the first, then the emptied
    /// tails are merged, last block first, so every captured path stays valid.
    pub fn delete_between(doc: &Document, first: TextCaret, last: TextCaret) -> Self {
        let text_graphemes = |block, range: std::ops::Range<usize>| {
            doc.text(block)
                .map(|text| {
                    grapheme::grapheme_boundaries(&text)
                        .into_iter()
                        .filter(|b| *b > range.start && *b <= range.end)
                        .count()
                })
                .unwrap_or_default()
        };

        if first.block == last.block {
            let count = text_graphemes(first.block, first.offset..last.offset);
            return EditAction::delete_text(doc, first, count, DeleteDirection::Forward);
        }

        let mut blocks = Vec::new();
        for block in BlockTreeWalker::new(doc).iter_from(first.block) {
            blocks.push(block);
            if block == last.block {
                break;
            }
        }

        let mut actions = Vec::new();
        for (position, &block) in blocks.iter().enumerate().rev() {
            let start = if position == 0 { first.offset } else { 0 };
            let end = if block == last.block {
                last.offset
            } else {
                doc.text_len(block)
            };
            let count = text_graphemes(block, start..end);
            if count > 0 {
                actions.push(EditAction::delete_text(
                    doc,
                    TextCaret::new(block, start),
                    count,
                    DeleteDirection::Forward,
                ));
            }
        }
        for &block in blocks.iter().skip(1).rev() {
            actions.push(EditAction::merge_blocks(doc, block));
        }
        EditAction::Batch(actions)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            EditAction::InsertText(_) => "insert-text",
            EditAction::DeleteText(_) => "delete-text",
            EditAction::SplitBlock(_) => "split-block",
            EditAction::MergeBlocks(_) => "merge-blocks",
            EditAction::SetBlockKind(_) => "set-block-kind",
            EditAction::ApplyStyle(_) => "apply-style",
            EditAction::Batch(_) => "batch",
        }
    }

    /// Performs the edit, returning where the caret should go (or `None` to leave it).
    pub fn apply(&mut self, ctx: &mut EditorContext) -> Result<Option<Caret>, EditError> {
        let doc = &mut ctx.document;
        match self {
            EditAction::InsertText(insert) => {
                let (block, offset) = text_location(&insert.at, doc)?;
                let text = insert.text.as_str();
                match insert.style {
                    Some(style) => doc.edit_runs(block, |runs| runs.insert_styled(offset, text, style))?,
                    None => doc.edit_runs(block, |runs| runs.insert_text(offset, text))?,
                }
                let updated = doc.text(block).unwrap_or_default();
                let after = ceil_boundary(&updated, offset + grapheme::char_len(text));
                Ok(Some(Caret::text(block, after)))
            }
            EditAction::DeleteText(delete) => {
                let (block, offset) = text_location(&delete.at, doc)?;
                let count = delete.graphemes;
                let removed = doc.edit_runs(block, |runs| runs.delete_text(offset, count))?;
                delete.removed = Some(removed);
                Ok(Some(Caret::text(block, offset)))
            }
            EditAction::SplitBlock(split) => {
                let (block, offset) = text_location(&split.at, doc)?;
                let node = doc.require(block)?;
                let parent = node.parent().ok_or(EditError::UnresolvableTarget)?;
                let at_end = offset >= doc.text_len(block);
                let kind = if at_end {
                    node.kind().continuation()
                } else {
                    node.kind()
                };
                let index = doc
                    .index_in_parent(block)
                    .ok_or(EditError::UnresolvableTarget)?;
                let tail = doc.edit_runs(block, |runs| runs.split_off(offset))?;
                let created = match doc.insert_content_block(parent, index + 1, kind, tail.clone()) {
                    Ok(created) => created,
                    Err(err) => {
                        doc.edit_runs(block, |runs| {
                            runs.merge_with(tail);
                            Ok(())
                        })?;
                        return Err(err.into());
                    }
                };
                let caret = Caret::text(created, 0);
                split.created = Some(CursorHandle::capture(&caret, doc));
                Ok(Some(caret))
            }
            EditAction::MergeBlocks(merge) => {
                let second = merge
                    .second
                    .locate(doc)
                    .ok_or(EditError::UnresolvableTarget)?;
                let previous = BlockTreeWalker::new(doc)
                    .previous_non_container(second)
                    .ok_or(EditError::NoPreviousBlock)?;
                let runs = doc.runs(second).cloned().ok_or(EditError::NotATextCaret)?;
                let joint = doc.text_len(previous);
                let detached = doc.detach(second)?;
                doc.edit_runs(previous, |target| {
                    target.merge_with(runs);
                    Ok(())
                })?;
                let caret = Caret::text(previous, joint);
                merge.joint = Some(CursorHandle::capture(&caret, doc));
                merge.detached = Some(detached);
                Ok(Some(caret))
            }
            EditAction::SetBlockKind(set) => {
                let block = set.at.locate(doc).ok_or(EditError::UnresolvableTarget)?;
                set.previous = Some(doc.set_kind(block, set.kind)?);
                Ok(None)
            }
            EditAction::ApplyStyle(style) => {
                let (block, offset) = text_location(&style.at, doc)?;
                let change = style.change;
                let original =
                    doc.edit_runs(block, |runs| runs.restyle(offset..offset + style.len, |s| change.apply(s)))?;
                style.original = Some(original);
                Ok(None)
            }
            EditAction::Batch(actions) => {
                let mut caret = None;
                for applied in 0..actions.len() {
                    match actions[applied].apply(ctx) {
                        Ok(next) => caret = next.or(caret),
                        Err(err) => {
                            for action in actions[..applied].iter_mut().rev() {
                                action.revert(ctx)?;
                            }
                            return Err(err);
                        }
                    }
                }
                Ok(caret)
            }
        }
    }

    /// Undoes a previous [`apply`](Self::apply).
    pub fn revert(&mut self, ctx: &mut EditorContext) -> Result<(), EditError> {
        let doc = &mut ctx.document;
        match self {
            EditAction::InsertText(insert) => {
                let (block, offset) = text_location(&insert.at, doc)?;
                let end = offset + grapheme::char_len(&insert.text);
                doc.edit_runs(block, |runs| Ok(runs.remove_range_raw(offset..end)))?;
            }
            EditAction::DeleteText(delete) => {
                let (block, offset) = text_location(&delete.at, doc)?;
                let removed = delete.removed.clone().ok_or(EditError::NotApplied)?;
                doc.edit_runs(block, |runs| {
                    runs.insert_runs_raw(offset, removed);
                    Ok(())
                })?;
            }
            EditAction::SplitBlock(split) => {
                let (block, _) = text_location(&split.at, doc)?;
                let created = split
                    .created
                    .as_ref()
                    .and_then(|handle| handle.locate(doc))
                    .ok_or(EditError::NotApplied)?;
                let tail = doc.runs(created).cloned().ok_or(EditError::NotATextCaret)?;
                doc.detach(created)?;
                doc.edit_runs(block, |runs| {
                    runs.merge_with(tail);
                    Ok(())
                })?;
            }
            EditAction::MergeBlocks(merge) => {
                let joint = merge.joint.as_ref().ok_or(EditError::NotApplied)?;
                let (previous, offset) = text_location(joint, doc)?;
                let detached = merge.detached.take().ok_or(EditError::NotApplied)?;
                doc.edit_runs(previous, |runs| {
                    let len = runs.len();
                    Ok(runs.remove_range_raw(offset..len))
                })?;
                doc.attach(detached)?;
            }
            EditAction::SetBlockKind(set) => {
                let block = set.at.locate(doc).ok_or(EditError::UnresolvableTarget)?;
                let previous = set.previous.ok_or(EditError::NotApplied)?;
                doc.set_kind(block, previous)?;
            }
            EditAction::ApplyStyle(style) => {
                let (block, offset) = text_location(&style.at, doc)?;
                let original = style.original.clone().ok_or(EditError::NotApplied)?;
                let end = offset + style.len;
                doc.edit_runs(block, |runs| Ok(runs.replace_range_raw(offset..end, original)))?;
            }
            EditAction::Batch(actions) => {
                for action in actions.iter_mut().rev() {
                    action.revert(ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Folds `next` into `self` when both are single-grapheme edits that
    /// continue each other inside one block.
    ///
    /// Typing coalesces until a word starts after whitespace; deletions
    /// coalesce while they keep going in the same direction.
    pub fn try_merge(&mut self, next: &EditAction) -> bool {
        match (self, next) {
            (EditAction::InsertText(previous), EditAction::InsertText(next)) => {
                let (Some(start), Some(at)) = (previous.at.offset(), next.at.offset()) else {
                    return false;
                };
                let contiguous = previous.at.path() == next.at.path()
                    && at == start + grapheme::char_len(&previous.text);
                let new_word = ends_with_whitespace(&previous.text) && !ends_with_whitespace(&next.text);
                if !contiguous || new_word || previous.style != next.style || !is_single_grapheme(&next.text) {
                    return false;
                }
                previous.text.push_str(&next.text);
                true
            }
            (EditAction::DeleteText(previous), EditAction::DeleteText(next)) => {
                let (Some(start), Some(at)) = (previous.at.offset(), next.at.offset()) else {
                    return false;
                };
                let (Some(removed), Some(next_removed)) = (previous.removed.as_mut(), next.removed.as_ref()) else {
                    return false;
                };
                if previous.at.path() != next.at.path()
                    || previous.direction != next.direction
                    || next.graphemes != 1
                {
                    return false;
                }
                match next.direction {
                    DeleteDirection::Backward if at + next_removed.len() == start => {
                        let mut combined = next_removed.clone();
                        combined.merge_with(std::mem::take(removed));
                        *removed = combined;
                        previous.at = previous.at.with_offset(at);
                    }
                    DeleteDirection::Forward if at == start => {
                        removed.merge_with(next_removed.clone());
                    }
                    _ => return false,
                }
                previous.graphemes += 1;
                true
            }
            _ => false,
        }
    }
}

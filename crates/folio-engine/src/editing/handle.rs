//! Durable, path-based caret positions.
//!
//! A [`CursorHandle`] records the child-index path from the root to the
//! caret's block plus the position inside it. Resolving walks the path again,
//! so a handle survives edits that replace blocks, as long as the shape of
//! the tree along the path is unchanged.
//!
//! Resolution never fails. When the path no longer fits the tree it is
//! clamped: an out-of-range child index falls back to the last child at that
//! depth and descent stops there, with the caret at the end of that block.

use serde::{Deserialize, Serialize};

use crate::document::{BlockId, BlockTreeWalker, Document, DocumentId};
use crate::editing::caret::Caret;
use crate::editing::selection::Selection;
use crate::text::grapheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleTarget {
    Text { offset: usize },
    Boundary { index: usize },
    Invalid,
}

/// The caret a handle was captured from, reused while the document is unchanged.
#[derive(Debug, Clone, Copy)]
struct Captured {
    document: DocumentId,
    revision: u64,
    caret: Caret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorHandle {
    path: Vec<usize>,
    target: HandleTarget,
    #[serde(skip)]
    captured: Option<Captured>,
}

impl PartialEq for CursorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.target == other.target
    }
}

impl Eq for CursorHandle {}

impl CursorHandle {
    pub fn capture(caret: &Caret, doc: &Document) -> Self {
        let located = match caret {
            Caret::Text(text) => doc
                .path_to(text.block)
                .map(|path| (path, HandleTarget::Text { offset: text.offset })),
            Caret::Boundary(boundary) => doc
                .path_to(boundary.container)
                .map(|path| (path, HandleTarget::Boundary { index: boundary.index })),
            Caret::Invalid => None,
        };
        let Some((path, target)) = located else {
            return Self::invalid();
        };
        Self {
            path,
            target,
            captured: Some(Captured {
                document: doc.id(),
                revision: doc.revision(),
                caret: *caret,
            }),
        }
    }

    pub fn invalid() -> Self {
        Self {
            path: Vec::new(),
            target: HandleTarget::Invalid,
            captured: None,
        }
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn target(&self) -> HandleTarget {
        self.target
    }

    /// Recorded text offset, for text targets.
    pub fn offset(&self) -> Option<usize> {
        match self.target {
            HandleTarget::Text { offset } => Some(offset),
            _ => None,
        }
    }

    /// Same block path, different text offset.
    pub fn with_offset(&self, offset: usize) -> Self {
        Self {
            path: self.path.clone(),
            target: HandleTarget::Text { offset },
            captured: None,
        }
    }

    /// The block at the recorded path, with no fallback when the path no longer fits.
    pub fn locate(&self, doc: &Document) -> Option<BlockId> {
        if self.target == HandleTarget::Invalid {
            return None;
        }
        self.path
            .iter()
            .try_fold(doc.root(), |block, &index| doc.children(block).get(index).copied())
    }

    /// Turns the handle back into a live caret for `doc`.
    pub fn resolve(&self, doc: &Document) -> Caret {
        if let Some(captured) = self.captured
            && captured.document == doc.id()
            && captured.revision == doc.revision()
        {
            return captured.caret;
        }
        if self.target == HandleTarget::Invalid {
            return Caret::Invalid;
        }

        let mut block = doc.root();
        for (depth, &index) in self.path.iter().enumerate() {
            let children = doc.children(block);
            let Some(&last) = children.last() else {
                log::warn!("handle path {:?} runs past content block at depth {depth}", self.path);
                return Caret::end_of(doc, block);
            };
            match children.get(index) {
                Some(&child) => block = child,
                None => {
                    log::warn!(
                        "handle path {:?} index {index} out of range at depth {depth}; clamping",
                        self.path
                    );
                    return Caret::end_of(doc, last);
                }
            }
        }

        match self.target {
            HandleTarget::Text { offset } => match doc.text(block) {
                Some(text) => {
                    let snapped = grapheme::floor_boundary(&text, offset);
                    if snapped != offset {
                        log::warn!("handle offset {offset} snapped to {snapped} in {block}");
                    }
                    Caret::text(block, snapped)
                }
                None => {
                    log::warn!("handle expected text in container {block}");
                    BlockTreeWalker::new(doc)
                        .first_leaf(block)
                        .map(|leaf| Caret::text(leaf, 0))
                        .unwrap_or_else(|| Caret::start_of(doc, block))
                }
            },
            HandleTarget::Boundary { index } => {
                if doc.is_container(block) {
                    Caret::boundary(block, index.min(doc.children(block).len()))
                } else {
                    log::warn!("handle expected a container at {block}");
                    Caret::start_of(doc, block)
                }
            }
            HandleTarget::Invalid => Caret::Invalid,
        }
    }
}

/// Both ends of a selection as handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionHandle {
    pub start: CursorHandle,
    pub end: CursorHandle,
}

impl SelectionHandle {
    pub fn capture(selection: &Selection, doc: &Document) -> Self {
        Self {
            start: CursorHandle::capture(&selection.start(), doc),
            end: CursorHandle::capture(&selection.end(), doc),
        }
    }

    pub fn collapsed(caret: &Caret, doc: &Document) -> Self {
        let handle = CursorHandle::capture(caret, doc);
        Self {
            start: handle.clone(),
            end: handle,
        }
    }

    /// Resolves both ends and moves `selection` there.
    pub fn restore(&self, selection: &mut Selection, doc: &Document) {
        selection.set(self.start.resolve(doc), self.end.resolve(doc));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockKind;
    use crate::editing::caret::CaretNavigation;
    use crate::tests::{leaf_named, nested_fixture, paragraphs};
    use crate::text::TextRuns;
    use pretty_assertions::assert_eq;

    #[test]
    fn records_path_and_offset() {
        let doc = nested_fixture();
        let b111 = leaf_named(&doc, "b111");
        let handle = CursorHandle::capture(&Caret::text(b111, 2), &doc);
        assert_eq!(handle.path(), &[1, 0, 0, 0]);
        assert_eq!(handle.target(), HandleTarget::Text { offset: 2 });
    }

    #[test]
    fn survives_block_replacement_at_same_path() {
        let mut doc = paragraphs(&["first", "second"]);
        let first = leaf_named(&doc, "first");
        let handle = CursorHandle::capture(&Caret::text(first, 3), &doc);

        let detached = doc.detach(first).expect("detach");
        let replacement = doc
            .insert_content_block(doc.root(), 0, BlockKind::Paragraph, TextRuns::from_text("fresh"))
            .expect("insert");
        assert!(!doc.contains(detached.root()));

        assert_eq!(handle.resolve(&doc), Caret::text(replacement, 3));
    }

    #[test]
    fn unchanged_document_reuses_captured_caret() {
        let doc = paragraphs(&["abc"]);
        let caret = Caret::text(doc.leaves()[0], 2);
        assert_eq!(CursorHandle::capture(&caret, &doc).resolve(&doc), caret);
    }

    #[test]
    fn out_of_range_index_clamps_to_last_sibling_end() {
        let mut doc = paragraphs(&["one", "two", "three"]);
        let three = leaf_named(&doc, "three");
        let handle = CursorHandle::capture(&Caret::text(three, 1), &doc);
        doc.detach(three).expect("detach");
        let two = leaf_named(&doc, "two");
        assert_eq!(handle.resolve(&doc), Caret::text(two, 3));
    }

    #[test]
    fn offset_past_end_is_clamped_to_a_boundary() {
        let mut doc = paragraphs(&["e\u{0301}xyz"]);
        let block = doc.leaves()[0];
        let handle = CursorHandle::capture(&Caret::text(block, 5), &doc);
        doc.edit_runs(block, |runs| runs.delete_text(2, 2)).expect("delete");
        // "e\u{301}z"
        assert_eq!(handle.resolve(&doc), Caret::text(block, 3));

        doc.replace_runs(block, TextRuns::from_text("e\u{0301}")).expect("replace");
        assert_eq!(handle.resolve(&doc), Caret::text(block, 2));
        assert!(handle.resolve(&doc).is_valid(&doc));
    }

    #[test]
    fn boundary_handles_resolve_to_boundaries() {
        let mut doc = nested_fixture();
        let root = doc.root();
        let handle = CursorHandle::capture(&Caret::boundary(root, 3), &doc);
        doc.detach(leaf_named(&doc, "c")).expect("detach");
        assert_eq!(handle.resolve(&doc), Caret::boundary(root, 2));
    }

    #[test]
    fn invalid_carets_stay_invalid() {
        let doc = paragraphs(&["x"]);
        let handle = CursorHandle::capture(&Caret::Invalid, &doc);
        assert_eq!(handle, CursorHandle::invalid());
        assert!(handle.resolve(&doc).is_invalid());
    }

    #[test]
    fn handles_serialize_without_the_cached_caret() {
        let doc = nested_fixture();
        let handle = CursorHandle::capture(&Caret::text(leaf_named(&doc, "b12"), 1), &doc);
        let json = serde_json::to_string(&handle).expect("serialize");
        let back: CursorHandle = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, handle);
        assert_eq!(back.resolve(&doc), handle.resolve(&doc));
    }
}

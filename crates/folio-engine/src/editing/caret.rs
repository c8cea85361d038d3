//! Immutable caret positions and the stepping rules between them.
//!
//! A [`Caret`] is either inside the text of a content block or on a structural
//! boundary between the children of a container. Every move returns a fresh
//! caret; moving off either end of the document yields [`Caret::Invalid`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::document::{BlockId, BlockTreeWalker, Document};
use crate::text::grapheme;

/// A position inside the text of a content block, in `char`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextCaret {
    pub block: BlockId,
    pub offset: usize,
}

/// A position between the children of a container: `index` 0 is before the
/// first child, `children.len()` after the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryCaret {
    pub container: BlockId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Caret {
    Text(TextCaret),
    Boundary(BoundaryCaret),
    /// Past either end of the document.
    Invalid,
}

/// Navigation contract shared by every caret variant.
pub trait CaretNavigation {
    fn move_forward(&self, doc: &Document) -> Caret;
    fn move_backward(&self, doc: &Document) -> Caret;
    fn is_at_block_start(&self, doc: &Document) -> bool;
    fn is_at_block_end(&self, doc: &Document) -> bool;
    /// The grapheme left of the caret, `"\n"` across a block break, `None` at the document start.
    fn character_before(&self, doc: &Document) -> Option<String>;
    /// The grapheme right of the caret, `"\n"` across a block break, `None` at the document end.
    fn character_after(&self, doc: &Document) -> Option<String>;
    /// Whether the caret addresses something that currently exists in `doc`.
    fn is_valid(&self, doc: &Document) -> bool;
}

/// Implemented by the concrete caret variants so callers can ask `is::<TextCaret>()`.
pub trait CaretVariant {
    fn from_caret(caret: &Caret) -> Option<&Self>;
}

impl CaretVariant for TextCaret {
    fn from_caret(caret: &Caret) -> Option<&Self> {
        match caret {
            Caret::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl CaretVariant for BoundaryCaret {
    fn from_caret(caret: &Caret) -> Option<&Self> {
        match caret {
            Caret::Boundary(boundary) => Some(boundary),
            _ => None,
        }
    }
}

impl TextCaret {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }

    /// Orders two text carets by document position.
    pub fn cmp_in(&self, other: &TextCaret, doc: &Document) -> Option<Ordering> {
        if self.block == other.block {
            return Some(self.offset.cmp(&other.offset));
        }
        let mine = doc.path_to(self.block)?;
        let theirs = doc.path_to(other.block)?;
        Some(mine.cmp(&theirs))
    }
}

impl CaretNavigation for TextCaret {
    fn move_forward(&self, doc: &Document) -> Caret {
        let Some(text) = doc.text(self.block) else {
            return Caret::Invalid;
        };
        if let Some(next) = grapheme::next_boundary(&text, self.offset) {
            log::trace!("caret {} -> {next} within {}", self.offset, self.block);
            return Caret::Text(TextCaret::new(self.block, next));
        }
        BlockTreeWalker::new(doc)
            .next_non_container(self.block)
            .map(|next| Caret::Text(TextCaret::new(next, 0)))
            .unwrap_or(Caret::Invalid)
    }

    fn move_backward(&self, doc: &Document) -> Caret {
        let Some(text) = doc.text(self.block) else {
            return Caret::Invalid;
        };
        if let Some(previous) = grapheme::previous_boundary(&text, self.offset) {
            return Caret::Text(TextCaret::new(self.block, previous));
        }
        BlockTreeWalker::new(doc)
            .previous_non_container(self.block)
            .map(|previous| Caret::Text(TextCaret::new(previous, doc.text_len(previous))))
            .unwrap_or(Caret::Invalid)
    }

    fn is_at_block_start(&self, _doc: &Document) -> bool {
        self.offset == 0
    }

    fn is_at_block_end(&self, doc: &Document) -> bool {
        self.offset >= doc.text_len(self.block)
    }

    fn character_before(&self, doc: &Document) -> Option<String> {
        let text = doc.text(self.block)?;
        if self.offset > 0 {
            return grapheme::grapheme_before(&text, self.offset).map(str::to_string);
        }
        BlockTreeWalker::new(doc)
            .previous_non_container(self.block)
            .map(|_| "\n".to_string())
    }

    fn character_after(&self, doc: &Document) -> Option<String> {
        let text = doc.text(self.block)?;
        if self.offset < grapheme::char_len(&text) {
            return grapheme::grapheme_at(&text, self.offset).map(str::to_string);
        }
        BlockTreeWalker::new(doc)
            .next_non_container(self.block)
            .map(|_| "\n".to_string())
    }

    fn is_valid(&self, doc: &Document) -> bool {
        doc.text(self.block)
            .is_some_and(|text| grapheme::is_grapheme_boundary(&text, self.offset))
    }
}

impl CaretNavigation for BoundaryCaret {
    fn move_forward(&self, doc: &Document) -> Caret {
        let children = doc.children(self.container);
        if let Some(&child) = children.get(self.index) {
            if doc.is_container(child) {
                return Caret::Boundary(BoundaryCaret {
                    container: child,
                    index: 0,
                });
            }
            return Caret::Boundary(BoundaryCaret {
                container: self.container,
                index: self.index + 1,
            });
        }
        match (doc.parent(self.container), doc.index_in_parent(self.container)) {
            (Some(parent), Some(index)) => Caret::Boundary(BoundaryCaret {
                container: parent,
                index: index + 1,
            }),
            _ => Caret::Invalid,
        }
    }

    fn move_backward(&self, doc: &Document) -> Caret {
        if self.index > 0 {
            let Some(&child) = doc.children(self.container).get(self.index - 1) else {
                return Caret::Invalid;
            };
            if doc.is_container(child) {
                return Caret::Boundary(BoundaryCaret {
                    container: child,
                    index: doc.children(child).len(),
                });
            }
            return Caret::Boundary(BoundaryCaret {
                container: self.container,
                index: self.index - 1,
            });
        }
        match (doc.parent(self.container), doc.index_in_parent(self.container)) {
            (Some(parent), Some(index)) => Caret::Boundary(BoundaryCaret {
                container: parent,
                index,
            }),
            _ => Caret::Invalid,
        }
    }

    fn is_at_block_start(&self, _doc: &Document) -> bool {
        self.index == 0
    }

    fn is_at_block_end(&self, doc: &Document) -> bool {
        self.index >= doc.children(self.container).len()
    }

    fn character_before(&self, _doc: &Document) -> Option<String> {
        None
    }

    fn character_after(&self, _doc: &Document) -> Option<String> {
        None
    }

    fn is_valid(&self, doc: &Document) -> bool {
        doc.is_container(self.container) && self.index <= doc.children(self.container).len()
    }
}

/// Result of [`Caret::move_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The last valid caret reached.
    pub caret: Caret,
    pub steps: usize,
    /// Whether every requested step was taken.
    pub completed: bool,
}

impl Caret {
    pub fn text(block: BlockId, offset: usize) -> Self {
        Caret::Text(TextCaret::new(block, offset))
    }

    pub fn boundary(container: BlockId, index: usize) -> Self {
        Caret::Boundary(BoundaryCaret { container, index })
    }

    /// Start of a block: its text start, or its first boundary for containers.
    pub fn start_of(doc: &Document, block: BlockId) -> Self {
        match doc.block(block) {
            Some(node) if node.is_container() => Caret::boundary(block, 0),
            Some(_) => Caret::text(block, 0),
            None => Caret::Invalid,
        }
    }

    pub fn end_of(doc: &Document, block: BlockId) -> Self {
        match doc.block(block) {
            Some(node) if node.is_container() => Caret::boundary(block, node.children().len()),
            Some(_) => Caret::text(block, doc.text_len(block)),
            None => Caret::Invalid,
        }
    }

    pub fn document_start(doc: &Document) -> Self {
        BlockTreeWalker::new(doc)
            .first()
            .map(|block| Caret::text(block, 0))
            .unwrap_or(Caret::boundary(doc.root(), 0))
    }

    pub fn document_end(doc: &Document) -> Self {
        BlockTreeWalker::new(doc)
            .last()
            .map(|block| Caret::end_of(doc, block))
            .unwrap_or_else(|| Caret::end_of(doc, doc.root()))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Caret::Invalid)
    }

    /// The block the caret lives in (the container for boundary carets).
    pub fn block(&self) -> Option<BlockId> {
        match self {
            Caret::Text(text) => Some(text.block),
            Caret::Boundary(boundary) => Some(boundary.container),
            Caret::Invalid => None,
        }
    }

    pub fn as_text(&self) -> Option<TextCaret> {
        TextCaret::from_caret(self).copied()
    }

    /// Steps `|n|` times forward (positive) or backward (negative).
    ///
    /// Stops at the last valid caret if the walk runs off the document.
    pub fn move_by(&self, doc: &Document, n: isize) -> MoveOutcome {
        let wanted = n.unsigned_abs();
        let mut caret = *self;
        let mut steps = 0;
        while steps < wanted {
            let next = if n > 0 {
                caret.move_forward(doc)
            } else {
                caret.move_backward(doc)
            };
            if next.is_invalid() {
                break;
            }
            caret = next;
            steps += 1;
        }
        MoveOutcome {
            caret,
            steps,
            completed: steps == wanted,
        }
    }
}

impl CaretNavigation for Caret {
    fn move_forward(&self, doc: &Document) -> Caret {
        match self {
            Caret::Text(text) => text.move_forward(doc),
            Caret::Boundary(boundary) => boundary.move_forward(doc),
            Caret::Invalid => Caret::Invalid,
        }
    }

    fn move_backward(&self, doc: &Document) -> Caret {
        match self {
            Caret::Text(text) => text.move_backward(doc),
            Caret::Boundary(boundary) => boundary.move_backward(doc),
            Caret::Invalid => Caret::Invalid,
        }
    }

    fn is_at_block_start(&self, doc: &Document) -> bool {
        match self {
            Caret::Text(text) => text.is_at_block_start(doc),
            Caret::Boundary(boundary) => boundary.is_at_block_start(doc),
            Caret::Invalid => false,
        }
    }

    fn is_at_block_end(&self, doc: &Document) -> bool {
        match self {
            Caret::Text(text) => text.is_at_block_end(doc),
            Caret::Boundary(boundary) => boundary.is_at_block_end(doc),
            Caret::Invalid => false,
        }
    }

    fn character_before(&self, doc: &Document) -> Option<String> {
        match self {
            Caret::Text(text) => text.character_before(doc),
            Caret::Boundary(boundary) => boundary.character_before(doc),
            Caret::Invalid => None,
        }
    }

    fn character_after(&self, doc: &Document) -> Option<String> {
        match self {
            Caret::Text(text) => text.character_after(doc),
            Caret::Boundary(boundary) => boundary.character_after(doc),
            Caret::Invalid => None,
        }
    }

    fn is_valid(&self, doc: &Document) -> bool {
        match self {
            Caret::Text(text) => text.is_valid(doc),
            Caret::Boundary(boundary) => boundary.is_valid(doc),
            Caret::Invalid => false,
        }
    }
}

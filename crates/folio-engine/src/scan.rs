//! Cancellable read-only scans over committed text.
//!
//! A scan borrows the document immutably, so it can never see a block halfway
//! through a mutation. Work that should outlive an edit captures a
//! [`CursorHandle`] and a [`CancellationToken`], and is restarted from the
//! handle rather than resumed.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use unicode_segmentation::UnicodeSegmentation;

use crate::document::{BlockId, BlockTreeWalker, Document};
use crate::editing::caret::Caret;
use crate::editing::handle::CursorHandle;
use crate::text::grapheme;

/// Shared cancellation flag; clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordHit {
    pub block: BlockId,
    /// `char` range within the block text.
    pub range: Range<usize>,
    pub word: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Cancelled,
}

/// Visits every word from a starting position to the end of the document.
pub struct WordScanner<'a> {
    doc: &'a Document,
    start: CursorHandle,
    token: CancellationToken,
}

impl<'a> WordScanner<'a> {
    pub fn new(doc: &'a Document, start: CursorHandle, token: CancellationToken) -> Self {
        Self { doc, start, token }
    }

    /// Scans the whole document.
    pub fn from_start(doc: &'a Document, token: CancellationToken) -> Self {
        let start = CursorHandle::capture(&Caret::document_start(doc), doc);
        Self::new(doc, start, token)
    }

    /// Calls `visit` for each word whose start is at or after the handle.
    ///
    /// The token is checked before every word.
    pub fn scan(&self, mut visit: impl FnMut(&WordHit)) -> ScanOutcome {
        let (first, offset) = match self.start.resolve(self.doc) {
            Caret::Text(text) => (text.block, text.offset),
            Caret::Boundary(boundary) => {
                match BlockTreeWalker::new(self.doc).first_leaf(boundary.container) {
                    Some(leaf) => (leaf, 0),
                    None => return ScanOutcome::Completed,
                }
            }
            Caret::Invalid => return ScanOutcome::Completed,
        };

        let mut words = 0usize;
        for block in BlockTreeWalker::new(self.doc).iter_from(first) {
            let Some(text) = self.doc.text(block) else {
                continue;
            };
            for (byte, word) in text.unicode_word_indices() {
                if self.token.is_cancelled() {
                    log::debug!("word scan cancelled after {words} words");
                    return ScanOutcome::Cancelled;
                }
                let start = grapheme::char_len(&text[..byte]);
                if block == first && start < offset {
                    continue;
                }
                words += 1;
                visit(&WordHit {
                    block,
                    range: start..start + grapheme::char_len(word),
                    word: word.to_string(),
                });
            }
        }
        ScanOutcome::Completed
    }
}

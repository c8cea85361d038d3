//! A pair of carets plus observer fan-out for position changes.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::document::Document;
use crate::editing::caret::{Caret, CaretVariant, TextCaret};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    /// Collapse the selection onto the new caret.
    Replace,
    /// Move only the active end, keeping the anchor.
    Extend,
}

/// Sent to every subscriber after each [`Selection::move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged {
    pub start: Caret,
    pub end: Caret,
}

/// `start` is the active end that moves; `end` is the anchor.
#[derive(Debug)]
pub struct Selection {
    start: Caret,
    end: Caret,
    observers: Vec<Sender<SelectionChanged>>,
}

impl Selection {
    pub fn new(caret: Caret) -> Self {
        Self {
            start: caret,
            end: caret,
            observers: Vec::new(),
        }
    }

    /// A collapsed selection at the first position of `doc`.
    pub fn at_document_start(doc: &Document) -> Self {
        Self::new(Caret::document_start(doc))
    }

    pub fn start(&self) -> Caret {
        self.start
    }

    pub fn end(&self) -> Caret {
        self.end
    }

    pub fn has_selection(&self) -> bool {
        self.start != self.end
    }

    pub fn move_to(&mut self, caret: Caret, mode: MoveMode) {
        self.start = caret;
        if mode == MoveMode::Replace {
            self.end = caret;
        }
        self.notify();
    }

    /// Replaces both ends at once, as undo/redo do.
    pub fn set(&mut self, start: Caret, end: Caret) {
        self.start = start;
        self.end = end;
        self.notify();
    }

    /// Whether the active caret is of variant `T`.
    pub fn is<T: CaretVariant>(&self) -> bool {
        T::from_caret(&self.start).is_some()
    }

    /// Both ends as text carets in document order, if they are text carets.
    pub fn ordered_text(&self, doc: &Document) -> Option<(TextCaret, TextCaret)> {
        let start = self.start.as_text()?;
        let end = self.end.as_text()?;
        match start.cmp_in(&end, doc)? {
            std::cmp::Ordering::Greater => Some((end, start)),
            _ => Some((start, end)),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<SelectionChanged> {
        let (sender, receiver) = mpsc::channel();
        self.observers.push(sender);
        receiver
    }

    fn notify(&mut self) {
        let message = SelectionChanged {
            start: self.start,
            end: self.end,
        };
        // Dropped receivers unsubscribe.
        self.observers.retain(|observer| observer.send(message).is_ok());
    }
}

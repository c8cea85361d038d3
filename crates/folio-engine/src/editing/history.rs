//! Undo/redo history.
//!
//! # Invariants
//!
//! 1. `undo_stack.len() <= max_depth` after every operation
//! 2. The redo stack is cleared whenever a new action executes
//! 3. Undoing an entry restores the selection captured before it ran; redoing
//!    restores the one captured after
//!
//! ```text
//! execute(a3)              undo()                 execute(a4)
//! undo: [a1, a2, a3]       undo: [a1, a2]         undo: [a1, a2, a4]
//! redo: []                 redo: [a3]             redo: []
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::editing::actions::EditAction;
use crate::editing::handle::SelectionHandle;
use crate::editing::selection::MoveMode;
use crate::editing::{EditError, EditorContext};

/// Decides whether a freshly executed action joins the previous undo step.
pub trait MergePolicy {
    fn try_merge(&self, previous: &mut EditAction, next: &EditAction) -> bool;
}

/// Coalesces typing and repeated deletes inside one block.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMergePolicy;

impl MergePolicy for StandardMergePolicy {
    fn try_merge(&self, previous: &mut EditAction, next: &EditAction) -> bool {
        previous.try_merge(next)
    }
}

/// Every action is its own undo step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverMerge;

impl MergePolicy for NeverMerge {
    fn try_merge(&self, _previous: &mut EditAction, _next: &EditAction) -> bool {
        false
    }
}

#[derive(Debug)]
struct UndoEntry {
    action: EditAction,
    before: SelectionHandle,
    after: SelectionHandle,
}

pub struct ActionStack {
    /// Newest at the back.
    undo_stack: VecDeque<UndoEntry>,
    /// Next to redo at the back.
    redo_stack: Vec<UndoEntry>,
    policy: Box<dyn MergePolicy>,
    max_depth: usize,
    /// Set by undo/redo and navigation; the next action starts a fresh step.
    sealed: bool,
}

impl fmt::Debug for ActionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStack")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .field("sealed", &self.sealed)
            .finish()
    }
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStack {
    pub const DEFAULT_MAX_DEPTH: usize = 1000;

    pub fn new() -> Self {
        Self::with_settings(Box::new(StandardMergePolicy), Self::DEFAULT_MAX_DEPTH)
    }

    pub fn with_settings(policy: Box<dyn MergePolicy>, max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            policy,
            max_depth: max_depth.max(1),
            sealed: false,
        }
    }

    /// Applies `action`, moves the caret to where it lands, and records it.
    ///
    /// A failing action leaves the document and the history untouched.
    pub fn execute(&mut self, mut action: EditAction, ctx: &mut EditorContext) -> Result<(), EditError> {
        let before = SelectionHandle::capture(&ctx.selection, &ctx.document);
        if let Some(caret) = action.apply(ctx)? {
            ctx.selection.move_to(caret, MoveMode::Replace);
        }
        let after = SelectionHandle::capture(&ctx.selection, &ctx.document);
        self.redo_stack.clear();

        if !self.sealed
            && let Some(top) = self.undo_stack.back_mut()
            && self.policy.try_merge(&mut top.action, &action)
        {
            log::debug!("merged {} into previous step", action.name());
            top.after = after;
            return Ok(());
        }

        log::debug!("executed {}", action.name());
        self.undo_stack.push_back(UndoEntry {
            action,
            before,
            after,
        });
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
        self.sealed = false;
        Ok(())
    }

    /// Reverts the newest step. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, ctx: &mut EditorContext) -> Result<bool, EditError> {
        let Some(mut entry) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = entry.action.revert(ctx) {
            self.undo_stack.push_back(entry);
            return Err(err);
        }
        entry.before.restore(&mut ctx.selection, &ctx.document);
        log::debug!("undid {}", entry.action.name());
        self.redo_stack.push(entry);
        self.sealed = true;
        Ok(true)
    }

    /// Replays the most recently undone step. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, ctx: &mut EditorContext) -> Result<bool, EditError> {
        let Some(mut entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(err) = entry.action.apply(ctx) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        entry.after.restore(&mut ctx.selection, &ctx.document);
        log::debug!("redid {}", entry.action.name());
        self.undo_stack.push_back(entry);
        self.sealed = true;
        Ok(true)
    }

    /// Ends the current merge chain.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

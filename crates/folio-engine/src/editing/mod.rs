/*!
 * # Editing Core
 *
 * Everything that moves the caret or changes the document goes through this
 * module.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Carets
 * - A **`Caret`** is a value: either a text offset inside a content block or a
 *   boundary between the children of a container
 * - Moving returns a new caret; running off the document yields
 *   `Caret::Invalid`, which callers test for instead of handling an error
 *
 * ### 2. Durable Positions
 * - **`CursorHandle`** stores the child-index path to a caret instead of block
 *   ids, so positions survive blocks being removed and rebuilt
 * - Resolution is best-effort and never fails
 *
 * ### 3. Reversible Actions
 * - Every mutation is an **`EditAction`** with exact `apply`/`revert`
 * - The **`ActionStack`** records the selection before and after each action,
 *   coalesces keystrokes through a pluggable **`MergePolicy`**, and restores the
 *   selection on undo/redo
 *
 * ### 4. Commands
 * - **`Command`**s are the externally invoked edit API: a stable id, an
 *   activation guard, and an `activate` that turns the current selection into
 *   actions
 *
 * ## Usage Pattern
 *
 * ```rust
 * use folio_engine::editing::{ActionStack, CommandRegistry, EditorContext, InsertTextCommand, run};
 * use folio_engine::document::Document;
 *
 * let mut ctx = EditorContext::new(Document::new());
 * let mut stack = ActionStack::new();
 * let registry = CommandRegistry::standard();
 *
 * run(&InsertTextCommand::new("Hello"), &mut ctx, &mut stack).unwrap();
 * registry.execute("break-block", &mut ctx, &mut stack).unwrap();
 * registry.execute("undo", &mut ctx, &mut stack).unwrap();
 * assert_eq!(ctx.document.plain_text(), "Hello");
 * ```
 */

pub mod actions;
pub mod caret;
pub mod commands;
pub mod context;
pub mod handle;
pub mod history;
pub mod selection;

pub use actions::{DeleteDirection, EditAction, StyleChange};
pub use caret::{BoundaryCaret, Caret, CaretNavigation, CaretVariant, MoveOutcome, TextCaret};
pub use commands::{Command, CommandRegistry, InsertTextCommand, run};
pub use context::EditorContext;
pub use handle::{CursorHandle, HandleTarget, SelectionHandle};
pub use history::{ActionStack, MergePolicy, NeverMerge, StandardMergePolicy};
pub use selection::{MoveMode, Selection, SelectionChanged};

use crate::document::DocumentError;
use crate::text::TextError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("the active caret is not inside text")]
    NotATextCaret,
    #[error("recorded position no longer exists in the document")]
    UnresolvableTarget,
    #[error("there is no content block before this one")]
    NoPreviousBlock,
    #[error("action was reverted before it was applied")]
    NotApplied,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

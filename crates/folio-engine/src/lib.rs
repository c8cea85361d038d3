//! Caret and cursor engine for a block-structured rich-text document.
//!
//! - [`text`]: grapheme segmentation and styled text runs
//! - [`document`]: the block tree arena, its walker and serialization
//! - [`editing`]: carets, selection, cursor handles, actions, undo and commands
//! - [`view`]: the rendering capabilities carets call into
//! - [`scan`]: cancellable read-only scans

pub mod document;
pub mod editing;
pub mod scan;
pub mod text;
pub mod view;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use document::{
    BlockId, BlockKind, BlockTreeWalker, DescriptorsLookup, Document, DocumentBuilder, DocumentError,
    DocumentId, SerializeNode,
};
pub use editing::{
    ActionStack, Caret, CaretNavigation, CommandRegistry, CursorHandle, EditAction, EditError, EditorContext,
    Selection, TextCaret,
};
pub use text::{Style, TextRuns};

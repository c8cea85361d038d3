//! Named, guarded edit operations.
//!
//! A [`Command`] turns the current selection into [`EditAction`]s (or plain
//! caret moves). Front ends look commands up by id in a [`CommandRegistry`] and
//! bind them to keys; a command whose guard fails is simply not run.

use crate::document::{BlockKind, BlockTreeWalker, HEADING_LEVELS};
use crate::editing::actions::{DeleteDirection, EditAction, StyleChange};
use crate::editing::caret::{Caret, CaretNavigation, TextCaret};
use crate::editing::history::ActionStack;
use crate::editing::selection::MoveMode;
use crate::editing::{EditError, EditorContext};
use crate::text::grapheme;
use crate::view;

pub trait Command {
    /// Stable identifier used for key bindings.
    fn id(&self) -> &'static str;
    fn can_activate(&self, ctx: &EditorContext) -> bool;
    /// Runs the command; `Ok(false)` means nothing changed.
    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError>;
}

/// Activates `command` if its guard allows it.
pub fn run(command: &dyn Command, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
    if !command.can_activate(ctx) {
        log::debug!("command {} not available", command.id());
        return Ok(false);
    }
    command.activate(ctx, stack)
}

fn text_caret(ctx: &EditorContext) -> Result<TextCaret, EditError> {
    ctx.caret().as_text().ok_or(EditError::NotATextCaret)
}

/// Deletes the selected range as its own undo step. Returns `false` when the selection is collapsed.
fn delete_selection(ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
    if !ctx.selection.has_selection() {
        return Ok(false);
    }
    let (first, last) = ctx
        .selection
        .ordered_text(&ctx.document)
        .ok_or(EditError::NotATextCaret)?;
    let action = EditAction::delete_between(&ctx.document, first, last);
    stack.seal();
    stack.execute(action, ctx)?;
    ctx.selection.move_to(Caret::Text(first), MoveMode::Replace);
    stack.seal();
    Ok(true)
}

fn has_text_caret(ctx: &EditorContext) -> bool {
    ctx.caret().as_text().is_some() && ctx.caret().is_valid(&ctx.document)
}

/// Types text at the caret, replacing the selection if there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTextCommand {
    text: String,
}

impl InsertTextCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Command for InsertTextCommand {
    fn id(&self) -> &'static str {
        "insert-text"
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        !self.text.is_empty() && has_text_caret(ctx)
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        delete_selection(ctx, stack)?;
        let caret = text_caret(ctx)?;
        let action = EditAction::insert_text(&ctx.document, caret, self.text.clone());
        stack.execute(action, ctx)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteCommand {
    direction: DeleteDirection,
}

impl DeleteCommand {
    pub fn backward() -> Self {
        Self {
            direction: DeleteDirection::Backward,
        }
    }

    pub fn forward() -> Self {
        Self {
            direction: DeleteDirection::Forward,
        }
    }
}

impl Command for DeleteCommand {
    fn id(&self) -> &'static str {
        match self.direction {
            DeleteDirection::Backward => "delete-backward",
            DeleteDirection::Forward => "delete-forward",
        }
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        if !has_text_caret(ctx) {
            return false;
        }
        if ctx.selection.has_selection() {
            return true;
        }
        let neighbour = match self.direction {
            DeleteDirection::Backward => ctx.caret().move_backward(&ctx.document),
            DeleteDirection::Forward => ctx.caret().move_forward(&ctx.document),
        };
        !neighbour.is_invalid()
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        if delete_selection(ctx, stack)? {
            return Ok(true);
        }
        let caret = text_caret(ctx)?;
        let doc = &ctx.document;
        let text = doc.text(caret.block).ok_or(EditError::NotATextCaret)?;
        let walker = BlockTreeWalker::new(doc);
        let action = match self.direction {
            DeleteDirection::Backward => match grapheme::previous_boundary(&text, caret.offset) {
                Some(start) => EditAction::delete_text(doc, TextCaret::new(caret.block, start), 1, self.direction),
                None if walker.previous_non_container(caret.block).is_some() => {
                    stack.seal();
                    EditAction::merge_blocks(doc, caret.block)
                }
                None => return Ok(false),
            },
            DeleteDirection::Forward => {
                if grapheme::next_boundary(&text, caret.offset).is_some() {
                    EditAction::delete_text(doc, caret, 1, self.direction)
                } else if let Some(next) = walker.next_non_container(caret.block) {
                    stack.seal();
                    EditAction::merge_blocks(doc, next)
                } else {
                    return Ok(false);
                }
            }
        };
        stack.execute(action, ctx)?;
        Ok(true)
    }
}

/// Splits the block at the caret (Enter).
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakBlockCommand;

impl Command for BreakBlockCommand {
    fn id(&self) -> &'static str {
        "break-block"
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        has_text_caret(ctx)
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        delete_selection(ctx, stack)?;
        let caret = text_caret(ctx)?;
        let action = EditAction::split_block(&ctx.document, caret);
        stack.seal();
        stack.execute(action, ctx)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// One grapheme left or right, collapsing or extending the selection.
#[derive(Debug, Clone, Copy)]
pub struct MoveCommand {
    id: &'static str,
    direction: Direction,
    mode: MoveMode,
}

impl MoveCommand {
    pub fn new(id: &'static str, direction: Direction, mode: MoveMode) -> Self {
        Self {
            id,
            direction,
            mode,
        }
    }
}

impl Command for MoveCommand {
    fn id(&self) -> &'static str {
        self.id
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        !ctx.caret().is_invalid()
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        stack.seal();
        if self.mode == MoveMode::Replace
            && ctx.selection.has_selection()
            && let Some((first, last)) = ctx.selection.ordered_text(&ctx.document)
        {
            let edge = match self.direction {
                Direction::Backward => first,
                Direction::Forward => last,
            };
            ctx.selection.move_to(Caret::Text(edge), MoveMode::Replace);
            return Ok(true);
        }
        let next = match self.direction {
            Direction::Backward => ctx.caret().move_backward(&ctx.document),
            Direction::Forward => ctx.caret().move_forward(&ctx.document),
        };
        if next.is_invalid() {
            return Ok(false);
        }
        ctx.selection.move_to(next, self.mode);
        Ok(true)
    }
}

/// Home/End on the visual line, using the context's views.
#[derive(Debug, Clone, Copy)]
pub struct LineEdgeCommand {
    direction: Direction,
}

impl LineEdgeCommand {
    pub fn start() -> Self {
        Self {
            direction: Direction::Backward,
        }
    }

    pub fn end() -> Self {
        Self {
            direction: Direction::Forward,
        }
    }
}

impl Command for LineEdgeCommand {
    fn id(&self) -> &'static str {
        match self.direction {
            Direction::Backward => "move-line-start",
            Direction::Forward => "move-line-end",
        }
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        ctx.views.is_some() && has_text_caret(ctx)
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        let caret = text_caret(ctx)?;
        let Some(views) = ctx.views.as_deref() else {
            return Ok(false);
        };
        let target = match self.direction {
            Direction::Backward => view::line_start(views, &ctx.document, &caret),
            Direction::Forward => view::line_end(views, &ctx.document, &caret),
        };
        let Some(target) = target else {
            return Ok(false);
        };
        stack.seal();
        ctx.selection.move_to(Caret::Text(target), MoveMode::Replace);
        Ok(true)
    }
}

const HEADING_IDS: [&str; 6] = [
    "set-heading-1",
    "set-heading-2",
    "set-heading-3",
    "set-heading-4",
    "set-heading-5",
    "set-heading-6",
];

/// Changes the kind of the block holding the caret.
#[derive(Debug, Clone, Copy)]
pub struct SetKindCommand {
    id: &'static str,
    kind: BlockKind,
}

impl SetKindCommand {
    /// `level` is clamped to [`HEADING_LEVELS`].
    pub fn heading(level: u8) -> Self {
        let level = level.clamp(*HEADING_LEVELS.start(), *HEADING_LEVELS.end());
        Self {
            id: HEADING_IDS[usize::from(level - 1)],
            kind: BlockKind::Heading { level },
        }
    }

    pub fn paragraph() -> Self {
        Self {
            id: "set-paragraph",
            kind: BlockKind::Paragraph,
        }
    }
}

impl Command for SetKindCommand {
    fn id(&self) -> &'static str {
        self.id
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        ctx.caret()
            .as_text()
            .and_then(|caret| ctx.document.block(caret.block))
            .is_some_and(|block| block.kind() != self.kind)
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        let caret = text_caret(ctx)?;
        let action = EditAction::set_block_kind(&ctx.document, caret.block, self.kind);
        stack.seal();
        stack.execute(action, ctx)?;
        Ok(true)
    }
}

/// Bolds the selection, or unbolds it when it is already entirely bold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToggleBoldCommand;

impl Command for ToggleBoldCommand {
    fn id(&self) -> &'static str {
        "toggle-bold"
    }

    fn can_activate(&self, ctx: &EditorContext) -> bool {
        ctx.selection.has_selection() && ctx.selection.ordered_text(&ctx.document).is_some()
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        let doc = &ctx.document;
        let (first, last) = ctx.selection.ordered_text(doc).ok_or(EditError::NotATextCaret)?;

        let mut spans = Vec::new();
        for block in BlockTreeWalker::new(doc).iter_from(first.block) {
            let start = if block == first.block { first.offset } else { 0 };
            let end = if block == last.block {
                last.offset
            } else {
                doc.text_len(block)
            };
            if end > start {
                spans.push((block, start, end));
            }
            if block == last.block {
                break;
            }
        }
        if spans.is_empty() {
            return Ok(false);
        }

        let all_bold = spans.iter().all(|&(block, start, end)| {
            doc.runs(block)
                .is_some_and(|runs| runs.all_styled(start..end, |style| style.bold))
        });
        let change = StyleChange::bold(!all_bold);
        let actions = spans
            .into_iter()
            .map(|(block, start, end)| EditAction::apply_style(doc, TextCaret::new(block, start), end - start, change))
            .collect();
        stack.seal();
        stack.execute(EditAction::Batch(actions), ctx)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UndoCommand;

impl Command for UndoCommand {
    fn id(&self) -> &'static str {
        "undo"
    }

    fn can_activate(&self, _ctx: &EditorContext) -> bool {
        true
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        stack.undo(ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedoCommand;

impl Command for RedoCommand {
    fn id(&self) -> &'static str {
        "redo"
    }

    fn can_activate(&self, _ctx: &EditorContext) -> bool {
        true
    }

    fn activate(&self, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        stack.redo(ctx)
    }
}

/// Commands by id. `insert-text` carries its payload and is built per keystroke.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(DeleteCommand::backward());
        registry.register(DeleteCommand::forward());
        registry.register(BreakBlockCommand);
        registry.register(MoveCommand::new("move-left", Direction::Backward, MoveMode::Replace));
        registry.register(MoveCommand::new("move-right", Direction::Forward, MoveMode::Replace));
        registry.register(MoveCommand::new("extend-left", Direction::Backward, MoveMode::Extend));
        registry.register(MoveCommand::new("extend-right", Direction::Forward, MoveMode::Extend));
        registry.register(LineEdgeCommand::start());
        registry.register(LineEdgeCommand::end());
        for level in 1..=6 {
            registry.register(SetKindCommand::heading(level));
        }
        registry.register(SetKindCommand::paragraph());
        registry.register(ToggleBoldCommand);
        registry.register(UndoCommand);
        registry.register(RedoCommand);
        registry
    }

    /// Adds `command`, replacing any command with the same id.
    pub fn register(&mut self, command: impl Command + 'static) {
        self.commands.retain(|existing| existing.id() != command.id());
        self.commands.push(Box::new(command));
    }

    pub fn get(&self, id: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|command| command.id() == id)
            .map(|command| &**command)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|command| command.id())
    }

    pub fn execute(&self, id: &str, ctx: &mut EditorContext, stack: &mut ActionStack) -> Result<bool, EditError> {
        let command = self
            .get(id)
            .ok_or_else(|| EditError::UnknownCommand(id.to_string()))?;
        run(command, ctx, stack)
    }
}

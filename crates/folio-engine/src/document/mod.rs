//! # Block Tree
//!
//! A document is an arena of [`BlockNode`]s keyed by stable [`BlockId`]s.
//! Parent/child relationships are id lists, so nothing outside the arena ever
//! holds a reference into the tree across a mutation.
//!
//! ## Invariants
//!
//! - Every block except the root has exactly one parent, and appears once in
//!   that parent's child list
//! - Every container holds at least one child (an empty paragraph is added on
//!   creation, and detaching never empties a container)
//! - `revision` increases on every mutation

pub mod builder;
pub mod serialize;
pub mod walker;

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{TextError, TextRuns};

pub use builder::DocumentBuilder;
pub use serialize::{AttributeValue, BlockDescriptor, DescriptorsLookup, SerializeError, SerializeNode};
pub use walker::BlockTreeWalker;

/// Stable identity of a block within a document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

/// Levels a heading may have.
pub const HEADING_LEVELS: RangeInclusive<u8> = 1..=6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Top-level or nested section; the document root is always a section.
    Section,
    BlockQuote,
    List,
    Paragraph,
    Heading {
        level: u8,
    },
    ListItem,
}

impl BlockKind {
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Section | Self::BlockQuote | Self::List)
    }

    /// Rejects headings outside [`HEADING_LEVELS`].
    pub fn validate(&self) -> Result<(), DocumentError> {
        match self {
            Self::Heading { level } if !HEADING_LEVELS.contains(level) => {
                Err(DocumentError::InvalidHeadingLevel(*level))
            }
            _ => Ok(()),
        }
    }

    /// Kind of the block created when a block of this kind is split at its end.
    pub fn continuation(&self) -> BlockKind {
        match self {
            Self::Heading { .. } => Self::Paragraph,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
    Children(Vec<BlockId>),
    Text(TextRuns),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    id: BlockId,
    parent: Option<BlockId>,
    kind: BlockKind,
    content: BlockContent,
}

impl BlockNode {
    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn parent(&self) -> Option<BlockId> {
        self.parent
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn is_container(&self) -> bool {
        matches!(self.content, BlockContent::Children(_))
    }

    /// Children of a container; empty for content blocks.
    pub fn children(&self) -> &[BlockId] {
        match &self.content {
            BlockContent::Children(children) => children,
            BlockContent::Text(_) => &[],
        }
    }

    pub fn runs(&self) -> Option<&TextRuns> {
        match &self.content {
            BlockContent::Text(runs) => Some(runs),
            BlockContent::Children(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentError {
    #[error("block {0} does not exist")]
    UnknownBlock(BlockId),
    #[error("block {0} is not a container")]
    NotAContainer(BlockId),
    #[error("block {0} has no text content")]
    NotContent(BlockId),
    #[error("child index {index} out of range (container has {len} children)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("the document root cannot be detached")]
    DetachRoot,
    #[error("detaching block {0} would leave the document empty")]
    LastBlock(BlockId),
    #[error("cannot change {from:?} into {to:?}")]
    KindMismatch { from: BlockKind, to: BlockKind },
    #[error("heading level {0} is outside 1..=6")]
    InvalidHeadingLevel(u8),
    #[error(transparent)]
    Text(#[from] TextError),
}

/// A subtree removed from the arena, ready to be attached again with the same ids.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedBlock {
    parent: BlockId,
    index: usize,
    root: BlockId,
    nodes: Vec<BlockNode>,
}

impl DetachedBlock {
    /// Id of the topmost detached block.
    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    root: BlockId,
    blocks: HashMap<BlockId, BlockNode>,
    revision: u64,
}

impl Document {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        let mut doc = Self::bare(BlockKind::Section);
        doc.ensure_populated(doc.root);
        doc
    }

    /// A document whose root container has no children yet.
    pub(crate) fn bare(root_kind: BlockKind) -> Self {
        let root = BlockId::new();
        let mut blocks = HashMap::new();
        blocks.insert(
            root,
            BlockNode {
                id: root,
                parent: None,
                kind: root_kind,
                content: BlockContent::Children(Vec::new()),
            },
        );
        Self {
            id: DocumentId(Uuid::new_v4()),
            root,
            blocks,
            revision: 0,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn root(&self) -> BlockId {
        self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockNode> {
        self.blocks.get(&id)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn require(&self, id: BlockId) -> Result<&BlockNode, DocumentError> {
        self.blocks.get(&id).ok_or(DocumentError::UnknownBlock(id))
    }

    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.blocks.get(&id).and_then(|b| b.parent)
    }

    pub fn children(&self, id: BlockId) -> &[BlockId] {
        self.blocks.get(&id).map(BlockNode::children).unwrap_or(&[])
    }

    pub fn is_container(&self, id: BlockId) -> bool {
        self.blocks.get(&id).is_some_and(BlockNode::is_container)
    }

    pub fn index_in_parent(&self, id: BlockId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn runs(&self, id: BlockId) -> Option<&TextRuns> {
        self.blocks.get(&id).and_then(BlockNode::runs)
    }

    /// Visible text of a content block.
    pub fn text(&self, id: BlockId) -> Option<String> {
        self.runs(id).map(TextRuns::text)
    }

    /// Length of a content block in `char`s (0 for anything else).
    pub fn text_len(&self, id: BlockId) -> usize {
        self.runs(id).map(TextRuns::len).unwrap_or(0)
    }

    /// Child indices from the root down to `id`.
    pub fn path_to(&self, id: BlockId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root {
            path.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn block_at_path(&self, path: &[usize]) -> Option<BlockId> {
        path.iter()
            .try_fold(self.root, |current, &index| self.children(current).get(index).copied())
    }

    /// Content blocks in document order.
    pub fn leaves(&self) -> Vec<BlockId> {
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, id: BlockId, out: &mut Vec<BlockId>) {
        match self.blocks.get(&id).map(|b| &b.content) {
            Some(BlockContent::Children(children)) => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
            Some(BlockContent::Text(_)) => out.push(id),
            None => {}
        }
    }

    /// Texts of all content blocks joined by newlines.
    pub fn plain_text(&self) -> String {
        self.leaves()
            .into_iter()
            .filter_map(|id| self.text(id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Inserts a new block under `parent`; containers come with an empty paragraph.
    pub fn insert_block(
        &mut self,
        parent: BlockId,
        index: usize,
        kind: BlockKind,
    ) -> Result<BlockId, DocumentError> {
        let content = if kind.is_container() {
            BlockContent::Children(Vec::new())
        } else {
            BlockContent::Text(TextRuns::new())
        };
        let id = self.insert_node(parent, index, kind, content)?;
        self.ensure_populated(id);
        Ok(id)
    }

    /// Inserts a content block already holding `runs`.
    pub fn insert_content_block(
        &mut self,
        parent: BlockId,
        index: usize,
        kind: BlockKind,
        runs: TextRuns,
    ) -> Result<BlockId, DocumentError> {
        if kind.is_container() {
            return Err(DocumentError::KindMismatch {
                from: BlockKind::Paragraph,
                to: kind,
            });
        }
        self.insert_node(parent, index, kind, BlockContent::Text(runs))
    }

    pub(crate) fn insert_node(
        &mut self,
        parent: BlockId,
        index: usize,
        kind: BlockKind,
        content: BlockContent,
    ) -> Result<BlockId, DocumentError> {
        kind.validate()?;
        let id = BlockId::new();
        let children = self.children_mut(parent)?;
        if index > children.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: children.len(),
            });
        }
        children.insert(index, id);
        self.blocks.insert(
            id,
            BlockNode {
                id,
                parent: Some(parent),
                kind,
                content,
            },
        );
        self.revision += 1;
        Ok(id)
    }

    pub(crate) fn ensure_populated(&mut self, id: BlockId) {
        if self.is_container(id) && self.children(id).is_empty() {
            // Cannot fail: `id` is a known, empty container.
            let _ = self.insert_node(
                id,
                0,
                BlockKind::Paragraph,
                BlockContent::Text(TextRuns::new()),
            );
        }
    }

    /// Applies a fallible edit to the runs of a content block.
    pub fn edit_runs<R>(
        &mut self,
        id: BlockId,
        edit: impl FnOnce(&mut TextRuns) -> Result<R, TextError>,
    ) -> Result<R, DocumentError> {
        let runs = self.runs_mut(id)?;
        let result = edit(runs)?;
        self.revision += 1;
        Ok(result)
    }

    /// Replaces the runs of a content block, returning the old ones.
    pub fn replace_runs(&mut self, id: BlockId, runs: TextRuns) -> Result<TextRuns, DocumentError> {
        let slot = self.runs_mut(id)?;
        let previous = std::mem::replace(slot, runs);
        self.revision += 1;
        Ok(previous)
    }

    /// Changes the kind of a block within its family (content stays content).
    pub fn set_kind(&mut self, id: BlockId, kind: BlockKind) -> Result<BlockKind, DocumentError> {
        kind.validate()?;
        let node = self
            .blocks
            .get_mut(&id)
            .ok_or(DocumentError::UnknownBlock(id))?;
        if node.kind.is_container() != kind.is_container() {
            return Err(DocumentError::KindMismatch {
                from: node.kind,
                to: kind,
            });
        }
        let previous = std::mem::replace(&mut node.kind, kind);
        self.revision += 1;
        Ok(previous)
    }

    /// Removes `id` from the tree.
    ///
    /// When `id` is the only child of its container, the highest ancestor that
    /// would be left empty is removed instead, so no container ever ends up
    /// without children.
    pub fn detach(&mut self, id: BlockId) -> Result<DetachedBlock, DocumentError> {
        self.require(id)?;
        if id == self.root {
            return Err(DocumentError::DetachRoot);
        }
        let mut top = id;
        loop {
            let parent = self.parent(top).ok_or(DocumentError::UnknownBlock(top))?;
            if self.children(parent).len() > 1 {
                break;
            }
            if parent == self.root {
                return Err(DocumentError::LastBlock(id));
            }
            top = parent;
        }

        let parent = self.parent(top).ok_or(DocumentError::UnknownBlock(top))?;
        let index = self
            .index_in_parent(top)
            .ok_or(DocumentError::UnknownBlock(top))?;
        self.children_mut(parent)?.remove(index);

        let mut nodes = Vec::new();
        let mut pending = vec![top];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.blocks.remove(&next) {
                pending.extend(node.children().iter().rev().copied());
                nodes.push(node);
            }
        }
        self.revision += 1;
        log::debug!("detached block {top} ({} nodes) from {parent}[{index}]", nodes.len());
        Ok(DetachedBlock {
            parent,
            index,
            root: top,
            nodes,
        })
    }

    /// Puts a detached subtree back where it was taken from.
    pub fn attach(&mut self, detached: DetachedBlock) -> Result<BlockId, DocumentError> {
        let DetachedBlock {
            parent,
            index,
            root,
            nodes,
        } = detached;
        let children = self.children_mut(parent)?;
        if index > children.len() {
            return Err(DocumentError::IndexOutOfRange {
                index,
                len: children.len(),
            });
        }
        children.insert(index, root);
        for node in nodes {
            self.blocks.insert(node.id, node);
        }
        self.revision += 1;
        Ok(root)
    }

    fn children_mut(&mut self, id: BlockId) -> Result<&mut Vec<BlockId>, DocumentError> {
        match self.blocks.get_mut(&id).map(|b| &mut b.content) {
            Some(BlockContent::Children(children)) => Ok(children),
            Some(BlockContent::Text(_)) => Err(DocumentError::NotAContainer(id)),
            None => Err(DocumentError::UnknownBlock(id)),
        }
    }

    fn runs_mut(&mut self, id: BlockId) -> Result<&mut TextRuns, DocumentError> {
        match self.blocks.get_mut(&id).map(|b| &mut b.content) {
            Some(BlockContent::Text(runs)) => Ok(runs),
            Some(BlockContent::Children(_)) => Err(DocumentError::NotContent(id)),
            None => Err(DocumentError::UnknownBlock(id)),
        }
    }
}

/// Clones get a fresh [`DocumentId`], so carets cached for one copy are never
/// reused for the other.
impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: DocumentId(Uuid::new_v4()),
            root: self.root,
            blocks: self.blocks.clone(),
            revision: self.revision,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

use crate::text::TextRuns;

use super::{BlockContent, BlockId, BlockKind, Document, DocumentError};

/// Builds a document top-down without the placeholder paragraphs that
/// [`Document::insert_block`] adds, so fixtures come out exactly as
/// described. Containers left empty still get one.
pub struct DocumentBuilder {
    doc: Document,
    stack: Vec<BlockId>,
    error: Option<DocumentError>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::with_root(BlockKind::Section)
    }

    pub fn with_root(kind: BlockKind) -> Self {
        let kind = if kind.is_container() {
            kind
        } else {
            BlockKind::Section
        };
        let doc = Document::bare(kind);
        let root = doc.root();
        Self {
            doc,
            stack: vec![root],
            error: None,
        }
    }

    pub fn paragraph(self, text: &str) -> Self {
        self.content(BlockKind::Paragraph, TextRuns::from_text(text))
    }

    pub fn heading(self, level: u8, text: &str) -> Self {
        self.content(BlockKind::Heading { level }, TextRuns::from_text(text))
    }

    pub fn list_item(self, text: &str) -> Self {
        self.content(BlockKind::ListItem, TextRuns::from_text(text))
    }

    pub fn content(mut self, kind: BlockKind, runs: TextRuns) -> Self {
        if kind.is_container() {
            self.fail(DocumentError::KindMismatch {
                from: BlockKind::Paragraph,
                to: kind,
            });
            return self;
        }
        self.push(kind, BlockContent::Text(runs));
        self
    }

    /// Adds a container and fills it with whatever `fill` adds.
    pub fn container(mut self, kind: BlockKind, fill: impl FnOnce(Self) -> Self) -> Self {
        if !kind.is_container() {
            self.fail(DocumentError::NotAContainer(self.current()));
            return self;
        }
        let Some(id) = self.push(kind, BlockContent::Children(Vec::new())) else {
            return self;
        };
        self.stack.push(id);
        let mut filled = fill(self);
        filled.stack.pop();
        filled.doc.ensure_populated(id);
        filled
    }

    pub fn build(mut self) -> Result<Document, DocumentError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let root = self.doc.root();
        self.doc.ensure_populated(root);
        Ok(self.doc)
    }

    fn current(&self) -> BlockId {
        self.stack.last().copied().unwrap_or(self.doc.root())
    }

    fn push(&mut self, kind: BlockKind, content: BlockContent) -> Option<BlockId> {
        if self.error.is_some() {
            return None;
        }
        let parent = self.current();
        let index = self.doc.children(parent).len();
        match self.doc.insert_node(parent, index, kind, content) {
            Ok(id) => Some(id),
            Err(error) => {
                self.fail(error);
                None
            }
        }
    }

    fn fail(&mut self, error: DocumentError) {
        self.error.get_or_insert(error);
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_single_paragraph() {
        let doc = DocumentBuilder::new().build().unwrap();
        assert_eq!(doc.leaves().len(), 1);
    }

    #[test]
    fn empty_containers_are_populated() {
        let doc = DocumentBuilder::new()
            .paragraph("before")
            .container(BlockKind::BlockQuote, |b| b)
            .build()
            .unwrap();
        assert_eq!(doc.plain_text(), "before\n");
    }

    #[test]
    fn content_kind_cannot_be_a_container() {
        let result = DocumentBuilder::new()
            .content(BlockKind::List, TextRuns::new())
            .build();
        assert!(matches!(result, Err(DocumentError::KindMismatch { .. })));
    }

    #[test]
    fn out_of_range_heading_fails_the_build() {
        let result = DocumentBuilder::new().paragraph("x").heading(9, "Big").build();
        assert_eq!(result.err(), Some(DocumentError::InvalidHeadingLevel(9)));
    }
}

//! Conversion between block subtrees and generic [`SerializeNode`] trees.
//!
//! Each block kind has a static [`BlockDescriptor`] naming its type id and
//! the properties it persists. Byte or text codecs are layered on top through
//! the serde derives; nothing here fixes a wire format.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::text::{Style, TextFragment, TextRuns};

use super::{BlockContent, BlockId, BlockKind, Document, DocumentError};

pub const RUN_TYPE_ID: &str = "run";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Double(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializeNode {
    pub type_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SerializeNode>,
}

impl SerializeNode {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn bool_attribute(&self, name: &str) -> Result<bool, SerializeError> {
        match self.attributes.get(name) {
            None => Ok(false),
            Some(AttributeValue::Bool(value)) => Ok(*value),
            Some(_) => Err(self.invalid(name)),
        }
    }

    fn invalid(&self, name: &str) -> SerializeError {
        SerializeError::InvalidAttribute {
            type_id: self.type_id.clone(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerializeError {
    #[error("unknown block type `{0}`")]
    UnknownType(String),
    #[error("attribute `{name}` on `{type_id}` is missing or has the wrong type")]
    InvalidAttribute { type_id: String, name: String },
    #[error("the root node `{0}` is not a container")]
    RootNotContainer(String),
    #[error("`{parent}` cannot hold a `{child}` child")]
    UnexpectedChild { parent: String, child: String },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A persisted property of a block kind.
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub get: fn(&BlockKind) -> Option<AttributeValue>,
    pub set: fn(&mut BlockKind, &AttributeValue) -> Result<(), SerializeError>,
}

/// Static description of one block type.
pub struct BlockDescriptor {
    pub type_id: &'static str,
    /// Kind produced before properties are applied.
    pub prototype: BlockKind,
    pub properties: &'static [PropertyDescriptor],
}

fn heading_level(kind: &BlockKind) -> Option<AttributeValue> {
    match kind {
        BlockKind::Heading { level } => Some(AttributeValue::Int(i64::from(*level))),
        _ => None,
    }
}

fn set_heading_level(kind: &mut BlockKind, value: &AttributeValue) -> Result<(), SerializeError> {
    let parsed = match value {
        AttributeValue::Int(raw) => u8::try_from(*raw).ok(),
        _ => None,
    };
    match (kind, parsed) {
        (BlockKind::Heading { level }, Some(parsed)) => {
            *level = parsed;
            Ok(())
        }
        _ => Err(SerializeError::InvalidAttribute {
            type_id: HEADING.type_id.to_string(),
            name: "level".to_string(),
        }),
    }
}

pub static SECTION: BlockDescriptor = BlockDescriptor {
    type_id: "section",
    prototype: BlockKind::Section,
    properties: &[],
};

pub static BLOCK_QUOTE: BlockDescriptor = BlockDescriptor {
    type_id: "block_quote",
    prototype: BlockKind::BlockQuote,
    properties: &[],
};

pub static LIST: BlockDescriptor = BlockDescriptor {
    type_id: "list",
    prototype: BlockKind::List,
    properties: &[],
};

pub static PARAGRAPH: BlockDescriptor = BlockDescriptor {
    type_id: "paragraph",
    prototype: BlockKind::Paragraph,
    properties: &[],
};

pub static HEADING: BlockDescriptor = BlockDescriptor {
    type_id: "heading",
    prototype: BlockKind::Heading { level: 1 },
    properties: &[PropertyDescriptor {
        name: "level",
        get: heading_level,
        set: set_heading_level,
    }],
};

pub static LIST_ITEM: BlockDescriptor = BlockDescriptor {
    type_id: "list_item",
    prototype: BlockKind::ListItem,
    properties: &[],
};

impl BlockKind {
    pub fn descriptor(&self) -> &'static BlockDescriptor {
        match self {
            BlockKind::Section => &SECTION,
            BlockKind::BlockQuote => &BLOCK_QUOTE,
            BlockKind::List => &LIST,
            BlockKind::Paragraph => &PARAGRAPH,
            BlockKind::Heading { .. } => &HEADING,
            BlockKind::ListItem => &LIST_ITEM,
        }
    }
}

/// Maps type ids to the descriptors able to rebuild them.
#[derive(Default)]
pub struct DescriptorsLookup {
    by_type: HashMap<&'static str, &'static BlockDescriptor>,
}

impl DescriptorsLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every block kind the engine defines.
    pub fn standard() -> Self {
        let mut lookup = Self::empty();
        for descriptor in [&SECTION, &BLOCK_QUOTE, &LIST, &PARAGRAPH, &HEADING, &LIST_ITEM] {
            lookup.register(descriptor);
        }
        lookup
    }

    pub fn register(&mut self, descriptor: &'static BlockDescriptor) {
        self.by_type.insert(descriptor.type_id, descriptor);
    }

    pub fn get(&self, type_id: &str) -> Option<&'static BlockDescriptor> {
        self.by_type.get(type_id).copied()
    }

    fn kind_for(&self, node: &SerializeNode) -> Result<BlockKind, SerializeError> {
        let descriptor = self
            .get(&node.type_id)
            .ok_or_else(|| SerializeError::UnknownType(node.type_id.clone()))?;
        let mut kind = descriptor.prototype;
        for property in descriptor.properties {
            if let Some(value) = node.attributes.get(property.name) {
                (property.set)(&mut kind, value)?;
            }
        }
        kind.validate()?;
        Ok(kind)
    }
}

fn serialize_runs(runs: &TextRuns) -> Vec<SerializeNode> {
    runs.fragments()
        .iter()
        .map(|fragment| {
            let mut node = SerializeNode::new(RUN_TYPE_ID);
            node.attributes
                .insert("text".into(), AttributeValue::Str(fragment.text.clone()));
            let style = fragment.style;
            for (name, on) in [
                ("bold", style.bold),
                ("italic", style.italic),
                ("underline", style.underline),
                ("code", style.code),
            ] {
                if on {
                    node.attributes.insert(name.into(), AttributeValue::Bool(true));
                }
            }
            node
        })
        .collect()
}

fn deserialize_run(node: &SerializeNode) -> Result<TextFragment, SerializeError> {
    let text = match node.attributes.get("text") {
        Some(AttributeValue::Str(text)) => text.clone(),
        _ => return Err(node.invalid("text")),
    };
    let style = Style {
        bold: node.bool_attribute("bold")?,
        italic: node.bool_attribute("italic")?,
        underline: node.bool_attribute("underline")?,
        code: node.bool_attribute("code")?,
    };
    Ok(TextFragment::new(text, style))
}

impl Document {
    /// Serializes the whole document starting at the root.
    pub fn serialize(&self) -> SerializeNode {
        // The root always exists.
        self.serialize_block(self.root)
            .unwrap_or_else(|_| SerializeNode::new(SECTION.type_id))
    }

    pub fn serialize_block(&self, id: BlockId) -> Result<SerializeNode, DocumentError> {
        let block = self.require(id)?;
        let descriptor = block.kind.descriptor();
        let mut node = SerializeNode::new(descriptor.type_id);
        for property in descriptor.properties {
            if let Some(value) = (property.get)(&block.kind) {
                node.attributes.insert(property.name.to_string(), value);
            }
        }
        node.children = match &block.content {
            BlockContent::Children(children) => children
                .iter()
                .map(|&child| self.serialize_block(child))
                .collect::<Result<_, _>>()?,
            BlockContent::Text(runs) => serialize_runs(runs),
        };
        Ok(node)
    }

    /// Rebuilds a document from `node`, which must describe a container.
    pub fn deserialize(
        node: &SerializeNode,
        lookup: &DescriptorsLookup,
    ) -> Result<Document, SerializeError> {
        let DecodedBlock::Container(kind, children) = decode(node, lookup)? else {
            return Err(SerializeError::RootNotContainer(node.type_id.clone()));
        };
        let mut doc = Document::bare(kind);
        let root = doc.root;
        for (index, child) in children.into_iter().enumerate() {
            doc.place(root, index, child)?;
        }
        doc.ensure_populated(root);
        Ok(doc)
    }

    /// Rebuilds the block subtree described by `node` as child `index` of
    /// `parent`. Content and container nodes are both accepted. Nothing is
    /// inserted unless the whole subtree decodes.
    pub fn insert_subtree(
        &mut self,
        parent: BlockId,
        index: usize,
        node: &SerializeNode,
        lookup: &DescriptorsLookup,
    ) -> Result<BlockId, SerializeError> {
        let decoded = decode(node, lookup)?;
        Ok(self.place(parent, index, decoded)?)
    }

    fn place(
        &mut self,
        parent: BlockId,
        index: usize,
        block: DecodedBlock,
    ) -> Result<BlockId, DocumentError> {
        match block {
            DecodedBlock::Content(kind, runs) => {
                self.insert_node(parent, index, kind, BlockContent::Text(runs))
            }
            DecodedBlock::Container(kind, children) => {
                let id = self.insert_node(parent, index, kind, BlockContent::Children(Vec::new()))?;
                for (position, child) in children.into_iter().enumerate() {
                    self.place(id, position, child)?;
                }
                self.ensure_populated(id);
                Ok(id)
            }
        }
    }
}

/// A block decoded from a node but not yet placed in a document.
enum DecodedBlock {
    Content(BlockKind, TextRuns),
    Container(BlockKind, Vec<DecodedBlock>),
}

fn decode(node: &SerializeNode, lookup: &DescriptorsLookup) -> Result<DecodedBlock, SerializeError> {
    let kind = lookup.kind_for(node)?;
    let unexpected = |child: &SerializeNode| SerializeError::UnexpectedChild {
        parent: node.type_id.clone(),
        child: child.type_id.clone(),
    };
    if kind.is_container() {
        let children = node
            .children
            .iter()
            .map(|child| {
                if child.type_id == RUN_TYPE_ID {
                    Err(unexpected(child))
                } else {
                    decode(child, lookup)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodedBlock::Container(kind, children))
    } else {
        let fragments = node
            .children
            .iter()
            .map(|run| {
                if run.type_id == RUN_TYPE_ID {
                    deserialize_run(run)
                } else {
                    Err(unexpected(run))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DecodedBlock::Content(kind, TextRuns::from_fragments(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentBuilder;
    use crate::tests::{leaf_named, nested_fixture, paragraphs};
    use pretty_assertions::assert_eq;

    fn styled_document() -> Document {
        DocumentBuilder::new()
            .heading(2, "Title")
            .content(
                BlockKind::Paragraph,
                TextRuns::from_fragments([
                    TextFragment::plain("mixed "),
                    TextFragment::new("bold", Style::bold()),
                ]),
            )
            .container(BlockKind::List, |b| b.list_item("one").list_item("two"))
            .build()
            .unwrap()
    }

    #[test]
    fn round_trip_preserves_structure() {
        let lookup = DescriptorsLookup::standard();
        for doc in [styled_document(), nested_fixture(), Document::new()] {
            let node = doc.serialize();
            let restored = Document::deserialize(&node, &lookup).unwrap();
            assert_eq!(restored.serialize(), node);
            assert_eq!(restored.plain_text(), doc.plain_text());
        }
    }

    #[test]
    fn heading_level_is_an_attribute() {
        let node = styled_document().serialize();
        let heading = &node.children[0];
        assert_eq!(heading.type_id, "heading");
        assert_eq!(heading.attributes.get("level"), Some(&AttributeValue::Int(2)));
        let bold_run = &node.children[1].children[1];
        assert_eq!(bold_run.attributes.get("bold"), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn round_trip_through_json() {
        let node = styled_document().serialize();
        let json = serde_json::to_string(&node).unwrap();
        let decoded: SerializeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let mut node = SerializeNode::new("section");
        node.children.push(SerializeNode::new("table"));
        assert_eq!(
            Document::deserialize(&node, &DescriptorsLookup::standard()).unwrap_err(),
            SerializeError::UnknownType("table".into())
        );
    }

    #[test]
    fn lookup_only_knows_registered_types() {
        let mut lookup = DescriptorsLookup::empty();
        lookup.register(&SECTION);
        let mut node = SerializeNode::new("section");
        node.children.push(SerializeNode::new("paragraph"));
        assert!(matches!(
            Document::deserialize(&node, &lookup),
            Err(SerializeError::UnknownType(_))
        ));
    }

    #[test]
    fn invalid_heading_level_is_rejected() {
        let mut heading = SerializeNode::new("heading");
        heading
            .attributes
            .insert("level".into(), AttributeValue::Str("two".into()));
        let mut node = SerializeNode::new("section");
        node.children.push(heading);
        assert!(matches!(
            Document::deserialize(&node, &DescriptorsLookup::standard()),
            Err(SerializeError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn out_of_range_heading_level_is_rejected() {
        let mut heading = SerializeNode::new("heading");
        heading.attributes.insert("level".into(), AttributeValue::Int(9));
        let mut node = SerializeNode::new("section");
        node.children.push(heading);
        assert_eq!(
            Document::deserialize(&node, &DescriptorsLookup::standard()).unwrap_err(),
            SerializeError::Document(DocumentError::InvalidHeadingLevel(9))
        );
    }

    #[test]
    fn content_subtree_round_trips() {
        let source = styled_document();
        let lookup = DescriptorsLookup::standard();
        let mut target = paragraphs(&["existing"]);
        let root = target.root();
        for &block in source.children(source.root()).iter().take(2) {
            let node = source.serialize_block(block).unwrap();
            let inserted = target.insert_subtree(root, 0, &node, &lookup).unwrap();
            assert_eq!(target.serialize_block(inserted).unwrap(), node);
        }

        let item = source.leaves()[2];
        let node = source.serialize_block(item).unwrap();
        assert_eq!(node.type_id, "list_item");
        let inserted = target.insert_subtree(root, 1, &node, &lookup).unwrap();
        assert_eq!(target.serialize_block(inserted).unwrap(), node);
        assert_eq!(target.text(inserted).as_deref(), Some("one"));
    }

    #[test]
    fn nested_container_subtree_round_trips() {
        let source = nested_fixture();
        let lookup = DescriptorsLookup::standard();
        let outer = source.children(source.root())[1];
        let node = source.serialize_block(outer).unwrap();

        let mut target = Document::new();
        let root = target.root();
        let inserted = target.insert_subtree(root, 1, &node, &lookup).unwrap();
        assert_eq!(target.serialize_block(inserted).unwrap(), node);
        assert_eq!(target.text(leaf_named(&target, "b111")).as_deref(), Some("b111"));
    }

    #[test]
    fn failed_subtree_insert_leaves_document_untouched() {
        let mut target = paragraphs(&["keep"]);
        let root = target.root();
        let revision = target.revision();
        let lookup = DescriptorsLookup::standard();

        let mut quote = SerializeNode::new("block_quote");
        quote.children.push(SerializeNode::new("paragraph"));
        quote.children.push(SerializeNode::new("table"));
        assert_eq!(
            target.insert_subtree(root, 0, &quote, &lookup).unwrap_err(),
            SerializeError::UnknownType("table".into())
        );

        let paragraph = SerializeNode::new("paragraph");
        assert!(matches!(
            target.insert_subtree(root, 5, &paragraph, &lookup),
            Err(SerializeError::Document(DocumentError::IndexOutOfRange { .. }))
        ));
        assert_eq!(target.revision(), revision);
        assert_eq!(target.plain_text(), "keep");
    }

    #[test]
    fn runs_only_belong_in_content_blocks() {
        let mut run = SerializeNode::new(RUN_TYPE_ID);
        run.attributes.insert("text".into(), AttributeValue::Str("stray".into()));
        let mut node = SerializeNode::new("section");
        node.children.push(run);
        assert_eq!(
            Document::deserialize(&node, &DescriptorsLookup::standard()).unwrap_err(),
            SerializeError::UnexpectedChild {
                parent: "section".into(),
                child: "run".into(),
            }
        );
    }

    #[test]
    fn content_root_is_rejected() {
        let node = SerializeNode::new("paragraph");
        assert_eq!(
            Document::deserialize(&node, &DescriptorsLookup::standard()).unwrap_err(),
            SerializeError::RootNotContainer("paragraph".into())
        );
    }
}

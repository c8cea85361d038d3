//! Shared fixtures for unit tests.

use crate::document::{BlockId, BlockKind, Document, DocumentBuilder};

/// `[[[a11, a12, a13]], [[[b111], b12]], c]`
pub fn nested_fixture() -> Document {
    DocumentBuilder::new()
        .container(BlockKind::Section, |b| {
            b.container(BlockKind::List, |b| {
                b.list_item("a11").list_item("a12").list_item("a13")
            })
        })
        .container(BlockKind::Section, |b| {
            b.container(BlockKind::BlockQuote, |b| {
                b.container(BlockKind::BlockQuote, |b| b.paragraph("b111"))
                    .paragraph("b12")
            })
        })
        .paragraph("c")
        .build()
        .expect("fixture builds")
}

/// A flat document with one paragraph per entry.
pub fn paragraphs(texts: &[&str]) -> Document {
    texts
        .iter()
        .fold(DocumentBuilder::new(), |b, text| b.paragraph(text))
        .build()
        .expect("fixture builds")
}

/// Finds the content block whose text is `text`.
pub fn leaf_named(doc: &Document, text: &str) -> BlockId {
    doc.leaves()
        .into_iter()
        .find(|&id| doc.text(id).as_deref() == Some(text))
        .unwrap_or_else(|| panic!("no leaf with text {text:?}"))
}

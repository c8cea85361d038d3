#![allow(dead_code)]

use folio_engine::document::{BlockId, BlockKind, Document, DocumentBuilder};

/// `[[[a11, a12, a13]], [[[b111], b12]], c]`
pub fn nested() -> Document {
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

/// A document mixing combining marks, emoji and empty blocks.
pub fn mixed() -> Document {
    DocumentBuilder::new()
        .heading(1, "Cafe\u{0301}")
        .paragraph("")
        .container(BlockKind::List, |b| {
            b.list_item("a\u{0304}\u{0308}bc\u{0327}")
                .list_item("👍🏽 ok")
        })
        .paragraph("end")
        .build()
        .expect("fixture builds")
}

pub fn leaf(doc: &Document, text: &str) -> BlockId {
    doc.leaves()
        .into_iter()
        .find(|&id| doc.text(id).as_deref() == Some(text))
        .unwrap_or_else(|| panic!("no leaf with text {text:?}"))
}

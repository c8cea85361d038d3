// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use folio_engine::document::{BlockKind, Document, DocumentBuilder};

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    (0..sections)
        .fold(DocumentBuilder::new(), |builder, section| {
            builder
                .heading(1, &format!("Section {section}"))
                .paragraph("Some paragraph content with multiple sentences. This helps create realistic structure.")
                .container(BlockKind::List, |list| {
                    list.list_item("First item")
                        .list_item("Second item")
                        .container(BlockKind::BlockQuote, |quote| quote.paragraph("Quoted text"))
                })
        })
        .build()
        .unwrap()
}

use folio_engine::document::{BlockTreeWalker, Document, DocumentBuilder};
use folio_engine::editing::{ActionStack, Caret, CaretNavigation, CursorHandle, EditorContext, InsertTextCommand, run};
use folio_engine::text::grapheme_length;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

fn forward_walk(doc: &Document) -> Vec<Caret> {
    std::iter::successors(Some(Caret::document_start(doc)), |caret| {
        Some(caret.move_forward(doc)).filter(|next| !next.is_invalid())
    })
    .collect()
}

#[rstest]
#[case::nested(common::nested())]
#[case::mixed(common::mixed())]
#[case::empty(Document::new())]
fn forward_then_backward_returns_to_the_same_caret(#[case] doc: Document) {
    let carets = forward_walk(&doc);
    let last = carets.last().copied().expect("at least one caret");
    assert_eq!(last, Caret::document_end(&doc));
    assert!(last.move_forward(&doc).is_invalid());

    for caret in &carets[..carets.len() - 1] {
        assert_eq!(caret.move_forward(&doc).move_backward(&doc), *caret);
    }
}

#[rstest]
#[case::nested(common::nested())]
#[case::mixed(common::mixed())]
fn walker_directions_are_inverse(#[case] doc: Document) {
    let walker = BlockTreeWalker::new(&doc);
    let first = walker.first().expect("first leaf");
    let last = walker.last().expect("last leaf");

    let forward: Vec<_> = std::iter::successors(Some(first), |&b| walker.next_non_container(b)).collect();
    let mut backward: Vec<_> = std::iter::successors(Some(last), |&b| walker.previous_non_container(b)).collect();
    backward.reverse();
    assert_eq!(forward, backward);
    assert_eq!(forward, doc.leaves());
}

#[test]
fn nested_walk_order() {
    let doc = common::nested();
    let walker = BlockTreeWalker::new(&doc);
    let a11 = common::leaf(&doc, "a11");
    let c = common::leaf(&doc, "c");
    let order: Vec<_> = walker
        .iter_from(a11)
        .filter_map(|id| doc.text(id))
        .collect();
    assert_snapshot!(order.join(","), @"a11,a12,a13,b111,b12,c");
    assert_eq!(walker.next_non_container(c), None);
    assert_eq!(walker.previous_non_container(a11), None);
}

#[rstest]
#[case(0, 3)]
#[case(3, 1)]
#[case(4, 2)]
fn grapheme_lengths_around_combining_marks(#[case] index: usize, #[case] length: usize) {
    assert_eq!(grapheme_length("a\u{0304}\u{0308}bc\u{0327}", index), Ok(length));
}

#[test]
fn restoring_a_captured_caret_after_typing() {
    let mut ctx = EditorContext::new(Document::new());
    let mut stack = ActionStack::new();
    run(
        &InsertTextCommand::new("This is the beginning of the paragraph"),
        &mut ctx,
        &mut stack,
    )
    .expect("insert");
    let block = ctx.document.leaves()[0];

    let handle = CursorHandle::capture(&Caret::text(block, 3), &ctx.document);
    ctx.selection
        .move_to(Caret::end_of(&ctx.document, block), folio_engine::editing::MoveMode::Replace);
    let restored = handle.resolve(&ctx.document);

    assert_eq!(restored.character_after(&ctx.document).as_deref(), Some("s"));
    assert_eq!(restored.character_before(&ctx.document).as_deref(), Some("i"));
}

#[test]
fn move_by_reports_partial_moves() {
    let doc = DocumentBuilder::new().paragraph("ab").paragraph("c").build().expect("build");
    let start = Caret::document_start(&doc);
    let outcome = start.move_by(&doc, 10);
    assert_eq!(outcome.steps, 4);
    assert!(!outcome.completed);
    assert_eq!(outcome.caret, Caret::document_end(&doc));
}

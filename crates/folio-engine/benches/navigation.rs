use criterion::{Criterion, criterion_group, criterion_main};
use folio_engine::editing::{Caret, CaretNavigation, CursorHandle};
mod common;

fn bench_navigation(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation");
    group.sample_size(10);

    let doc = common::generate_document(50);

    group.bench_function("walk_forward_whole_document", |b| {
        b.iter(|| {
            let mut caret = Caret::document_start(&doc);
            let mut steps = 0;
            while !caret.is_invalid() {
                caret = caret.move_forward(std::hint::black_box(&doc));
                steps += 1;
            }
            std::hint::black_box(steps);
        });
    });

    let end = Caret::document_end(&doc);
    let handle = CursorHandle::capture(&end, &doc);
    let mut edited = doc.clone();
    let first = edited.leaves()[0];
    edited.edit_runs(first, |runs| runs.insert_text(0, "x")).unwrap();

    group.bench_function("resolve_handle_after_edit", |b| {
        b.iter(|| std::hint::black_box(handle.resolve(std::hint::black_box(&edited))));
    });

    group.finish();
}

criterion_group!(benches, bench_navigation);
criterion_main!(benches);

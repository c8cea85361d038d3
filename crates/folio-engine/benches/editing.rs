use criterion::{Criterion, criterion_group, criterion_main};
use folio_engine::editing::{ActionStack, EditorContext, InsertTextCommand, run};
mod common;

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editing");
    group.sample_size(10);

    let doc = common::generate_document(20);

    group.bench_function("type_sentence_then_undo", |b| {
        b.iter(|| {
            let mut ctx = EditorContext::new(doc.clone());
            let mut stack = ActionStack::new();
            for ch in "The quick brown fox jumps over the lazy dog".chars() {
                run(&InsertTextCommand::new(ch), &mut ctx, &mut stack).unwrap();
            }
            while stack.undo(&mut ctx).unwrap() {}
            std::hint::black_box(ctx.document.revision());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_typing);
criterion_main!(benches);

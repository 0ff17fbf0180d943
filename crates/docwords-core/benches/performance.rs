use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use docwords_core::{
    CompletionEngine, ContentChange, HostDocument, Position, Settings, TextDocument,
    parse_document,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "let value_{i:06} = compute_total(quick_brown_fox, lazy_dog_{}); // benchmark\n",
            i % 97
        ));
    }
    out.pop();
    out
}

fn bench_cold_parse(c: &mut Criterion) {
    let doc = TextDocument::new("file:///bench/large.rs", "rust", &large_text(9_999));
    let engine = CompletionEngine::new(Settings::default());
    c.bench_function("cold_parse/10k_lines", |b| {
        b.iter(|| {
            let index = parse_document(black_box(&doc), engine.settings());
            black_box(index.len());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(9_999);
    c.bench_function("typing_middle/100_keystrokes", |b| {
        b.iter_batched(
            || {
                let doc = TextDocument::new("file:///bench/large.rs", "rust", &text);
                let mut engine = CompletionEngine::new(Settings::default());
                engine.on_document_opened(&doc);
                engine.on_active_document_changed(Some(&doc));
                (engine, doc)
            },
            |(mut engine, mut doc)| {
                let line = doc.line_count() / 2;
                for i in 0..100 {
                    let change = ContentChange::insert(Position::new(line, 4 + i), "x");
                    doc.apply_change(&change);
                    black_box(engine.on_document_edited(&doc, std::slice::from_ref(&change)));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_completion_query(c: &mut Criterion) {
    let mut engine = CompletionEngine::new(Settings::default());
    let docs: Vec<TextDocument> = (0..20)
        .map(|i| TextDocument::new(format!("file:///bench/{i}.rs"), "rust", &large_text(500)))
        .collect();
    for doc in &docs {
        engine.on_document_opened(doc);
    }
    let query = TextDocument::new("file:///bench/query.rs", "rust", "let x = val");
    c.bench_function("query/20_documents", |b| {
        b.iter(|| black_box(engine.provide_completions(&query, Position::new(0, 11))))
    });
}

criterion_group!(
    benches,
    bench_cold_parse,
    bench_typing_in_middle,
    bench_completion_query
);
criterion_main!(benches);

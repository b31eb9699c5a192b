use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobcompass_core::keyword::{BM25Document, BM25Index};
use std::collections::HashMap;

fn build_index(n: usize) -> BM25Index {
    let mut index = BM25Index::new();
    for i in 0..n {
        index.add_document(BM25Document {
            id: format!("doc-{i}"),
            content_type: "corporate_site".to_string(),
            secondary_content_types: Vec::new(),
            text: format!("サンプル商事 新卒採用 {i}年 エンジニア募集 東京本社"),
            metadata: HashMap::new(),
        });
    }
    index
}

fn bm25_search(c: &mut Criterion) {
    let index = build_index(2_000);
    c.bench_function("bm25_search_2k_docs", |b| {
        b.iter(|| black_box(index.search("新卒採用 エンジニア", 10, None)));
    });
}

criterion_group!(benches, bm25_search);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use docsearch::{IndexEntry, SearchConfig, SearchFilters, SearchRequest, SearchService};

const WORDS: &[&str] = &[
    "invoice", "report", "quarterly", "budget", "meeting", "notes", "contract", "draft",
    "review", "archive", "project", "summary", "design", "release", "customer", "payment",
    "搜索", "文档", "会议", "报告",
];

/// Deterministic pseudo-random text so runs are comparable
fn synthetic_text(seed: usize, len: usize) -> String {
    let mut state = seed as u64 ^ 0x9E37_79B9_7F4A_7C15;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            WORDS[(state >> 33) as usize % WORDS.len()]
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn setup_service() -> SearchService {
    let service = SearchService::in_memory(SearchConfig::default()).unwrap();
    for i in 0..2_000i64 {
        let file_type = if i % 3 == 0 { "pdf" } else { "md" };
        service.upsert(
            IndexEntry::new(i, synthetic_text(i as usize, 200), file_type)
                .with_folder(Some(i % 10))
                .with_tags([i % 7, i % 11]),
        );
    }
    service
}

fn bench_search(c: &mut Criterion) {
    let service = setup_service();

    let queries = vec![
        ("single_word", SearchRequest::new("invoice")),
        ("multi_word", SearchRequest::new("quarterly budget report")),
        ("cjk", SearchRequest::new("搜索文档")),
        ("deep_page", SearchRequest::new("meeting").with_page(80, 20)),
        (
            "filtered",
            SearchRequest::new("contract payment")
                .with_filters(SearchFilters::default().file_type("pdf").tags([3])),
        ),
    ];

    let mut group = c.benchmark_group("search");
    group.sample_size(20);

    for (name, request) in queries {
        group.bench_function(name, |b| {
            b.iter(|| service.search(&request).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);

//! Benchmarks for search crate scoring and ranking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use querydeck_search::{levenshtein, rank, similarity, SearchItem, DEFAULT_RESULT_CAP};

struct BenchQuery {
    key: String,
    tags: Vec<String>,
    usage: u64,
}

impl SearchItem for BenchQuery {
    fn search_key(&self) -> &str {
        &self.key
    }

    fn search_tags(&self) -> &[String] {
        &self.tags
    }

    fn usage_count(&self) -> u64 {
        self.usage
    }
}

fn create_test_queries(count: usize) -> Vec<BenchQuery> {
    let services = ["auth", "billing", "checkout", "inventory", "search"];
    (0..count)
        .map(|i| BenchQuery {
            key: format!("{} latency alerts {}", services[i % services.len()], i),
            tags: vec![services[i % services.len()].to_string(), "prod".to_string()],
            usage: (i % 17) as u64,
        })
        .collect()
}

fn bench_levenshtein(c: &mut Criterion) {
    c.bench_function("levenshtein_short", |b| {
        b.iter(|| levenshtein(black_box("login tracking"), black_box("logn trakcing")))
    });
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    group.bench_function("substring_hit", |b| {
        b.iter(|| similarity(black_box("checkout payment failures"), black_box("payment")))
    });

    group.bench_function("edit_distance_path", |b| {
        b.iter(|| similarity(black_box("checkout payment failures"), black_box("paymnet falures")))
    });

    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    for size in [10, 100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("term_match", size), size, |b, &size| {
            // rank takes ownership, so build fresh candidates per iteration
            b.iter_with_setup(
                || create_test_queries(size),
                |queries| rank(queries, black_box("billing latency"), DEFAULT_RESULT_CAP),
            )
        });

        group.bench_with_input(BenchmarkId::new("browse_mode", size), size, |b, &size| {
            b.iter_with_setup(
                || create_test_queries(size),
                |queries| rank(queries, black_box(""), DEFAULT_RESULT_CAP),
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_levenshtein, bench_similarity, bench_rank);
criterion_main!(benches);

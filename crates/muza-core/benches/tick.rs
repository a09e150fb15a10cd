use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use muza_core::{AssociativeMemory, ContentType, Emotion};

fn populated(n: usize) -> AssociativeMemory {
    let mut mem = AssociativeMemory::with_seed(7);
    let text: Vec<String> = (0..n).map(|i| format!("word{i:04}")).collect();
    mem.learn_at(&text.join(" "), false, ContentType::General, Emotion::Neutral, 0);
    mem
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    for n in [50, 200, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut mem = populated(n);
            b.iter(|| mem.tick());
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mem = populated(500);
    c.bench_function("semantic_search_500", |b| {
        b.iter(|| mem.semantic_search("word0042", 5).len())
    });
}

criterion_group!(benches, bench_tick, bench_search);
criterion_main!(benches);

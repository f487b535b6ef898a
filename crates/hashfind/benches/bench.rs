use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hashfind::{
    CancelFlag, LengthEnumerator, Search, SearchParams, SecretHasher, Sha1Base64,
    min_substring_hamming_distance,
};

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance");
    let digest = Sha1Base64.hash(&[0x00]);
    for target in ["a", "cat", "hello", "W6k8nbDP+T9StSHXQg5D9u2ieE8="] {
        group.bench_function(format!("min_substring/{}", target.len()), |b| {
            b.iter(|| {
                black_box(
                    min_substring_hamming_distance(
                        black_box(digest.as_bytes()),
                        black_box(target.as_bytes()),
                    )
                    .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_exhaust_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    group.throughput(Throughput::Elements(256));
    group.bench_function("sha1/length_1", |b| {
        b.iter(|| {
            // '!' never appears in base64, so every candidate is evaluated.
            let params = SearchParams::new("!", 0);
            let enumerator =
                LengthEnumerator::new(params, Sha1Base64, CancelFlag::new(), 1).unwrap();
            black_box(enumerator.count())
        })
    });
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    for target in ["Hi", "cat"] {
        group.bench_function(format!("best/{target}"), |b| {
            b.iter(|| {
                let params = SearchParams::new(target, 0);
                black_box(
                    Search::new(params, Sha1Base64, CancelFlag::new())
                        .best()
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance, bench_exhaust_length, bench_search);
criterion_main!(benches);

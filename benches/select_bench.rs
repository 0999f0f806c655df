use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ogshot::select::{select, CandidateFile, PathNormalizer, SelectionRule};

fn candidates(n: usize) -> Vec<CandidateFile> {
    (0..n)
        .map(|i| {
            let section = ["blog", "docs", "about", "tags"][i % 4];
            CandidateFile::new(format!("/home/ci/site/dist/{}/page-{}/index.html", section, i))
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let n = PathNormalizer::default();
    c.bench_function("normalize", |b| {
        b.iter(|| n.normalize(black_box("/home/ci/site/dist/blog/post-1/index.html")))
    });
}

fn bench_select(c: &mut Criterion) {
    let input = candidates(5000);
    let rules = vec![SelectionRule::new("^/blog/"), SelectionRule::new("^/docs/page-1")];

    // Regexes are compiled inside `select`, as they are once per run
    c.bench_function("select_5000", |b| {
        b.iter(|| select(black_box(input.clone()), &rules).unwrap())
    });
}

criterion_group!(benches, bench_normalize, bench_select);
criterion_main!(benches);

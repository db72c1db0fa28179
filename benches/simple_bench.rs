use acora::AhoCorasick;
use criterion::{criterion_group, criterion_main, Criterion};

fn build_dictionary() -> AhoCorasick<usize> {
    use std::fs::File;
    use std::io::{prelude::*, BufReader};

    let f = File::open("/usr/share/dict/cracklib-small").expect("cracklib-small exists");
    let reader = BufReader::new(f);

    let mut ac: AhoCorasick<usize> = AhoCorasick::new();
    for (i, line) in reader.lines().enumerate() {
        let word = line.unwrap();
        if !word.is_empty() {
            ac.add(word.as_str(), i).unwrap();
        }
    }
    ac.finalize();
    ac
}

fn bench_cracklib(c: &mut Criterion) {
    let ac = build_dictionary();
    c.bench_function("cracklib_search", |b| {
        b.iter(|| {
            let count = ac
                .search("cafécafé café café")
                .unwrap()
                .filter(|r| r.is_ok())
                .count();
            criterion::black_box(count)
        });
    });
}

fn bench_cracklib_longest(c: &mut Criterion) {
    let ac = build_dictionary();
    c.bench_function("cracklib_search_longest", |b| {
        b.iter(|| {
            let count = ac
                .search_longest("cafécafé café café")
                .unwrap()
                .filter(|r| r.is_ok())
                .count();
            criterion::black_box(count)
        });
    });
}

criterion_group!(benches, bench_cracklib, bench_cracklib_longest);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tessera_html5::parser::Html5ParserOptions;

fn sample_document() -> String {
    let mut html = String::from("<!DOCTYPE html><title>Bench</title>");
    for i in 0..100 {
        html.push_str(&format!(
            "<p><b>{i}<i>nested</b> misnested</i><table><tr><td>{i}</td>stray</table>\
             <ul><li>one<li>two</ul><svg><circle r=\"{i}\"/><foreignObject><p>x</svg>"
        ));
    }
    html
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tree construction");
    group.significance_level(0.1).sample_size(500);

    let html = sample_document();

    group.bench_function("document", |b| {
        b.iter(|| black_box(tessera_html5::parse(&html, None).errors.len()));
    });

    group.bench_function("document with locations", |b| {
        b.iter(|| {
            let options = Html5ParserOptions::default().with_source_locations(true);
            black_box(tessera_html5::parse(&html, Some(options)).errors.len())
        });
    });

    group.bench_function("fragment", |b| {
        b.iter(|| black_box(tessera_html5::parse_fragment(&html, Some("div"), None).errors.len()));
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;
use tessera_html5::errors::ErrorLogger;
use tessera_html5::tokenizer::Tokenizer;
use tessera_shared::byte_stream::ByteStream;

fn sample_document() -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body>");
    for i in 0..200 {
        html.push_str(&format!(
            "<div class=\"row-{i}\" data-x='{i}'><p>Item &amp; {i} &lt;ok&gt; &copy;</p><!-- c {i} --><br/></div>\n"
        ));
    }
    html.push_str("<script>if (a < b && c) { x = '</div>'; }</script></body></html>");
    html
}

fn criterion_benchmark(c: &mut Criterion) {
    // Criterion can report inconsistent results from run to run in some cases.  We attempt to
    // minimize that in this setup.
    let mut group = c.benchmark_group("tokenization");
    group.significance_level(0.1).sample_size(500);

    let html = sample_document();

    group.bench_function("document", |b| {
        b.iter(|| {
            let error_logger = Rc::new(RefCell::new(ErrorLogger::new()));
            let mut tokenizer = Tokenizer::new(ByteStream::new(None), None, error_logger);
            tokenizer.write(&html);
            tokenizer.end();

            let mut count = 0;
            while let Some(token) = tokenizer.next_token() {
                if token.is_eof() {
                    break;
                }
                count += 1;
            }
            black_box(count)
        })
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

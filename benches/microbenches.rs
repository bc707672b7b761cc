use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quick_sax::{
    characters, element, encode, parse_chunks, parse_str, Control, Event, HandlerError, Node,
};

/// A mixed document: markup, attributes, references and text runs.
fn sample_document(records: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><log>");
    for i in 0..records {
        xml.push_str(&format!(
            "<entry id=\"{}\" level=\"info\">message &amp; detail no {}<data x=\"&#65;\"/></entry>",
            i, i
        ));
    }
    xml.push_str("</log>");
    xml
}

fn count_events(c: &mut Criterion) {
    let doc = sample_document(1_000);

    let mut group = c.benchmark_group("parse");
    group.bench_function("contiguous", |b| {
        b.iter(|| {
            let mut count = 0usize;
            let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
                if matches!(event, Event::StartElement { .. }) {
                    count += 1;
                }
                Ok(Control::Continue)
            };
            parse_str(black_box(&doc), &mut handler).unwrap();
            count
        })
    });
    group.bench_function("chunked_4k", |b| {
        b.iter(|| {
            let mut count = 0usize;
            let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
                if matches!(event, Event::Characters(_)) {
                    count += 1;
                }
                Ok(Control::Continue)
            };
            parse_chunks(black_box(doc.as_bytes()).chunks(4096), &mut handler).unwrap();
            count
        })
    });
    group.finish();
}

fn encode_tree(c: &mut Criterion) {
    let tree = element(
        "log",
        &[("version", "3")],
        (0..1_000)
            .map(|_| {
                Node::from(element(
                    "entry",
                    &[("id", "x"), ("level", "info")],
                    vec![characters("message & detail <here>")],
                ))
            })
            .collect(),
    );

    c.bench_function("encode", |b| b.iter(|| encode(black_box(&tree), None)));
}

criterion_group!(benches, count_events, encode_tree);
criterion_main!(benches);

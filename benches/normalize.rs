use annotext::{Annotation, Document};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// A few thousand code units of paragraphs with overlapping inline marks.
fn sample_document() -> Document {
    let paragraph = "The quick brown fox jumps over the lazy dog and keeps running.\n";
    let mut content = String::new();
    let mut annotations = Vec::new();
    for index in 0..64 {
        let start = content.chars().count();
        content.push_str(paragraph);
        let end = content.chars().count();
        annotations.push(Annotation::new("paragraph", start, end));
        annotations.push(Annotation::parse_token(end - 1, end));
        annotations.push(Annotation::new("bold", start + 4, start + 20));
        annotations.push(Annotation::new("italic", start + 10, start + 35));
        if index % 4 == 0 {
            annotations.push(
                Annotation::new("link", start + 30, start + 50)
                    .with_attribute("url", "https://example.com"),
            );
        }
    }
    Document::from_parts(content, annotations).unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let doc = sample_document();
    c.bench_function("normalize", |b| b.iter(|| black_box(doc.normalize().unwrap())));
}

fn bench_render(c: &mut Criterion) {
    let doc = sample_document();
    c.bench_function("to_commonmark", |b| {
        b.iter(|| black_box(doc.to_commonmark().unwrap()))
    });
}

fn bench_insert_text(c: &mut Criterion) {
    let doc = sample_document();
    c.bench_function("insert_text", |b| {
        b.iter(|| {
            let mut working = doc.clone();
            let _ = working.insert_text(1000, "x", false);
            black_box(working);
        })
    });
}

criterion_group!(benches, bench_normalize, bench_render, bench_insert_text);
criterion_main!(benches);

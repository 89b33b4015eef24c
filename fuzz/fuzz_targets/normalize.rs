#![no_main]

use annotext::{Annotation, Document};
use libfuzzer_sys::fuzz_target;

const KINDS: &[&str] = &[
    "paragraph",
    "blockquote",
    "unordered-list",
    "list-item",
    "heading",
    "bold",
    "italic",
    "link",
    "code",
    "parse-token",
];

// First byte picks the content length; each following triple is one
// annotation (kind, start, end).
fuzz_target!(|data: &[u8]| {
    let Some((&len, rest)) = data.split_first() else {
        return;
    };
    let len = usize::from(len % 48);
    let content: String = "ab c\nde*f".chars().cycle().take(len).collect();

    let annotations: Vec<Annotation> = rest
        .chunks_exact(3)
        .map(|chunk| {
            let kind = KINDS[usize::from(chunk[0]) % KINDS.len()];
            let a = usize::from(chunk[1]) % (len + 1);
            let b = usize::from(chunk[2]) % (len + 1);
            Annotation::new(kind, a.min(b), a.max(b))
        })
        .collect();

    let doc = Document::from_parts(content, annotations).expect("ranges are in bounds");
    let tree = doc.normalize().expect("valid document normalizes");
    assert_eq!(tree.text_paths().len(), tree.text().chars().count());
    let _ = doc.to_commonmark();
});

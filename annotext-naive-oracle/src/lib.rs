//! A naive, simple oracle implementation for differential testing.
//!
//! Instead of sweeping breakpoints and merging open paths, every code unit is
//! looked at on its own: collect the annotations covering it, sort them by
//! the nesting rules, and that is its path.
use annotext::core::{Annotation, Attributes, Display, PARSE_TOKEN, Schema};
use std::cmp::Ordering;

pub type Path = Vec<(String, Attributes)>;

fn nests_outside(a: &(usize, &Annotation), b: &(usize, &Annotation), schema: &Schema) -> Ordering {
    let (index_a, a) = *a;
    let (index_b, b) = *b;
    let display = |annotation: &Annotation| match schema.spec(&annotation.kind).display {
        Display::Block => 0,
        Display::Inline => 1,
    };
    let attributes = |annotation: &Annotation| {
        serde_json::to_string(&annotation.attributes).unwrap_or_default()
    };

    display(a)
        .cmp(&display(b))
        .then(a.start.cmp(&b.start))
        .then(b.end.cmp(&a.end))
        .then(schema.rank(&a.kind).cmp(&schema.rank(&b.kind)))
        .then(a.kind.cmp(&b.kind))
        .then(attributes(a).cmp(&attributes(b)))
        .then(index_a.cmp(&index_b))
}

/// Text and enclosing path of every code unit that is not a parse token.
pub fn text_paths(content: &str, annotations: &[Annotation], schema: &Schema) -> Vec<(char, Path)> {
    let spans: Vec<&Annotation> = annotations
        .iter()
        .filter(|annotation| annotation.kind != PARSE_TOKEN)
        .collect();

    let mut out = Vec::new();
    for (offset, ch) in content.chars().enumerate() {
        let masked = annotations.iter().any(|annotation| {
            annotation.kind == PARSE_TOKEN && annotation.start <= offset && offset < annotation.end
        });
        if masked {
            continue;
        }

        let mut covering: Vec<(usize, &Annotation)> = spans
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, annotation)| annotation.start <= offset && offset < annotation.end)
            .collect();
        covering.sort_by(|a, b| nests_outside(a, b, schema));

        let path = covering
            .into_iter()
            .map(|(_, annotation)| (annotation.kind.clone(), annotation.attributes.clone()))
            .collect();
        out.push((ch, path));
    }
    out
}

//! Hierarchical representation: the canonical tree built from a flat,
//! possibly overlapping set of annotations.
//!
//! [`normalize`] partitions the content at every annotation boundary. Each
//! resulting segment is covered by a fixed set of annotations; sorted by the
//! nesting order that set becomes the segment's root-to-leaf chain, and
//! consecutive chains share nodes along their common prefix. An annotation
//! whose chain position changes between segments is split into sibling nodes
//! of the same type, which is how non-nesting overlap turns into a tree.
//!
//! The nesting order of two annotations is decided, in turn, by display
//! class (blocks outside inline spans), start (earlier outside), end (wider
//! outside), schema rank, type name and attributes. It does not depend on
//! the order the annotations were supplied in.

use crate::core::{Annotation, Attributes, Display, Schema, char_len};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

pub mod render;

pub use render::{Handler, render};

pub const ROOT: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("annotation {kind} at {start}..{end} is out of bounds for content of length {len}")]
    OutOfBounds {
        kind: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    pub start: usize,
    pub end: usize,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Text {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Structural equality: ranges are positional bookkeeping and are ignored.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => a == b,
            (Node::Text(a), Node::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Element {
    fn new(kind: &str, attributes: Attributes, start: usize) -> Self {
        Self {
            kind: kind.to_string(),
            attributes,
            start,
            end: start,
            children: Vec::new(),
        }
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.as_str())
    }

    pub fn attribute_u64(&self, key: &str) -> Option<u64> {
        self.attributes.get(key).and_then(|value| value.as_u64())
    }

    /// Concatenated leaf text of this subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn push_text(&mut self, text: &str, start: usize, end: usize) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.text.push_str(text);
            last.end = end;
            return;
        }
        self.children.push(Node::Text(Text {
            text: text.to_string(),
            start,
            end,
        }));
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// One step of a root-to-leaf path: the element's type and attributes.
pub type PathStep = (String, Attributes);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
    pub root: Element,
}

impl Tree {
    pub fn children(&self) -> &[Node] {
        &self.root.children
    }

    pub fn text(&self) -> String {
        self.root.text()
    }

    /// For every emitted code unit, the path of enclosing elements below the
    /// root.
    pub fn text_paths(&self) -> Vec<(char, Vec<PathStep>)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        walk_paths(&self.root.children, &mut path, &mut out);
        out
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

fn walk_paths(nodes: &[Node], path: &mut Vec<PathStep>, out: &mut Vec<(char, Vec<PathStep>)>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                for ch in text.text.chars() {
                    out.push((ch, path.clone()));
                }
            }
            Node::Element(element) => {
                path.push((element.kind.clone(), element.attributes.clone()));
                walk_paths(&element.children, path, out);
                path.pop();
            }
        }
    }
}

/// Nesting order key; smaller keys nest outside larger ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct NestingKey<'a> {
    display: Display,
    start: usize,
    end: Reverse<usize>,
    rank: u32,
    kind: &'a str,
    attributes: String,
    index: usize,
}

fn nesting_key<'a>(annotation: &'a Annotation, index: usize, schema: &Schema) -> NestingKey<'a> {
    let spec = schema.spec(&annotation.kind);
    NestingKey {
        display: spec.display,
        start: annotation.start,
        end: Reverse(annotation.end),
        rank: spec.rank,
        kind: &annotation.kind,
        attributes: serde_json::to_string(&annotation.attributes).unwrap_or_default(),
        index,
    }
}

struct Frame {
    order: usize,
    element: Element,
}

/// Maintains the currently open path of elements while sweeping the content.
struct TreeBuilder<'a> {
    annotations: &'a [&'a Annotation],
    root: Element,
    stack: Vec<Frame>,
}

impl<'a> TreeBuilder<'a> {
    fn new(annotations: &'a [&'a Annotation]) -> Self {
        Self {
            annotations,
            root: Element::new(ROOT, Attributes::new(), 0),
            stack: Vec::new(),
        }
    }

    /// Makes the open path equal `chain`, closing and opening elements at
    /// `position` where the two diverge.
    fn sync(&mut self, chain: &[usize], position: usize) {
        let common = self
            .stack
            .iter()
            .zip(chain)
            .take_while(|(frame, order)| frame.order == **order)
            .count();
        while self.stack.len() > common {
            self.close(position);
        }
        for &order in &chain[common..] {
            let annotation = self.annotations[order];
            self.stack.push(Frame {
                order,
                element: Element::new(&annotation.kind, annotation.attributes.clone(), position),
            });
        }
    }

    fn close(&mut self, position: usize) {
        if let Some(mut frame) = self.stack.pop() {
            frame.element.end = position;
            self.top().children.push(Node::Element(frame.element));
        }
    }

    fn top(&mut self) -> &mut Element {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.element,
            None => &mut self.root,
        }
    }

    fn finish(mut self, len: usize) -> Element {
        while !self.stack.is_empty() {
            self.close(len);
        }
        self.root.end = len;
        self.root
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Whether a span whose `edge` sits at the offset of a zero-length marker
/// encloses the marker.
///
/// An inline marker stands for the embedded object at its offset, so it
/// belongs to the spans opening there. A block marker only nests in blocks
/// of a strictly lower rank: an empty list item is a sibling of the items
/// around it, not their child.
fn holds_marker(schema: &Schema, span: &str, marker: &str, edge: Edge) -> bool {
    let span = schema.spec(span);
    let marker = schema.spec(marker);
    if marker.display == Display::Inline {
        return edge == Edge::Start;
    }
    (span.display, span.rank) < (marker.display, marker.rank)
}

/// Builds the canonical tree for `content` and `annotations`.
///
/// Parse tokens contribute breakpoints but never text, and never open or
/// close elements on their own.
pub fn normalize(
    content: &str,
    annotations: &[Annotation],
    schema: &Schema,
) -> Result<Tree, NormalizeError> {
    let len = char_len(content);
    for annotation in annotations {
        if !annotation.fits(len) {
            return Err(NormalizeError::OutOfBounds {
                kind: annotation.kind.clone(),
                start: annotation.start,
                end: annotation.end,
                len,
            });
        }
    }

    let (tokens, spans): (Vec<&Annotation>, Vec<&Annotation>) =
        annotations.iter().partition(|a| a.is_parse_token());

    // Re-index the spans by nesting order so that chains sort as plain
    // integers.
    let mut keyed: Vec<(NestingKey<'_>, &Annotation)> = spans
        .iter()
        .enumerate()
        .map(|(index, annotation)| (nesting_key(annotation, index, schema), *annotation))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    let ordered: Vec<&Annotation> = keyed.into_iter().map(|(_, annotation)| annotation).collect();

    let mut breakpoints = BTreeSet::from([0, len]);
    let mut starts: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut ends: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut markers: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (order, annotation) in ordered.iter().enumerate() {
        breakpoints.insert(annotation.start);
        breakpoints.insert(annotation.end);
        if annotation.is_empty() {
            markers.entry(annotation.start).or_default().push(order);
        } else {
            starts.entry(annotation.start).or_default().push(order);
            ends.entry(annotation.end).or_default().push(order);
        }
    }

    let mut token_delta: BTreeMap<usize, isize> = BTreeMap::new();
    for token in tokens.iter().filter(|token| !token.is_empty()) {
        breakpoints.insert(token.start);
        breakpoints.insert(token.end);
        *token_delta.entry(token.start).or_default() += 1;
        *token_delta.entry(token.end).or_default() -= 1;
    }

    let chars: Vec<char> = content.chars().collect();
    let breakpoints: Vec<usize> = breakpoints.into_iter().collect();
    let mut builder = TreeBuilder::new(&ordered);
    let mut active: BTreeSet<usize> = BTreeSet::new();
    let mut masked: isize = 0;

    for (index, &position) in breakpoints.iter().enumerate() {
        for order in ends.get(&position).into_iter().flatten() {
            active.remove(order);
        }
        for &order in starts.get(&position).into_iter().flatten() {
            active.insert(order);
        }
        masked += token_delta.get(&position).copied().unwrap_or(0);

        for &marker in markers.get(&position).into_iter().flatten() {
            let ending = ends.get(&position).into_iter().flatten().copied();
            let mut candidates: Vec<usize> = active
                .range(..marker)
                .copied()
                .chain(ending.filter(|&span| span < marker))
                .collect();
            candidates.sort_unstable();

            // A span closing here that holds the marker leaves no room for
            // spans opening here; one that does not hold it rules out the
            // closing spans nested inside it.
            let kind = &ordered[marker].kind;
            let mut closing = false;
            let mut skipped = false;
            let mut chain: Vec<usize> = Vec::with_capacity(candidates.len() + 1);
            for span in candidates {
                let annotation = ordered[span];
                if annotation.start < position && annotation.end > position {
                    chain.push(span);
                } else if annotation.end == position {
                    if !skipped && holds_marker(schema, &annotation.kind, kind, Edge::End) {
                        closing = true;
                        chain.push(span);
                    } else {
                        skipped = true;
                    }
                } else if !closing && holds_marker(schema, &annotation.kind, kind, Edge::Start) {
                    chain.push(span);
                } else {
                    break;
                }
            }
            chain.push(marker);
            builder.sync(&chain, position);
            builder.close(position);
        }

        let Some(&next) = breakpoints.get(index + 1) else {
            break;
        };
        if masked > 0 || next == position {
            continue;
        }

        let chain: Vec<usize> = active.iter().copied().collect();
        builder.sync(&chain, position);
        let text: String = chars[position..next].iter().collect();
        builder.top().push_text(&text, position, next);
    }

    tracing::trace!(
        annotations = annotations.len(),
        segments = breakpoints.len().saturating_sub(1),
        "normalized document"
    );
    Ok(Tree {
        root: builder.finish(len),
    })
}

//! Per-type annotation policy.
//!
//! A [`Schema`] tells the rest of the crate how an annotation type behaves:
//! where it nests when boundaries tie, whether it is a block or an inline
//! span, what happens to it when a deletion swallows it, and whether it
//! overrides the default insertion rule.

use super::Annotation;
use crate::doc::range_ops;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Display {
    Block,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroLengthPolicy {
    /// Keep the annotation as a zero-length marker.
    Retain,
    /// Drop the annotation from the document.
    Remove,
}

/// Describes one text insertion, as seen by a [`Transform`].
#[derive(Debug, Clone, Copy)]
pub struct InsertEdit<'a> {
    /// Content after the insertion has been spliced in.
    pub content: &'a str,
    pub position: usize,
    pub len: usize,
    pub preserve_adjacent_boundaries: bool,
}

/// Replaces the default insertion rule for an annotation type.
pub trait Transform: fmt::Debug + Send + Sync {
    fn apply(&self, annotation: &mut Annotation, edit: &InsertEdit<'_>);
}

/// Hyperlink edit semantics: typing at the trailing edge of a link never
/// extends it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkTransform;

impl Transform for LinkTransform {
    fn apply(&self, annotation: &mut Annotation, edit: &InsertEdit<'_>) {
        if edit.position == annotation.end && annotation.start < annotation.end {
            return;
        }
        range_ops::apply_insert(
            annotation,
            edit.position,
            edit.len,
            edit.preserve_adjacent_boundaries,
        );
    }
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    /// Tie-break for identical ranges; lower ranks nest outside higher ones.
    pub rank: u32,
    pub display: Display,
    pub zero_length: ZeroLengthPolicy,
    pub transform: Option<Arc<dyn Transform>>,
}

impl TypeSpec {
    pub fn block(rank: u32) -> Self {
        Self {
            rank,
            display: Display::Block,
            zero_length: ZeroLengthPolicy::Retain,
            transform: None,
        }
    }

    pub fn inline(rank: u32) -> Self {
        Self {
            rank,
            display: Display::Inline,
            zero_length: ZeroLengthPolicy::Retain,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn with_zero_length(mut self, policy: ZeroLengthPolicy) -> Self {
        self.zero_length = policy;
        self
    }

    pub fn is_block(&self) -> bool {
        self.display == Display::Block
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    types: BTreeMap<String, TypeSpec>,
    fallback: TypeSpec,
}

impl Schema {
    /// A schema that knows no types; every annotation gets the fallback spec.
    pub fn empty() -> Self {
        Self {
            types: BTreeMap::new(),
            fallback: TypeSpec::inline(100),
        }
    }

    /// Types produced by the CommonMark source and understood by the
    /// CommonMark serializer.
    pub fn commonmark() -> Self {
        Self::empty()
            .with_type("blockquote", TypeSpec::block(10))
            .with_type("ordered-list", TypeSpec::block(20))
            .with_type("unordered-list", TypeSpec::block(20))
            .with_type("list-item", TypeSpec::block(30))
            .with_type("heading", TypeSpec::block(40))
            .with_type("paragraph", TypeSpec::block(40))
            .with_type("code-block", TypeSpec::block(40))
            .with_type("horizontal-rule", TypeSpec::block(40))
            .with_type("link", TypeSpec::inline(50).with_transform(LinkTransform))
            .with_type("image", TypeSpec::inline(50))
            .with_type("bold", TypeSpec::inline(60))
            .with_type("italic", TypeSpec::inline(60))
            .with_type("code", TypeSpec::inline(70))
            .with_type("line-break", TypeSpec::inline(80))
    }

    pub fn with_type(mut self, kind: impl Into<String>, spec: TypeSpec) -> Self {
        self.types.insert(kind.into(), spec);
        self
    }

    pub fn set_type(&mut self, kind: impl Into<String>, spec: TypeSpec) {
        self.types.insert(kind.into(), spec);
    }

    /// Overrides the nesting rank of one type, registering it from the
    /// fallback spec when unknown.
    pub fn set_rank(&mut self, kind: &str, rank: u32) {
        let fallback = self.fallback.clone();
        self.types
            .entry(kind.to_string())
            .or_insert(fallback)
            .rank = rank;
    }

    pub fn spec(&self, kind: &str) -> &TypeSpec {
        self.types.get(kind).unwrap_or(&self.fallback)
    }

    pub fn rank(&self, kind: &str) -> u32 {
        self.spec(kind).rank
    }

    pub fn is_block(&self, kind: &str) -> bool {
        self.spec(kind).is_block()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::commonmark()
    }
}

//! annotext: annotated-text documents.
//!
//! A document is plain text plus a flat set of typed, possibly overlapping
//! range annotations. This crate provides:
//!
//! - **Core data model** - Annotations, attributes and the per-type schema
//! - **Document store** - Text edits that keep every annotation range valid
//! - **Range normalizer** - The canonical, strictly nested tree for a document
//! - **CommonMark serializer** - Markdown output that normalizes back to the
//!   same tree
//! - **CommonMark source** - Markdown input via pulldown-cmark (optional)
//!
//! # Quick Start
//!
//! ```rust
//! use annotext::{Annotation, Document};
//!
//! let mut doc = Document::from_parts(
//!     "Some bold text",
//!     vec![Annotation::new("bold", 5, 9)],
//! )
//! .unwrap();
//!
//! doc.insert_text(5, "very ", false).unwrap();
//! assert_eq!(doc.to_commonmark().unwrap(), "Some very **bold** text");
//! ```
//!
//! # Features
//!
//! - `source` - Enables [`CommonMarkSource`] for parsing Markdown
//! - `cli` - Builds the `annotext` command-line tool (requires `source`)

// Primitive data model and schema
pub mod core;

// Document store and edit rules
pub mod doc;

// Range normalizer and presentation walk
pub mod hir;

// CommonMark serializer
pub mod commonmark;

// Optional: CommonMark source adapter
#[cfg(feature = "source")]
pub mod source;

// Re-export core types
pub use core::{
    Annotation, AnnotationId, Attributes, Display, InsertEdit, LinkTransform, PARSE_TOKEN,
    PLACEHOLDER, Schema, Transform, TypeSpec, ZeroLengthPolicy,
};

// Re-export doc types
pub use doc::{Document, EditError, range_ops};

// Re-export tree types
pub use hir::{Element, Handler, Node, NormalizeError, Text, Tree, normalize};

// Re-export serializer types
pub use commonmark::{RenderConfig, RenderError};

// Re-export source types (feature-gated)
#[cfg(feature = "source")]
pub use source::CommonMarkSource;

//! Core data model for annotated text.
//!
//! This module provides the building blocks shared by every other layer:
//!
//! - [`Annotation`] - A typed, half-open range over document content
//! - [`AnnotationId`] - Stable identity used to address one annotation
//! - [`Attributes`] - Open-ended, type-specific annotation data
//! - [`Schema`] and [`TypeSpec`] - Per-type nesting rank, display class and
//!   edit policy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod schema;

pub use schema::{
    Display, InsertEdit, LinkTransform, Schema, Transform, TypeSpec, ZeroLengthPolicy,
};

pub type AnnotationId = Uuid;

pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Reserved type marking source-syntax characters that are present in the
/// content but carry no semantic text.
pub const PARSE_TOKEN: &str = "parse-token";

/// Out-of-band code unit that stands in for a collapsed embedded object.
pub const PLACEHOLDER: char = '\u{FFFC}';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default = "Uuid::new_v4")]
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: String,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl Annotation {
    pub fn new(kind: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            start,
            end,
            attributes: Attributes::new(),
        }
    }

    pub fn parse_token(start: usize, end: usize) -> Self {
        Self::new(PARSE_TOKEN, start, end)
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn is_parse_token(&self) -> bool {
        self.kind == PARSE_TOKEN
    }

    /// Returns true when `start <= end <= len`.
    pub fn fits(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|value| value.as_str())
    }
}

/// Number of code units in `content`.
#[inline]
pub fn char_len(content: &str) -> usize {
    content.chars().count()
}

/// Converts a code-unit offset into a byte offset, or `None` when the offset
/// lies past the end of `content`.
pub fn byte_offset(content: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }

    let mut count = 0;
    for (byte_index, _) in content.char_indices() {
        if count == offset {
            return Some(byte_index);
        }
        count += 1;
    }
    if count == offset {
        Some(content.len())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_multibyte() {
        let text = "aé\u{FFFC}b";
        assert_eq!(byte_offset(text, 0), Some(0));
        assert_eq!(byte_offset(text, 1), Some(1));
        assert_eq!(byte_offset(text, 2), Some(3));
        assert_eq!(byte_offset(text, 3), Some(6));
        assert_eq!(byte_offset(text, 4), Some(text.len()));
        assert_eq!(byte_offset(text, 5), None);
        assert_eq!(char_len(text), 4);
    }

    #[test]
    fn test_annotation_json_shape() {
        let json = r#"{
            "type": "link",
            "start": 2,
            "end": 6,
            "attributes": { "url": "https://example.com" }
        }"#;
        let annotation: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.kind, "link");
        assert_eq!(annotation.len(), 4);
        assert_eq!(annotation.attribute_str("url"), Some("https://example.com"));

        let encoded = serde_json::to_value(&annotation).unwrap();
        assert_eq!(encoded["type"], "link");
        assert!(encoded.get("id").is_some());
    }

    #[test]
    fn test_zero_length_annotation_fits() {
        let marker = Annotation::new("image", 3, 3);
        assert!(marker.is_empty());
        assert!(marker.fits(3));
        assert!(!Annotation::new("bold", 2, 5).fits(4));
        assert!(!Annotation::new("bold", 4, 2).fits(10));
    }
}

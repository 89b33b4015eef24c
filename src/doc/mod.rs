//! Document store and editing API.
//!
//! A [`Document`] owns its content and its annotations. Every mutation
//! validates its input before touching either, then adjusts each annotation
//! so that `0 <= start <= end <= len` keeps holding.

use crate::commonmark::{self, RenderError};
use crate::core::{
    Annotation, AnnotationId, InsertEdit, PLACEHOLDER, Schema, ZeroLengthPolicy, byte_offset,
    char_len,
};
use crate::hir::{self, NormalizeError, Tree};
use serde::{Deserialize, Serialize};

pub mod range_ops;

use range_ops::DeleteEffect;

pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("position {position} is out of bounds for content of length {len}")]
    PositionOutOfBounds { position: usize, len: usize },
    #[error("range {start}..{end} is out of bounds for content of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("annotation not found")]
    AnnotationNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", rename_all = "camelCase")]
pub struct Document {
    content: String,
    content_type: String,
    annotations: Vec<Annotation>,
    #[serde(skip)]
    schema: Schema,
    #[serde(skip)]
    len: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    content: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl TryFrom<RawDocument> for Document {
    type Error = EditError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let mut doc = Document::from_parts(raw.content, raw.annotations)?;
        if let Some(content_type) = raw.content_type {
            doc.content_type = content_type;
        }
        Ok(doc)
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            annotations: Vec::new(),
            schema: Schema::default(),
            len: 0,
        }
    }

    /// Builds a document from plain content, with no annotations.
    pub fn from_text(content: impl Into<String>) -> Self {
        let content = content.into();
        let len = char_len(&content);
        Self {
            content,
            len,
            ..Self::new()
        }
    }

    pub fn from_parts(
        content: impl Into<String>,
        annotations: Vec<Annotation>,
    ) -> Result<Self, EditError> {
        let mut doc = Self::from_text(content);
        doc.add_annotations(annotations)?;
        Ok(doc)
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    /// Content length in code units.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    /// Returns the content covered by `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<&str, EditError> {
        let (from, to) = self.byte_range(start, end)?;
        Ok(&self.content[from..to])
    }

    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<AnnotationId, EditError> {
        self.check_range(annotation.start, annotation.end)?;
        let id = annotation.id;
        self.annotations.push(annotation);
        Ok(id)
    }

    /// Adds every annotation or none of them.
    pub fn add_annotations(
        &mut self,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Result<Vec<AnnotationId>, EditError> {
        let annotations: Vec<Annotation> = annotations.into_iter().collect();
        for annotation in &annotations {
            self.check_range(annotation.start, annotation.end)?;
        }
        let ids = annotations.iter().map(|annotation| annotation.id).collect();
        self.annotations.extend(annotations);
        Ok(ids)
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self
            .annotations
            .iter()
            .position(|annotation| annotation.id == id)?;
        Some(self.annotations.remove(index))
    }

    pub fn insert_text(
        &mut self,
        position: usize,
        text: &str,
        preserve_adjacent_boundaries: bool,
    ) -> Result<(), EditError> {
        let byte_index =
            byte_offset(&self.content, position).ok_or(EditError::PositionOutOfBounds {
                position,
                len: self.len,
            })?;

        let inserted = char_len(text);
        self.content.insert_str(byte_index, text);
        self.len += inserted;

        let edit = InsertEdit {
            content: &self.content,
            position,
            len: inserted,
            preserve_adjacent_boundaries,
        };
        for annotation in &mut self.annotations {
            match &self.schema.spec(&annotation.kind).transform {
                Some(transform) => transform.apply(annotation, &edit),
                None => range_ops::apply_insert(
                    annotation,
                    position,
                    inserted,
                    preserve_adjacent_boundaries,
                ),
            }
        }

        tracing::debug!(position, inserted, len = self.len, "inserted text");
        Ok(())
    }

    /// Deletes `[start, end)` and returns the annotations removed because
    /// their type's zero-length policy is [`ZeroLengthPolicy::Remove`].
    pub fn delete_text(&mut self, start: usize, end: usize) -> Result<Vec<Annotation>, EditError> {
        let (from, to) = self.byte_range(start, end)?;
        self.content.replace_range(from..to, "");
        self.len -= end - start;

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.annotations.len());
        for mut annotation in self.annotations.drain(..) {
            let was_empty = annotation.is_empty();
            let effect = range_ops::apply_delete(&mut annotation, start, end);
            let discard = effect == DeleteEffect::Collapsed
                && !was_empty
                && start < end
                && self.schema.spec(&annotation.kind).zero_length == ZeroLengthPolicy::Remove;
            if discard {
                removed.push(annotation);
            } else {
                kept.push(annotation);
            }
        }
        self.annotations = kept;

        tracing::debug!(
            start,
            end,
            removed = removed.len(),
            len = self.len,
            "deleted text"
        );
        Ok(removed)
    }

    /// Replaces the content under annotation `id` with a single
    /// [`PLACEHOLDER`]; the annotation itself becomes zero length at its
    /// original start.
    pub fn collapse_to_placeholder(&mut self, id: AnnotationId) -> Result<(), EditError> {
        let target = self
            .annotations
            .iter()
            .find(|annotation| annotation.id == id)
            .ok_or(EditError::AnnotationNotFound)?;
        let (old_start, old_end) = (target.start, target.end);
        let (from, to) = self.byte_range(old_start, old_end)?;

        let mut buffer = [0u8; 4];
        self.content
            .replace_range(from..to, PLACEHOLDER.encode_utf8(&mut buffer));
        self.len = self.len + 1 - (old_end - old_start);

        for annotation in &mut self.annotations {
            if annotation.id == id {
                annotation.end = annotation.start;
            } else {
                range_ops::apply_collapse(annotation, old_start, old_end);
            }
        }

        tracing::debug!(old_start, old_end, len = self.len, "collapsed to placeholder");
        Ok(())
    }

    /// Builds the canonical tree for this document.
    pub fn normalize(&self) -> Result<Tree, NormalizeError> {
        hir::normalize(&self.content, &self.annotations, &self.schema)
    }

    pub fn to_commonmark(&self) -> Result<String, RenderError> {
        commonmark::render(self)
    }

    /// Two documents are equal when their normalized trees are.
    pub fn structurally_eq(&self, other: &Document) -> Result<bool, NormalizeError> {
        Ok(self.normalize()? == other.normalize()?)
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), EditError> {
        if start > end || end > self.len {
            return Err(EditError::RangeOutOfBounds {
                start,
                end,
                len: self.len,
            });
        }
        Ok(())
    }

    fn byte_range(&self, start: usize, end: usize) -> Result<(usize, usize), EditError> {
        self.check_range(start, end)?;
        let out_of_bounds = EditError::RangeOutOfBounds {
            start,
            end,
            len: self.len,
        };
        let from = byte_offset(&self.content, start).ok_or(out_of_bounds.clone())?;
        let to = byte_offset(&self.content, end).ok_or(out_of_bounds)?;
        Ok((from, to))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

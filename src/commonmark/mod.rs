//! CommonMark output.
//!
//! The serializer works on the normalized tree, so overlapping annotations
//! have already been split into properly nested elements. Unknown element
//! types are transparent: their children render in their place. Parse tokens
//! and object placeholders never reach the output.
//!
//! ```rust
//! use annotext::{Annotation, Document};
//!
//! let doc = Document::from_parts(
//!     "bold and italic",
//!     vec![Annotation::new("bold", 0, 4), Annotation::new("italic", 9, 15)],
//! )
//! .unwrap();
//! assert_eq!(doc.to_commonmark().unwrap(), "**bold** and *italic*");
//! ```

use crate::doc::Document;
use crate::hir::{NormalizeError, Tree};

mod emphasis;
pub mod escape;
mod writer;

use writer::Writer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("cannot normalize document: {0}")]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Bullet for unordered lists; an adjacent list uses the other bullet.
    pub bullet: char,
    /// Delimiter after ordered list numbers, `.` or `)`.
    pub ordered_delimiter: char,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bullet: '-',
            ordered_delimiter: '.',
        }
    }
}

pub fn render(doc: &Document) -> Result<String, RenderError> {
    render_with_config(doc, &RenderConfig::default())
}

pub fn render_with_config(doc: &Document, config: &RenderConfig) -> Result<String, RenderError> {
    let tree = doc.normalize()?;
    let output = render_tree(&tree, config);
    tracing::debug!(
        content_len = doc.len(),
        output_len = output.len(),
        "rendered commonmark"
    );
    Ok(output)
}

pub fn render_tree(tree: &Tree, config: &RenderConfig) -> String {
    let writer = Writer::new(config);
    writer
        .container(tree.children(), false)
        .trim_end()
        .to_string()
}

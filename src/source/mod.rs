//! CommonMark input: builds an annotated [`Document`] from Markdown text.
//!
//! Markup characters do not survive into the content. Block-terminating
//! newlines are kept and covered by a `parse-token`, images and thematic
//! breaks become [`PLACEHOLDER`] characters, and everything else maps onto
//! the types of [`Schema::commonmark`](crate::core::Schema::commonmark).

use crate::core::{Annotation, AnnotationId, Attributes, PARSE_TOKEN, PLACEHOLDER, char_len};
use crate::doc::{Document, EditError};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};

pub const CONTENT_TYPE: &str = "text/commonmark";

#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkSource;

impl CommonMarkSource {
    pub fn parse(markdown: &str) -> Result<Document, EditError> {
        let mut builder = Builder::default();
        for event in Parser::new(markdown) {
            builder.event(event);
        }

        let mut doc = Document::from_parts(builder.content, builder.annotations)?
            .with_content_type(CONTENT_TYPE);
        for id in builder.images {
            doc.collapse_to_placeholder(id)?;
        }
        tracing::debug!(
            len = doc.len(),
            annotations = doc.annotations().len(),
            "parsed commonmark"
        );
        Ok(doc)
    }
}

struct Open {
    kind: Option<&'static str>,
    attributes: Attributes,
    start: usize,
}

#[derive(Default)]
struct Builder {
    content: String,
    len: usize,
    annotations: Vec<Annotation>,
    stack: Vec<Open>,
    /// Open image being read; only its alt text is collected.
    image: Option<(Open, usize)>,
    images: Vec<AnnotationId>,
}

impl Builder {
    fn push(&mut self, text: &str) {
        self.content.push_str(text);
        self.len += char_len(text);
    }

    fn push_char(&mut self, ch: char) {
        self.content.push(ch);
        self.len += 1;
    }

    fn annotate(&mut self, kind: &str, start: usize, attributes: Attributes) -> AnnotationId {
        let mut annotation = Annotation::new(kind, start, self.len);
        annotation.attributes = attributes;
        let id = annotation.id;
        self.annotations.push(annotation);
        id
    }

    fn event(&mut self, event: Event<'_>) {
        if self.image.is_some() {
            self.image_event(event);
            return;
        }

        match event {
            Event::Start(Tag::Image(_, url, title)) => {
                let mut attributes = link_attributes(&url, &title);
                attributes.insert("alt".into(), String::new().into());
                let open = Open {
                    kind: Some("image"),
                    attributes,
                    start: self.len,
                };
                self.image = Some((open, 1));
            }
            Event::Start(tag) => {
                let (kind, attributes) = open_tag(&tag);
                self.stack.push(Open {
                    kind,
                    attributes,
                    start: self.len,
                });
            }
            Event::End(tag) => self.close(&tag),
            Event::Text(text) => self.push(&text),
            Event::Code(code) => {
                let start = self.len;
                self.push(&code);
                self.annotate("code", start, Attributes::new());
            }
            Event::SoftBreak => self.push_char('\n'),
            Event::HardBreak => {
                let start = self.len;
                self.push_char('\n');
                self.annotate("line-break", start, Attributes::new());
            }
            Event::Rule => {
                let start = self.len;
                self.push_char(PLACEHOLDER);
                self.annotate("horizontal-rule", start, Attributes::new());
            }
            Event::Html(html) => {
                tracing::debug!(html = %html.trim_end(), "dropping raw html");
            }
            Event::FootnoteReference(_) | Event::TaskListMarker(_) => {}
        }
    }

    fn close(&mut self, tag: &Tag<'_>) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        if matches!(tag, Tag::Paragraph | Tag::Heading(..)) {
            let start = self.len;
            self.push_char('\n');
            let mut attributes = Attributes::new();
            attributes.insert("tokenType".into(), "newline".into());
            self.annotate(PARSE_TOKEN, start, attributes);
        }
        if let Some(kind) = open.kind {
            self.annotate(kind, open.start, open.attributes);
        }
    }

    fn image_event(&mut self, event: Event<'_>) {
        let Some((open, depth)) = self.image.as_mut() else {
            return;
        };
        match event {
            Event::Start(Tag::Image(..)) => *depth += 1,
            Event::End(Tag::Image(..)) => *depth -= 1,
            Event::Text(text) | Event::Code(text) => {
                if let Some(serde_json::Value::String(alt)) = open.attributes.get_mut("alt") {
                    alt.push_str(&text);
                }
                self.push(&text);
                return;
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(serde_json::Value::String(alt)) = open.attributes.get_mut("alt") {
                    alt.push(' ');
                }
                self.push_char(' ');
                return;
            }
            _ => return,
        }

        if let Some((open, _)) = self.image.take_if(|(_, depth)| *depth == 0) {
            let id = self.annotate("image", open.start, open.attributes);
            self.images.push(id);
        }
    }
}

fn link_attributes(url: &str, title: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("url".into(), url.into());
    if !title.is_empty() {
        attributes.insert("title".into(), title.into());
    }
    attributes
}

fn open_tag(tag: &Tag<'_>) -> (Option<&'static str>, Attributes) {
    let mut attributes = Attributes::new();
    let kind = match tag {
        Tag::Paragraph => "paragraph",
        Tag::Heading(level, ..) => {
            attributes.insert("level".into(), (*level as u64).into());
            "heading"
        }
        Tag::BlockQuote => "blockquote",
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) if !info.is_empty() => {
            attributes.insert("info".into(), info.to_string().into());
            "code-block"
        }
        Tag::CodeBlock(_) => "code-block",
        Tag::List(Some(start)) => {
            attributes.insert("start".into(), (*start).into());
            "ordered-list"
        }
        Tag::List(None) => "unordered-list",
        Tag::Item => "list-item",
        Tag::Emphasis => "italic",
        Tag::Strong => "bold",
        Tag::Link(_, url, title) => return (Some("link"), link_attributes(url, title)),
        _ => return (None, attributes),
    };
    (Some(kind), attributes)
}

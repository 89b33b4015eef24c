//! Generic presentation walk over a normalized tree.
//!
//! A [`Handler`] maps leaves and elements to some output type; [`render`]
//! drives it bottom-up so that every element sees its already-rendered
//! children.

use super::{Element, Node, Tree};
use crate::core::Attributes;

pub trait Handler {
    type Output;

    fn text(&mut self, text: &str) -> Self::Output;

    fn element(
        &mut self,
        kind: &str,
        attributes: &Attributes,
        children: Vec<Self::Output>,
    ) -> Self::Output;
}

/// Renders the whole tree; the root is handed to the handler as an element
/// of type [`ROOT`](super::ROOT).
pub fn render<H: Handler>(tree: &Tree, handler: &mut H) -> H::Output {
    render_element(&tree.root, handler)
}

fn render_element<H: Handler>(element: &Element, handler: &mut H) -> H::Output {
    let children = element
        .children
        .iter()
        .map(|child| match child {
            Node::Text(text) => handler.text(&text.text),
            Node::Element(child) => render_element(child, handler),
        })
        .collect();
    handler.element(&element.kind, &element.attributes, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Annotation, Schema};
    use crate::hir::normalize;

    /// Minimal HTML-ish output with a per-type tag table.
    struct Markup;

    impl Handler for Markup {
        type Output = String;

        fn text(&mut self, text: &str) -> String {
            text.replace('\n', "<br/>")
        }

        fn element(
            &mut self,
            kind: &str,
            attributes: &Attributes,
            children: Vec<String>,
        ) -> String {
            let inner = children.concat();
            match kind {
                "root" => format!("<article>{inner}</article>"),
                "bold" => format!("<strong>{inner}</strong>"),
                "italic" => format!("<em>{inner}</em>"),
                "link" => {
                    let url = attributes.get("url").and_then(|v| v.as_str()).unwrap_or("");
                    format!("<a href=\"{url}\">{inner}</a>")
                }
                "youtube" => {
                    let id = attributes.get("id").and_then(|v| v.as_str()).unwrap_or("");
                    format!("<iframe src=\"https://www.youtube.com/embed/{id}\"></iframe>")
                }
                _ => inner,
            }
        }
    }

    fn html(content: &str, annotations: Vec<Annotation>) -> String {
        let tree = normalize(content, &annotations, &Schema::commonmark()).unwrap();
        render(&tree, &mut Markup)
    }

    #[test]
    fn test_renders_marks() {
        assert_eq!(
            html(
                "This is bold and italic text",
                vec![Annotation::new("bold", 8, 12), Annotation::new("italic", 17, 23)],
            ),
            "<article>This is <strong>bold</strong> and <em>italic</em> text</article>"
        );
    }

    #[test]
    fn test_renders_links_breaks_and_embeds() {
        let content = "Visit the site\nand watch \u{FFFC}";
        assert_eq!(
            html(
                content,
                vec![
                    Annotation::new("link", 10, 14).with_attribute("url", "https://example.com"),
                    Annotation::new("youtube", 25, 26).with_attribute("id", "abc123"),
                ],
            ),
            "<article>Visit the <a href=\"https://example.com\">site</a><br/>and watch \
             <iframe src=\"https://www.youtube.com/embed/abc123\"></iframe></article>"
        );
    }

    #[test]
    fn test_children_are_rendered_in_order() {
        struct Counter(Vec<String>);
        impl Handler for Counter {
            type Output = ();
            fn text(&mut self, text: &str) {
                self.0.push(text.to_string());
            }
            fn element(&mut self, kind: &str, _: &Attributes, children: Vec<()>) {
                self.0.push(format!("{kind}/{}", children.len()));
            }
        }

        let tree =
            normalize("ab", &[Annotation::new("bold", 1, 2)], &Schema::commonmark()).unwrap();
        let mut counter = Counter(Vec::new());
        render(&tree, &mut counter);
        assert_eq!(counter.0, vec!["a", "b", "bold/1", "root/2"]);
    }
}

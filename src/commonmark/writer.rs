//! Tree walk that produces CommonMark text.
//!
//! Blocks render to self-contained strings with no trailing newline.
//! Containers join their children with a blank line (or a single newline
//! inside tight lists and between headings) and then prefix every line with
//! their own marker, the way a blockquote or list item nests its content.

use super::RenderConfig;
use super::emphasis::{self, Mark, Piece};
use super::escape;
use crate::core::PLACEHOLDER;
use crate::hir::{Element, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendered {
    Heading,
    List { ordered: bool, alternate: bool },
    Rule,
    Other,
}

/// A contiguous run of block-level content.
enum Block<'a> {
    Element(&'a Element),
    Run(Vec<&'a Node>),
}

fn is_block(kind: &str) -> bool {
    matches!(
        kind,
        "blockquote"
            | "ordered-list"
            | "unordered-list"
            | "list-item"
            | "heading"
            | "paragraph"
            | "code-block"
            | "horizontal-rule"
    )
}

fn is_inline(kind: &str) -> bool {
    matches!(
        kind,
        "bold" | "italic" | "code" | "link" | "image" | "line-break"
    )
}

/// Expands elements of unknown type into their children.
fn flatten<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
    for node in nodes {
        match node {
            Node::Element(element) if !is_block(&element.kind) && !is_inline(&element.kind) => {
                flatten(&element.children, out)
            }
            _ => out.push(node),
        }
    }
}

fn group(nodes: &[Node]) -> Vec<Block<'_>> {
    let mut flat = Vec::new();
    flatten(nodes, &mut flat);

    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for node in flat {
        match node {
            Node::Element(element) if is_block(&element.kind) => {
                if !run.is_empty() {
                    blocks.push(Block::Run(std::mem::take(&mut run)));
                }
                blocks.push(Block::Element(element));
            }
            _ => run.push(node),
        }
    }
    if !run.is_empty() {
        blocks.push(Block::Run(run));
    }
    blocks
}

/// Prefixes the first line of `text` with `first` and every other line with
/// `rest`. Blank lines keep quote markers but drop trailing indentation.
fn indent(text: &str, first: &str, rest: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let prefix = if index == 0 { first } else { rest };
        if line.is_empty() {
            let trimmed = prefix.trim_end();
            out.push_str(trimmed);
            if trimmed.ends_with('>') {
                out.push(' ');
            }
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    out
}

pub(super) struct Writer<'a> {
    config: &'a RenderConfig,
}

impl<'a> Writer<'a> {
    pub(super) fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Renders the children of a block container.
    pub(super) fn container(&self, children: &[Node], tight: bool) -> String {
        let mut out = String::new();
        let mut previous: Option<Rendered> = None;

        for block in group(children) {
            let (rendered, mut text) = match block {
                Block::Run(nodes) => (Rendered::Other, self.paragraph(&nodes)),
                Block::Element(element) => self.block(element, previous),
            };
            if text.is_empty() {
                continue;
            }

            if let Some(previous) = previous {
                let single =
                    tight || (previous == Rendered::Heading && rendered == Rendered::Heading);
                if single {
                    // A dash rule directly under a text line would read as a
                    // setext underline.
                    if rendered == Rendered::Rule && previous == Rendered::Other {
                        text = "***".to_string();
                    }
                    out.push('\n');
                } else {
                    out.push_str("\n\n");
                }
            }
            out.push_str(&text);
            previous = Some(rendered);
        }
        out
    }

    fn block(&self, element: &Element, previous: Option<Rendered>) -> (Rendered, String) {
        match element.kind.as_str() {
            "paragraph" => {
                let nodes: Vec<&Node> = element.children.iter().collect();
                (Rendered::Other, self.paragraph(&nodes))
            }
            "heading" => (Rendered::Heading, self.heading(element)),
            "blockquote" => {
                let inner = self.container(&element.children, false);
                (Rendered::Other, indent(&inner, "> ", "> "))
            }
            "code-block" => (Rendered::Other, code_block(element)),
            "horizontal-rule" => (Rendered::Rule, "---".to_string()),
            "ordered-list" | "unordered-list" => {
                let ordered = element.kind == "ordered-list";
                let alternate = matches!(
                    previous,
                    Some(Rendered::List { ordered: o, alternate: a }) if o == ordered && !a
                );
                (
                    Rendered::List { ordered, alternate },
                    self.list(element, ordered, alternate),
                )
            }
            // An item outside of any list renders as a one-item bullet list.
            "list-item" => (
                Rendered::List {
                    ordered: false,
                    alternate: false,
                },
                self.item(&element.children, &format!("{} ", self.config.bullet), true),
            ),
            _ => (Rendered::Other, self.container(&element.children, false)),
        }
    }

    fn paragraph(&self, nodes: &[&Node]) -> String {
        let mut inline = Inline::new(None, false);
        for node in nodes {
            inline.node(node);
        }
        inline.finish(None).trim().to_string()
    }

    fn heading(&self, element: &Element) -> String {
        let level = element.attribute_u64("level").unwrap_or(1).clamp(1, 6) as usize;
        let mut inline = Inline::new(Some(' '), true);
        inline.nodes(&element.children);
        let text = inline.finish(None);
        format!("{} {}", "#".repeat(level), text.trim())
            .trim_end()
            .to_string()
    }

    fn list(&self, element: &Element, ordered: bool, alternate: bool) -> String {
        // Text directly inside a list becomes an item of its own.
        let mut items: Vec<Vec<Node>> = Vec::new();
        let mut loose_nodes: Vec<Node> = Vec::new();
        let mut flat = Vec::new();
        flatten(&element.children, &mut flat);
        for node in flat {
            match node {
                Node::Element(item) if item.kind == "list-item" => {
                    if !loose_nodes.is_empty() {
                        items.push(std::mem::take(&mut loose_nodes));
                    }
                    items.push(item.children.clone());
                }
                _ => loose_nodes.push(node.clone()),
            }
        }
        if !loose_nodes.is_empty() {
            items.push(loose_nodes);
        }

        let loose = items.iter().any(|children| {
            children
                .iter()
                .any(|child| matches!(child, Node::Element(e) if e.kind == "paragraph"))
        });

        let bullet = if alternate {
            alternate_bullet(self.config.bullet)
        } else {
            self.config.bullet
        };
        let delimiter = if alternate {
            alternate_delimiter(self.config.ordered_delimiter)
        } else {
            self.config.ordered_delimiter
        };
        let mut number = element.attribute_u64("start").unwrap_or(1);

        let rendered: Vec<String> = items
            .iter()
            .map(|children| {
                let marker = if ordered {
                    let marker = format!("{number}{delimiter} ");
                    number += 1;
                    marker
                } else {
                    format!("{bullet} ")
                };
                self.item(children, &marker, !loose)
            })
            .collect();
        rendered.join(if loose { "\n\n" } else { "\n" })
    }

    fn item(&self, children: &[Node], marker: &str, tight: bool) -> String {
        let inner = self.container(children, tight);
        let rest = " ".repeat(marker.chars().count());
        indent(&inner, marker, &rest)
    }
}

fn alternate_bullet(bullet: char) -> char {
    if bullet == '*' { '-' } else { '*' }
}

fn alternate_delimiter(delimiter: char) -> char {
    if delimiter == ')' { '.' } else { ')' }
}

fn code_block(element: &Element) -> String {
    let text = element.text();
    let body = text.strip_suffix('\n').unwrap_or(&text);
    let fence = "`".repeat(escape::longest_run(body, '`').max(2) + 1);
    let info = element.attribute_str("info").unwrap_or("");
    if body.is_empty() {
        format!("{fence}{info}\n{fence}")
    } else {
        format!("{fence}{info}\n{body}\n{fence}")
    }
}

/// Moves whitespace and hard breaks at the front of `body` into the result.
fn take_leading_space(body: &mut Vec<Piece>) -> Vec<Piece> {
    let mut lead = Vec::new();
    while let Some(piece) = body.first() {
        let keep = match piece {
            Piece::Break => 0,
            Piece::Text(text) => text.trim_start().len(),
            Piece::Delim(_) => break,
        };
        if keep == 0 {
            lead.push(body.remove(0));
            continue;
        }
        if let Some(Piece::Text(text)) = body.first_mut() {
            let split = text.len() - keep;
            if split > 0 {
                lead.push(Piece::Text(text.drain(..split).collect()));
            }
        }
        break;
    }
    lead
}

/// Moves whitespace and hard breaks at the back of `body` into the result.
fn take_trailing_space(body: &mut Vec<Piece>) -> Vec<Piece> {
    let mut trail = Vec::new();
    while let Some(piece) = body.last() {
        let keep = match piece {
            Piece::Break => 0,
            Piece::Text(text) => text.trim_end().len(),
            Piece::Delim(_) => break,
        };
        if keep == 0 {
            trail.extend(body.pop());
            continue;
        }
        if let Some(Piece::Text(text)) = body.last_mut() {
            let space = text.split_off(keep);
            if !space.is_empty() {
                trail.push(Piece::Text(space));
            }
        }
        break;
    }
    trail.reverse();
    trail
}

/// `(destination "title")` for links and images.
fn target(url: &str, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("({} {})", escape::destination(url), escape::title(title)),
        None => format!("({})", escape::destination(url)),
    }
}

/// Inline content writer. Delimiter characters are chosen once the whole
/// run of inline content is known, in [`Inline::finish`].
struct Inline {
    pieces: Vec<Piece>,
    marks: Vec<Mark>,
    /// Character considered to precede the output; `None` at a line start.
    prev: Option<char>,
    single_line: bool,
}

impl Inline {
    fn new(prev: Option<char>, single_line: bool) -> Self {
        Self {
            pieces: Vec::new(),
            marks: Vec::new(),
            prev,
            single_line,
        }
    }

    fn at_line_start(&self) -> bool {
        if self.single_line {
            return false;
        }
        for piece in self.pieces.iter().rev() {
            match piece {
                Piece::Text(text) => {
                    if let Some(ch) = text.trim_end_matches(' ').chars().next_back() {
                        return ch == '\n';
                    }
                }
                Piece::Break => return true,
                Piece::Delim(_) => return false,
            }
        }
        self.prev.is_none_or(|ch| ch == '\n')
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Text(last)) = self.pieces.last_mut() {
            last.push_str(text);
        } else {
            self.pieces.push(Piece::Text(text.to_string()));
        }
    }

    fn extend(&mut self, pieces: Vec<Piece>) {
        for piece in pieces {
            match piece {
                Piece::Text(text) => self.push_text(&text),
                piece => self.pieces.push(piece),
            }
        }
    }

    fn nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Text(text) => {
                let line_start = self.at_line_start();
                let mut escaped = String::new();
                escape::escape_text(&text.text, line_start, self.single_line, &mut escaped);
                self.push_text(&escaped);
            }
            Node::Element(element) => self.element(element),
        }
    }

    fn element(&mut self, element: &Element) {
        match element.kind.as_str() {
            "bold" => self.emphasis(element, 2),
            "italic" => self.emphasis(element, 1),
            "code" => self.code(element),
            "link" => self.link(element),
            "image" => self.image(element),
            "line-break" if self.single_line => self.push_text(" "),
            "line-break" => self.pieces.push(Piece::Break),
            _ => self.nodes(&element.children),
        }
    }

    /// Emphasis delimiters cannot sit next to whitespace on their inner
    /// side, so leading and trailing whitespace moves outside them.
    fn emphasis(&mut self, element: &Element, width: usize) {
        let mark = self.marks.len();
        self.marks.push(Mark::new(width));
        let start = self.pieces.len();
        self.pieces.push(Piece::Delim(mark));
        self.nodes(&element.children);

        let mut body = self.pieces.split_off(start + 1);
        self.pieces.truncate(start);
        let lead = take_leading_space(&mut body);
        let trail = take_trailing_space(&mut body);

        self.extend(lead);
        if body.is_empty() {
            return;
        }
        self.pieces.push(Piece::Delim(mark));
        self.pieces.extend(body);
        self.pieces.push(Piece::Delim(mark));
        self.extend(trail);
    }

    fn code(&mut self, element: &Element) {
        let text: String = element
            .text()
            .chars()
            .filter(|ch| *ch != PLACEHOLDER)
            .map(|ch| if ch == '\n' { ' ' } else { ch })
            .collect();
        if text.is_empty() {
            return;
        }
        let fence = "`".repeat(escape::longest_run(&text, '`') + 1);
        let pad = text.starts_with('`')
            || text.ends_with('`')
            || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
        let space = if pad { " " } else { "" };
        self.push_text(&format!("{fence}{space}{text}{space}{fence}"));
    }

    fn link(&mut self, element: &Element) {
        let url = element
            .attribute_str("url")
            .or_else(|| element.attribute_str("href"))
            .unwrap_or("");
        let mut inner = Inline::new(Some('['), self.single_line);
        inner.nodes(&element.children);
        let text = inner.finish(Some(']'));

        let target = target(url, element.attribute_str("title"));
        self.push_text(&format!("[{text}]{target}"));
    }

    fn image(&mut self, element: &Element) {
        let url = element
            .attribute_str("url")
            .or_else(|| element.attribute_str("src"))
            .unwrap_or("");
        let mut alt = String::new();
        escape::escape_text(
            element.attribute_str("alt").unwrap_or(""),
            false,
            true,
            &mut alt,
        );

        let target = target(url, element.attribute_str("title"));
        self.push_text(&format!("![{alt}]{target}"));
    }

    /// Fixes delimiter characters and writes the pieces out. `after` is the
    /// character that follows the output, `None` at a line end.
    fn finish(mut self, after: Option<char>) -> String {
        emphasis::choose(&self.pieces, &mut self.marks, self.prev, after);
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Break => out.push_str("\\\n"),
                Piece::Delim(mark) => {
                    let mark = self.marks[*mark];
                    out.extend(std::iter::repeat_n(mark.ch, mark.width));
                }
            }
        }
        out
    }
}

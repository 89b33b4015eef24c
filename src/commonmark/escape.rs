//! Backslash escaping for literal text.

use crate::core::PLACEHOLDER;

/// Characters that are escaped wherever they appear.
const ALWAYS: &[char] = &['\\', '`', '*', '_', '[', ']', '<', '>', '#', '&'];

/// Characters that only start a construct at the beginning of a line.
const LINE_START: &[char] = &['-', '+', '=', '~'];

/// Appends `text` to `out` so that it reads back as the same literal text.
///
/// `line_start` says whether `out` currently ends at the start of a line
/// (ignoring indentation). With `single_line`, newlines become spaces.
pub fn escape_text(text: &str, mut line_start: bool, single_line: bool, out: &mut String) {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            PLACEHOLDER => continue,
            '\n' if single_line => {
                out.push(' ');
                line_start = false;
                continue;
            }
            '\n' => {
                out.push('\n');
                line_start = true;
                continue;
            }
            ' ' | '\t' => {
                out.push(ch);
                continue;
            }
            _ => {}
        }

        if ALWAYS.contains(&ch) || (line_start && LINE_START.contains(&ch)) {
            out.push('\\');
            out.push(ch);
        } else if line_start && ch.is_ascii_digit() {
            out.push(ch);
            while let Some(&digit) = chars.peek().filter(|c| c.is_ascii_digit()) {
                out.push(digit);
                chars.next();
            }
            if let Some(&delimiter) = chars.peek().filter(|c| matches!(c, '.' | ')')) {
                out.push('\\');
                out.push(delimiter);
                chars.next();
            }
        } else {
            out.push(ch);
        }
        line_start = false;
    }
}

/// Length of the longest run of `needle` in `text`.
pub fn longest_run(text: &str, needle: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == needle {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Link or image destination.
pub fn destination(url: &str) -> String {
    if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let escaped = url.replace('<', "\\<").replace('>', "\\>");
        return format!("<{escaped}>");
    }

    let mut out = String::with_capacity(url.len());
    for ch in url.chars() {
        if matches!(ch, '(' | ')' | '<' | '>') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn title(title: &str) -> String {
    format!("\"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
}

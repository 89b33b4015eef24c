//! Delimiter choice for bold and italic.
//!
//! Whether `*` or `_` closes an emphasis depends on the characters on both
//! sides of each delimiter run, and runs of the same character that touch
//! merge into one. The writer first lays inline content out as pieces with
//! every delimiter left open, then [`choose`] picks characters by replaying
//! CommonMark's delimiter pairing over the pieces and keeping the choice
//! under which every emphasis pairs with its own closer.

/// Inline output before delimiter characters are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Piece {
    Text(String),
    /// Hard line break, written as a backslash and a newline.
    Break,
    /// Opening or closing delimiter of the emphasis with this index.
    Delim(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Mark {
    pub ch: char,
    pub width: usize,
}

impl Mark {
    pub(super) fn new(width: usize) -> Self {
        Self { ch: '*', width }
    }
}

fn flip(ch: char) -> char {
    if ch == '*' { '_' } else { '*' }
}

/// Picks a delimiter character for every mark in `pieces`. `before` and
/// `after` are the characters around the pieces, `None` for a line edge.
pub(super) fn choose(
    pieces: &[Piece],
    marks: &mut [Mark],
    before: Option<char>,
    after: Option<char>,
) {
    let wanted = pieces
        .iter()
        .filter(|piece| matches!(piece, Piece::Delim(_)))
        .count()
        / 2;

    let mut best = score(pieces, marks, before, after);
    while best < wanted {
        let mut improved = false;
        for index in (0..marks.len()).rev() {
            marks[index].ch = flip(marks[index].ch);
            let found = score(pieces, marks, before, after);
            if found > best {
                best = found;
                improved = true;
            } else {
                marks[index].ch = flip(marks[index].ch);
            }
        }
        if !improved {
            tracing::debug!(paired = best, wanted, "emphasis delimiters may not re-parse");
            break;
        }
    }
}

fn score(pieces: &[Piece], marks: &[Mark], before: Option<char>, after: Option<char>) -> usize {
    paired(&mut runs(pieces, marks, before, after), marks)
}

/// A maximal run of touching delimiters with the same character.
#[derive(Debug)]
struct Run {
    ch: char,
    len: usize,
    can_open: bool,
    can_close: bool,
    /// Owning mark of each delimiter character, left to right.
    units: Vec<usize>,
    front: usize,
    back: usize,
}

impl Run {
    fn remaining(&self) -> usize {
        self.back - self.front
    }
}

fn first_char(piece: &Piece, marks: &[Mark]) -> Option<char> {
    match piece {
        Piece::Text(text) => text.chars().next(),
        Piece::Break => Some('\\'),
        Piece::Delim(mark) => Some(marks[*mark].ch),
    }
}

fn last_char(piece: &Piece, marks: &[Mark]) -> Option<char> {
    match piece {
        Piece::Text(text) => text.chars().next_back(),
        Piece::Break => Some('\n'),
        Piece::Delim(mark) => Some(marks[*mark].ch),
    }
}

fn is_space(ch: Option<char>) -> bool {
    ch.is_none_or(char::is_whitespace)
}

fn is_punctuation(ch: Option<char>) -> bool {
    ch.is_some_and(|ch| ch.is_ascii_punctuation())
}

/// Left- and right-flanking rules, returning `(can_open, can_close)`.
fn flanking(ch: char, prev: Option<char>, next: Option<char>) -> (bool, bool) {
    let left =
        !is_space(next) && (!is_punctuation(next) || is_space(prev) || is_punctuation(prev));
    let right =
        !is_space(prev) && (!is_punctuation(prev) || is_space(next) || is_punctuation(next));
    if ch == '_' {
        (
            left && (!right || is_punctuation(prev)),
            right && (!left || is_punctuation(next)),
        )
    } else {
        (left, right)
    }
}

fn runs(pieces: &[Piece], marks: &[Mark], before: Option<char>, after: Option<char>) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut index = 0;
    while index < pieces.len() {
        let Piece::Delim(mark) = pieces[index] else {
            index += 1;
            continue;
        };
        let ch = marks[mark].ch;
        let start = index;
        let mut units = Vec::new();
        while let Some(&Piece::Delim(mark)) = pieces.get(index) {
            if marks[mark].ch != ch {
                break;
            }
            units.extend(std::iter::repeat_n(mark, marks[mark].width));
            index += 1;
        }

        let prev = match start.checked_sub(1) {
            Some(previous) => last_char(&pieces[previous], marks),
            None => before,
        };
        let next = match pieces.get(index) {
            Some(piece) => first_char(piece, marks),
            None => after,
        };
        let (can_open, can_close) = flanking(ch, prev, next);
        runs.push(Run {
            ch,
            len: units.len(),
            can_open,
            can_close,
            front: 0,
            back: units.len(),
            units,
        });
    }
    runs
}

/// Runs that can both open and close only pair when their combined length
/// is not a multiple of three, unless both lengths are.
fn odd_match(opener: &Run, closer: &Run) -> bool {
    (opener.can_close || closer.can_open)
        && (opener.len + closer.len) % 3 == 0
        && !(opener.len % 3 == 0 && closer.len % 3 == 0)
}

/// Replays emphasis pairing over `runs` and counts the marks whose opening
/// and closing delimiters end up paired with each other.
fn paired(runs: &mut [Run], marks: &[Mark]) -> usize {
    let mut paired = 0;
    let mut live = vec![true; runs.len()];

    for closer in 0..runs.len() {
        if !runs[closer].can_close {
            continue;
        }
        while runs[closer].remaining() > 0 {
            let Some(opener) = (0..closer).rev().find(|&opener| {
                let run = &runs[opener];
                live[opener]
                    && run.can_open
                    && run.remaining() > 0
                    && run.ch == runs[closer].ch
                    && !odd_match(run, &runs[closer])
            }) else {
                break;
            };

            let used = if runs[opener].remaining() >= 2 && runs[closer].remaining() >= 2 {
                2
            } else {
                1
            };
            let open = &runs[opener];
            let close = &runs[closer];
            let opened = &open.units[open.back - used..open.back];
            let closed = &close.units[close.front..close.front + used];
            let mark = opened[0];
            let whole = marks[mark].width == used;
            if whole && opened.iter().chain(closed).all(|&unit| unit == mark) {
                paired += 1;
            }

            runs[opener].back -= used;
            runs[closer].front += used;
            for between in &mut live[opener + 1..closer] {
                *between = false;
            }
        }
    }
    paired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Piece {
        Piece::Text(value.to_string())
    }

    fn render(pieces: &[Piece], marks: &[Mark]) -> String {
        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Break => out.push_str("\\\n"),
                Piece::Delim(mark) => {
                    out.extend(std::iter::repeat_n(marks[*mark].ch, marks[*mark].width))
                }
            }
        }
        out
    }

    fn chosen(pieces: &[Piece], mut marks: Vec<Mark>) -> String {
        choose(pieces, &mut marks, None, None);
        render(pieces, &marks)
    }

    #[test]
    fn test_flanking() {
        assert_eq!(flanking('*', None, Some('a')), (true, false));
        assert_eq!(flanking('*', Some('a'), Some('b')), (true, true));
        assert_eq!(flanking('_', Some('a'), Some('b')), (false, false));
        assert_eq!(flanking('_', Some('*'), Some('b')), (true, false));
        assert_eq!(flanking('_', Some('a'), Some('*')), (false, true));
        assert_eq!(flanking('*', Some('a'), Some('(')), (false, true));
    }

    #[test]
    fn test_plain_emphasis_keeps_stars() {
        let pieces = [
            text("a "),
            Piece::Delim(0),
            text("b"),
            Piece::Delim(0),
            text(" c"),
        ];
        assert_eq!(chosen(&pieces, vec![Mark::new(2)]), "a **b** c");
    }

    #[test]
    fn test_closer_then_opener_followed_by_letter() {
        // bold(abc italic(def)) italic(ghi) j
        let pieces = [
            Piece::Delim(0),
            text("abc"),
            Piece::Delim(1),
            text("def"),
            Piece::Delim(1),
            Piece::Delim(0),
            Piece::Delim(2),
            text("ghi"),
            Piece::Delim(2),
            text("j"),
        ];
        let marks = vec![Mark::new(2), Mark::new(1), Mark::new(1)];
        assert_eq!(chosen(&pieces, marks), "__abc*def*__*ghi*j");
    }

    #[test]
    fn test_nested_at_same_start() {
        let pieces = [
            Piece::Delim(0),
            Piece::Delim(1),
            text("x"),
            Piece::Delim(1),
            text("y"),
            Piece::Delim(0),
        ];
        assert_eq!(
            chosen(&pieces, vec![Mark::new(2), Mark::new(1)]),
            "***x*y**"
        );
    }

    #[test]
    fn test_identical_ranges_switch_inner_delimiter() {
        let pieces = [
            Piece::Delim(0),
            Piece::Delim(1),
            text("both"),
            Piece::Delim(1),
            Piece::Delim(0),
        ];
        assert_eq!(
            chosen(&pieces, vec![Mark::new(2), Mark::new(1)]),
            "**_both_**"
        );
    }

    #[test]
    fn test_pairing_counts_only_intended_pairs() {
        let pieces = [
            Piece::Delim(0),
            Piece::Delim(1),
            text("x"),
            Piece::Delim(1),
            Piece::Delim(0),
        ];
        let marks = [Mark::new(2), Mark::new(1)];
        assert_eq!(paired(&mut runs(&pieces, &marks, None, None), &marks), 0);
    }
}

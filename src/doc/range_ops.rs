//! Range adjustment rules for text edits.
//!
//! These are the default, per-annotation rules the document store applies
//! when content changes. They are public so that custom
//! [`Transform`](crate::core::Transform) implementations can fall back to
//! them for the cases they do not override.

use crate::core::Annotation;

/// Outcome of adjusting an annotation for a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteEffect {
    Unchanged,
    Shifted,
    Trimmed,
    /// The deletion covered the whole annotation; it is now zero length.
    Collapsed,
}

/// Default insertion rule for `len` code units spliced in at `position`.
pub fn apply_insert(
    annotation: &mut Annotation,
    position: usize,
    len: usize,
    preserve_adjacent_boundaries: bool,
) {
    if position < annotation.start {
        annotation.start += len;
        annotation.end += len;
    } else if position > annotation.start && position < annotation.end {
        annotation.end += len;
    } else if position == annotation.start {
        if !preserve_adjacent_boundaries {
            annotation.start += len;
        }
        annotation.end += len;
    } else if position == annotation.end && !preserve_adjacent_boundaries {
        annotation.end += len;
    }
}

/// Deletion rule for the range `[start, end)`.
pub fn apply_delete(annotation: &mut Annotation, start: usize, end: usize) -> DeleteEffect {
    let length = end - start;

    if annotation.end < start {
        return DeleteEffect::Unchanged;
    }

    if end < annotation.start {
        annotation.start -= length;
        annotation.end -= length;
        return DeleteEffect::Shifted;
    }

    if end < annotation.end {
        if start > annotation.start {
            annotation.end -= length;
        } else {
            annotation.start = start;
            annotation.end -= length;
        }
        DeleteEffect::Trimmed
    } else if start <= annotation.start {
        annotation.start = start;
        annotation.end = start;
        DeleteEffect::Collapsed
    } else {
        annotation.end = start;
        DeleteEffect::Trimmed
    }
}

/// Rule for every annotation other than the one whose range
/// `[old_start, old_end)` was replaced by a single placeholder.
///
/// Offsets at or past `old_end` move left by `old_len - 1`; offsets strictly
/// inside the replaced range clamp to the end of the placeholder.
pub fn apply_collapse(annotation: &mut Annotation, old_start: usize, old_end: usize) {
    annotation.start = collapse_offset(annotation.start, old_start, old_end);
    annotation.end = collapse_offset(annotation.end, old_start, old_end);
}

fn collapse_offset(offset: usize, old_start: usize, old_end: usize) -> usize {
    if offset >= old_end {
        offset + 1 - (old_end - old_start)
    } else if offset > old_start {
        old_start + 1
    } else {
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Annotation {
        Annotation::new("bold", start, end)
    }

    fn bounds(annotation: &Annotation) -> (usize, usize) {
        (annotation.start, annotation.end)
    }

    #[test]
    fn test_insert_before_shifts() {
        let mut a = span(5, 8);
        apply_insert(&mut a, 2, 3, false);
        assert_eq!(bounds(&a), (8, 11));
    }

    #[test]
    fn test_insert_inside_extends() {
        let mut a = span(5, 8);
        apply_insert(&mut a, 6, 3, true);
        assert_eq!(bounds(&a), (5, 11));
    }

    #[test]
    fn test_insert_at_end_respects_preserve() {
        let mut a = span(5, 8);
        apply_insert(&mut a, 8, 2, false);
        assert_eq!(bounds(&a), (5, 10));

        let mut b = span(5, 8);
        apply_insert(&mut b, 8, 2, true);
        assert_eq!(bounds(&b), (5, 8));
    }

    #[test]
    fn test_insert_after_is_ignored() {
        let mut a = span(1, 3);
        apply_insert(&mut a, 7, 2, false);
        assert_eq!(bounds(&a), (1, 3));
    }

    #[test]
    fn test_insert_at_zero_length_marker() {
        let mut a = span(4, 4);
        apply_insert(&mut a, 4, 2, false);
        assert_eq!(bounds(&a), (6, 6));

        let mut b = span(4, 4);
        apply_insert(&mut b, 4, 2, true);
        assert_eq!(bounds(&b), (4, 6));
    }

    #[test]
    fn test_delete_cases() {
        let mut before = span(0, 2);
        assert_eq!(apply_delete(&mut before, 4, 6), DeleteEffect::Unchanged);
        assert_eq!(bounds(&before), (0, 2));

        let mut after = span(8, 10);
        assert_eq!(apply_delete(&mut after, 4, 6), DeleteEffect::Shifted);
        assert_eq!(bounds(&after), (6, 8));

        let mut around = span(2, 10);
        assert_eq!(apply_delete(&mut around, 4, 6), DeleteEffect::Trimmed);
        assert_eq!(bounds(&around), (2, 8));

        let mut head = span(5, 10);
        assert_eq!(apply_delete(&mut head, 3, 7), DeleteEffect::Trimmed);
        assert_eq!(bounds(&head), (3, 6));

        let mut covered = span(4, 6);
        assert_eq!(apply_delete(&mut covered, 3, 7), DeleteEffect::Collapsed);
        assert_eq!(bounds(&covered), (3, 3));

        let mut tail = span(2, 6);
        assert_eq!(apply_delete(&mut tail, 4, 8), DeleteEffect::Trimmed);
        assert_eq!(bounds(&tail), (2, 4));
    }

    #[test]
    fn test_delete_touching_end_keeps_range() {
        let mut a = span(2, 4);
        apply_delete(&mut a, 4, 6);
        assert_eq!(bounds(&a), (2, 4));
    }

    #[test]
    fn test_collapse_offsets() {
        // "ab[cdef]gh" -> "ab\u{FFFC}gh"
        let mut after = span(6, 8);
        apply_collapse(&mut after, 2, 6);
        assert_eq!(bounds(&after), (3, 5));

        let mut around = span(0, 8);
        apply_collapse(&mut around, 2, 6);
        assert_eq!(bounds(&around), (0, 5));

        let mut inner = span(3, 5);
        apply_collapse(&mut inner, 2, 6);
        assert_eq!(bounds(&inner), (3, 3));

        let mut before = span(0, 2);
        apply_collapse(&mut before, 2, 6);
        assert_eq!(bounds(&before), (0, 2));
    }

    #[test]
    fn test_collapse_empty_range_grows_by_one() {
        let mut after = span(2, 4);
        apply_collapse(&mut after, 2, 2);
        assert_eq!(bounds(&after), (3, 5));
    }
}

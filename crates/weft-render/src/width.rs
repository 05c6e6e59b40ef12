#![forbid(unsafe_code)]

//! Visible-width measurement and column slicing for styled lines.
//!
//! Width is counted in terminal cells over grapheme clusters, with escape
//! sequences contributing nothing. Column slicing keeps escape sequences so
//! styles survive a cut; a wide grapheme straddling a cut is replaced by
//! spaces so the result has exactly the requested width.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::ansi::{Segment, has_escapes, segments};

/// Display width of one grapheme cluster.
#[inline]
#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.chars().all(char::is_control) {
        return 0;
    }
    grapheme.width()
}

/// Display width of plain text (no escape handling).
#[must_use]
pub fn text_width(text: &str) -> usize {
    if text.is_ascii() {
        return text.bytes().filter(|b| !b.is_ascii_control()).count();
    }
    text.graphemes(true).map(grapheme_width).sum()
}

/// Display width of a line that may embed escape sequences.
#[must_use]
pub fn visible_width(line: &str) -> usize {
    if !has_escapes(line) {
        return text_width(line);
    }
    segments(line)
        .map(|segment| match segment {
            Segment::Text(text) => text_width(text),
            Segment::Escape(_) => 0,
        })
        .sum()
}

/// Append spaces until `line` is `width` cells wide. Never truncates.
#[must_use]
pub fn pad_to_width(line: &str, width: usize) -> String {
    let current = visible_width(line);
    let mut out = String::with_capacity(line.len() + width.saturating_sub(current));
    out.push_str(line);
    push_spaces(&mut out, width.saturating_sub(current));
    out
}

/// The first `cols` visible cells of `line`, escapes included.
///
/// Shorter lines are returned whole (no padding).
#[must_use]
pub fn take_columns(line: &str, cols: usize) -> String {
    let mut out = String::with_capacity(line.len().min(cols * 4 + 16));
    let mut used = 0;
    for segment in segments(line) {
        match segment {
            Segment::Escape(seq) => out.push_str(seq),
            Segment::Text(text) => {
                for grapheme in text.graphemes(true) {
                    let w = grapheme_width(grapheme);
                    if used + w > cols {
                        push_spaces(&mut out, cols - used);
                        return out;
                    }
                    out.push_str(grapheme);
                    used += w;
                }
            }
        }
    }
    out
}

/// `line` without its first `cols` visible cells, escapes included.
#[must_use]
pub fn skip_columns(line: &str, cols: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut skipped = 0;
    for segment in segments(line) {
        match segment {
            Segment::Escape(seq) => out.push_str(seq),
            Segment::Text(text) => {
                for grapheme in text.graphemes(true) {
                    if skipped >= cols {
                        out.push_str(grapheme);
                        continue;
                    }
                    let w = grapheme_width(grapheme);
                    skipped += w;
                    if skipped > cols {
                        // Right half of a wide grapheme cut at the boundary.
                        push_spaces(&mut out, skipped - cols);
                    }
                }
            }
        }
    }
    out
}

/// Truncate to at most `max` cells, escapes included.
#[must_use]
pub fn truncate_to_width(line: &str, max: usize) -> String {
    if visible_width(line) <= max {
        return line.to_string();
    }
    take_columns(line, max)
}

pub(crate) fn push_spaces(out: &mut String, n: usize) {
    out.extend(std::iter::repeat_n(' ', n));
}

#![forbid(unsafe_code)]

//! Immutable, line-oriented render results.
//!
//! An [`OutputBuffer`] is an ordered list of lines that may embed style
//! sequences. `height` is the line count and `width` the widest line's
//! visible width. Buffers are never edited in place; the composition
//! operators return new buffers and pad shorter operands with spaces (or
//! blank lines) first, so operands are never truncated or misaligned.
//!
//! Vertical stacking is associative: `a.vstack(&b, s).vstack(&c, s)` equals
//! `a.vstack(&b.vstack(&c, s), s)`.

use crate::ansi::SGR_RESET;
use crate::width::{pad_to_width, push_spaces, skip_columns, take_columns, visible_width};

/// A rendered block of styled lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    lines: Vec<String>,
    width: usize,
}

impl OutputBuffer {
    /// A buffer with no lines.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            lines: Vec::new(),
            width: 0,
        }
    }

    /// Build from lines. Lines must not contain `\n`; use [`Self::text`] for
    /// multi-line strings.
    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let width = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
        Self { lines, width }
    }

    /// Split `text` on newlines. An empty string is an empty buffer.
    #[must_use]
    pub fn text(text: &str) -> Self {
        if text.is_empty() {
            return Self::empty();
        }
        Self::from_lines(text.split('\n').map(|l| l.trim_end_matches('\r')))
    }

    /// `height` blank lines of `width` spaces.
    #[must_use]
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            lines: vec![" ".repeat(width); height],
            width,
        }
    }

    /// The lines, top to bottom.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Take the lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Line at `row`, if any.
    #[must_use]
    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    /// Number of lines.
    #[must_use]
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    /// Widest visible line width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// No lines at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Every line padded to at least `width` cells.
    #[must_use]
    pub fn padded_to(&self, width: usize) -> Self {
        let width = width.max(self.width);
        Self {
            lines: self.lines.iter().map(|l| pad_to_width(l, width)).collect(),
            width,
        }
    }

    /// Blank lines appended until `height` is reached. Never removes lines.
    #[must_use]
    pub fn padded_to_height(&self, height: usize) -> Self {
        let mut lines = self.lines.clone();
        while lines.len() < height {
            lines.push(" ".repeat(self.width));
        }
        Self {
            lines,
            width: self.width,
        }
    }

    /// Keep at most `height` lines (clamping, not an error).
    #[must_use]
    pub fn clipped_to_height(&self, height: usize) -> Self {
        if self.lines.len() <= height {
            return self.clone();
        }
        Self::from_lines(self.lines[..height].iter().cloned())
    }

    /// Place `other` below `self` with `spacing` blank lines between.
    ///
    /// Both operands are padded to the wider width. Stacking onto an empty
    /// buffer adds no spacing.
    #[must_use]
    pub fn vstack(&self, other: &Self, spacing: usize) -> Self {
        let width = self.width.max(other.width);
        if self.is_empty() {
            return other.padded_to(width);
        }
        if other.is_empty() {
            return self.padded_to(width);
        }
        let mut lines = Vec::with_capacity(self.height() + spacing + other.height());
        lines.extend(self.lines.iter().map(|l| pad_to_width(l, width)));
        lines.extend(std::iter::repeat_n(" ".repeat(width), spacing));
        lines.extend(other.lines.iter().map(|l| pad_to_width(l, width)));
        Self { lines, width }
    }

    /// Place `other` to the right of `self` with `spacing` columns between.
    ///
    /// The shorter operand gains blank lines at the bottom; every left line is
    /// padded to the left width before joining.
    #[must_use]
    pub fn hstack(&self, other: &Self, spacing: usize) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let height = self.height().max(other.height());
        let width = self.width + spacing + other.width;
        let mut lines = Vec::with_capacity(height);
        for row in 0..height {
            let left = self.line(row).unwrap_or("");
            let right = other.line(row).unwrap_or("");
            let mut line = pad_to_width(left, self.width);
            push_spaces(&mut line, spacing);
            line.push_str(&pad_to_width(right, other.width));
            lines.push(line);
        }
        Self { lines, width }
    }

    /// Draw `top` over `self` with its top-left corner at column `x`, row `y`.
    ///
    /// The base grows (blank rows, padded columns) when `top` extends past
    /// it. Cells of the base outside `top`'s rectangle keep their content and
    /// styling; each overlaid row is bracketed by style resets.
    #[must_use]
    pub fn overlay(&self, top: &Self, x: usize, y: usize) -> Self {
        if top.is_empty() {
            return self.clone();
        }
        let width = self.width.max(x + top.width);
        let height = self.height().max(y + top.height());
        let mut lines = Vec::with_capacity(height);
        for row in 0..height {
            let base = pad_to_width(self.line(row).unwrap_or(""), width);
            let Some(over) = row.checked_sub(y).and_then(|r| top.line(r)) else {
                lines.push(base);
                continue;
            };
            let mut line = take_columns(&base, x);
            line.push_str(SGR_RESET);
            line.push_str(&pad_to_width(over, top.width));
            line.push_str(SGR_RESET);
            line.push_str(&skip_columns(&base, x + top.width));
            lines.push(line);
        }
        Self { lines, width }
    }

    /// Stack many buffers vertically.
    #[must_use]
    pub fn vstack_all<'a, I>(buffers: I, spacing: usize) -> Self
    where
        I: IntoIterator<Item = &'a OutputBuffer>,
    {
        buffers
            .into_iter()
            .fold(Self::empty(), |acc, next| acc.vstack(next, spacing))
    }

    /// Place many buffers side by side.
    #[must_use]
    pub fn hstack_all<'a, I>(buffers: I, spacing: usize) -> Self
    where
        I: IntoIterator<Item = &'a OutputBuffer>,
    {
        buffers
            .into_iter()
            .fold(Self::empty(), |acc, next| acc.hstack(next, spacing))
    }
}

impl From<&str> for OutputBuffer {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for OutputBuffer {
    fn from(text: String) -> Self {
        Self::text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::strip_ansi;

    fn plain(buf: &OutputBuffer) -> Vec<String> {
        buf.lines().iter().map(|l| strip_ansi(l).into_owned()).collect()
    }

    #[test]
    fn width_ignores_style() {
        let buf = OutputBuffer::from_lines(["\x1b[31mabc\x1b[0m", "de"]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
    }

    #[test]
    fn text_splits_lines() {
        let buf = OutputBuffer::text("a\r\nbb\nccc");
        assert_eq!(buf.lines(), ["a", "bb", "ccc"]);
        assert_eq!(buf.width(), 3);
        assert!(OutputBuffer::text("").is_empty());
    }

    #[test]
    fn vstack_pads_and_spaces() {
        let a = OutputBuffer::text("ab");
        let b = OutputBuffer::text("wxyz");
        let stacked = a.vstack(&b, 1);
        assert_eq!(stacked.lines(), ["ab  ", "    ", "wxyz"]);
        assert_eq!(stacked.width(), 4);
    }

    #[test]
    fn vstack_with_empty_adds_no_spacing() {
        let a = OutputBuffer::text("ab");
        assert_eq!(OutputBuffer::empty().vstack(&a, 3), a);
        assert_eq!(a.vstack(&OutputBuffer::empty(), 3), a);
    }

    #[test]
    fn hstack_equalizes_height() {
        let a = OutputBuffer::text("a\nbbb");
        let b = OutputBuffer::text("x");
        let joined = a.hstack(&b, 2);
        assert_eq!(joined.lines(), ["a    x", "bbb   "]);
        assert_eq!(joined.width(), 6);
        assert_eq!(joined.height(), 2);
    }

    #[test]
    fn overlay_replaces_rectangle() {
        let base = OutputBuffer::text("......\n......\n......");
        let top = OutputBuffer::text("XX\nYY");
        let out = base.overlay(&top, 2, 1);
        assert_eq!(plain(&out), ["......", "..XX..", "..YY.."]);
        assert_eq!(out.width(), 6);
    }

    #[test]
    fn overlay_grows_base() {
        let base = OutputBuffer::text("ab");
        let top = OutputBuffer::text("XYZ");
        let out = base.overlay(&top, 1, 1);
        assert_eq!(plain(&out), ["ab  ", " XYZ"]);
        assert_eq!(out.height(), 2);
        assert_eq!(out.width(), 4);
    }

    #[test]
    fn clip_and_pad_height() {
        let buf = OutputBuffer::text("a\nb\nc");
        assert_eq!(buf.clipped_to_height(2).lines(), ["a", "b"]);
        assert_eq!(buf.clipped_to_height(10).height(), 3);
        assert_eq!(buf.padded_to_height(4).height(), 4);
    }

    #[test]
    fn stack_all() {
        let parts = [OutputBuffer::text("a"), OutputBuffer::text("b")];
        assert_eq!(OutputBuffer::vstack_all(&parts, 0).lines(), ["a", "b"]);
        assert_eq!(OutputBuffer::hstack_all(&parts, 1).lines(), ["a b"]);
    }
}

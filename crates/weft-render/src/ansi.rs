#![forbid(unsafe_code)]

//! ANSI escape sequence generation and recognition.
//!
//! Generation helpers are pure byte writers; the frame presenter decides when
//! to call them. Recognition ([`segments`], [`strip_ansi`]) lets width
//! measurement skip control sequences embedded in rendered lines.
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ n m` | SGR (Select Graphic Rendition) |
//! | CSI | `ESC [ row ; col H` | CUP (Cursor Position, 1-indexed) |
//! | CSI | `ESC [ 2 K` | EL (Erase whole line) |
//! | CSI | `ESC [ 2 J` | ED (Erase whole display) |
//! | CSI | `ESC [ ? 2026 h/l` | Synchronized Output (DEC) |
//! | CSI | `ESC [ ? 25 h/l` | Cursor show/hide |

use std::borrow::Cow;
use std::io::{self, Write};

// =============================================================================
// SGR (Select Graphic Rendition)
// =============================================================================

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &str = "\x1b[0m";

/// Write SGR reset sequence.
#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET.as_bytes())
}

/// True color foreground: `CSI 38;2;r;g;b m`
#[must_use]
pub fn fg_rgb(r: u8, g: u8, b: u8) -> String {
    format!("\x1b[38;2;{r};{g};{b}m")
}

/// True color background: `CSI 48;2;r;g;b m`
#[must_use]
pub fn bg_rgb(r: u8, g: u8, b: u8) -> String {
    format!("\x1b[48;2;{r};{g};{b}m")
}

/// Bold on: `CSI 1 m`
pub const SGR_BOLD: &str = "\x1b[1m";

/// Reverse video on: `CSI 7 m`
pub const SGR_REVERSE: &str = "\x1b[7m";

/// Dim on: `CSI 2 m`
pub const SGR_DIM: &str = "\x1b[2m";

// =============================================================================
// Cursor and erase
// =============================================================================

/// CUP (Cursor Position): `CSI row ; col H` (1-indexed)
///
/// Row and col are 0-indexed input, converted to 1-indexed for ANSI.
pub fn cup<W: Write>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        row.saturating_add(1),
        col.saturating_add(1)
    )
}

/// Erase the whole display: `CSI 2 J`
pub const ERASE_DISPLAY: &[u8] = b"\x1b[2J";

/// Write erase-display.
#[inline]
pub fn erase_display<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ERASE_DISPLAY)
}

/// Erase the whole current line: `CSI 2 K`
pub const ERASE_LINE: &[u8] = b"\x1b[2K";

/// Write erase-line.
#[inline]
pub fn erase_line<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ERASE_LINE)
}

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

// =============================================================================
// Synchronized Output (DEC 2026)
// =============================================================================

/// Begin synchronized output: `CSI ? 2026 h`
pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";

/// End synchronized output: `CSI ? 2026 l`
pub const SYNC_END: &[u8] = b"\x1b[?2026l";

/// Write synchronized output begin.
#[inline]
pub fn sync_begin<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_BEGIN)
}

/// Write synchronized output end.
#[inline]
pub fn sync_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_END)
}

// =============================================================================
// Recognition
// =============================================================================

const ESC: u8 = 0x1b;

/// A run of a styled line: either printable text or one control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Printable text (may still contain wide or zero-width graphemes).
    Text(&'a str),
    /// A complete escape sequence, including the leading `ESC`.
    Escape(&'a str),
}

/// Split a line into text and escape-sequence segments.
///
/// Handles CSI (`ESC [` .. final byte), OSC (`ESC ]` .. BEL/ST), DCS/PM/APC
/// (`ESC P`/`ESC ^`/`ESC _` .. ST) and two-byte `ESC x` sequences.
/// Unterminated sequences run to the end of the line.
pub fn segments(s: &str) -> impl Iterator<Item = Segment<'_>> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        if bytes[pos] == ESC {
            pos = skip_escape_sequence(bytes, pos);
            // ESC is ASCII and every terminator is ASCII, so both ends are
            // char boundaries; an aborted CSI stops before a non-ASCII byte.
            Some(Segment::Escape(&s[start..pos]))
        } else {
            while pos < bytes.len() && bytes[pos] != ESC {
                pos += 1;
            }
            Some(Segment::Text(&s[start..pos]))
        }
    })
}

/// Remove escape sequences. Borrows when there are none.
#[must_use]
pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    if !s.as_bytes().contains(&ESC) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    for segment in segments(s) {
        if let Segment::Text(text) = segment {
            out.push_str(text);
        }
    }
    Cow::Owned(out)
}

/// Whether the string contains any escape sequence.
#[must_use]
pub fn has_escapes(s: &str) -> bool {
    s.as_bytes().contains(&ESC)
}

fn skip_escape_sequence(bytes: &[u8], pos: usize) -> usize {
    let next = pos + 1;
    if next >= bytes.len() {
        return bytes.len();
    }
    match bytes[next] {
        b'[' => skip_csi(bytes, next + 1),
        b']' | b'P' | b'^' | b'_' => skip_string_terminated(bytes, next + 1),
        b if b.is_ascii() => next + 1,
        // ESC followed by a multi-byte char: drop only the ESC.
        _ => next,
    }
}

fn skip_csi(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7e).contains(&b) {
            return i + 1;
        }
        if !(0x20..=0x7e).contains(&b) {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_string_terminated(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            ESC if i + 1 < bytes.len() && bytes[i + 1] == b'\\' => return i + 2,
            _ => i += 1,
        }
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn cup_is_one_indexed() {
        assert_eq!(to_string(|w| cup(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(to_string(|w| cup(w, 4, 9)), "\x1b[5;10H");
        assert_eq!(to_string(|w| cup(w, u16::MAX, 0)), "\x1b[65535;1H");
    }

    #[test]
    fn sgr_and_erase_bytes() {
        assert_eq!(to_string(sgr_reset), "\x1b[0m");
        assert_eq!(to_string(erase_display), "\x1b[2J");
        assert_eq!(bg_rgb(1, 2, 3), "\x1b[48;2;1;2;3m");
        assert_eq!(fg_rgb(255, 0, 10), "\x1b[38;2;255;0;10m");
    }

    #[test]
    fn strip_borrows_plain_text() {
        assert!(matches!(strip_ansi("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn strip_removes_csi_and_osc() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_ansi("\x1b[38;2;255;0;0mred\x1b[0m"), "red");
        assert_eq!(
            strip_ansi("\x1b]8;;https://example.com\x07link\x1b]8;;\x1b\\"),
            "link"
        );
        assert_eq!(strip_ansi("\x1b=mode"), "mode");
    }

    #[test]
    fn strip_handles_truncated_sequences() {
        assert_eq!(strip_ansi("abc\x1b["), "abc");
        assert_eq!(strip_ansi("abc\x1b"), "abc");
        assert_eq!(strip_ansi("\x1b\u{e9}x"), "\u{e9}x");
    }

    #[test]
    fn segments_split_in_order() {
        let parts: Vec<_> = segments("a\x1b[1mb\x1b[0m").collect();
        assert_eq!(
            parts,
            vec![
                Segment::Text("a"),
                Segment::Escape("\x1b[1m"),
                Segment::Text("b"),
                Segment::Escape("\x1b[0m"),
            ]
        );
    }
}

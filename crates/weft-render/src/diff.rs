#![forbid(unsafe_code)]

//! Line diffing against the previous frame.
//!
//! The screen is split into three regions (header, content, status line).
//! Each region remembers the final, style-wrapped lines it wrote last frame.
//! Diffing a new frame is a row-by-row string comparison:
//!
//! 1. Invalid region: every new row is changed.
//! 2. Otherwise a row is changed when it differs from, or did not exist in,
//!    the cached lines.
//! 3. Cached rows past the new line count are cleared.
//!
//! The cache then holds the new lines. A region is invalidated wholesale on
//! resize and on header-height correction.
//!
//! ```
//! use weft_render::diff::{FrameDiffCache, Region};
//!
//! let mut cache = FrameDiffCache::new();
//! let first = cache.diff(Region::Content, &["a".to_string(), "b".to_string()]);
//! assert_eq!(first.changed, vec![0, 1]);
//!
//! let second = cache.diff(Region::Content, &["a".to_string(), "B".to_string()]);
//! assert_eq!(second.changed, vec![1]);
//! ```

use std::ops::Range;

/// Screen region with its own diff cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Optional header at the top.
    Header,
    /// Main content between header and status line.
    Content,
    /// Optional single status line at the bottom.
    StatusLine,
}

impl Region {
    /// All regions in screen order.
    pub const ALL: [Region; 3] = [Region::Header, Region::Content, Region::StatusLine];

    const fn index(self) -> usize {
        match self {
            Region::Header => 0,
            Region::Content => 1,
            Region::StatusLine => 2,
        }
    }
}

/// Rows a region must write this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionDiff {
    /// Indices of new rows whose content must be written, ascending.
    pub changed: Vec<usize>,
    /// Rows that held content last frame but have none now.
    pub cleared: Range<usize>,
}

impl RegionDiff {
    /// Nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.cleared.is_empty()
    }

    /// Total row writes (changed plus cleared).
    #[must_use]
    pub fn len(&self) -> usize {
        self.changed.len() + self.cleared.len()
    }
}

/// Previous-frame lines for one region.
#[derive(Debug, Clone, Default)]
pub struct RegionCache {
    lines: Vec<String>,
    valid: bool,
}

impl RegionCache {
    /// Diff `new` against the cached lines, then remember `new`.
    pub fn diff(&mut self, new: &[String]) -> RegionDiff {
        let changed = if self.valid {
            new.iter()
                .enumerate()
                .filter(|(row, line)| self.lines.get(*row) != Some(*line))
                .map(|(row, _)| row)
                .collect()
        } else {
            (0..new.len()).collect()
        };
        let cleared = if self.valid && self.lines.len() > new.len() {
            new.len()..self.lines.len()
        } else {
            0..0
        };
        self.lines.clear();
        self.lines.extend_from_slice(new);
        self.valid = true;
        RegionDiff { changed, cleared }
    }

    /// Forget the previous frame; the next diff writes every row.
    pub fn invalidate(&mut self) {
        self.valid = false;
        self.lines.clear();
    }

    /// Whether the next diff is incremental.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Lines written last frame.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Diff caches for all three regions.
#[derive(Debug, Clone, Default)]
pub struct FrameDiffCache {
    regions: [RegionCache; 3],
}

impl FrameDiffCache {
    /// Create a cache with every region invalid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff one region.
    pub fn diff(&mut self, region: Region, new: &[String]) -> RegionDiff {
        self.regions[region.index()].diff(new)
    }

    /// Invalidate one region.
    pub fn invalidate(&mut self, region: Region) {
        self.regions[region.index()].invalidate();
    }

    /// Invalidate every region (resize).
    pub fn invalidate_all(&mut self) {
        for region in &mut self.regions {
            region.invalidate();
        }
        weft_core::debug!("frame diff cache invalidated");
    }

    /// Whether every region is invalid.
    #[must_use]
    pub fn is_fully_invalid(&self) -> bool {
        self.regions.iter().all(|r| !r.is_valid())
    }

    /// Cache for one region.
    #[must_use]
    pub fn region(&self, region: Region) -> &RegionCache {
        &self.regions[region.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn invalid_region_writes_everything() {
        let mut cache = RegionCache::default();
        let diff = cache.diff(&lines(&["a", "b", "c"]));
        assert_eq!(diff.changed, vec![0, 1, 2]);
        assert!(diff.cleared.is_empty());
        assert!(cache.is_valid());
    }

    #[test]
    fn identical_frame_writes_nothing() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["a", "b"]));
        assert!(cache.diff(&lines(&["a", "b"])).is_empty());
    }

    #[test]
    fn one_changed_line_is_one_write() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["a", "b", "c"]));
        let diff = cache.diff(&lines(&["a", "X", "c"]));
        assert_eq!(diff.changed, vec![1]);
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn growing_region_writes_new_rows() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["a"]));
        let diff = cache.diff(&lines(&["a", "b"]));
        assert_eq!(diff.changed, vec![1]);
    }

    #[test]
    fn shrinking_region_clears_old_rows() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["a", "b", "c"]));
        let diff = cache.diff(&lines(&["a"]));
        assert!(diff.changed.is_empty());
        assert_eq!(diff.cleared, 1..3);
    }

    #[test]
    fn style_only_change_is_a_change() {
        let mut cache = RegionCache::default();
        cache.diff(&lines(&["\x1b[1mx\x1b[0m"]));
        let diff = cache.diff(&lines(&["\x1b[2mx\x1b[0m"]));
        assert_eq!(diff.changed, vec![0]);
    }

    #[test]
    fn invalidate_all_forces_full_rewrite() {
        let mut cache = FrameDiffCache::new();
        assert!(cache.is_fully_invalid());
        cache.diff(Region::Header, &lines(&["h"]));
        cache.diff(Region::Content, &lines(&["a", "b"]));
        cache.diff(Region::StatusLine, &lines(&["s"]));

        cache.invalidate_all();
        assert_eq!(cache.diff(Region::Header, &lines(&["h"])).changed, vec![0]);
        assert_eq!(
            cache.diff(Region::Content, &lines(&["a", "b"])).changed,
            vec![0, 1]
        );
        assert_eq!(cache.diff(Region::StatusLine, &lines(&["s"])).changed, vec![0]);
    }

    #[test]
    fn regions_are_independent() {
        let mut cache = FrameDiffCache::new();
        cache.diff(Region::Content, &lines(&["a"]));
        cache.invalidate(Region::Header);
        assert!(cache.region(Region::Content).is_valid());
        assert!(cache.diff(Region::Content, &lines(&["a"])).is_empty());
    }
}

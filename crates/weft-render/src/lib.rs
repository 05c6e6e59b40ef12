#![forbid(unsafe_code)]

//! Render kernel: styled line buffers, width measurement, line diffs, and
//! single-write frame presentation.

pub mod ansi;
pub mod counting_writer;
pub mod diff;
pub mod output;
pub mod presenter;
pub mod width;

pub use diff::{FrameDiffCache, Region, RegionDiff};
pub use output::OutputBuffer;
pub use presenter::{FrameBuilder, PresentOptions};
pub use width::visible_width;

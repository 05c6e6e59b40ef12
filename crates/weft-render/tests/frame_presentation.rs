//! Diff cache and presenter working together across frames.

use weft_core::backend::write_frame_to;
use weft_render::counting_writer::CountingWriter;
use weft_render::diff::{FrameDiffCache, Region};
use weft_render::presenter::{FrameBuilder, PresentOptions};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Diff all three regions and present them; returns (bytes, rows written).
fn frame(
    cache: &mut FrameDiffCache,
    sink: &mut CountingWriter<Vec<u8>>,
    header: &[String],
    content: &[String],
    status: &[String],
    clear: bool,
) -> (u64, usize) {
    let mut builder = FrameBuilder::new(PresentOptions::default(), clear);
    let header_rows = header.len() as u16;
    let status_top = header_rows + content.len() as u16;
    for (region, top, new) in [
        (Region::Header, 0, header),
        (Region::Content, header_rows, content),
        (Region::StatusLine, status_top, status),
    ] {
        let diff = cache.diff(region, new);
        builder.region(top, new, &diff);
    }
    let (bytes, stats) = builder.finish();
    sink.reset_counter();
    write_frame_to(sink, &bytes).unwrap();
    (sink.bytes_written(), stats.rows_written)
}

#[test]
fn unchanged_frame_costs_nothing() {
    let mut cache = FrameDiffCache::new();
    let mut sink = CountingWriter::new(Vec::new());
    let header = lines(&["title"]);
    let content = lines(&["a", "b", "c"]);
    let status = lines(&["q quit"]);

    let (_, rows) = frame(&mut cache, &mut sink, &header, &content, &status, true);
    assert_eq!(rows, 5);
    assert_eq!(sink.write_calls(), 1);
    assert_eq!(sink.flush_calls(), 1);

    let (bytes, rows) = frame(&mut cache, &mut sink, &header, &content, &status, false);
    assert_eq!(bytes, 0);
    assert_eq!(rows, 0);
    assert_eq!(sink.write_calls(), 0);
    assert_eq!(sink.flush_calls(), 0);
}

#[test]
fn one_changed_line_is_one_row_in_one_write() {
    let mut cache = FrameDiffCache::new();
    let mut sink = CountingWriter::new(Vec::new());
    let header = lines(&["title"]);
    let status = lines(&["q quit"]);

    frame(
        &mut cache,
        &mut sink,
        &header,
        &lines(&["a", "b", "c"]),
        &status,
        true,
    );
    let (_, rows) = frame(
        &mut cache,
        &mut sink,
        &header,
        &lines(&["a", "B", "c"]),
        &status,
        false,
    );
    assert_eq!(rows, 1);
    assert_eq!(sink.write_calls(), 1);
    let written = String::from_utf8(sink.inner().clone()).unwrap();
    // Header is row 0, so content row 1 is screen row 3 (1-indexed).
    assert!(written.ends_with("\x1b[3;1HB\x1b[0m"));
}

#[test]
fn invalidation_rewrites_every_region() {
    let mut cache = FrameDiffCache::new();
    let mut sink = CountingWriter::new(Vec::new());
    let header = lines(&["h"]);
    let content = lines(&["a", "b"]);
    let status = lines(&["s"]);

    frame(&mut cache, &mut sink, &header, &content, &status, true);
    cache.invalidate_all();
    let (_, rows) = frame(&mut cache, &mut sink, &header, &content, &status, true);
    assert_eq!(rows, 4);
}

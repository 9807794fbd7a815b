use super::*;
use crate::foundation::error::ErrorKind;

fn assert_gapless(tl: &SegmentTimeline, target: f64) {
    let segs = tl.segments();
    assert_eq!(segs.first().unwrap().start, 0.0);
    assert_eq!(segs.last().unwrap().end, target);
    for pair in segs.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "gap or overlap at {:?}", pair);
    }
    for s in segs {
        assert!(s.end > s.start, "empty segment {s:?}");
        assert!(!s.text.is_empty());
    }
}

#[test]
fn three_lines_over_fifteen_seconds() {
    let tl = segment_text("roses are red\nviolets are blue\nrust is fast", 15.0).unwrap();
    assert_eq!(tl.len(), 3);
    let spans: Vec<(f64, f64)> = tl.segments().iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(spans, vec![(0.0, 5.0), (5.0, 10.0), (10.0, 15.0)]);
    assert_eq!(tl.segments()[1].text, "violets are blue");
}

#[test]
fn single_line_spans_everything() {
    let tl = segment_text("only this", 15.0).unwrap();
    assert_eq!(tl.len(), 1);
    assert_eq!(tl.segments()[0].start, 0.0);
    assert_eq!(tl.segments()[0].end, 15.0);
}

#[test]
fn blank_lines_and_whitespace_are_dropped() {
    let text = "  first \t  line  \r\n\r\n   \n\tsecond\rthird\n\n";
    assert_eq!(
        normalize_lines(text),
        vec!["first line", "second", "third"]
    );
    let tl = segment_text(text, 9.0).unwrap();
    assert_eq!(tl.len(), 3);
}

#[test]
fn empty_or_whitespace_text_is_empty_text_error() {
    for text in ["", "   ", "\n\n\t\r\n"] {
        let err = segment_text(text, 15.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyText, "{text:?}");
    }
}

#[test]
fn invalid_duration_is_rejected() {
    let err = segment_text("a line", 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDuration);
}

#[test]
fn segments_cover_target_for_many_shapes() {
    let targets = [0.1, 1.0, 3.3, 7.0, 15.0, 59.97];
    for &target in &targets {
        for n in 1..=40usize {
            let poem: Vec<String> = (0..n).map(|i| format!("line {i}")).collect();
            let tl = segment_text(&poem.join("\n"), target).unwrap();
            assert_eq!(tl.len(), n);
            assert_gapless(&tl, target);
        }
    }
}

#[test]
fn more_lines_than_seconds_have_no_floor() {
    let poem: Vec<&str> = std::iter::repeat_n("x", 30).collect();
    let tl = segment_text(&poem.join("\n"), 3.0).unwrap();
    assert_eq!(tl.len(), 30);
    assert!((tl.segments()[0].duration() - 0.1).abs() < 1e-12);
}

#[test]
fn non_ascii_text_is_preserved() {
    let tl = segment_text("Ночь, улица, фонарь\n夜の海\n🌙  moon", 6.0).unwrap();
    let texts: Vec<&str> = tl.segments().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Ночь, улица, фонарь", "夜の海", "🌙 moon"]);
}

#[test]
fn only_spaces_and_tabs_collapse() {
    assert_eq!(
        normalize_lines("a\u{A0}\u{A0}b\n夜\u{3000}海\nc \t \td"),
        vec!["a\u{A0}\u{A0}b", "夜\u{3000}海", "c d"]
    );
    // Trimming still removes any whitespace at the line edges.
    assert_eq!(normalize_lines("\u{3000}夜\u{A0}\n\u{A0}"), vec!["夜"]);
}

#[test]
fn segment_lookup_is_exclusive_except_at_the_end() {
    let tl = segment_text("a\nb\nc", 15.0).unwrap();
    assert_eq!(tl.segment_at(0.0).unwrap().index, 0);
    assert_eq!(tl.segment_at(4.999).unwrap().index, 0);
    assert_eq!(tl.segment_at(5.0).unwrap().index, 1);
    assert_eq!(tl.segment_at(14.99).unwrap().index, 2);
    assert_eq!(tl.segment_at(15.0).unwrap().index, 2);
    assert!(tl.segment_at(15.01).is_none());
    assert!(tl.segment_at(-0.01).is_none());
}

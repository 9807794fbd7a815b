use serde::Serialize;

use crate::config::style::validate_target_duration;
use crate::foundation::error::{ReelError, ReelResult};

/// One poem line and the output interval during which it is shown.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextSegment {
    /// Zero-based position in display order.
    pub index: usize,
    /// Non-empty display text.
    pub text: String,
    /// Start time in seconds (inclusive).
    pub start: f64,
    /// End time in seconds (exclusive, except for the last segment).
    pub end: f64,
}

impl TextSegment {
    /// Display length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered, gapless segments covering `[0, duration]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentTimeline {
    segments: Vec<TextSegment>,
    duration: f64,
}

impl SegmentTimeline {
    /// Segments in display order.
    pub fn segments(&self) -> &[TextSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; an empty poem never produces a timeline.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total covered duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Segment active at output time `t`. The final instant belongs to the last segment.
    pub fn segment_at(&self, t: f64) -> Option<&TextSegment> {
        if !(0.0..=self.duration).contains(&t) {
            return None;
        }
        let idx = self.segments.partition_point(|s| s.end <= t);
        self.segments.get(idx).or_else(|| self.segments.last())
    }
}

/// Split a poem into display lines.
///
/// Lines break on `\n`, `\r\n` and `\r`; each line is trimmed and inner runs of spaces and tabs
/// collapse to one space. Other whitespace (no-break, ideographic) is kept as written. Lines that
/// are blank after trimming are dropped.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(collapse_blanks)
        .filter(|line| !line.is_empty())
        .collect()
}

fn collapse_blanks(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_run = false;
    for c in line.trim().chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Give each non-blank line an equal share of `target_secs`, in order.
pub fn segment_text(text: &str, target_secs: f64) -> ReelResult<SegmentTimeline> {
    validate_target_duration(target_secs)?;
    let lines = normalize_lines(text);
    if lines.is_empty() {
        return Err(ReelError::empty_text(
            "poem has no non-blank lines to display",
        ));
    }

    let n = lines.len();
    let share = target_secs / n as f64;
    let segments = lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let start = i as f64 * share;
            let end = if i + 1 == n {
                target_secs
            } else {
                (i + 1) as f64 * share
            };
            TextSegment {
                index: i,
                text,
                start,
                end,
            }
        })
        .collect();

    Ok(SegmentTimeline {
        segments,
        duration: target_secs,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timing/segment.rs"]
mod tests;

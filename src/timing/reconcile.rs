use serde::Serialize;

use crate::assets::media::MediaAsset;
use crate::config::style::validate_target_duration;
use crate::foundation::core::TimeRange;
use crate::foundation::error::{ReelError, ReelResult};

/// The part of a source clip that fills the output timeline.
///
/// `range` always starts at 0. When the source is at least as long as the target the range is the
/// trim window `[0, target]`; otherwise it is the whole source, repeated with playback position
/// wrapped modulo the source duration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SourceWindow {
    /// Source interval played per pass.
    pub range: TimeRange,
    /// Output duration the window must fill.
    pub target_secs: f64,
}

impl SourceWindow {
    /// Source span used per pass; never exceeds the target.
    pub fn span(&self) -> f64 {
        self.range.span()
    }

    /// `true` when the source has to repeat to fill the target.
    pub fn is_looped(&self) -> bool {
        self.range.span() < self.target_secs
    }

    /// Number of passes over the source, the last one possibly cut short.
    pub fn pass_count(&self) -> u32 {
        if !self.is_looped() {
            return 1;
        }
        let span = self.span();
        let mut n = (self.target_secs / span).ceil().max(1.0) as u32;
        // Division can round up past an exact multiple; drop passes that would start at the end.
        while n > 1 && f64::from(n - 1) * span >= self.target_secs {
            n -= 1;
        }
        n
    }

    /// Zero-based pass containing output time `t`.
    pub fn pass_index_at(&self, t: f64) -> u32 {
        if !self.is_looped() {
            return 0;
        }
        let t = t.clamp(0.0, self.target_secs);
        ((t / self.span()).floor() as u32).min(self.pass_count() - 1)
    }

    /// Source time shown at output time `t`.
    pub fn source_time_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, self.target_secs);
        if self.is_looped() {
            let wrapped = t - f64::from(self.pass_index_at(t)) * self.span();
            self.range.start + wrapped.clamp(0.0, self.span())
        } else {
            self.range.start + t.min(self.span())
        }
    }

    /// Passes in order, each as the source interval it plays and the output interval it covers.
    pub fn passes(&self) -> Vec<WindowPass> {
        let n = self.pass_count();
        let span = self.span();
        (0..n)
            .map(|i| {
                let out_start = f64::from(i) * span;
                let out_end = if i + 1 == n {
                    self.target_secs
                } else {
                    f64::from(i + 1) * span
                };
                let len = (out_end - out_start).max(0.0);
                WindowPass {
                    index: i,
                    source: TimeRange {
                        start: self.range.start,
                        end: self.range.start + len,
                    },
                    output: TimeRange {
                        start: out_start,
                        end: out_end,
                    },
                }
            })
            .collect()
    }
}

/// One repetition of a [`SourceWindow`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WindowPass {
    /// Zero-based pass number.
    pub index: u32,
    /// Source interval played during this pass.
    pub source: TimeRange,
    /// Output interval covered by this pass.
    pub output: TimeRange,
}

/// Where the output audio comes from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AudioPlan {
    /// The caller-supplied background track.
    External {
        /// The audio asset.
        asset: MediaAsset,
        /// Trim/loop window over the track.
        window: SourceWindow,
    },
    /// The background video's own audio stream.
    Native {
        /// Trim/loop window, identical to the video window.
        window: SourceWindow,
    },
    /// No audio source; a silent track is written.
    Silence,
}

impl AudioPlan {
    /// `true` when a real audio source feeds the output.
    pub fn has_source(&self) -> bool {
        !matches!(self, Self::Silence)
    }
}

/// Reconciled timing for one render.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DurationPlan {
    /// Output duration in seconds.
    pub target_secs: f64,
    /// Background video asset.
    pub video: MediaAsset,
    /// Trim/loop window over the background video.
    pub video_window: SourceWindow,
    /// Audio source and its window.
    pub audio: AudioPlan,
}

/// Trim or loop a source of `source_secs` to fill `target_secs`, always starting at 0.
pub fn plan_window(source_secs: f64, target_secs: f64) -> ReelResult<SourceWindow> {
    validate_target_duration(target_secs)?;
    if !source_secs.is_finite() || source_secs <= 0.0 {
        return Err(ReelError::missing_asset(format!(
            "source duration must be a positive finite number of seconds, got {source_secs}"
        )));
    }
    let end = source_secs.min(target_secs);
    Ok(SourceWindow {
        range: TimeRange { start: 0.0, end },
        target_secs,
    })
}

/// Compute video and audio windows for a render.
pub fn reconcile(
    video: Option<&MediaAsset>,
    audio: Option<&MediaAsset>,
    target_secs: f64,
) -> ReelResult<DurationPlan> {
    validate_target_duration(target_secs)?;
    let video = video.ok_or_else(|| ReelError::missing_asset("no video asset supplied"))?;
    let video_window = plan_window(video.duration_secs, target_secs).map_err(|e| match e {
        ReelError::MissingAsset(msg) => {
            ReelError::missing_asset(format!("video '{}': {msg}", video.path.display()))
        }
        other => other,
    })?;

    let external = audio.and_then(|a| match plan_window(a.duration_secs, target_secs) {
        Ok(window) => Some(AudioPlan::External {
            asset: a.clone(),
            window,
        }),
        Err(e) => {
            tracing::warn!(path = %a.path.display(), error = %e, "ignoring unusable audio asset");
            None
        }
    });

    let audio = match external {
        Some(plan) => plan,
        None if video.has_audio => AudioPlan::Native {
            window: video_window,
        },
        None => AudioPlan::Silence,
    };

    Ok(DurationPlan {
        target_secs,
        video: video.clone(),
        video_window,
        audio,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timing/reconcile.rs"]
mod tests;

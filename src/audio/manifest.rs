use crate::assets::media::AudioPcm;
use crate::foundation::core::Fps;
use crate::timing::reconcile::SourceWindow;

/// One loop pass copied onto the output timeline, in sample frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PassSpan {
    /// First output frame of the pass.
    pub(crate) out_start: u64,
    /// Output frame the pass stops before.
    pub(crate) out_end: u64,
    /// Source frame copied to `out_start`.
    pub(crate) src_start: u64,
}

/// Output track plan: the decoded source, the passes that replay it and the closing fade.
#[derive(Clone, Debug)]
pub(crate) struct AudioManifest {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) total_samples: u64,
    /// Interleaved source PCM at `sample_rate` with `channels` channels.
    pub(crate) source: Vec<f32>,
    /// Butt-jointed passes, in timeline order.
    pub(crate) passes: Vec<PassSpan>,
    /// Length of the linear fade-out ending the track.
    pub(crate) tail_fade_samples: u64,
}

impl AudioManifest {
    /// A manifest that mixes to silence.
    pub(crate) fn silent(sample_rate: u32, channels: u16, total_samples: u64) -> Self {
        Self {
            sample_rate,
            channels,
            total_samples,
            source: Vec::new(),
            passes: Vec::new(),
            tail_fade_samples: 0,
        }
    }
}

/// Lay the passes of `window` out on the output timeline over `pcm`, which is taken as decoded at
/// the output rate.
///
/// The last pass runs to `total_samples`; a source that ends early leaves silence behind it.
pub(crate) fn build_audio_manifest(
    window: &SourceWindow,
    pcm: AudioPcm,
    total_samples: u64,
    tail_fade_secs: f64,
) -> AudioManifest {
    let sample_rate = pcm.sample_rate;
    let passes = window.passes();
    let last = passes.len().saturating_sub(1);

    let spans = passes
        .iter()
        .enumerate()
        .filter_map(|(i, pass)| {
            let out_start = secs_to_sample(pass.output.start, sample_rate).min(total_samples);
            let out_end = if i == last {
                total_samples
            } else {
                secs_to_sample(pass.output.end, sample_rate).min(total_samples)
            };
            (out_end > out_start).then(|| PassSpan {
                out_start,
                out_end,
                src_start: secs_to_sample(pass.source.start, sample_rate),
            })
        })
        .collect();

    AudioManifest {
        sample_rate,
        channels: pcm.channels,
        total_samples,
        source: pcm.interleaved_f32,
        passes: spans,
        tail_fade_samples: secs_to_sample(tail_fade_secs, sample_rate).min(total_samples),
    }
}

fn secs_to_sample(secs: f64, sample_rate: u32) -> u64 {
    (secs.max(0.0) * f64::from(sample_rate)).round() as u64
}

/// Convert a frame delta to the nearest sample index at `sample_rate`.
pub(crate) fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

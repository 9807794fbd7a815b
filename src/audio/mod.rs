//! Output audio track: decode, lay out trim/loop passes, normalize, write raw PCM.

pub(crate) mod loudness;
pub(crate) mod manifest;
pub(crate) mod mix;

use std::path::Path;

use crate::assets::media::{AudioPcm, MIX_CHANNELS, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
use crate::config::opts::RenderOpts;
use crate::encode::sink::AudioInputConfig;
use crate::foundation::error::ReelResult;
use crate::timing::reconcile::{AudioPlan, DurationPlan, SourceWindow, plan_window};

use self::loudness::{LoudnessReport, normalize_in_place};
use self::manifest::{AudioManifest, build_audio_manifest};
use self::mix::{clamp_in_place, mix_manifest, write_mix_to_f32le_file};

/// The mixed track handed to the encoder.
#[derive(Debug, Clone)]
pub(crate) struct AudioTrack {
    pub(crate) input: AudioInputConfig,
    /// `false` when the track is generated silence.
    pub(crate) has_source: bool,
    pub(crate) loudness: Option<LoudnessReport>,
}

/// Build the output track described by `plan.audio` and write it to `out_path` as `f32le`.
///
/// `total_samples` is the track length per channel; it follows the video frame count so both
/// streams end together.
pub(crate) fn build_audio_track(
    plan: &DurationPlan,
    total_samples: u64,
    opts: &RenderOpts,
    out_path: &Path,
) -> ReelResult<AudioTrack> {
    let source = match &plan.audio {
        AudioPlan::External { asset, window } => Some((asset.path.clone(), *window)),
        AudioPlan::Native { window } => Some((plan.video.path.clone(), *window)),
        AudioPlan::Silence => None,
    };

    let manifest = match source {
        Some((path, window)) => source_manifest(&path, window, plan.target_secs, total_samples, opts)?,
        None => None,
    };
    let has_source = manifest.is_some();
    let manifest = manifest
        .unwrap_or_else(|| AudioManifest::silent(MIX_SAMPLE_RATE, MIX_CHANNELS, total_samples));

    let mut mixed = mix_manifest(&manifest);
    let loudness = match (&opts.loudness, has_source) {
        (Some(l), true) => {
            let report = normalize_in_place(&mut mixed, manifest.channels, manifest.sample_rate, l);
            tracing::info!(
                measured_lufs = ?report.measured_lufs,
                gain_db = report.gain_db,
                "audio loudness normalized"
            );
            Some(report)
        }
        _ => None,
    };
    clamp_in_place(&mut mixed);
    write_mix_to_f32le_file(&mixed, out_path)?;

    Ok(AudioTrack {
        input: AudioInputConfig {
            path: out_path.to_path_buf(),
            sample_rate: manifest.sample_rate,
            channels: manifest.channels,
        },
        has_source,
        loudness,
    })
}

fn source_manifest(
    path: &Path,
    window: SourceWindow,
    target_secs: f64,
    total_samples: u64,
    opts: &RenderOpts,
) -> ReelResult<Option<AudioManifest>> {
    let pcm = decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)?;
    if pcm.frames() == 0 {
        tracing::warn!(path = %path.display(), "audio source decoded to no samples; writing silence");
        return Ok(None);
    }
    let window = fit_window_to_pcm(window, &pcm, target_secs)?;
    tracing::debug!(
        path = %path.display(),
        passes = window.pass_count(),
        looped = window.is_looped(),
        "audio window"
    );
    Ok(Some(build_audio_manifest(
        &window,
        pcm,
        total_samples,
        opts.audio_tail_fade_secs,
    )))
}

/// Container durations can overstate the decodable audio; loop on what was actually decoded.
fn fit_window_to_pcm(window: SourceWindow, pcm: &AudioPcm, target_secs: f64) -> ReelResult<SourceWindow> {
    let decoded_secs = pcm.frames() as f64 / f64::from(pcm.sample_rate);
    if decoded_secs + 1e-3 < window.span() {
        tracing::debug!(
            probed = window.span(),
            decoded = decoded_secs,
            "audio shorter than probed; replanning window"
        );
        return plan_window(decoded_secs, target_secs);
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_shrinks_to_decoded_length() {
        let window = plan_window(10.0, 15.0).unwrap();
        let pcm = AudioPcm {
            sample_rate: 1000,
            channels: 2,
            interleaved_f32: vec![0.0; 9_500 * 2],
        };
        let fitted = fit_window_to_pcm(window, &pcm, 15.0).unwrap();
        assert!((fitted.span() - 9.5).abs() < 1e-9);
        assert_eq!(fitted.pass_count(), 2);

        let long = AudioPcm {
            sample_rate: 1000,
            channels: 2,
            interleaved_f32: vec![0.0; 10_000 * 2],
        };
        assert_eq!(fit_window_to_pcm(window, &long, 15.0).unwrap(), window);
    }

    #[test]
    fn silence_plan_writes_zeroed_track() {
        use crate::assets::media::MediaAsset;
        let dir = tempfile::tempdir().unwrap();
        let video = MediaAsset::video(dir.path().join("clip.mp4"), 30.0, false);
        let plan = crate::timing::reconcile::reconcile(Some(&video), None, 2.0).unwrap();
        assert_eq!(plan.audio, AudioPlan::Silence);

        let out = dir.path().join("mix.f32le");
        let track = build_audio_track(&plan, 96_000, &RenderOpts::default(), &out).unwrap();
        assert!(!track.has_source);
        assert!(track.loudness.is_none());
        assert_eq!(track.input.sample_rate, 48_000);
        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes.len(), 96_000 * 2 * 4);
        assert!(bytes.iter().all(|&b| b == 0));
    }
}

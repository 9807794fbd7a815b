use super::*;
use crate::foundation::error::ErrorKind;

fn video(secs: f64, has_audio: bool) -> MediaAsset {
    MediaAsset::video("bg.mp4", secs, has_audio)
}

#[test]
fn long_source_is_trimmed_from_zero() {
    let w = plan_window(30.0, 15.0).unwrap();
    assert_eq!(w.range, TimeRange { start: 0.0, end: 15.0 });
    assert!(!w.is_looped());
    assert_eq!(w.pass_count(), 1);
    assert_eq!(w.source_time_at(7.25), 7.25);
}

#[test]
fn equal_length_source_is_not_looped() {
    let w = plan_window(15.0, 15.0).unwrap();
    assert!(!w.is_looped());
    assert_eq!(w.passes().len(), 1);
}

#[test]
fn short_source_loops_with_modulo_playback() {
    // 5s clip into 15s: three full passes.
    let w = plan_window(5.0, 15.0).unwrap();
    assert!(w.is_looped());
    assert_eq!(w.pass_count(), 3);
    assert_eq!(w.pass_index_at(4.99), 0);
    assert_eq!(w.pass_index_at(5.0), 1);
    assert_eq!(w.pass_index_at(15.0), 2);
    assert!((w.source_time_at(11.5) - 1.5).abs() < 1e-12);

    let passes = w.passes();
    assert_eq!(passes.len(), 3);
    let total: f64 = passes.iter().map(|p| p.output.span()).sum();
    assert!((total - 15.0).abs() < 1e-12);
    assert!(passes.iter().all(|p| p.source.start == 0.0));
}

#[test]
fn last_loop_pass_is_cut_short() {
    let w = plan_window(4.0, 10.0).unwrap();
    let passes = w.passes();
    assert_eq!(passes.len(), 3);
    assert_eq!(passes[2].source, TimeRange { start: 0.0, end: 2.0 });
    assert_eq!(passes[2].output, TimeRange { start: 8.0, end: 10.0 });
}

#[test]
fn window_span_never_exceeds_target_and_loops_iff_shorter() {
    let sources = [0.1, 0.5, 1.0, 2.5, 4.999, 5.0, 5.001, 14.9, 15.0, 60.0, 3600.0];
    let targets = [0.04, 1.0, 5.0, 7.3, 15.0, 59.9];
    for &s in &sources {
        for &t in &targets {
            let w = plan_window(s, t).unwrap();
            assert!(w.span() <= t, "span {} > target {t}", w.span());
            assert_eq!(w.is_looped(), s < t, "source {s} target {t}");
            let covered: f64 = w.passes().iter().map(|p| p.output.span()).sum();
            assert!((covered - t).abs() < 1e-9);
        }
    }
}

#[test]
fn non_positive_target_is_invalid_duration() {
    for t in [0.0, -3.0, f64::NAN] {
        let err = plan_window(10.0, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDuration);
        let err = reconcile(Some(&video(10.0, false)), None, t).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDuration);
    }
}

#[test]
fn missing_or_empty_video_is_missing_asset() {
    let err = reconcile(None, None, 15.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingAsset);

    let err = reconcile(Some(&video(0.0, true)), None, 15.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingAsset);
}

#[test]
fn scenario_long_video_short_audio() {
    let audio = MediaAsset::audio("track.mp3", 10.0);
    let plan = reconcile(Some(&video(30.0, true)), Some(&audio), 15.0).unwrap();
    assert_eq!(plan.video_window.range, TimeRange { start: 0.0, end: 15.0 });
    assert!(!plan.video_window.is_looped());
    match &plan.audio {
        AudioPlan::External { window, .. } => {
            assert!(window.is_looped());
            assert_eq!(window.range, TimeRange { start: 0.0, end: 10.0 });
            assert_eq!(window.pass_count(), 2);
        }
        other => panic!("expected external audio, got {other:?}"),
    }
}

#[test]
fn audio_falls_back_to_native_then_silence() {
    let plan = reconcile(Some(&video(5.0, true)), None, 15.0).unwrap();
    assert_eq!(
        plan.audio,
        AudioPlan::Native {
            window: plan.video_window
        }
    );

    let plan = reconcile(Some(&video(5.0, false)), None, 15.0).unwrap();
    assert_eq!(plan.audio, AudioPlan::Silence);
    assert!(!plan.audio.has_source());

    let broken = MediaAsset::audio("broken.mp3", 0.0);
    let plan = reconcile(Some(&video(5.0, true)), Some(&broken), 15.0).unwrap();
    assert!(matches!(plan.audio, AudioPlan::Native { .. }));
}

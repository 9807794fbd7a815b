use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(24, 0).is_err());
    assert_eq!(Fps::new(24, 1).unwrap(), Fps::default());
}

#[test]
fn frames_for_duration_rounds_to_nearest() {
    let fps = Fps::new(24, 1).unwrap();
    assert_eq!(fps.frames_for_duration(15.0), 360);
    assert_eq!(fps.frames_for_duration(0.01), 1);

    let ntsc = Fps::new(30000, 1001).unwrap();
    let n = ntsc.frames_for_duration(10.0);
    let covered = ntsc.frame_time_secs(FrameIndex(n));
    assert!((covered - 10.0).abs() <= ntsc.frame_duration_secs());
}

#[test]
fn time_range_contains_is_half_open() {
    let r = TimeRange::new(1.0, 2.0).unwrap();
    assert!(r.contains(1.0));
    assert!(r.contains(1.5));
    assert!(!r.contains(2.0));
    assert_eq!(r.span(), 1.0);
    assert!(TimeRange::new(2.0, 1.0).is_err());
    assert!(TimeRange::new(f64::NAN, 1.0).is_err());
}

#[test]
fn story_canvas_is_vertical() {
    let c = Canvas::default();
    assert!(c.height > c.width);
    assert_eq!(c.rgba_len(), 1080 * 1920 * 4);
}

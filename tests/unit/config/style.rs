use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn defaults_are_story_format() {
    let s = StyleConfig::default();
    assert_eq!(s.canvas, Canvas::STORY);
    assert_eq!(s.duration_secs, 15.0);
    assert_eq!(s.font_size, 80);
    assert_eq!(s.text_color, Rgb8::WHITE);
    s.validate().unwrap();
}

#[test]
fn duration_is_checked_before_other_fields() {
    let s = StyleConfig::default().with_duration(0.0).with_font_size(0);
    assert_eq!(s.validate().unwrap_err().kind(), ErrorKind::InvalidDuration);

    for bad in [-1.0, f64::NAN, f64::INFINITY] {
        let s = StyleConfig::default().with_duration(bad);
        assert_eq!(s.validate().unwrap_err().kind(), ErrorKind::InvalidDuration);
    }
}

#[test]
fn odd_or_zero_canvas_is_invalid_style() {
    let odd = StyleConfig::default().with_canvas(Canvas {
        width: 1081,
        height: 1920,
    });
    assert_eq!(odd.validate().unwrap_err().kind(), ErrorKind::InvalidStyle);

    let zero = StyleConfig::default().with_font_size(0);
    assert_eq!(zero.validate().unwrap_err().kind(), ErrorKind::InvalidStyle);
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let json = r##"{ "font_size": 64, "text_color": "#ff0000", "h_align": "left" }"##;
    let s = StyleConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(s.font_size, 64);
    assert_eq!(s.text_color, Rgb8::new(255, 0, 0));
    assert_eq!(s.h_align, HAlign::Left);
    assert_eq!(s.v_align, VAlign::Center);
    assert_eq!(s.duration_secs, 15.0);
}

#[test]
fn json_rejects_unknown_fields() {
    let err = StyleConfig::from_reader(r#"{ "fontsize": 64 }"#.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStyle);
}

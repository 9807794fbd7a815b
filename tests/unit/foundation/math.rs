use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(255, 0), 0);
    assert_eq!(mul_div255_u16(200, 128), 100);
}

#[test]
fn db_gain_conversions_are_inverse() {
    for db in [-60.0, -14.0, -1.0, 0.0, 6.0] {
        let back = gain_to_db(db_to_gain(db));
        assert!((back - db).abs() < 1e-9, "{db} -> {back}");
    }
    assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
}

use super::*;

#[test]
fn default_timing() {
    let t = Timing::default();
    assert_eq!(t.debounce_ms, 100);
    assert_eq!(t.repeat_delay_ms, 400);
    assert_eq!(t.repeat_rate_ms, 50);
    assert_eq!(t.key_hold_ms, 50);
    assert_eq!(t.now_playing_timeout_ms, 10_000);
}

#[test]
#[should_panic]
fn repeat_delay_must_exceed_rate() {
    Timing::new(10, 50, 50);
}

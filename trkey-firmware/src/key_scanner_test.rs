extern crate std;

use std::vec::Vec;

use super::*;

use crate::switch_test_stub::{key_pins, Pin};

fn timing() -> KeyTiming {
    (&Timing::default()).into()
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

/// Hold a key from `from` to `to` ms sampling every 10 ms; returns the times edges fired.
fn hold(timer: &mut KeyTimer, from: u64, to: u64, exempt: bool) -> Vec<(u64, KeyEdge)> {
    let timing = timing();
    (from..=to)
        .step_by(10)
        .filter_map(|t| timer.update(true, at(t), exempt, &timing).map(|e| (t, e)))
        .collect()
}

#[test]
fn press_and_release() {
    let timing = timing();
    let mut timer = KeyTimer::default();

    assert_eq!(timer.update(false, at(1000), false, &timing), None);
    assert_eq!(
        timer.update(true, at(1000), false, &timing),
        Some(KeyEdge::Press)
    );
    assert!(timer.is_pressed());
    assert!(timer.is_repeating());
    assert_eq!(timer.update(true, at(1010), false, &timing), None);
    assert_eq!(
        timer.update(false, at(1200), false, &timing),
        Some(KeyEdge::Release)
    );
    assert!(!timer.is_pressed());
    assert!(!timer.is_repeating());
}

#[test]
fn bounces_inside_window_are_ignored() {
    let timing = timing();
    let mut timer = KeyTimer::default();

    assert_eq!(
        timer.update(true, at(1000), false, &timing),
        Some(KeyEdge::Press)
    );
    assert_eq!(timer.update(false, at(1010), false, &timing), None);
    assert_eq!(timer.update(true, at(1020), false, &timing), None);
    assert_eq!(timer.update(false, at(1090), false, &timing), None);
    assert!(timer.is_pressed());
    assert_eq!(
        timer.update(false, at(1100), false, &timing),
        Some(KeyEdge::Release)
    );
    // a quick re-press is also a bounce
    assert_eq!(timer.update(true, at(1150), false, &timing), None);
    assert_eq!(
        timer.update(true, at(1200), false, &timing),
        Some(KeyEdge::Press)
    );
}

#[test]
fn repeat_after_delay_at_rate() {
    let mut timer = KeyTimer::default();
    let edges = hold(&mut timer, 1000, 1700, false);

    assert_eq!(edges[0], (1000, KeyEdge::Press));
    // first repeat strictly after 400 ms, then strictly more than 50 ms apart
    let repeats: Vec<u64> = edges[1..]
        .iter()
        .map(|(t, e)| {
            assert_eq!(*e, KeyEdge::Repeat);
            *t
        })
        .collect();
    assert_eq!(repeats[0], 1410);
    for w in repeats.windows(2) {
        assert!(w[1] - w[0] > 50);
    }
    assert_eq!(repeats, [1410, 1470, 1530, 1590, 1650]);
}

#[test]
fn exempt_key_never_repeats() {
    let mut timer = KeyTimer::default();
    let edges = hold(&mut timer, 1000, 3000, true);
    assert_eq!(edges, [(1000, KeyEdge::Press)]);

    let timing = timing();
    assert_eq!(
        timer.update(false, at(3010), true, &timing),
        Some(KeyEdge::Release)
    );
}

#[test]
fn scanner_reads_active_low() {
    let (pins, keys) = key_pins();
    let mut scanner = KeyScanner::new(pins, &Timing::default());

    assert_eq!(scanner.poll_key(4, at(1000), false), None);
    keys[4].press();
    assert_eq!(scanner.poll_key(3, at(1000), false), None);
    assert_eq!(scanner.poll_key(4, at(1000), false), Some(KeyEdge::Press));
    assert!(scanner.timer(4).is_pressed());

    keys[4].release();
    assert_eq!(scanner.poll_key(4, at(1200), false), Some(KeyEdge::Release));
}

#[test]
fn unreadable_pin_counts_as_up() {
    let (pins, keys) = key_pins();
    let mut scanner = KeyScanner::new(pins, &Timing::default());

    keys[0].break_line();
    assert_eq!(scanner.poll_key(0, at(1000), false), None);
    assert!(!scanner.timer(0).is_pressed());
}

#[test]
fn layer_button_fires_once_per_press() {
    let pin = Pin::default();
    let mut button = LayerButton::new(pin.clone());

    assert!(!button.poll());
    pin.press();
    assert!(button.poll());
    assert!(!button.poll());
    pin.release();
    assert!(!button.poll());
    pin.press();
    assert!(button.poll());
}

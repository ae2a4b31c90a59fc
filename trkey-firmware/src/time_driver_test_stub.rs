//! Fake clock for host tests.
//!
//! Each test thread has its own clock. It reads real time until [`set_time`] is called; after
//! that time only moves through [`advance_ms`] or when a timer is scheduled, which jumps the
//! clock straight to the deadline (plus the configured lag).

extern crate std;

use core::{cell::RefCell, task::Waker};
use embassy_time_driver::Driver;
use std::time::SystemTime;

struct TestTimeDriver;

#[derive(Clone, Copy)]
struct Clock {
    /// Microseconds; 0 means follow the system clock.
    now: u64,
    wait_lag: u64,
}

impl Driver for TestTimeDriver {
    fn now(&self) -> u64 {
        CLOCK.with_borrow(|clock| {
            if clock.now == 0 {
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map(|d| d.as_micros() as u64)
                    .unwrap_or(1)
            } else {
                clock.now
            }
        })
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        CLOCK.with_borrow_mut(|clock| {
            if clock.now != 0 && at > clock.now {
                clock.now = at + clock.wait_lag;
            }
        });

        waker.wake_by_ref();
    }
}

std::thread_local! {
    static CLOCK: RefCell<Clock> = const { RefCell::new(Clock { now: 0, wait_lag: 0 }) };
}

embassy_time_driver::time_driver_impl!(static TIME_DRIVER: TestTimeDriver = TestTimeDriver);

/// Freeze the clock at `t` microseconds.
pub fn set_time(t: u64) {
    CLOCK.with_borrow_mut(|clock| clock.now = t);
}

/// Extra microseconds added whenever a timer wakes.
pub fn set_wait_lag(t: u64) {
    CLOCK.with_borrow_mut(|clock| clock.wait_lag = t);
}

pub fn advance_ms(ms: u64) {
    CLOCK.with_borrow_mut(|clock| clock.now += ms * 1000);
}

/// Freeze the clock at a fixed, non-zero start time.
pub fn start_clock() {
    set_time(1_000_000);
    set_wait_lag(0);
}

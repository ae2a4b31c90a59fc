pub const DEBOUNCE_MS_DEFAULT: u32 = 100;
pub const REPEAT_DELAY_MS_DEFAULT: u32 = 400;
pub const REPEAT_RATE_MS_DEFAULT: u32 = 50;
pub const KEY_HOLD_MS_DEFAULT: u32 = 50;
pub const PRESS_HIGHLIGHT_MS_DEFAULT: u32 = 300;
pub const NOW_PLAYING_TIMEOUT_MS_DEFAULT: u32 = 10_000;
pub const TICK_MS_DEFAULT: u32 = 10;
pub const LAYER_BUTTON_SETTLE_MS_DEFAULT: u32 = 200;

/// Tunable timings, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Minimum time between two accepted level changes of one key.
    pub debounce_ms: u32,
    /// How long a key must be held before it starts repeating.
    pub repeat_delay_ms: u32,
    /// Minimum gap between two repeats.
    pub repeat_rate_ms: u32,
    /// How long combo and single keys are held down before release.
    pub key_hold_ms: u32,
    /// How long the display highlights the last pressed key.
    pub press_highlight_ms: u32,
    /// How long the now-playing view stays up after the last update.
    pub now_playing_timeout_ms: u32,
    pub tick_ms: u32,
    pub layer_button_settle_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(
            DEBOUNCE_MS_DEFAULT,
            REPEAT_DELAY_MS_DEFAULT,
            REPEAT_RATE_MS_DEFAULT,
        )
    }
}

impl Timing {
    /// Timings with the given key timing and defaults for everything else. A repeat delay that is
    /// not longer than the repeat rate would remove the pause before auto-repeat, so it panics.
    pub const fn new(debounce_ms: u32, repeat_delay_ms: u32, repeat_rate_ms: u32) -> Self {
        assert!(repeat_delay_ms > repeat_rate_ms);
        Self {
            debounce_ms,
            repeat_delay_ms,
            repeat_rate_ms,
            key_hold_ms: KEY_HOLD_MS_DEFAULT,
            press_highlight_ms: PRESS_HIGHLIGHT_MS_DEFAULT,
            now_playing_timeout_ms: NOW_PLAYING_TIMEOUT_MS_DEFAULT,
            tick_ms: TICK_MS_DEFAULT,
            layer_button_settle_ms: LAYER_BUTTON_SETTLE_MS_DEFAULT,
        }
    }
}

#[cfg(test)]
#[path = "globals_test.rs"]
mod test;

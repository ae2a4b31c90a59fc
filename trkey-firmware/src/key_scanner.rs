use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use trkey_common::{globals::Timing, KEY_COUNT};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEdge {
    Press,
    /// Auto-repeat while held; acts like another press.
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyTiming {
    pub debounce: Duration,
    pub repeat_delay: Duration,
    pub repeat_rate: Duration,
}

impl From<&Timing> for KeyTiming {
    fn from(timing: &Timing) -> Self {
        Self {
            debounce: Duration::from_millis(timing.debounce_ms as u64),
            repeat_delay: Duration::from_millis(timing.repeat_delay_ms as u64),
            repeat_rate: Duration::from_millis(timing.repeat_rate_ms as u64),
        }
    }
}

/// Debounce and auto-repeat state of one key.
#[derive(Debug, Clone, Copy)]
pub struct KeyTimer {
    pressed: bool,
    repeat_active: bool,
    repeat_start: Instant,
    repeat_last: Instant,
    /// When the last level change was accepted.
    last_change: Option<Instant>,
}

impl Default for KeyTimer {
    fn default() -> Self {
        Self {
            pressed: false,
            repeat_active: false,
            repeat_start: Instant::MIN,
            repeat_last: Instant::MIN,
            last_change: None,
        }
    }
}

impl KeyTimer {
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_active
    }

    /// Feed the current level of the key. A change is ignored until `debounce` has passed since
    /// the previous accepted change. Keys with `repeat_exempt` set never repeat.
    pub fn update(
        &mut self,
        down: bool,
        now: Instant,
        repeat_exempt: bool,
        timing: &KeyTiming,
    ) -> Option<KeyEdge> {
        if down != self.pressed {
            if let Some(last) = self.last_change {
                if now.saturating_duration_since(last) < timing.debounce {
                    return None;
                }
            }
            self.pressed = down;
            self.last_change = Some(now);
            if down {
                self.repeat_start = now;
                self.repeat_last = now;
                self.repeat_active = true;
                Some(KeyEdge::Press)
            } else {
                self.repeat_active = false;
                Some(KeyEdge::Release)
            }
        } else if down
            && self.repeat_active
            && !repeat_exempt
            && now.saturating_duration_since(self.repeat_start) > timing.repeat_delay
            && now.saturating_duration_since(self.repeat_last) > timing.repeat_rate
        {
            self.repeat_last = now;
            Some(KeyEdge::Repeat)
        } else {
            None
        }
    }
}

/// The nine key switches, wired active-low.
pub struct KeyScanner<I: InputPin> {
    pins: [I; KEY_COUNT],
    timers: [KeyTimer; KEY_COUNT],
    timing: KeyTiming,
}

impl<I: InputPin> KeyScanner<I> {
    pub fn new(pins: [I; KEY_COUNT], timing: &Timing) -> Self {
        Self {
            pins,
            timers: [KeyTimer::default(); KEY_COUNT],
            timing: timing.into(),
        }
    }

    /// Sample key `key` and report an edge if one fires.
    pub fn poll_key(&mut self, key: usize, now: Instant, repeat_exempt: bool) -> Option<KeyEdge> {
        let down = self.pins[key].is_low().unwrap_or(false);
        self.timers[key].update(down, now, repeat_exempt, &self.timing)
    }

    pub fn timer(&self, key: usize) -> &KeyTimer {
        &self.timers[key]
    }
}

/// The button that cycles through the layers.
pub struct LayerButton<I: InputPin> {
    pin: I,
    was_down: bool,
}

impl<I: InputPin> LayerButton<I> {
    pub fn new(pin: I) -> Self {
        Self {
            pin,
            was_down: false,
        }
    }

    /// True once per press (high to low transition).
    pub fn poll(&mut self) -> bool {
        let down = self.pin.is_low().unwrap_or(false);
        let pressed = down && !self.was_down;
        self.was_down = down;
        pressed
    }
}

#[cfg(test)]
#[path = "key_scanner_test.rs"]
mod test;

use embassy_time::{Duration, Instant};
use heapless::String;
use serde::{Deserialize, Serialize};

/// Room for the longest field once its escapes are decoded.
const UNESCAPE_LEN: usize = 128;

/// What the host says is playing. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub title: String<96>,
    pub artist: String<96>,
    /// Seconds.
    pub position: u32,
    /// Seconds.
    pub duration: u32,
    pub source: String<32>,
}

/// The now-playing record and whether its view is up.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    track: Track,
    visible: bool,
    last_update: Instant,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self {
            track: Track::default(),
            visible: false,
            last_update: Instant::MIN,
        }
    }
}

impl NowPlaying {
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Replace the record from a JSON object and show it. On error nothing changes.
    pub fn set_json(&mut self, json: &[u8], now: Instant) -> Result<(), serde_json_core::de::Error> {
        let mut scratch = [0; UNESCAPE_LEN];
        let (track, _) = serde_json_core::from_slice_escaped::<Track>(json, &mut scratch)?;
        self.track = track;
        self.visible = true;
        self.last_update = now;
        Ok(())
    }

    /// Hide the view. The record is kept for `NP_GET`.
    pub fn clear(&mut self) {
        self.visible = false;
    }

    pub fn to_json(&self, buf: &mut [u8]) -> Result<usize, serde_json_core::ser::Error> {
        serde_json_core::to_slice(&self.track, buf)
    }

    /// True while visible and no more than `timeout` has passed since the last update.
    pub fn is_showing(&self, now: Instant, timeout: Duration) -> bool {
        self.visible && now.saturating_duration_since(self.last_update) <= timeout
    }

    /// Hide the view once it has timed out. Returns true on the call that hid it.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> bool {
        if self.visible && !self.is_showing(now, timeout) {
            self.visible = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "now_playing_test.rs"]
mod test;

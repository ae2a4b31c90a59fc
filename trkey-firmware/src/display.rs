//! Frames for the renderer.
//!
//! The engine decides when the screen changes and publishes an owned [`Frame`] through a
//! [`FrameSignal`]. Whatever drives the panel waits on the signal and draws the latest frame.

use core::fmt::Write;

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, signal::Signal};
use heapless::String;
use trkey_common::KEY_COUNT;

use crate::{layers::LayerSet, now_playing::Track};

pub const NOW_PLAYING_HEADER: &str = "Now Playing (Beta)";
pub const LINE_CHARS: usize = 20;
pub const SOURCE_CHARS: usize = 8;
pub const CELL_CHARS: usize = 5;

pub type Line = String<96>;
pub type Cell = String<24>;

pub type FrameSignal = Signal<NoopRawMutex, Frame>;

#[derive(Debug, Clone, PartialEq)]
pub struct LayerView {
    /// `Layer: <name> (<n>/<count>)`
    pub title: String<48>,
    pub cells: [Cell; KEY_COUNT],
    /// Key to highlight.
    pub pressed: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingView {
    pub header: &'static str,
    pub title: Line,
    pub artist: Line,
    /// `m:ss/m:ss <source>`
    pub progress: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Layer(LayerView),
    NowPlaying(NowPlayingView),
}

impl Frame {
    pub fn layer(layers: &LayerSet, index: usize, pressed: Option<usize>) -> Self {
        let layer = layers.layer(index);
        let mut title = String::new();
        let _ = write!(
            title,
            "Layer: {} ({}/{})",
            layer.name,
            index.min(layers.len() - 1) + 1,
            layers.len()
        );

        let cells = core::array::from_fn(|i| cell(layer.label(i)));
        Frame::Layer(LayerView {
            title,
            cells,
            pressed,
        })
    }

    pub fn now_playing(track: &Track) -> Self {
        let mut progress: Line = String::new();
        let _ = write!(
            progress,
            "{}/{} ",
            Seconds(track.position),
            Seconds(track.duration)
        );
        let source: Line = truncate(&track.source, SOURCE_CHARS);
        let _ = progress.push_str(&source);

        Frame::NowPlaying(NowPlayingView {
            header: NOW_PLAYING_HEADER,
            title: truncate(&track.title, LINE_CHARS),
            artist: truncate(&track.artist, LINE_CHARS),
            progress: truncate(progress.trim(), LINE_CHARS),
        })
    }
}

struct Seconds(u32);

impl core::fmt::Display for Seconds {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// `text` if it is at most `max` chars, otherwise its first `max - 1` chars and `…`.
pub fn truncate<const N: usize>(text: &str, max: usize) -> String<N> {
    let mut out = String::new();
    if text.chars().count() <= max {
        let _ = out.push_str(text);
        return out;
    }
    for c in text.chars().take(max.saturating_sub(1)) {
        if out.push(c).is_err() {
            break;
        }
    }
    let _ = out.push('…');
    out
}

/// `[label]` with the label cut to five chars and centred; odd padding goes on the left.
fn cell(label: &str) -> Cell {
    let label = match label.char_indices().nth(CELL_CHARS) {
        Some((i, _)) => &label[..i],
        None => label,
    };
    let pad = CELL_CHARS - label.chars().count();
    let left = pad / 2 + (pad & 1);

    let mut out = Cell::new();
    let _ = out.push('[');
    for _ in 0..left {
        let _ = out.push(' ');
    }
    let _ = out.push_str(label);
    for _ in 0..pad - left {
        let _ = out.push(' ');
    }
    let _ = out.push(']');
    out
}

#[cfg(test)]
#[path = "display_test.rs"]
mod test;

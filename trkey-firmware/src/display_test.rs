use heapless::Vec;

use crate::layers::{Layer, MacroTable};

use super::*;

fn layer_set() -> LayerSet {
    let mut layer = Layer::default();
    layer.name.push_str("Media").unwrap();
    for (i, label) in ["Play", "a", "ab", "abcd", "Volume Up", "", "abc", "ünï", "x"]
        .iter()
        .enumerate()
    {
        layer.labels[i].push_str(label).unwrap();
    }
    let mut layers = Vec::new();
    layers.push(layer.clone()).unwrap();
    layers.push(Layer::error()).unwrap();
    LayerSet::new(layers, MacroTable::default()).unwrap()
}

#[test]
fn layer_frame() {
    let Frame::Layer(view) = Frame::layer(&layer_set(), 0, Some(4)) else {
        panic!("expected layer view");
    };
    assert_eq!(view.title, "Layer: Media (1/2)");
    assert_eq!(view.pressed, Some(4));
    let cells: [&str; 9] = core::array::from_fn(|i| view.cells[i].as_str());
    assert_eq!(
        cells,
        [
            "[ Play]", "[  a  ]", "[  ab ]", "[ abcd]", "[Volum]", "[     ]", "[ abc ]",
            "[ ünï ]", "[  x  ]"
        ]
    );
}

#[test]
fn second_layer_title() {
    let Frame::Layer(view) = Frame::layer(&layer_set(), 1, None) else {
        panic!("expected layer view");
    };
    assert_eq!(view.title, "Layer: ERROR (2/2)");
    assert_eq!(view.cells[0], "[ ERR ]");
}

#[test]
fn now_playing_frame() {
    let track = Track {
        title: String::try_from("A Very Long Song Title Indeed").unwrap(),
        artist: String::try_from("Band").unwrap(),
        position: 65,
        duration: 3601,
        source: String::try_from("Spotify Desktop").unwrap(),
    };
    let Frame::NowPlaying(view) = Frame::now_playing(&track) else {
        panic!("expected now playing view");
    };
    assert_eq!(view.header, "Now Playing (Beta)");
    assert_eq!(view.title, "A Very Long Song Ti…");
    assert_eq!(view.artist, "Band");
    // "1:05/60:01 Spotify…" is 19 chars
    assert_eq!(view.progress, "1:05/60:01 Spotify…");
}

#[test]
fn now_playing_without_source() {
    let Frame::NowPlaying(view) = Frame::now_playing(&Track::default()) else {
        panic!("expected now playing view");
    };
    assert_eq!(view.title, "");
    assert_eq!(view.progress, "0:00/0:00");
}

#[test]
fn truncation() {
    assert_eq!(truncate::<32>("exactly twenty chars", 20), "exactly twenty chars");
    assert_eq!(truncate::<32>("twenty one characters", 20), "twenty one characte…");
    assert_eq!(truncate::<32>("abc", 1), "…");
}

#[test]
fn signal_carries_latest_frame() {
    let signal = FrameSignal::new();
    signal.signal(Frame::layer(&layer_set(), 0, None));
    signal.signal(Frame::layer(&layer_set(), 1, None));
    let Some(Frame::Layer(view)) = signal.try_take() else {
        panic!("expected layer view");
    };
    assert_eq!(view.title, "Layer: ERROR (2/2)");
    assert!(signal.try_take().is_none());
}

use heapless::{String, Vec};
use trkey_common::KEY_COUNT;

use crate::key_scanner::KeyEdge;

pub const MAX_LAYERS: usize = 8;
pub const MAX_MACROS: usize = 16;
pub const MAX_MACRO_LEN: usize = 128;

pub type LayerName = String<24>;
pub type KeyToken = String<32>;
pub type KeyLabel = String<16>;
pub type MacroSequence = String<MAX_MACRO_LEN>;

/// One page of the key map: a token and a display label per physical key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub name: LayerName,
    pub keys: [KeyToken; KEY_COUNT],
    pub labels: [KeyLabel; KEY_COUNT],
}

impl Layer {
    /// Shown when the layer file is missing or unusable.
    pub fn error() -> Self {
        let mut layer = Layer::default();
        let _ = layer.name.push_str("ERROR");
        for label in layer.labels.iter_mut() {
            let _ = label.push_str("ERR");
        }
        layer
    }

    pub fn key(&self, index: usize) -> &str {
        self.keys.get(index).map(|k| k.as_str()).unwrap_or("")
    }

    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(|k| k.as_str()).unwrap_or("")
    }
}

/// What `MACRO_<id>` runs.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroBody {
    /// A `+` combo such as `CTRL+ALT+T`, or text typed as is.
    Sequence(MacroSequence),
    /// Steps run in order, one per line.
    Steps(MacroSequence),
}

impl MacroBody {
    /// `None` if `sequence` is too long.
    pub fn sequence(sequence: &str) -> Option<Self> {
        MacroSequence::try_from(sequence).ok().map(Self::Sequence)
    }

    /// The steps of a step list; a sequence is a single step.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        let (text, single) = match self {
            Self::Sequence(s) => (s.as_str(), true),
            Self::Steps(s) => (s.as_str(), false),
        };
        text.split(move |c: char| !single && c == '\n')
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroTable {
    entries: Vec<(u16, MacroBody), MAX_MACROS>,
}

impl MacroTable {
    pub fn get(&self, id: u16) -> Option<&MacroBody> {
        self.entries
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, body)| body)
    }

    /// Add or replace macro `id`. Returns false if the table is full.
    pub fn insert(&mut self, id: u16, body: MacroBody) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(i, _)| *i == id) {
            entry.1 = body;
            true
        } else {
            self.entries.push((id, body)).is_ok()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The loaded key map. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    layers: Vec<Layer, MAX_LAYERS>,
    macros: MacroTable,
}

impl LayerSet {
    pub fn new(layers: Vec<Layer, MAX_LAYERS>, macros: MacroTable) -> Option<Self> {
        if layers.is_empty() {
            None
        } else {
            Some(Self { layers, macros })
        }
    }

    /// A single `ERROR` layer with no macros.
    pub fn fallback() -> Self {
        let mut layers = Vec::new();
        let _ = layers.push(Layer::error());
        Self {
            layers,
            macros: MacroTable::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Layer `index`, or the last layer if `index` is past the end.
    pub fn layer(&self, index: usize) -> &Layer {
        &self.layers[index.min(self.layers.len() - 1)]
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayerFnKind {
    /// Active while the key is held.
    Mo,
    /// Switch to the layer.
    To,
    /// Switch to the layer, or back to the default layer if already there.
    Tt,
    /// Make the layer the default and switch to it.
    Df,
}

impl LayerFnKind {
    pub fn from_name(name: &str) -> Option<Self> {
        [("MO", Self::Mo), ("TO", Self::To), ("TT", Self::Tt), ("DF", Self::Df)]
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, k)| k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Momentary {
    saved: usize,
    target: usize,
}

/// Which layer is showing, which is the default, and the momentary overrides held per key.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    current: usize,
    default: usize,
    momentary: [Option<Momentary>; KEY_COUNT],
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            current: 0,
            default: 0,
            momentary: [None; KEY_COUNT],
        }
    }
}

fn clamp(target: i32, len: usize) -> usize {
    target.clamp(0, len.max(1) as i32 - 1) as usize
}

impl LayerState {
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn default_layer(&self) -> usize {
        self.default
    }

    pub fn is_momentary(&self, key: usize) -> bool {
        self.momentary[key].is_some()
    }

    pub fn momentary_target(&self, key: usize) -> Option<usize> {
        self.momentary[key].map(|m| m.target)
    }

    /// Run a layer function bound to `key`. Returns true if the current or default layer changed.
    /// Only presses and the release of a held `MO` have an effect.
    pub fn apply(
        &mut self,
        kind: LayerFnKind,
        target: i32,
        key: usize,
        edge: KeyEdge,
        len: usize,
    ) -> bool {
        let before = (self.current, self.default);
        let target = clamp(target, len);

        match (kind, edge) {
            (LayerFnKind::Mo, KeyEdge::Press) => {
                let saved = match self.momentary[key] {
                    Some(m) => m.saved,
                    None => self.current,
                };
                self.momentary[key] = Some(Momentary { saved, target });
                self.current = target;
            }
            (LayerFnKind::Mo, KeyEdge::Release) => return self.release(key, len),
            (LayerFnKind::To, KeyEdge::Press) => self.current = target,
            (LayerFnKind::Tt, KeyEdge::Press) => {
                self.current = if self.current != target {
                    target
                } else {
                    self.default
                };
            }
            (LayerFnKind::Df, KeyEdge::Press) => {
                self.default = target;
                self.current = target;
            }
            _ => {}
        }

        (self.current, self.default) != before
    }

    /// End the momentary override held by `key`, restoring the layer saved when it was pressed.
    pub fn release(&mut self, key: usize, len: usize) -> bool {
        match self.momentary[key].take() {
            Some(m) => {
                let before = self.current;
                self.current = clamp(m.saved as i32, len);
                self.current != before
            }
            None => false,
        }
    }

    /// Step to the next layer, wrapping to the first.
    pub fn cycle(&mut self, len: usize) {
        self.current = (self.current + 1) % len.max(1);
    }

    /// Reset any index that no longer fits a layer set of `len` layers to 0.
    pub fn clamp_to(&mut self, len: usize) {
        if self.current >= len {
            self.current = 0;
        }
        if self.default >= len {
            self.default = 0;
        }
        for m in self.momentary.iter_mut().flatten() {
            if m.saved >= len {
                m.saved = 0;
            }
            if m.target >= len {
                m.target = 0;
            }
        }
    }

    /// Back to layer 0 with nothing held.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "layers_test.rs"]
mod test;

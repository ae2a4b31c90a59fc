//! Loading the key map from `layers.json`.
//!
//! ```json
//! { "grid_size": 3,
//!   "layers": [
//!     { "name": "Media", "keys": ["PLAY_PAUSE", "MO(1)", ...], "labels": ["Play", ...],
//!       "macros": [{ "id": 1, "sequence": "CTRL+ALT+T" }] } ] }
//! ```
//!
//! A `grid_size` that is not an integer in 2..=5 is taken as 3. Key and label arrays are cut to
//! `grid_size²` entries and then fitted to the nine physical keys. Only the first layer's `macros`
//! are used. A macro is a `sequence` string or a `steps` array; `steps` wins if both are given.
//! Unknown fields are ignored.
//!
//! Over-long labels and layer names are cut short. Over-long key tokens are blanked and over-long
//! macros dropped, so one bad entry does not lose the rest of the file.

use core::fmt;

use heapless::{String, Vec};
use serde::{
    de::{self, IgnoredAny, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use trkey_common::{protocol::LAYERS_FILE, KEY_COUNT};

use crate::{
    fs::{FileReader, FileStore, FsError},
    info,
    layers::{
        Layer, LayerName, LayerSet, MacroBody, MacroSequence, MacroTable, MAX_LAYERS, MAX_MACRO_LEN,
    },
    warn,
};

/// Largest `layers.json` that can be loaded.
pub const MAX_FILE_LEN: usize = 8192;

const DEFAULT_GRID_SIZE: usize = 3;
const DEFAULT_LAYER_NAME: &str = "Layer";
/// Room for the longest string once its escapes are decoded.
const UNESCAPE_LEN: usize = 256;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Missing,
    Fs(FsError),
    Json(serde_json_core::de::Error),
    Empty,
}

impl From<FsError> for ConfigError {
    fn from(value: FsError) -> Self {
        match value {
            FsError::FileNotFound => Self::Missing,
            err => Self::Fs(err),
        }
    }
}

impl From<serde_json_core::de::Error> for ConfigError {
    fn from(value: serde_json_core::de::Error) -> Self {
        Self::Json(value)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("layers.json not found"),
            Self::Fs(err) => f.write_str(err.as_str()),
            Self::Json(err) => write!(f, "invalid layers.json: {}", err),
            Self::Empty => f.write_str("layers[] is empty"),
        }
    }
}

/// Read and parse `layers.json`. `buf` must hold the whole file.
pub fn load_layers(fs: &dyn FileStore, buf: &mut [u8]) -> Result<LayerSet, ConfigError> {
    let mut reader = FileReader::open(fs, LAYERS_FILE)?;
    let json = reader.read_to_end(buf)?;
    parse_layers(json)
}

pub fn parse_layers(json: &[u8]) -> Result<LayerSet, ConfigError> {
    let grid_size = grid_size(json);
    let mut scratch = [0; UNESCAPE_LEN];
    let (file, _) = serde_json_core::from_slice_escaped::<LayerFile>(json, &mut scratch)?;

    let used = (grid_size * grid_size).min(KEY_COUNT);

    let LayerList { mut layers, macros } = file.layers;
    for layer in layers.iter_mut() {
        for i in used..KEY_COUNT {
            layer.keys[i].clear();
            layer.labels[i].clear();
        }
    }

    let set = LayerSet::new(layers, macros).ok_or(ConfigError::Empty)?;
    info!(
        "loaded {}: layers={} grid={}",
        LAYERS_FILE,
        set.len(),
        grid_size
    );
    Ok(set)
}

/// `grid_size` if it is an integer in 2..=5. Read in its own pass so a value of any other
/// type falls back to the default instead of failing the file.
fn grid_size(json: &[u8]) -> usize {
    #[derive(Deserialize)]
    struct GridOnly {
        #[serde(default)]
        grid_size: Option<i32>,
    }

    let mut scratch = [0; UNESCAPE_LEN];
    match serde_json_core::from_slice_escaped::<GridOnly>(json, &mut scratch) {
        Ok((GridOnly { grid_size: Some(n @ 2..=5) }, _)) => n as usize,
        _ => DEFAULT_GRID_SIZE,
    }
}

#[derive(Deserialize)]
struct LayerFile {
    layers: LayerList,
}

#[derive(Deserialize)]
struct RawLayer {
    #[serde(default)]
    name: Option<Clipped<24>>,
    #[serde(default)]
    keys: Padded<32>,
    #[serde(default)]
    labels: Padded<16>,
    #[serde(default)]
    macros: MacroList,
}

impl RawLayer {
    fn into_layer(self) -> Layer {
        let name = match self.name {
            Some(name) => name.shortened("layer name"),
            None => LayerName::try_from(DEFAULT_LAYER_NAME).unwrap_or_default(),
        };
        Layer {
            name,
            keys: self.keys.0.map(|key| {
                if key.clipped {
                    warn!("key token {} too long; left blank", key.text.as_str());
                    String::new()
                } else {
                    key.text
                }
            }),
            labels: self.labels.0.map(|label| label.shortened("label")),
        }
    }
}

#[derive(Deserialize)]
struct RawMacro {
    #[serde(default)]
    id: Option<u16>,
    #[serde(default)]
    sequence: Option<Clipped<MAX_MACRO_LEN>>,
    #[serde(default)]
    steps: Option<StepList>,
}

impl RawMacro {
    /// `None` if the macro does not fit.
    fn body(self) -> Option<MacroBody> {
        if let Some(StepList(steps)) = self.steps {
            return steps.map(MacroBody::Steps);
        }
        match self.sequence {
            Some(sequence) if sequence.clipped => None,
            Some(sequence) => Some(MacroBody::Sequence(sequence.text)),
            None => Some(MacroBody::Sequence(MacroSequence::new())),
        }
    }
}

/// A string cut to its first `N` bytes at a character boundary.
#[derive(Default)]
struct Clipped<const N: usize> {
    text: String<N>,
    clipped: bool,
}

impl<const N: usize> Clipped<N> {
    fn shortened(self, what: &str) -> String<N> {
        if self.clipped {
            warn!("{} cut to {:?}", what, self.text.as_str());
        }
        self.text
    }
}

impl<'de, const N: usize> Deserialize<'de> for Clipped<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ClippedVisitor<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for ClippedVisitor<N> {
            type Value = Clipped<N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let mut clipped = Clipped::default();
                for c in v.chars() {
                    if clipped.text.push(c).is_err() {
                        clipped.clipped = true;
                        break;
                    }
                }
                Ok(clipped)
            }
        }

        deserializer.deserialize_str(ClippedVisitor::<N>)
    }
}

/// The first nine strings of an array; missing entries are empty.
struct Padded<const N: usize>([Clipped<N>; KEY_COUNT]);

impl<const N: usize> Default for Padded<N> {
    fn default() -> Self {
        Self(core::array::from_fn(|_| Clipped::default()))
    }
}

impl<'de, const N: usize> Deserialize<'de> for Padded<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PaddedVisitor<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for PaddedVisitor<N> {
            type Value = Padded<N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of strings")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut padded = Padded::default();
                for slot in padded.0.iter_mut() {
                    match seq.next_element()? {
                        Some(s) => *slot = s,
                        None => return Ok(padded),
                    }
                }
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(padded)
            }
        }

        deserializer.deserialize_seq(PaddedVisitor::<N>)
    }
}

/// A `steps` array stored one step per line. `None` if it does not fit.
struct StepList(Option<MacroSequence>);

impl<'de> Deserialize<'de> for StepList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StepListVisitor;

        impl<'de> Visitor<'de> for StepListVisitor {
            type Value = StepList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of steps")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut steps = MacroSequence::new();
                let mut fits = true;
                let mut first = true;
                while let Some(step) = seq.next_element::<Clipped<MAX_MACRO_LEN>>()? {
                    fits = fits
                        && !step.clipped
                        && !step.text.contains('\n')
                        && (first || steps.push('\n').is_ok())
                        && steps.push_str(&step.text).is_ok();
                    first = false;
                }
                Ok(StepList(fits.then_some(steps)))
            }
        }

        deserializer.deserialize_seq(StepListVisitor)
    }
}

#[derive(Default)]
struct MacroList(MacroTable);

impl<'de> Deserialize<'de> for MacroList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MacroListVisitor;

        impl<'de> Visitor<'de> for MacroListVisitor {
            type Value = MacroList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of macros")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut table = MacroTable::default();
                while let Some(m) = seq.next_element::<RawMacro>()? {
                    let Some(id) = m.id else {
                        warn!("macro without id ignored");
                        continue;
                    };
                    let Some(body) = m.body() else {
                        warn!("macro {} ignored: sequence too long", id);
                        continue;
                    };
                    if !table.insert(id, body) {
                        warn!("macro {} ignored: table full", id);
                    }
                }
                Ok(MacroList(table))
            }
        }

        deserializer.deserialize_seq(MacroListVisitor)
    }
}

/// Layers converted as they are parsed, so only one raw layer is held at a time.
struct LayerList {
    layers: Vec<Layer, MAX_LAYERS>,
    macros: MacroTable,
}

impl<'de> Deserialize<'de> for LayerList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LayerListVisitor;

        impl<'de> Visitor<'de> for LayerListVisitor {
            type Value = LayerList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of layers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut list = LayerList {
                    layers: Vec::new(),
                    macros: MacroTable::default(),
                };
                while list.layers.len() < MAX_LAYERS {
                    let Some(mut raw) = seq.next_element::<RawLayer>()? else {
                        return Ok(list);
                    };
                    if list.layers.is_empty() {
                        list.macros = core::mem::take(&mut raw.macros.0);
                    }
                    let _ = list.layers.push(raw.into_layer());
                }
                let mut dropped = 0;
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    dropped += 1;
                }
                if dropped != 0 {
                    warn!("{} layers past {} ignored", dropped, MAX_LAYERS);
                }
                Ok(list)
            }
        }

        deserializer.deserialize_seq(LayerListVisitor)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod test;

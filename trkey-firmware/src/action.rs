use heapless::{String, Vec};
use trkey_common::keycodes::{app_fallback, consumer_code, key_code};

use crate::layers::{LayerFnKind, MacroTable};

pub const MAX_COMBO_KEYS: usize = 6;
/// Longest pause a `DELAY_<ms>` macro step may ask for.
pub const MAX_DELAY_MS: u32 = 10_000;

pub const MOUSE_LEFT: u8 = 1;
pub const MOUSE_RIGHT: u8 = 2;
pub const MOUSE_MIDDLE: u8 = 4;

pub type KeyCombo = Vec<u8, MAX_COMBO_KEYS>;
pub type CompanionName = String<32>;

/// What a key token asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<'a> {
    NoOp,
    LayerFn { kind: LayerFnKind, target: i32 },
    Consumer(u16),
    MacroRef(u16),
    /// An `APP_` action for the host companion, with a consumer code to send locally.
    Companion {
        name: CompanionName,
        fallback: Option<u16>,
    },
    /// Keys pressed together then released together.
    Combo(KeyCombo),
    SingleKey(u8),
    /// Text typed a character at a time. Only produced by macro bodies.
    LiteralText(&'a str),
    Mouse(MouseAction),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MouseAction {
    /// Press and release a [`MOUSE_LEFT`]/[`MOUSE_RIGHT`]/[`MOUSE_MIDDLE`] button mask.
    Click(u8),
    Move { x: i8, y: i8 },
    Scroll { wheel: i8, pan: i8 },
}

/// One entry of a macro step list.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroStep<'a> {
    /// Pause for this many milliseconds.
    Delay(u32),
    Output(Action<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolveError {
    UnknownKey,
    BadLayerFunction,
    MissingMacro(u16),
    ComboTooLong,
    BadMouseAction,
    BadDelay,
    /// Layer functions and macro references cannot be macro steps.
    NotAStep,
}

/// Turn a key token from the layer file into an [`Action`].
///
/// Tried in order: no-op, layer function `MO(n)`/`TO(n)`/`TT(n)`/`DF(n)`, `MOUSE_` action,
/// consumer name, `MACRO_<id>`, `APP_<name>`, underscore combo such as `CONTROL_C`, then a plain
/// key name. Names are case-insensitive.
pub fn resolve<'a>(token: &str, macros: &MacroTable) -> Result<Action<'a>, ResolveError> {
    let token = token.trim();
    if token.is_empty() || token.eq_ignore_ascii_case("NO_OP") {
        return Ok(Action::NoOp);
    }

    let bad_layer_fn = match parse_layer_fn(token) {
        Some(Ok((kind, target))) => return Ok(Action::LayerFn { kind, target }),
        Some(Err(())) => true,
        None => false,
    };

    if let Some(rest) = strip_prefix_ignore_case(token, "MOUSE_") {
        return parse_mouse(rest)
            .map(Action::Mouse)
            .ok_or(ResolveError::BadMouseAction);
    }

    if let Some(code) = consumer_code(token) {
        return Ok(Action::Consumer(code));
    }

    if let Some(id) = strip_prefix_ignore_case(token, "MACRO_").and_then(|id| id.parse().ok()) {
        return match macros.get(id) {
            Some(_) => Ok(Action::MacroRef(id)),
            None => Err(ResolveError::MissingMacro(id)),
        };
    }

    if strip_prefix_ignore_case(token, "APP_").is_some() {
        let mut name = CompanionName::new();
        for c in token.chars() {
            if name.push(c.to_ascii_uppercase()).is_err() {
                break;
            }
        }
        let fallback = app_fallback(&name);
        return Ok(Action::Companion { name, fallback });
    }

    if token.contains('_') {
        if let Some(keys) = parse_combo(token)? {
            return Ok(match keys.as_slice() {
                [key] => Action::SingleKey(*key),
                _ => Action::Combo(keys),
            });
        }
    }

    if let Some(code) = key_code(token) {
        return Ok(Action::SingleKey(code));
    }

    Err(if bad_layer_fn {
        ResolveError::BadLayerFunction
    } else {
        ResolveError::UnknownKey
    })
}

/// A macro body containing `+` is a combo of key names (`CTRL+ALT+T`); anything else is typed.
pub fn resolve_macro_body(sequence: &str) -> Result<Action<'_>, ResolveError> {
    let sequence = sequence.trim();
    if !sequence.contains('+') {
        return Ok(Action::LiteralText(sequence));
    }

    let mut keys = KeyCombo::new();
    for name in sequence.split('+').map(str::trim).filter(|n| !n.is_empty()) {
        let code = key_code(name).ok_or(ResolveError::UnknownKey)?;
        keys.push(code).map_err(|_| ResolveError::ComboTooLong)?;
    }
    Ok(Action::Combo(keys))
}

/// A step of a macro step list: `DELAY_<ms>`, a `+` combo, any key token except layer
/// functions and macros, or text to type.
pub fn resolve_step(step: &str) -> Result<MacroStep<'_>, ResolveError> {
    let trimmed = step.trim();
    if let Some(ms) = strip_prefix_ignore_case(trimmed, "DELAY_") {
        let ms: u32 = ms.parse().map_err(|_| ResolveError::BadDelay)?;
        return Ok(MacroStep::Delay(ms.min(MAX_DELAY_MS)));
    }
    if trimmed.contains('+') {
        return resolve_macro_body(trimmed).map(MacroStep::Output);
    }

    match resolve(trimmed, &MacroTable::default()) {
        Ok(Action::LayerFn { .. }) | Err(ResolveError::MissingMacro(_)) => {
            Err(ResolveError::NotAStep)
        }
        Ok(action) => Ok(MacroStep::Output(action)),
        Err(ResolveError::UnknownKey) => Ok(MacroStep::Output(Action::LiteralText(step))),
        Err(err) => Err(err),
    }
}

/// `LEFT_CLICK`, `RIGHT_CLICK`, `MIDDLE_CLICK`, `MOVE_<x>_<y>` or `SCROLL_<wheel>_<pan>`.
/// Amounts are clamped to ±127.
fn parse_mouse(rest: &str) -> Option<MouseAction> {
    for (name, button) in [
        ("LEFT_CLICK", MOUSE_LEFT),
        ("RIGHT_CLICK", MOUSE_RIGHT),
        ("MIDDLE_CLICK", MOUSE_MIDDLE),
    ] {
        if rest.eq_ignore_ascii_case(name) {
            return Some(MouseAction::Click(button));
        }
    }

    if let Some(args) = strip_prefix_ignore_case(rest, "MOVE_") {
        let (x, y) = parse_pair(args)?;
        return Some(MouseAction::Move { x, y });
    }
    let (wheel, pan) = parse_pair(strip_prefix_ignore_case(rest, "SCROLL_")?)?;
    Some(MouseAction::Scroll { wheel, pan })
}

fn parse_pair(args: &str) -> Option<(i8, i8)> {
    let (a, b) = args.split_once('_')?;
    let amount = |s: &str| s.trim().parse::<i32>().ok().map(|n| n.clamp(-127, 127) as i8);
    Some((amount(a)?, amount(b)?))
}

fn strip_prefix_ignore_case<'t>(token: &'t str, prefix: &str) -> Option<&'t str> {
    let head = token.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &token[prefix.len()..])
}

/// `Some(Err)` for something that names a layer function but has a bad target.
fn parse_layer_fn(token: &str) -> Option<Result<(LayerFnKind, i32), ()>> {
    let (name, rest) = token.split_once('(')?;
    let kind = LayerFnKind::from_name(name.trim())?;
    let Some(arg) = rest.trim_end().strip_suffix(')') else {
        return Some(Err(()));
    };
    Some(arg.trim().parse().map(|target| (kind, target)).map_err(|_| ()))
}

/// Split on `_` and match the longest run of parts that names a key, so `LEFT_SHIFT_A` is
/// `[LEFT_SHIFT, A]`. `None` if some part does not resolve.
fn parse_combo(token: &str) -> Result<Option<KeyCombo>, ResolveError> {
    let mut parts: Vec<&str, 16> = Vec::new();
    for part in token.split('_').filter(|p| !p.is_empty()) {
        if parts.push(part).is_err() {
            return Ok(None);
        }
    }

    let mut keys = KeyCombo::new();
    let mut i = 0;
    while i < parts.len() {
        let Some((code, next)) = (i + 1..=parts.len())
            .rev()
            .find_map(|j| joined_key_code(&parts[i..j]).map(|code| (code, j)))
        else {
            return Ok(None);
        };
        keys.push(code).map_err(|_| ResolveError::ComboTooLong)?;
        i = next;
    }

    Ok(if keys.is_empty() { None } else { Some(keys) })
}

fn joined_key_code(parts: &[&str]) -> Option<u8> {
    let mut name: String<32> = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i != 0 {
            name.push('_').ok()?;
        }
        name.push_str(part).ok()?;
    }
    key_code(&name)
}

#[cfg(test)]
#[path = "action_test.rs"]
mod test;

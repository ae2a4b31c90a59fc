use trkey_common::keycodes::consumer;

use crate::{kc, layers::MacroBody};

use super::*;

fn no_macros() -> MacroTable {
    MacroTable::default()
}

fn combo(keys: &[u8]) -> Action<'static> {
    Action::Combo(KeyCombo::from_slice(keys).unwrap())
}

#[test]
fn no_op() {
    assert_eq!(resolve("", &no_macros()), Ok(Action::NoOp));
    assert_eq!(resolve("  ", &no_macros()), Ok(Action::NoOp));
    assert_eq!(resolve("NO_OP", &no_macros()), Ok(Action::NoOp));
    assert_eq!(resolve("no_op", &no_macros()), Ok(Action::NoOp));
}

#[test]
fn layer_functions() {
    let m = no_macros();
    assert_eq!(
        resolve("MO(1)", &m),
        Ok(Action::LayerFn {
            kind: LayerFnKind::Mo,
            target: 1
        })
    );
    assert_eq!(
        resolve("to( 2 )", &m),
        Ok(Action::LayerFn {
            kind: LayerFnKind::To,
            target: 2
        })
    );
    assert_eq!(
        resolve(" TT (0)", &m),
        Ok(Action::LayerFn {
            kind: LayerFnKind::Tt,
            target: 0
        })
    );
    assert_eq!(
        resolve("DF(-1)", &m),
        Ok(Action::LayerFn {
            kind: LayerFnKind::Df,
            target: -1
        })
    );
}

#[test]
fn malformed_layer_functions() {
    let m = no_macros();
    assert_eq!(resolve("MO(x)", &m), Err(ResolveError::BadLayerFunction));
    assert_eq!(resolve("TO(1", &m), Err(ResolveError::BadLayerFunction));
    assert_eq!(resolve("XX(1)", &m), Err(ResolveError::UnknownKey));
}

#[test]
fn consumer_names() {
    let m = no_macros();
    assert_eq!(
        resolve("PLAY_PAUSE", &m),
        Ok(Action::Consumer(consumer::PLAY_PAUSE))
    );
    assert_eq!(
        resolve("volume_increment", &m),
        Ok(Action::Consumer(consumer::VOLUME_INCREMENT))
    );
}

#[test]
fn macro_refs() {
    let mut m = no_macros();
    m.insert(3, MacroBody::sequence("hello").unwrap());
    assert_eq!(resolve("MACRO_3", &m), Ok(Action::MacroRef(3)));
    assert_eq!(resolve("macro_3", &m), Ok(Action::MacroRef(3)));
    assert_eq!(resolve("MACRO_4", &m), Err(ResolveError::MissingMacro(4)));
    assert_eq!(resolve("MACRO_X", &m), Err(ResolveError::UnknownKey));
}

#[test]
fn companion_actions() {
    let m = no_macros();
    assert_eq!(
        resolve("app_next", &m),
        Ok(Action::Companion {
            name: CompanionName::try_from("APP_NEXT").unwrap(),
            fallback: Some(consumer::SCAN_NEXT_TRACK),
        })
    );
    assert_eq!(
        resolve("APP_OPEN_TERMINAL", &m),
        Ok(Action::Companion {
            name: CompanionName::try_from("APP_OPEN_TERMINAL").unwrap(),
            fallback: None,
        })
    );
}

#[test]
fn underscore_combos() {
    let m = no_macros();
    assert_eq!(resolve("CONTROL_C", &m), Ok(combo(&[kc!("CONTROL"), kc!("C")])));
    assert_eq!(
        resolve("LEFT_SHIFT_A", &m),
        Ok(combo(&[kc!("LEFT_SHIFT"), kc!("A")]))
    );
    assert_eq!(
        resolve("ctrl_alt_delete", &m),
        Ok(combo(&[kc!("CTRL"), kc!("ALT"), kc!("DELETE")]))
    );
    assert_eq!(
        resolve("CMD_SHIFT_PAGE_UP", &m),
        Ok(combo(&[kc!("GUI"), kc!("SHIFT"), kc!("PAGE_UP")]))
    );
}

#[test]
fn underscore_name_of_one_key() {
    let m = no_macros();
    assert_eq!(resolve("UP_ARROW", &m), Ok(Action::SingleKey(0x52)));
    assert_eq!(resolve("LEFT_SHIFT", &m), Ok(Action::SingleKey(0xe1)));
}

#[test]
fn combo_with_unknown_part() {
    let m = no_macros();
    assert_eq!(resolve("CONTROL_NOPE", &m), Err(ResolveError::UnknownKey));
}

#[test]
fn combo_too_long() {
    let m = no_macros();
    assert_eq!(resolve("A_B_C_D_E_F_G", &m), Err(ResolveError::ComboTooLong));
    assert_eq!(
        resolve("A_B_C_D_E_F", &m),
        Ok(combo(&[
            kc!("A"),
            kc!("B"),
            kc!("C"),
            kc!("D"),
            kc!("E"),
            kc!("F")
        ]))
    );
}

#[test]
fn single_keys() {
    let m = no_macros();
    assert_eq!(resolve("A", &m), Ok(Action::SingleKey(0x04)));
    assert_eq!(resolve("enter", &m), Ok(Action::SingleKey(0x28)));
    assert_eq!(resolve("F13", &m), Ok(Action::SingleKey(0x68)));
    assert_eq!(resolve("ctrl", &m), Ok(Action::SingleKey(0xe0)));
    assert_eq!(resolve("BANANA", &m), Err(ResolveError::UnknownKey));
}

#[test]
fn macro_bodies() {
    assert_eq!(
        resolve_macro_body(" hello world "),
        Ok(Action::LiteralText("hello world"))
    );
    assert_eq!(
        resolve_macro_body("control+alt+t"),
        Ok(combo(&[kc!("CONTROL"), kc!("ALT"), kc!("T")]))
    );
    assert_eq!(
        resolve_macro_body("CMD + SPACE"),
        Ok(combo(&[kc!("GUI"), kc!("SPACE")]))
    );
    assert_eq!(
        resolve_macro_body("ctrl+wibble"),
        Err(ResolveError::UnknownKey)
    );
    assert_eq!(
        resolve_macro_body("a+b+c+d+e+f+g"),
        Err(ResolveError::ComboTooLong)
    );
}

#[test]
fn mouse_actions() {
    let m = no_macros();
    assert_eq!(
        resolve("MOUSE_LEFT_CLICK", &m),
        Ok(Action::Mouse(MouseAction::Click(MOUSE_LEFT)))
    );
    assert_eq!(
        resolve("mouse_right_click", &m),
        Ok(Action::Mouse(MouseAction::Click(MOUSE_RIGHT)))
    );
    assert_eq!(
        resolve("MOUSE_MIDDLE_CLICK", &m),
        Ok(Action::Mouse(MouseAction::Click(MOUSE_MIDDLE)))
    );
    assert_eq!(
        resolve("MOUSE_MOVE_-10_25", &m),
        Ok(Action::Mouse(MouseAction::Move { x: -10, y: 25 }))
    );
    assert_eq!(
        resolve("MOUSE_SCROLL_-3_0", &m),
        Ok(Action::Mouse(MouseAction::Scroll { wheel: -3, pan: 0 }))
    );
    assert_eq!(
        resolve("MOUSE_MOVE_500_-500", &m),
        Ok(Action::Mouse(MouseAction::Move { x: 127, y: -127 }))
    );
}

#[test]
fn malformed_mouse_actions() {
    let m = no_macros();
    assert_eq!(resolve("MOUSE_MOVE_10", &m), Err(ResolveError::BadMouseAction));
    assert_eq!(resolve("MOUSE_MOVE_a_b", &m), Err(ResolveError::BadMouseAction));
    assert_eq!(resolve("MOUSE_FOURTH_CLICK", &m), Err(ResolveError::BadMouseAction));
}

#[test]
fn macro_steps() {
    assert_eq!(resolve_step("DELAY_250"), Ok(MacroStep::Delay(250)));
    assert_eq!(resolve_step("delay_99999"), Ok(MacroStep::Delay(MAX_DELAY_MS)));
    assert_eq!(resolve_step("DELAY_soon"), Err(ResolveError::BadDelay));
    assert_eq!(
        resolve_step("CTRL+C"),
        Ok(MacroStep::Output(combo(&[kc!("CTRL"), kc!("C")])))
    );
    assert_eq!(
        resolve_step("ENTER"),
        Ok(MacroStep::Output(Action::SingleKey(0x28)))
    );
    assert_eq!(
        resolve_step("MUTE"),
        Ok(MacroStep::Output(Action::Consumer(consumer::MUTE)))
    );
    assert_eq!(
        resolve_step("MOUSE_LEFT_CLICK"),
        Ok(MacroStep::Output(Action::Mouse(MouseAction::Click(MOUSE_LEFT))))
    );
    assert_eq!(
        resolve_step("git status"),
        Ok(MacroStep::Output(Action::LiteralText("git status")))
    );
    assert_eq!(resolve_step("MO(1)"), Err(ResolveError::NotAStep));
    assert_eq!(resolve_step("MACRO_2"), Err(ResolveError::NotAStep));
}

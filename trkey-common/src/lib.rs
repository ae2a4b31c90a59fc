#![no_std]
pub mod globals;
pub mod keycodes;
pub mod protocol;

/// Number of physical keys on the pad. Fixed regardless of the configured grid size.
pub const KEY_COUNT: usize = 9;

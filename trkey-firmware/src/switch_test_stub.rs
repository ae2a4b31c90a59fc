extern crate std;

use core::cell::Cell;
use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin};
use std::rc::Rc;

#[derive(Debug)]
pub struct TestError;

impl Error for TestError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    High,
    Low,
    Broken,
}

/// A pulled-up input with a switch to ground. Clones share the same line.
#[derive(Debug, Clone)]
pub struct Pin(Rc<Cell<Level>>);

impl Default for Pin {
    fn default() -> Self {
        Self(Rc::new(Cell::new(Level::High)))
    }
}

impl Pin {
    pub fn press(&self) {
        self.0.set(Level::Low);
    }

    pub fn release(&self) {
        self.0.set(Level::High);
    }

    /// Make reads fail until the next press or release.
    pub fn break_line(&self) {
        self.0.set(Level::Broken);
    }
}

impl ErrorType for Pin {
    type Error = TestError;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        match self.0.get() {
            Level::Broken => Err(TestError),
            level => Ok(level == Level::High),
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        match self.0.get() {
            Level::Broken => Err(TestError),
            level => Ok(level == Level::Low),
        }
    }
}

/// Nine key pins plus the handles a test uses to drive them.
pub fn key_pins() -> ([Pin; 9], [Pin; 9]) {
    let pins: [Pin; 9] = core::array::from_fn(|_| Pin::default());
    let handles = pins.clone();
    (pins, handles)
}

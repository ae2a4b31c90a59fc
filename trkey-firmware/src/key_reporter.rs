use embassy_time::{Duration, Timer};
use trkey_common::keycodes::{char_to_key, key_range};

use crate::{
    add_key_bit,
    hid::{
        OutputError, ReportWriter, CONSUMER_REPORT_ID, KEYBOARD_REPORT_ID, MAX_REPORT_LEN,
        MOUSE_REPORT_ID,
    },
    warn,
};

/// Builds NKRO keyboard, consumer and mouse reports and sends them to `W`.
///
/// Every operation that presses keys ends by sending a report with them released, even when
/// an earlier write failed.
pub struct Reporter<W: ReportWriter> {
    writer: W,
    keyboard_report: [u8; MAX_REPORT_LEN],
}

impl<W: ReportWriter> Reporter<W> {
    pub fn new(writer: W) -> Self {
        let mut keyboard_report = [0; MAX_REPORT_LEN];
        keyboard_report[0] = KEYBOARD_REPORT_ID;
        Self {
            writer,
            keyboard_report,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    async fn write_keyboard_report(&mut self) -> Result<(), OutputError> {
        self.writer.write_report(&self.keyboard_report).await
    }

    async fn write_consumer_report(&mut self, code: u16) -> Result<(), OutputError> {
        let [lo, hi] = code.to_le_bytes();
        self.writer
            .write_report(&[CONSUMER_REPORT_ID, lo, hi])
            .await
    }

    /// Press each key in order (one report per key), hold, then release them all.
    pub async fn tap_keys(&mut self, keys: &[u8], hold: Duration) -> Result<(), OutputError> {
        let mut result = Ok(());
        for key in keys {
            self.add_key(*key);
            if result.is_ok() {
                result = self.write_keyboard_report().await;
            }
        }
        if result.is_ok() {
            Timer::after(hold).await;
        }
        let released = self.release_all().await;
        result.and(released)
    }

    /// Send `code` then an empty consumer report.
    pub async fn consumer_pulse(&mut self, code: u16) -> Result<(), OutputError> {
        let pressed = self.write_consumer_report(code).await;
        let released = self.write_consumer_report(0).await;
        pressed.and(released)
    }

    /// Press mouse `buttons` (bit 0 left, 1 right, 2 middle) then release them.
    pub async fn mouse_click(&mut self, buttons: u8) -> Result<(), OutputError> {
        let pressed = self.write_mouse_report(buttons, [0; 4]).await;
        let released = self.write_mouse_report(0, [0; 4]).await;
        pressed.and(released)
    }

    /// One relative pointer report: `[x, y, wheel, pan]`.
    pub async fn mouse_move(&mut self, motion: [i8; 4]) -> Result<(), OutputError> {
        self.write_mouse_report(0, motion).await
    }

    async fn write_mouse_report(&mut self, buttons: u8, motion: [i8; 4]) -> Result<(), OutputError> {
        let mut report = [MOUSE_REPORT_ID, buttons, 0, 0, 0, 0];
        for (byte, m) in report[2..].iter_mut().zip(motion) {
            *byte = m as u8;
        }
        self.writer.write_report(&report).await
    }

    /// Type `text` on a US layout. Characters with no key are skipped. Stops at the first
    /// failed write.
    pub async fn type_text(&mut self, text: &str) -> Result<(), OutputError> {
        for c in text.chars() {
            let Some(stroke) = char_to_key(c) else {
                warn!("cannot type {:?}", c);
                continue;
            };
            if stroke.shift {
                self.add_key(key_range::LEFT_SHIFT);
            }
            self.add_key(stroke.code);
            let pressed = self.write_keyboard_report().await;
            let released = self.release_all().await;
            pressed.and(released)?;
        }
        Ok(())
    }

    pub async fn release_all(&mut self) -> Result<(), OutputError> {
        self.keyboard_report[1..].fill(0);
        self.write_keyboard_report().await
    }

    fn add_key(&mut self, key: u8) {
        if key_range::is_modifier(key) {
            self.keyboard_report[1] |= 1 << (key - key_range::MODIFIER_MIN);
        } else if key >= key_range::BASIC_MIN {
            add_key_bit(&mut self.keyboard_report[2..], key);
        }
    }
}

#[cfg(test)]
#[path = "key_reporter_test.rs"]
mod test;

use embassy_usb::driver::{Endpoint, EndpointError, EndpointIn};

pub const KEYBOARD_REPORT_ID: u8 = 6;
pub const CONSUMER_REPORT_ID: u8 = 4;
pub const MOUSE_REPORT_ID: u8 = 2;

/// Size of the largest report: id, modifiers and a bitmap of all 256 usages.
pub const MAX_REPORT_LEN: usize = crate::KEY_BITS_SIZE + 2;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    BufferOverflow,
    Disabled,
}

impl From<EndpointError> for OutputError {
    fn from(value: EndpointError) -> Self {
        match value {
            EndpointError::BufferOverflow => OutputError::BufferOverflow,
            EndpointError::Disabled => OutputError::Disabled,
        }
    }
}

/// Where finished HID input reports go.
#[allow(async_fn_in_trait)]
pub trait ReportWriter {
    async fn write_report(&mut self, report: &[u8]) -> Result<(), OutputError>;
}

#[rustfmt::skip]
pub const REPORT_DESCRIPTOR: [u8; 59 + 25 + 73] = [
    // NKRO keyboard, report id 6: modifier byte then one bit per usage
    0x05, 0x01, // USAGE_PAGE (Generic Desktop)
    0x09, 0x06, // USAGE (Keyboard)
    0xA1, 0x01, // COLLECTION (Application)
    0x85, 0x06, //   REPORT_ID (6)
    0x05, 0x07, //   USAGE_PAGE (Keyboard/Keypad)
    0x19, 0xE0, //   USAGE_MINIMUM (Left Control)
    0x29, 0xE7, //   USAGE_MAXIMUM (Right GUI)
    0x15, 0x00, //   LOGICAL_MINIMUM (0)
    0x25, 0x01, //   LOGICAL_MAXIMUM (1)
    0x95, 0x08, //   REPORT_COUNT (8)
    0x75, 0x01, //   REPORT_SIZE (1)
    0x81, 0x02, //   INPUT (Data,Var,Abs)
    0x05, 0x07, //   USAGE_PAGE (Keyboard/Keypad)
    0x19, 0x00, //   USAGE_MINIMUM (0)
    0x29, 0xFE, //   USAGE_MAXIMUM (254)
    0x15, 0x00, //   LOGICAL_MINIMUM (0)
    0x25, 0x01, //   LOGICAL_MAXIMUM (1)
    0x95, 0xFF, //   REPORT_COUNT (255)
    0x75, 0x01, //   REPORT_SIZE (1)
    0x81, 0x02, //   INPUT (Data,Var,Abs)
    0x05, 0x08, //   USAGE_PAGE (LEDs)
    0x19, 0x01, //   USAGE_MINIMUM (Num Lock)
    0x29, 0x05, //   USAGE_MAXIMUM (Kana)
    0x95, 0x05, //   REPORT_COUNT (5)
    0x75, 0x01, //   REPORT_SIZE (1)
    0x91, 0x02, //   OUTPUT (Data,Var,Abs)
    0x95, 0x01, //   REPORT_COUNT (1)
    0x75, 0x03, //   REPORT_SIZE (3)
    0x91, 0x01, //   OUTPUT (Const)
    0xC0,       // END_COLLECTION

    // Consumer control, report id 4: one 16 bit usage
    0x05, 0x0C, // USAGE_PAGE (Consumer)
    0x09, 0x01, // USAGE (Consumer Control)
    0xA1, 0x01, // COLLECTION (Application)
    0x85, 0x04, //   REPORT_ID (4)
    0x19, 0x01, //   USAGE_MINIMUM (1)
    0x2A, 0xA0, 0x02, // USAGE_MAXIMUM (0x2a0)
    0x15, 0x01, //   LOGICAL_MINIMUM (1)
    0x26, 0xA0, 0x02, // LOGICAL_MAXIMUM (0x2a0)
    0x95, 0x01, //   REPORT_COUNT (1)
    0x75, 0x10, //   REPORT_SIZE (16)
    0x81, 0x00, //   INPUT (Data,Array,Abs)
    0xC0,       // END_COLLECTION

    // Mouse, report id 2: buttons, then relative x, y, wheel and pan
    0x05, 0x01, // USAGE_PAGE (Generic Desktop)
    0x09, 0x02, // USAGE (Mouse)
    0xA1, 0x01, // COLLECTION (Application)
    0x85, 0x02, //   REPORT_ID (2)
    0x09, 0x01, //   USAGE (Pointer)
    0xA1, 0x00, //   COLLECTION (Physical)
    0x05, 0x09, //     USAGE_PAGE (Button)
    0x19, 0x01, //     USAGE_MINIMUM (Button 1)
    0x29, 0x08, //     USAGE_MAXIMUM (Button 8)
    0x15, 0x00, //     LOGICAL_MINIMUM (0)
    0x25, 0x01, //     LOGICAL_MAXIMUM (1)
    0x95, 0x08, //     REPORT_COUNT (8)
    0x75, 0x01, //     REPORT_SIZE (1)
    0x81, 0x02, //     INPUT (Data,Var,Abs)
    0x05, 0x01, //     USAGE_PAGE (Generic Desktop)
    0x09, 0x30, //     USAGE (X)
    0x09, 0x31, //     USAGE (Y)
    0x15, 0x81, //     LOGICAL_MINIMUM (-127)
    0x25, 0x7F, //     LOGICAL_MAXIMUM (127)
    0x95, 0x02, //     REPORT_COUNT (2)
    0x75, 0x08, //     REPORT_SIZE (8)
    0x81, 0x06, //     INPUT (Data,Var,Rel)
    0x09, 0x38, //     USAGE (Wheel)
    0x15, 0x81, //     LOGICAL_MINIMUM (-127)
    0x25, 0x7F, //     LOGICAL_MAXIMUM (127)
    0x95, 0x01, //     REPORT_COUNT (1)
    0x75, 0x08, //     REPORT_SIZE (8)
    0x81, 0x06, //     INPUT (Data,Var,Rel)
    0x05, 0x0C, //     USAGE_PAGE (Consumer)
    0x0A, 0x38, 0x02, // USAGE (AC Pan)
    0x15, 0x81, //     LOGICAL_MINIMUM (-127)
    0x25, 0x7F, //     LOGICAL_MAXIMUM (127)
    0x95, 0x01, //     REPORT_COUNT (1)
    0x75, 0x08, //     REPORT_SIZE (8)
    0x81, 0x06, //     INPUT (Data,Var,Rel)
    0xC0,       //   END_COLLECTION
    0xC0,       // END_COLLECTION
];

/// Writes input reports to a HID interrupt IN endpoint, splitting them into packets.
pub struct HidWriter<E: EndpointIn, const N: usize> {
    ep_in: E,
}

impl<E: EndpointIn, const N: usize> HidWriter<E, N> {
    pub fn new(ep_in: E) -> Self {
        Self { ep_in }
    }

    pub async fn write(&mut self, report: &[u8]) -> Result<(), EndpointError> {
        if report.len() > N {
            return Err(EndpointError::BufferOverflow);
        }

        let max_packet_size = usize::from(self.ep_in.info().max_packet_size);
        let zlp_needed = report.len() < N && report.len() % max_packet_size == 0;
        for chunk in report.chunks(max_packet_size) {
            self.ep_in.write(chunk).await?;
        }

        if zlp_needed {
            self.ep_in.write(&[]).await?;
        }

        Ok(())
    }
}

impl<E: EndpointIn, const N: usize> ReportWriter for HidWriter<E, N> {
    async fn write_report(&mut self, report: &[u8]) -> Result<(), OutputError> {
        Ok(self.write(report).await?)
    }
}

#[cfg(test)]
#[path = "hid_test.rs"]
mod test;

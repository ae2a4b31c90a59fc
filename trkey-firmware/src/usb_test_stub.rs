extern crate std;
use core::cell::{Cell, RefCell};
use embassy_usb::driver::{
    Endpoint, EndpointAddress, EndpointError, EndpointIn, EndpointInfo, EndpointType,
};
use std::rc::Rc;
use std::vec::Vec;

use crate::hid::{HidWriter, MAX_REPORT_LEN};

/// Shared record of the packets an endpoint was asked to send.
#[derive(Clone, Default)]
pub struct Packets(Rc<RefCell<Vec<Vec<u8>>>>);
impl Packets {
    pub fn take(&self) -> Vec<Vec<u8>> {
        self.0.take()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Vec<u8>> {
        self.0.borrow().last().cloned()
    }
}

pub struct TestEndpointIn {
    pub packets: Packets,
    /// While set every write fails with [`EndpointError::Disabled`] and is not recorded.
    pub disabled: Rc<Cell<bool>>,
    pub info: EndpointInfo,
}
impl Endpoint for TestEndpointIn {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    async fn wait_enabled(&mut self) {}
}
impl EndpointIn for TestEndpointIn {
    async fn write(&mut self, buf: &[u8]) -> Result<(), EndpointError> {
        if self.disabled.get() {
            return Err(EndpointError::Disabled);
        }
        self.packets.0.borrow_mut().push(Vec::from(buf));
        Ok(())
    }
}
impl TestEndpointIn {
    pub fn with_packet_size(max_packet_size: u16) -> Self {
        Self {
            packets: Packets::default(),
            disabled: Rc::new(Cell::new(false)),
            info: EndpointInfo {
                addr: EndpointAddress::from(0x81),
                ep_type: EndpointType::Interrupt,
                max_packet_size,
                interval_ms: 1,
            },
        }
    }
}
impl Default for TestEndpointIn {
    fn default() -> Self {
        Self::with_packet_size(64)
    }
}

pub type TestHidWriter = HidWriter<TestEndpointIn, MAX_REPORT_LEN>;

/// A HID writer over a fresh endpoint plus handles to inspect and break it.
pub fn test_hid_writer() -> (TestHidWriter, Packets, Rc<Cell<bool>>) {
    let ep_in = TestEndpointIn::default();
    let packets = ep_in.packets.clone();
    let disabled = ep_in.disabled.clone();
    (HidWriter::new(ep_in), packets, disabled)
}

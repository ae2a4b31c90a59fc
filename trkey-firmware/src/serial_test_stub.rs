extern crate std;

use core::cell::{Cell, RefCell};
use std::{collections::VecDeque, rc::Rc, string::String, vec::Vec};

use crate::control::{HostPort, PortError};

/// A serial port fed from the test. Clones share the same buffers.
#[derive(Clone, Default)]
pub struct TestPort {
    rx: Rc<RefCell<VecDeque<Vec<u8>>>>,
    tx: Rc<RefCell<Vec<u8>>>,
    /// While set every write fails and is not recorded.
    pub broken: Rc<Cell<bool>>,
}

impl TestPort {
    /// Queue `data` to be returned by a single read (or several if it does not fit the buffer).
    pub fn send(&self, data: impl AsRef<[u8]>) {
        self.rx.borrow_mut().push_back(Vec::from(data.as_ref()));
    }

    pub fn pending(&self) -> usize {
        self.rx.borrow().iter().map(|c| c.len()).sum()
    }

    /// Everything written so far, cleared.
    pub fn take(&self) -> Vec<u8> {
        self.tx.take()
    }

    pub fn take_string(&self) -> String {
        String::from_utf8_lossy(&self.take()).into_owned()
    }
}

impl HostPort for TestPort {
    fn poll_read(&mut self, buf: &mut [u8]) -> usize {
        let mut rx = self.rx.borrow_mut();
        let Some(chunk) = rx.front_mut() else {
            return 0;
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        chunk.drain(..n);
        if chunk.is_empty() {
            rx.pop_front();
        }
        n
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), PortError> {
        if self.broken.get() {
            return Err(PortError::Disconnected);
        }
        self.tx.borrow_mut().extend_from_slice(data);
        Ok(())
    }
}

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

extern crate std;

#[derive(Debug, PartialEq)]
pub enum FlashStubError {
    NotAligned,
    OutOfBounds,
    Failed,
}

#[derive(Debug, PartialEq)]
pub enum FlashOp {
    Erase(u32, u32),
    Write(u32, usize),
}

/// In-memory NOR flash: erase sets bytes to 0xff, writes can only clear bits.
pub struct NorFlashStub<const FLASH_SIZE: usize> {
    pub buf: [u8; FLASH_SIZE],
    pub ops: std::vec::Vec<FlashOp>,
    pub fail_writes: bool,
}
impl NorFlashError for FlashStubError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FlashStubError::NotAligned => NorFlashErrorKind::NotAligned,
            FlashStubError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            FlashStubError::Failed => NorFlashErrorKind::Other,
        }
    }
}
impl<const FLASH_SIZE: usize> ErrorType for NorFlashStub<FLASH_SIZE> {
    type Error = FlashStubError;
}
impl<const FLASH_SIZE: usize> NorFlashStub<FLASH_SIZE> {
    fn check(&self, offset: usize, len: usize, align: usize) -> Result<(), FlashStubError> {
        if offset + len > FLASH_SIZE {
            return Err(FlashStubError::OutOfBounds);
        }
        if offset % align != 0 || len % align != 0 {
            return Err(FlashStubError::NotAligned);
        }
        Ok(())
    }
}
impl<const FLASH_SIZE: usize> ReadNorFlash for NorFlashStub<FLASH_SIZE> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        self.check(offset, bytes.len(), Self::READ_SIZE)?;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        FLASH_SIZE
    }
}
impl<const FLASH_SIZE: usize> NorFlash for NorFlashStub<FLASH_SIZE> {
    const WRITE_SIZE: usize = 4;

    const ERASE_SIZE: usize = 256;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        self.ops.push(FlashOp::Erase(from, to));
        let (from, to) = (from as usize, to as usize);
        self.check(from, to - from, Self::ERASE_SIZE)?;
        self.buf[from..to].fill(0xff);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.ops.push(FlashOp::Write(offset, bytes.len()));
        if self.fail_writes {
            return Err(FlashStubError::Failed);
        }
        let offset = offset as usize;
        self.check(offset, bytes.len(), Self::WRITE_SIZE)?;
        for (t, f) in self.buf[offset..offset + bytes.len()]
            .iter_mut()
            .zip(bytes.iter())
        {
            *t &= *f;
        }
        Ok(())
    }
}
impl<const FLASH_SIZE: usize> Default for NorFlashStub<FLASH_SIZE> {
    fn default() -> Self {
        Self {
            buf: [0; FLASH_SIZE],
            ops: std::vec::Vec::new(),
            fail_writes: false,
        }
    }
}

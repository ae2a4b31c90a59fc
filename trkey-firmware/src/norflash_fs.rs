use core::cell::RefCell;

use embedded_storage::nor_flash::{self, NorFlash};

use crate::fs::{
    valid_name, FileDescriptor, FileList, FileName, FileState, FileStore, FsError, MAX_FILES,
    MAX_NAME_LEN,
};

const FORMAT_MAGIC_NUMBER: [u8; 4] = 0x7e4b5f01u32.to_be_bytes();

/// Slot layout: magic, data length (le u32), name padded with 0xff, then the data.
const HEADER_LEN: usize = 64;
const NAME_OFFSET: usize = 8;

/// Named files on NOR flash, one file per fixed-size slot.
///
/// A slot's header is written when its file is closed so an interrupted upload leaves the slot
/// looking free. `PAGE_SIZE` is the size of the write cache and must be a multiple of the flash
/// write size.
pub struct NorFlashFs<
    'd,
    F: NorFlash,
    const BASE: usize,
    const SLOT_SIZE: usize,
    const SLOTS: usize,
    const PAGE_SIZE: usize,
> {
    inner: RefCell<NorFlashFsInner<'d, F, BASE, SLOT_SIZE, SLOTS, PAGE_SIZE>>,
}

impl<
        'd,
        F: NorFlash,
        const BASE: usize,
        const SLOT_SIZE: usize,
        const SLOTS: usize,
        const PAGE_SIZE: usize,
    > NorFlashFs<'d, F, BASE, SLOT_SIZE, SLOTS, PAGE_SIZE>
{
    pub fn new(flash: &'d mut F) -> Self {
        Self {
            inner: RefCell::new(NorFlashFsInner::new(flash)),
        }
    }
}

impl<
        F: NorFlash,
        const BASE: usize,
        const SLOT_SIZE: usize,
        const SLOTS: usize,
        const PAGE_SIZE: usize,
    > FileStore for NorFlashFs<'_, F, BASE, SLOT_SIZE, SLOTS, PAGE_SIZE>
{
    fn create_file(&self, name: &str) -> Result<FileDescriptor, FsError> {
        self.inner.borrow_mut().create_file(name)
    }

    fn open_file(&self, name: &str) -> Result<FileDescriptor, FsError> {
        self.inner.borrow_mut().open_file(name)
    }

    fn write_file(&self, desc: &mut FileDescriptor, data: &[u8]) -> Result<(), FsError> {
        self.inner.borrow_mut().write_file(desc, data)
    }

    fn read_file(&self, desc: &mut FileDescriptor, data: &mut [u8]) -> Result<u32, FsError> {
        self.inner.borrow_mut().read_file(desc, data)
    }

    fn close_file(&self, desc: &mut FileDescriptor) -> Result<(), FsError> {
        self.inner.borrow_mut().close_file(desc)
    }

    fn remove_file(&self, name: &str) -> Result<(), FsError> {
        self.inner.borrow_mut().remove_file(name)
    }

    fn file_names(&self) -> Result<FileList, FsError> {
        self.inner.borrow_mut().file_names()
    }
}

const fn assert_fs_params<
    const BASE: usize,
    const SLOT_SIZE: usize,
    const SLOTS: usize,
    const PAGE_SIZE: usize,
>(
    erase_size: usize,
    write_size: usize,
) -> u32 {
    assert!(SLOTS > 0);
    assert!(SLOTS <= MAX_FILES);
    assert!(BASE % erase_size == 0);
    assert!(SLOT_SIZE % erase_size == 0);
    assert!(SLOT_SIZE > HEADER_LEN);
    assert!(HEADER_LEN % write_size == 0);
    assert!(PAGE_SIZE % write_size == 0);
    assert!(PAGE_SIZE > 0);
    (SLOT_SIZE - HEADER_LEN) as u32
}

fn map_flash_error(err: impl nor_flash::NorFlashError) -> FsError {
    match err.kind() {
        nor_flash::NorFlashErrorKind::NotAligned => FsError::NotAligned,
        nor_flash::NorFlashErrorKind::OutOfBounds => FsError::OutOfBounds,
        _ => FsError::Unknown,
    }
}

struct NorFlashFsInner<
    'd,
    F: NorFlash,
    const BASE: usize,
    const SLOT_SIZE: usize,
    const SLOTS: usize,
    const PAGE_SIZE: usize,
> {
    flash: &'d mut F,
    /// Name of the file being written; its header is not on disk yet.
    writer: Option<FileName>,
    read_counter: usize,
    write_cache: [u8; PAGE_SIZE],
}

impl<
        'd,
        F: NorFlash,
        const BASE: usize,
        const SLOT_SIZE: usize,
        const SLOTS: usize,
        const PAGE_SIZE: usize,
    > NorFlashFsInner<'d, F, BASE, SLOT_SIZE, SLOTS, PAGE_SIZE>
{
    const CAPACITY: u32 =
        assert_fs_params::<BASE, SLOT_SIZE, SLOTS, PAGE_SIZE>(F::ERASE_SIZE, F::WRITE_SIZE);

    fn new(flash: &'d mut F) -> Self {
        Self {
            flash,
            writer: None,
            read_counter: 0,
            write_cache: [0xff; PAGE_SIZE],
        }
    }

    fn create_file(&mut self, name: &str) -> Result<FileDescriptor, FsError> {
        if !valid_name(name) {
            return Err(FsError::InvalidName);
        }
        if self.writer.is_some() {
            return Err(FsError::InUse);
        }
        let location = match self.find(name)? {
            Some(_) if self.read_counter > 0 => return Err(FsError::InUse),
            Some((location, _)) => location,
            None => self.free_slot()?.ok_or(FsError::OutOfSpace)?,
        };

        self.erase_slot(location)?;
        self.writer = FileName::try_from(name).ok();
        self.write_cache.fill(0xff);
        Ok(FileDescriptor::new_writer(location))
    }

    fn open_file(&mut self, name: &str) -> Result<FileDescriptor, FsError> {
        let (location, len) = self.find(name)?.ok_or(FsError::FileNotFound)?;
        self.read_counter += 1;
        Ok(FileDescriptor::new_reader(location, len))
    }

    fn write_file(&mut self, desc: &mut FileDescriptor, data: &[u8]) -> Result<(), FsError> {
        if desc.state != FileState::Writer {
            return Err(FsError::FileClosed);
        }

        let result = self.guarded_write_file(desc, data);
        if result.is_err() {
            // abandon the upload; without a header the slot reads as free
            self.writer = None;
            desc.close();
        }
        result
    }

    fn guarded_write_file(
        &mut self,
        desc: &mut FileDescriptor,
        mut data: &[u8],
    ) -> Result<(), FsError> {
        if desc.len as usize + data.len() > Self::CAPACITY as usize {
            return Err(FsError::FileTooLarge);
        }

        while !data.is_empty() {
            let cached = (desc.len - desc.offset) as usize;
            let n = data.len().min(PAGE_SIZE - cached);
            self.write_cache[cached..cached + n].copy_from_slice(&data[..n]);
            desc.len += n as u32;
            data = &data[n..];

            if cached + n == PAGE_SIZE {
                self.commit_write_cache(desc, PAGE_SIZE)?;
            }
        }
        Ok(())
    }

    fn commit_write_cache(&mut self, desc: &mut FileDescriptor, len: usize) -> Result<(), FsError> {
        let offset = desc.location + HEADER_LEN as u32 + desc.offset;
        let result = self
            .flash
            .write(BASE as u32 + offset, &self.write_cache[..len])
            .map_err(map_flash_error);
        self.write_cache.fill(0xff);
        desc.offset = desc.len;
        result
    }

    fn read_file(&mut self, desc: &mut FileDescriptor, data: &mut [u8]) -> Result<u32, FsError> {
        if desc.state != FileState::Reader {
            return Err(FsError::FileClosed);
        }
        let rem = (desc.len - desc.offset) as usize;
        let data = if rem < data.len() {
            data.split_at_mut(rem).0
        } else {
            data
        };
        if !data.is_empty() {
            self.read(desc.location + HEADER_LEN as u32 + desc.offset, data)?;
        }
        desc.offset += data.len() as u32;
        Ok(data.len() as u32)
    }

    fn close_file(&mut self, desc: &mut FileDescriptor) -> Result<(), FsError> {
        match desc.state {
            FileState::Closed => Ok(()),
            FileState::Reader => {
                self.read_counter -= 1;
                desc.close();
                Ok(())
            }
            FileState::Writer => {
                let result = self.commit_file(desc);
                self.writer = None;
                desc.close();
                result
            }
        }
    }

    fn commit_file(&mut self, desc: &mut FileDescriptor) -> Result<(), FsError> {
        let cached = (desc.len - desc.offset) as usize;
        if cached != 0 {
            let padded = cached.div_ceil(F::WRITE_SIZE) * F::WRITE_SIZE;
            self.commit_write_cache(desc, padded)?;
        }

        let mut header = [0xff; HEADER_LEN];
        header[..4].copy_from_slice(&FORMAT_MAGIC_NUMBER);
        header[4..NAME_OFFSET].copy_from_slice(&desc.len.to_le_bytes());
        if let Some(name) = self.writer.as_ref() {
            header[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name.as_bytes());
        }
        self.flash
            .write(BASE as u32 + desc.location, &header)
            .map_err(map_flash_error)
    }

    fn remove_file(&mut self, name: &str) -> Result<(), FsError> {
        let (location, _) = self.find(name)?.ok_or(FsError::FileNotFound)?;
        if self.read_counter > 0 {
            return Err(FsError::InUse);
        }
        self.erase_slot(location)
    }

    fn file_names(&mut self) -> Result<FileList, FsError> {
        let mut names = FileList::new();
        for slot in 0..SLOTS {
            if let Some((_, name)) = self.read_header(Self::slot_location(slot))? {
                let _ = names.push(name);
            }
        }
        Ok(names)
    }

    const fn slot_location(slot: usize) -> u32 {
        (slot * SLOT_SIZE) as u32
    }

    fn find(&mut self, name: &str) -> Result<Option<(u32, u32)>, FsError> {
        for slot in 0..SLOTS {
            let location = Self::slot_location(slot);
            if let Some((len, n)) = self.read_header(location)? {
                if n == name {
                    return Ok(Some((location, len)));
                }
            }
        }
        Ok(None)
    }

    fn free_slot(&mut self) -> Result<Option<u32>, FsError> {
        for slot in 0..SLOTS {
            let location = Self::slot_location(slot);
            if self.read_header(location)?.is_none() {
                return Ok(Some(location));
            }
        }
        Ok(None)
    }

    fn read_header(&mut self, location: u32) -> Result<Option<(u32, FileName)>, FsError> {
        let mut header = [0; HEADER_LEN];
        self.read(location, &mut header)?;
        if header[..4] != FORMAT_MAGIC_NUMBER {
            return Ok(None);
        }
        let mut len = [0; 4];
        len.copy_from_slice(&header[4..NAME_OFFSET]);
        let len = u32::from_le_bytes(len);
        if len > Self::CAPACITY {
            return Ok(None);
        }

        let name = &header[NAME_OFFSET..NAME_OFFSET + MAX_NAME_LEN];
        let end = name.iter().position(|b| *b == 0xff).unwrap_or(MAX_NAME_LEN);
        let Ok(name) = core::str::from_utf8(&name[..end]) else {
            return Ok(None);
        };
        Ok(FileName::try_from(name).ok().map(|name| (len, name)))
    }

    fn erase_slot(&mut self, location: u32) -> Result<(), FsError> {
        let start = BASE as u32 + location;
        self.flash
            .erase(start, start + SLOT_SIZE as u32)
            .map_err(map_flash_error)
    }

    fn read(&mut self, offset: u32, data: &mut [u8]) -> Result<(), FsError> {
        self.flash
            .read(BASE as u32 + offset, data)
            .map_err(map_flash_error)
    }
}

#[cfg(test)]
#[path = "norflash_fs_test.rs"]
pub(crate) mod test;

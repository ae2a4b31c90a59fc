use heapless::{String, Vec};

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_FILES: usize = 16;

pub type FileName = String<MAX_NAME_LEN>;
pub type FileList = Vec<FileName, MAX_FILES>;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FsError {
    OutOfSpace,
    InUse,
    FileTooLarge,
    FileNotFound,
    FileClosed,
    InvalidName,
    NotAligned,
    OutOfBounds,
    Unknown,
}

impl FsError {
    /// Text sent to the host after `ERROR: `.
    pub fn as_str(&self) -> &'static str {
        match self {
            FsError::OutOfSpace => "no space left",
            FsError::InUse => "file in use",
            FsError::FileTooLarge => "file too large",
            FsError::FileNotFound => "file not found",
            FsError::FileClosed => "file closed",
            FsError::InvalidName => "invalid file name",
            FsError::NotAligned => "flash not aligned",
            FsError::OutOfBounds => "flash out of bounds",
            FsError::Unknown => "flash error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileState {
    Closed,
    Reader,
    Writer,
}

#[derive(Debug, Clone, Copy)]
pub struct FileDescriptor {
    pub state: FileState,
    /// Address of the file's slot on disk.
    pub location: u32,
    /// Length of file. Grows while writing.
    pub len: u32,
    /// Offset from the start of the file data to the current read/write location.
    pub offset: u32,
}

/// A small flat store of named files.
///
/// At most one file can be written at a time. A file being written is not visible to
/// [`FileStore::open_file`] or [`FileStore::file_names`] until it is closed.
pub trait FileStore {
    /// Create `name`, replacing any existing file of that name.
    fn create_file(&self, name: &str) -> Result<FileDescriptor, FsError>;
    fn open_file(&self, name: &str) -> Result<FileDescriptor, FsError>;
    fn write_file(&self, desc: &mut FileDescriptor, data: &[u8]) -> Result<(), FsError>;
    /// Read up to `data.len()` bytes. Returns 0 at the end of the file.
    fn read_file(&self, desc: &mut FileDescriptor, data: &mut [u8]) -> Result<u32, FsError>;
    /// Close `desc`. Closing a writer commits the file.
    fn close_file(&self, desc: &mut FileDescriptor) -> Result<(), FsError>;
    fn remove_file(&self, name: &str) -> Result<(), FsError>;
    fn file_names(&self) -> Result<FileList, FsError>;
}

pub struct FileWriter<'f> {
    fs: &'f dyn FileStore,
    desc: FileDescriptor,
}
impl Drop for FileWriter<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
impl<'f> FileWriter<'f> {
    pub fn create(fs: &'f dyn FileStore, name: &str) -> Result<Self, FsError> {
        let desc = fs.create_file(name)?;
        Ok(Self { fs, desc })
    }

    pub fn close(&mut self) -> Result<(), FsError> {
        self.fs.close_file(&mut self.desc)
    }

    pub fn is_closed(&self) -> bool {
        self.desc.is_closed()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), FsError> {
        self.fs.write_file(&mut self.desc, data)
    }
}

pub struct FileReader<'f> {
    fs: &'f dyn FileStore,
    desc: FileDescriptor,
}
impl Drop for FileReader<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
impl<'f> FileReader<'f> {
    pub fn open(fs: &'f dyn FileStore, name: &str) -> Result<Self, FsError> {
        let desc = fs.open_file(name)?;
        Ok(Self { fs, desc })
    }

    pub fn close(&mut self) -> Result<(), FsError> {
        self.fs.close_file(&mut self.desc)
    }

    pub fn is_closed(&self) -> bool {
        self.desc.is_closed()
    }

    pub fn len(&self) -> u32 {
        self.desc.len
    }

    pub fn is_empty(&self) -> bool {
        self.desc.len == 0
    }

    pub fn read(&mut self, data: &mut [u8]) -> Result<u32, FsError> {
        self.fs.read_file(&mut self.desc, data)
    }

    /// Fill `buf` from the start of the file. Fails with [`FsError::FileTooLarge`] if the file
    /// does not fit.
    pub fn read_to_end<'b>(&mut self, buf: &'b mut [u8]) -> Result<&'b [u8], FsError> {
        let len = self.desc.len as usize;
        if len > buf.len() {
            return Err(FsError::FileTooLarge);
        }
        let mut pos = 0;
        while pos < len {
            let n = self.read(&mut buf[pos..len])? as usize;
            if n == 0 {
                break;
            }
            pos += n;
        }
        Ok(&buf[..pos])
    }
}

impl FileDescriptor {
    pub fn new_writer(location: u32) -> Self {
        Self {
            state: FileState::Writer,
            location,
            len: 0,
            offset: 0,
        }
    }

    pub fn new_reader(location: u32, len: u32) -> Self {
        Self {
            state: FileState::Reader,
            location,
            len,
            offset: 0,
        }
    }

    pub fn closed() -> Self {
        Self {
            state: FileState::Closed,
            location: 0,
            len: 0,
            offset: 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, FileState::Closed)
    }

    pub(crate) fn close(&mut self) {
        self.state = FileState::Closed;
    }
}

/// Non-empty printable ASCII without spaces, at most [`MAX_NAME_LEN`] bytes.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && name.bytes().all(|b| b.is_ascii_graphic())
}

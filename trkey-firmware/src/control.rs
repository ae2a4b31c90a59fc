//! The host control channel.
//!
//! One serial byte stream carries newline terminated commands and, after `PUT <name>`, raw file
//! contents ended by `<EOF>`. Replies are lines of text. The channel also carries
//! `APP_EVENT <name>` notifications to the companion app on the host.

use core::fmt::{self, Write as _};

use embassy_time::Instant;
use heapless::{String, Vec};
use trkey_common::protocol::{
    command, reply, GET_CHUNK_LEN, LAYERS_FILE, MAX_LINE_LEN, SENTINEL,
};

use crate::{
    config::ConfigError,
    fs::{FileDescriptor, FileName, FileStore, FsError},
    info,
    now_playing::NowPlaying,
    warn,
};

const READ_CHUNK_LEN: usize = 64;
const MAX_READS_PER_POLL: usize = 8;
const NP_JSON_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    Disconnected,
}

/// The serial link to the host.
#[allow(async_fn_in_trait)]
pub trait HostPort {
    /// Copy waiting bytes into `buf` without blocking. Returns 0 when nothing is waiting.
    fn poll_read(&mut self, buf: &mut [u8]) -> usize;
    async fn write_all(&mut self, data: &[u8]) -> Result<(), PortError>;
}

/// State outside the channel that commands act on.
pub trait ControlTarget {
    /// Re-read `layers.json`. On error the target falls back to its error layer.
    fn reload_layers(&mut self, fs: &dyn FileStore) -> Result<(), ConfigError>;
    fn now_playing(&mut self) -> &mut NowPlaying;
    /// Something shown on the display changed.
    fn request_refresh(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlConfig {
    /// Only `HELLO` marks the companion as connected. Otherwise any command does.
    pub require_handshake: bool,
}

#[derive(Debug)]
enum Mode {
    AwaitingCommand,
    ReceivingFile {
        name: FileName,
        desc: FileDescriptor,
        error: Option<FsError>,
    },
}

pub struct ControlChannel<P: HostPort> {
    port: P,
    config: ControlConfig,
    mode: Mode,
    line: Vec<u8, MAX_LINE_LEN>,
    line_overflow: bool,
    /// Length of the sentinel prefix seen at the end of the last upload chunk. Those bytes are
    /// held back until the next chunk shows whether they start `<EOF>` or are file data.
    sentinel_held: usize,
    connected: bool,
}

impl<P: HostPort> ControlChannel<P> {
    pub fn new(port: P, config: ControlConfig) -> Self {
        Self {
            port,
            config,
            mode: Mode::AwaitingCommand,
            line: Vec::new(),
            line_overflow: false,
            sentinel_held: 0,
            connected: false,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self.mode, Mode::ReceivingFile { .. })
    }

    /// Handle whatever the host has sent since the last call.
    pub async fn poll(&mut self, fs: &dyn FileStore, target: &mut impl ControlTarget, now: Instant) {
        let mut buf = [0; READ_CHUNK_LEN];
        for _ in 0..MAX_READS_PER_POLL {
            let n = self.port.poll_read(&mut buf);
            if n == 0 {
                break;
            }
            self.feed(fs, target, now, &buf[..n]).await;
        }
    }

    /// Process bytes received from the host.
    pub async fn feed(
        &mut self,
        fs: &dyn FileStore,
        target: &mut impl ControlTarget,
        now: Instant,
        mut data: &[u8],
    ) {
        while !data.is_empty() {
            if self.is_receiving() {
                data = self.receive_file(fs, target, data).await;
                continue;
            }

            let Some(i) = data.iter().position(|b| *b == b'\n') else {
                self.push_line(data);
                return;
            };
            self.push_line(&data[..i]);
            data = &data[i + 1..];

            let line = core::mem::take(&mut self.line);
            if core::mem::take(&mut self.line_overflow) {
                self.reply_error("line too long").await;
                continue;
            }
            match core::str::from_utf8(&line) {
                Ok(cmd) => self.run_command(fs, target, now, cmd.trim()).await,
                Err(_) => self.reply_error("command is not text").await,
            }
        }
    }

    fn push_line(&mut self, data: &[u8]) {
        for b in data.iter().copied().filter(|b| *b != b'\r') {
            if self.line.push(b).is_err() {
                self.line_overflow = true;
            }
        }
    }

    async fn run_command(
        &mut self,
        fs: &dyn FileStore,
        target: &mut impl ControlTarget,
        now: Instant,
        cmd: &str,
    ) {
        if cmd.is_empty() {
            return;
        }
        let (verb, arg) = match cmd.split_once(' ') {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (cmd, ""),
        };

        if verb == command::HELLO && arg.is_empty() {
            self.connected = true;
            self.reply(reply::HELLO).await;
            return;
        }
        if !self.config.require_handshake {
            self.connected = true;
        }

        match (verb, arg.is_empty()) {
            (command::LIST, true) => self.list(fs).await,
            (command::DEL, false) => match fs.remove_file(arg) {
                Ok(()) => self.reply(reply::DELETED).await,
                Err(err) => self.reply_error(err.as_str()).await,
            },
            (command::PUT, false) => self.start_upload(fs, arg).await,
            (command::GET, false) => self.download(fs, arg).await,
            (command::NP_SET, false) => {
                match target.now_playing().set_json(arg.as_bytes(), now) {
                    Ok(()) => {
                        target.request_refresh();
                        self.reply(reply::NP_OK).await;
                    }
                    Err(err) => self.reply_error(err).await,
                }
            }
            (command::NP_CLEAR, true) => {
                target.now_playing().clear();
                target.request_refresh();
                self.reply(reply::NP_CLEARED).await;
            }
            (command::NP_GET, true) => {
                let mut json = [0; NP_JSON_LEN];
                match target.now_playing().to_json(&mut json) {
                    Ok(n) => {
                        self.reply(&json[..n]).await;
                        self.reply(b"\n").await;
                    }
                    Err(_) => self.reply_error("now playing too large").await,
                }
            }
            (command::RELOAD, true) => self.reload(fs, target).await,
            _ => {
                info!("unknown command {}", verb);
                self.reply(reply::UNKNOWN_COMMAND).await
            }
        }
    }

    async fn list(&mut self, fs: &dyn FileStore) {
        match fs.file_names() {
            Ok(names) => {
                self.reply(reply::FILES).await;
                for name in names.iter() {
                    self.reply(name.as_bytes()).await;
                    self.reply(b"\n").await;
                }
                self.reply(reply::END).await;
            }
            Err(err) => self.reply_error(err.as_str()).await,
        }
    }

    async fn start_upload(&mut self, fs: &dyn FileStore, name: &str) {
        let created = FileName::try_from(name)
            .map_err(|_| FsError::InvalidName)
            .and_then(|file_name| Ok((file_name, fs.create_file(name)?)));
        match created {
            Ok((name, desc)) => {
                self.mode = Mode::ReceivingFile {
                    name,
                    desc,
                    error: None,
                };
                self.sentinel_held = 0;
                self.line.clear();
                self.reply(reply::READY).await;
            }
            Err(err) => self.reply_error(err.as_str()).await,
        }
    }

    async fn download(&mut self, fs: &dyn FileStore, name: &str) {
        let mut desc = match fs.open_file(name) {
            Ok(desc) => desc,
            Err(err) => return self.reply_error(err.as_str()).await,
        };
        let mut chunk = [0; GET_CHUNK_LEN];
        let result = loop {
            match fs.read_file(&mut desc, &mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    if self.port.write_all(&chunk[..n as usize]).await.is_err() {
                        break Ok(());
                    }
                }
                Err(err) => break Err(err),
            }
        };
        let _ = fs.close_file(&mut desc);
        match result {
            Ok(()) => self.reply(reply::EOF).await,
            Err(err) => self.reply_error(err.as_str()).await,
        }
    }

    async fn reload(&mut self, fs: &dyn FileStore, target: &mut impl ControlTarget) {
        if let Err(err) = target.reload_layers(fs) {
            warn!("layers reload failed: {:?}", err);
        }
        target.request_refresh();
        self.reply(reply::LAYERS_RELOADED).await;
    }

    /// Append upload bytes to the file until `<EOF>`. Returns what follows the sentinel.
    async fn receive_file<'d>(
        &mut self,
        fs: &dyn FileStore,
        target: &mut impl ControlTarget,
        data: &'d [u8],
    ) -> &'d [u8] {
        // No proper prefix of `<EOF>` is also a suffix of it, so after a mismatch the held bytes
        // are plain data and scanning restarts at the mismatching byte.
        let mut run_start = 0;
        let mut i = 0;
        while i < data.len() {
            if data[i] == SENTINEL[self.sentinel_held] {
                if self.sentinel_held == 0 {
                    self.append(fs, &data[run_start..i]);
                }
                self.sentinel_held += 1;
                i += 1;
                run_start = i;
                if self.sentinel_held == SENTINEL.len() {
                    self.sentinel_held = 0;
                    self.finish_upload(fs, target).await;
                    return &data[i..];
                }
            } else if self.sentinel_held > 0 {
                self.append(fs, &SENTINEL[..self.sentinel_held]);
                self.sentinel_held = 0;
                run_start = i;
            } else {
                i += 1;
            }
        }
        if self.sentinel_held == 0 {
            self.append(fs, &data[run_start..]);
        }
        &[]
    }

    fn append(&mut self, fs: &dyn FileStore, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if let Mode::ReceivingFile { desc, error, .. } = &mut self.mode {
            if error.is_none() {
                if let Err(err) = fs.write_file(desc, data) {
                    warn!("upload failed: {:?}", err);
                    *error = Some(err);
                }
            }
        }
    }

    async fn finish_upload(&mut self, fs: &dyn FileStore, target: &mut impl ControlTarget) {
        let Mode::ReceivingFile {
            name,
            mut desc,
            error,
        } = core::mem::replace(&mut self.mode, Mode::AwaitingCommand)
        else {
            return;
        };

        let result = match error {
            Some(err) => Err(err),
            None => fs.close_file(&mut desc),
        };
        if let Err(err) = result {
            return self.reply_error(err.as_str()).await;
        }

        info!("received {}", name.as_str());
        self.reply(reply::FILE_RECEIVED).await;
        if name == LAYERS_FILE {
            self.reload(fs, target).await;
        }
    }

    /// Send `APP_EVENT <name>` if the companion is connected.
    pub async fn send_app_event(&mut self, name: &str) -> Result<(), PortError> {
        if !self.connected {
            return Ok(());
        }
        self.port.write_all(reply::APP_EVENT_PREFIX).await?;
        self.port.write_all(name.as_bytes()).await?;
        self.port.write_all(b"\n").await
    }

    async fn reply(&mut self, data: &[u8]) {
        if let Err(err) = self.port.write_all(data).await {
            warn!("host write failed: {:?}", err);
        }
    }

    async fn reply_error(&mut self, msg: impl fmt::Display) {
        let mut line: String<128> = String::new();
        let _ = write!(line, "{}", msg);
        self.reply(reply::ERROR_PREFIX).await;
        self.reply(line.as_bytes()).await;
        self.reply(b"\n").await;
    }
}

#[cfg(test)]
#[path = "control_test.rs"]
mod test;

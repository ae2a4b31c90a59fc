//! Wire constants for the serial control channel.

/// Marks the end of an uploaded file and of a `GET` download.
pub const SENTINEL: &[u8] = b"<EOF>";

/// Name of the file holding the key map; finishing an upload of it reloads the layers.
pub const LAYERS_FILE: &str = "layers.json";

/// Size of the chunks a `GET` streams.
pub const GET_CHUNK_LEN: usize = 512;

/// The longest command line accepted, excluding the newline.
pub const MAX_LINE_LEN: usize = 512;

pub mod command {
    pub const LIST: &str = "LIST";
    pub const DEL: &str = "DEL";
    pub const PUT: &str = "PUT";
    pub const GET: &str = "GET";
    pub const NP_SET: &str = "NP_SET";
    pub const NP_CLEAR: &str = "NP_CLEAR";
    pub const NP_GET: &str = "NP_GET";
    pub const RELOAD: &str = "RELOAD";
    pub const HELLO: &str = "HELLO";
}

pub mod reply {
    pub const FILES: &[u8] = b"Files:\n";
    pub const END: &[u8] = b"<END>\n";
    pub const DELETED: &[u8] = b"DELETED\n";
    pub const READY: &[u8] = b"READY\n";
    pub const EOF: &[u8] = b"<EOF>\n";
    pub const FILE_RECEIVED: &[u8] = b"FILE RECEIVED\n";
    pub const NP_OK: &[u8] = b"NP_OK\n";
    pub const NP_CLEARED: &[u8] = b"NP_CLEARED\n";
    pub const LAYERS_RELOADED: &[u8] = b"LAYERS RELOADED\n";
    pub const HELLO: &[u8] = b"HELLO\n";
    pub const UNKNOWN_COMMAND: &[u8] = b"UNKNOWN COMMAND\n";
    pub const ERROR_PREFIX: &[u8] = b"ERROR: ";
    pub const APP_EVENT_PREFIX: &[u8] = b"APP_EVENT ";
}

//! Error taxonomy (spec §7). Two real fallible boundaries exist in this
//! crate: loading a cartridge, and the CLI harness around it. Everything
//! inside the CPU/bus hot path is, by contract, unconditional (spec §4.1).

use thiserror::Error;

/// Fatal, pre-run errors encountered while loading a ROM image.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("ROM size {len} bytes is not a power of two between 32 KiB and 8 MiB")]
    InvalidSize { len: usize },

    #[error("header checksum mismatch: expected {expected:#04x}, computed {actual:#04x}")]
    BadHeaderChecksum { expected: u8, actual: u8 },

    #[error("unsupported mapper (cartridge type {code:#04x}); only ROM-only (0x00) is mandated")]
    UnsupportedMapper { code: u8 },
}

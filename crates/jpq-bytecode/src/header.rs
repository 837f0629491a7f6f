//! Compiled query header (12 bytes).
//!
//! Layout:
//! - 0-3: magic `b"JPQ1"`
//! - 4: format version in bits 0-6, lax flag in bit 7
//! - 5-7: reserved, zero
//! - 8-11: number of external cache slots (operator and cast nodes)
//!
//! The root node follows immediately at offset 12.

use jpq_core::Mode;

pub const MAGIC: [u8; 4] = *b"JPQ1";
pub const VERSION: u8 = 1;
pub const HEADER_SIZE: usize = 12;

/// Bit 7 of the version byte: query was compiled in lax mode.
pub const LAX_FLAG: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    /// Format version (currently 1).
    pub version: u8,
    pub mode: Mode,
    /// Cache slots the evaluator needs, one per operator or cast node.
    pub external_count: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            mode: Mode::Lax,
            external_count: 0,
        }
    }
}

impl Header {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Decode header from the first 12 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_SIZE, "header too short");

        let mode = if bytes[4] & LAX_FLAG != 0 {
            Mode::Lax
        } else {
            Mode::Strict
        };

        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: bytes[4] & !LAX_FLAG,
            mode,
            external_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    /// Encode header to 12 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version | if self.mode.is_lax() { LAX_FLAG } else { 0 };
        bytes[8..12].copy_from_slice(&self.external_count.to_le_bytes());
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == VERSION
    }
}

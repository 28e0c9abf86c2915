//! Particle embedding codec
//!
//! Serializes a preset directly into grid cells, so a recipe travels inside
//! an exported world snapshot and can be rediscovered later starting from any
//! cell of the record.
//!
//! # Record layout
//!
//! Every cell of the chosen region becomes a marker particle
//! ([`DATA_MATERIAL`]) carrying [`EMBED_MAGIC`] and navigation flags pointing
//! toward the origin: `RIGHT` when the header lies further left, `UP` when it
//! lies further down. The origin sits in the region's leftmost column on its
//! bottom row. Body cells are then overwritten in row-major order from the
//! origin (bottom row first, left to right):
//!
//! ```text
//! Cell payload (4 x u16 words, each word = lo + hi * 256):
//!   header (index 0, flag HEADER):
//!     word 0: payload checksum
//!     word 1: chunk count
//!     word 2: region width
//!     word 3: region height
//!   chunk cells (indices 1..=chunks): 8 payload bytes each,
//!     last chunk zero-padded
//!   footer (index chunks + 1, flag FOOTER): no payload
//! ```
//!
//! The payload is the JSON [`PresetEnvelope`](cindergrid_preset::PresetEnvelope)
//! `{ name, data }` where `data` is the preset document's JSON text. The
//! checksum covers the unpadded payload; it detects accidental corruption,
//! nothing more.

mod checksum;
mod decode;
mod encode;
mod scan;

pub use checksum::payload_checksum;
pub use decode::{DecodeError, DecodedPreset, decode_at};
pub use encode::{EmbedError, encode_preset};
pub use scan::EmbedScanner;

use cindergrid_preset::MaterialId;

/// Material id reserved exclusively for embedded-data cells.
pub const DATA_MATERIAL: MaterialId = 0xDA7A;

/// Magic word carried by every embedded-data cell.
pub const EMBED_MAGIC: u16 = 0xC19D;

/// Payload bytes per cell (4 words x 2 bytes).
pub const CHUNK_BYTES: usize = 8;

/// Step ceiling for the header-discovery walk. Inside a valid record the
/// walk needs at most `width + height` steps; the ceiling only terminates
/// walks over corrupted or cyclic flag data.
pub const HEADER_WALK_LIMIT: u32 = 4096;

bitflags::bitflags! {
    /// Per-cell navigation flags describing the route toward the header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NavFlags: u8 {
        /// This cell is the record header.
        const HEADER = 1;
        /// The header lies further left.
        const RIGHT = 2;
        /// The header lies further down.
        const UP = 4;
        /// This cell terminates the record body.
        const FOOTER = 8;
    }
}

/// Pack two payload bytes into one cell word (`lo + hi * 256`).
pub(crate) fn pack_word(lo: u8, hi: u8) -> u16 {
    lo as u16 | (hi as u16) << 8
}

/// Split one cell word back into its two payload bytes.
pub(crate) fn unpack_word(word: u16) -> (u8, u8) {
    (word as u8, (word >> 8) as u8)
}

/// Position of body cell `index` in row-major order from the record origin
/// (`index` 0 is the header itself; rows grow upward from the bottom row).
pub(crate) fn body_pos(origin_x: i32, origin_y: i32, width: i32, index: u32) -> (i32, i32) {
    let row = (index / width as u32) as i32;
    let col = (index % width as u32) as i32;
    (origin_x + col, origin_y - row)
}

//! Embedded record decoder
//!
//! Decoding starts at an arbitrary cell of a record. The navigation flags
//! route the walk to the header (left on `RIGHT`, down on `UP`, both in one
//! step when both are set), then the body is read back in row-major order
//! using the geometry stored in the header itself.

use cindergrid_preset::{
    PresetDoc, PresetEnvelope, ValidatePolicy, ValidationOutcome, validate,
};

use crate::world::{CellRecord, World};

use super::{CHUNK_BYTES, DATA_MATERIAL, EMBED_MAGIC, HEADER_WALK_LIMIT, NavFlags, body_pos, unpack_word};

/// Fatal decode failures. "The cell holds no embedded data" is not one of
/// these - [`decode_at`] reports that as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// A cell inside the record is not a marker cell (wrong material, wrong
    /// magic, or vacated entirely).
    #[error("non-record cell at ({x}, {y}) inside embedded data")]
    ForeignCellEncountered { x: i32, y: i32 },
    /// The body walk left the grid before reading the declared chunk count.
    #[error("embedded record ends before its declared length")]
    PrematureEnd,
    /// The navigation walk never reached a header cell.
    #[error("no header found following the navigation flags")]
    HeaderNotFound,
    /// Payload bytes do not match the checksum stored in the header.
    #[error("payload checksum mismatch (stored {stored:#06x}, computed {computed:#06x})")]
    ChecksumMismatch { stored: u16, computed: u16 },
    /// The payload, or the preset document inside it, is not valid JSON.
    #[error("embedded payload is not valid JSON: {0}")]
    JsonMalformed(String),
}

/// A fully decoded record: the envelope contents plus the validation outcome
/// of the embedded document.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPreset {
    /// Display name from the envelope.
    pub name: String,
    /// The preset document's JSON text, byte-for-byte as embedded.
    pub json: String,
    pub doc: PresetDoc,
    pub outcome: ValidationOutcome,
}

/// Decode the record covering `(x, y)`, if any. Returns `Ok(None)` when the
/// cell holds no embedded data at all.
pub fn decode_at(
    world: &dyn World,
    policy: ValidatePolicy,
    x: i32,
    y: i32,
) -> Result<Option<DecodedPreset>, DecodeError> {
    let Some((header_x, header_y, header)) = find_header(world, x, y)? else {
        return Ok(None);
    };
    decode_from_header(world, policy, header_x, header_y, header).map(Some)
}

/// Follow the navigation flags from `(x, y)` to the record header. Returns
/// `Ok(None)` when the start cell is not part of a record.
pub(crate) fn find_header(
    world: &dyn World,
    x: i32,
    y: i32,
) -> Result<Option<(i32, i32, CellRecord)>, DecodeError> {
    let Some(start) = world.cell(x, y) else {
        return Ok(None);
    };
    if start.magic != EMBED_MAGIC {
        return Ok(None);
    }

    let (mut cx, mut cy) = (x, y);
    let mut cell = start;
    for _ in 0..HEADER_WALK_LIMIT {
        if cell.material != DATA_MATERIAL || cell.magic != EMBED_MAGIC {
            return Err(DecodeError::ForeignCellEncountered { x: cx, y: cy });
        }
        let flags = NavFlags::from_bits_truncate(cell.flags);
        if flags.contains(NavFlags::HEADER) {
            return Ok(Some((cx, cy, cell)));
        }
        if !flags.intersects(NavFlags::RIGHT | NavFlags::UP) {
            // A non-header cell with nowhere to go: corrupted flags
            return Err(DecodeError::HeaderNotFound);
        }
        if flags.contains(NavFlags::RIGHT) {
            cx -= 1;
        }
        if flags.contains(NavFlags::UP) {
            cy += 1;
        }
        cell = world
            .cell(cx, cy)
            .ok_or(DecodeError::ForeignCellEncountered { x: cx, y: cy })?;
    }

    Err(DecodeError::HeaderNotFound)
}

fn decode_from_header(
    world: &dyn World,
    policy: ValidatePolicy,
    header_x: i32,
    header_y: i32,
    header: CellRecord,
) -> Result<DecodedPreset, DecodeError> {
    let [stored, chunk_count, width, _height] = header.words;
    if width == 0 {
        return Err(DecodeError::PrematureEnd);
    }

    let mut payload = Vec::with_capacity(chunk_count as usize * CHUNK_BYTES);
    for index in 1..=chunk_count as u32 {
        let (bx, by) = body_pos(header_x, header_y, width as i32, index);
        if !world.contains(bx, by) {
            return Err(DecodeError::PrematureEnd);
        }
        let cell = world
            .cell(bx, by)
            .ok_or(DecodeError::ForeignCellEncountered { x: bx, y: by })?;
        if cell.material != DATA_MATERIAL || cell.magic != EMBED_MAGIC {
            return Err(DecodeError::ForeignCellEncountered { x: bx, y: by });
        }
        for word in cell.words {
            let (lo, hi) = unpack_word(word);
            payload.push(lo);
            payload.push(hi);
        }
    }

    // Strip the final chunk's zero padding; the payload is JSON text and
    // cannot contain NUL bytes
    while payload.last() == Some(&0) {
        payload.pop();
    }

    let computed = super::payload_checksum(&payload);
    if computed != stored {
        return Err(DecodeError::ChecksumMismatch { stored, computed });
    }

    let envelope = PresetEnvelope::from_json(
        std::str::from_utf8(&payload).map_err(|e| DecodeError::JsonMalformed(e.to_string()))?,
    )
    .map_err(|e| DecodeError::JsonMalformed(e.to_string()))?;
    let doc =
        PresetDoc::from_json(&envelope.data).map_err(|e| DecodeError::JsonMalformed(e.to_string()))?;

    let outcome = validate(&doc, world, policy);
    Ok(DecodedPreset {
        name: envelope.name,
        json: envelope.data,
        doc,
        outcome,
    })
}

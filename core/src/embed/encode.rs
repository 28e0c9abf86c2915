//! Embedded record encoder

use cindergrid_preset::{PresetDoc, PresetEnvelope};
use smallvec::SmallVec;

use crate::world::{CellRecord, Rect, World};

use super::{
    CHUNK_BYTES, DATA_MATERIAL, EMBED_MAGIC, NavFlags, body_pos, checksum::payload_checksum,
    pack_word,
};

/// Errors raised before or during encoding. Capacity is checked up front, so
/// a failed encode never writes a cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedError {
    /// The payload needs more cells than the region offers.
    #[error("embedding needs {need} cells but the region only has {have}")]
    CapacityExceeded { need: u64, have: u64 },
    /// The preset document failed to serialize.
    #[error("preset serialization failed: {0}")]
    Serialize(String),
}

/// Serialize `doc` (wrapped with its display name) into the cells of
/// `region`. Takes a world snapshot before clearing the region, so the host
/// can undo the operation.
pub fn encode_preset(
    world: &mut dyn World,
    name: &str,
    doc: &PresetDoc,
    region: Rect,
) -> Result<(), EmbedError> {
    let data = serde_json::to_string(doc).map_err(|e| EmbedError::Serialize(e.to_string()))?;
    let envelope = PresetEnvelope {
        name: name.to_string(),
        data,
    };
    let payload =
        serde_json::to_vec(&envelope).map_err(|e| EmbedError::Serialize(e.to_string()))?;

    let chunk_count = payload.len().div_ceil(CHUNK_BYTES) as u64;
    let need = chunk_count + 2;
    let have = region.cells();
    if need > have || chunk_count > u16::MAX as u64 {
        return Err(EmbedError::CapacityExceeded { need, have });
    }

    let checksum = payload_checksum(&payload);
    log::debug!(
        "embedding preset `{}`: {} bytes, {} chunks, checksum {:#06x}",
        name,
        payload.len(),
        chunk_count,
        checksum
    );

    world.snapshot();
    world.clear_region(region);

    // Fill the whole region with marker cells whose flags point at the
    // origin; body writes below overwrite their slice of it
    let origin = (region.x, region.bottom());
    for y in region.y..=region.bottom() {
        for x in region.x..region.x + region.width {
            world.set_cell(x, y, marker_cell(region, x, y, [0; 4]));
        }
    }

    // Header
    world.set_cell(
        origin.0,
        origin.1,
        CellRecord {
            material: DATA_MATERIAL,
            magic: EMBED_MAGIC,
            flags: NavFlags::HEADER.bits(),
            words: [
                checksum,
                chunk_count as u16,
                region.width as u16,
                region.height as u16,
            ],
        },
    );

    // Chunk cells
    for (i, chunk) in payload.chunks(CHUNK_BYTES).enumerate() {
        let mut bytes: SmallVec<[u8; CHUNK_BYTES]> = SmallVec::from_slice(chunk);
        bytes.resize(CHUNK_BYTES, 0);
        let words = [
            pack_word(bytes[0], bytes[1]),
            pack_word(bytes[2], bytes[3]),
            pack_word(bytes[4], bytes[5]),
            pack_word(bytes[6], bytes[7]),
        ];
        let (x, y) = body_pos(origin.0, origin.1, region.width, i as u32 + 1);
        world.set_cell(x, y, marker_cell(region, x, y, words));
    }

    // Footer
    let (x, y) = body_pos(origin.0, origin.1, region.width, chunk_count as u32 + 1);
    let mut footer = marker_cell(region, x, y, [0; 4]);
    footer.flags |= NavFlags::FOOTER.bits();
    world.set_cell(x, y, footer);

    Ok(())
}

/// A marker cell for `(x, y)` with its direction flags toward the origin.
fn marker_cell(region: Rect, x: i32, y: i32, words: [u16; 4]) -> CellRecord {
    let mut flags = NavFlags::empty();
    if x > region.x {
        flags |= NavFlags::RIGHT;
    }
    if y < region.bottom() {
        flags |= NavFlags::UP;
    }
    CellRecord {
        material: DATA_MATERIAL,
        magic: EMBED_MAGIC,
        flags: flags.bits(),
        words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;
    use cindergrid_preset::PresetDoc;

    fn empty_doc() -> PresetDoc {
        PresetDoc {
            version_major: Some(1),
            version_minor: Some(0),
            passes: vec![],
        }
    }

    /// Pad the preset name so the envelope payload is exactly `len` bytes.
    fn name_for_payload_len(doc: &PresetDoc, len: usize) -> String {
        let probe = PresetEnvelope {
            name: String::new(),
            data: serde_json::to_string(doc).unwrap(),
        };
        let base = serde_json::to_vec(&probe).unwrap().len();
        assert!(len >= base, "payload cannot shrink below {}", base);
        "x".repeat(len - base)
    }

    #[test]
    fn test_capacity_failure_writes_nothing() {
        let mut world = MemoryWorld::new(16, 16);
        let doc = empty_doc();
        // 120 bytes -> 15 chunks -> 17 cells needed, one more than 4x4 has
        let name = name_for_payload_len(&doc, 120);
        let region = Rect::new(2, 2, 4, 4);

        let result = encode_preset(&mut world, &name, &doc, region);
        assert_eq!(
            result,
            Err(EmbedError::CapacityExceeded { need: 17, have: 16 })
        );
        for y in 0..16 {
            for x in 0..16 {
                assert_eq!(world.cell(x, y), None);
            }
        }
    }

    #[test]
    fn test_fill_flags_point_at_origin() {
        let mut world = MemoryWorld::new(16, 16);
        let doc = empty_doc();
        let region = Rect::new(3, 5, 5, 4);
        encode_preset(&mut world, "flags", &doc, region).unwrap();

        for y in region.y..=region.bottom() {
            for x in region.x..region.x + region.width {
                let flags = NavFlags::from_bits_truncate(world.cell(x, y).unwrap().flags);
                if flags.contains(NavFlags::HEADER) {
                    assert_eq!((x, y), (region.x, region.bottom()));
                    continue;
                }
                assert_eq!(flags.contains(NavFlags::RIGHT), x > region.x);
                assert_eq!(flags.contains(NavFlags::UP), y < region.bottom());
            }
        }
    }

    #[test]
    fn test_header_words_describe_the_record() {
        let mut world = MemoryWorld::new(16, 16);
        let doc = empty_doc();
        let region = Rect::new(0, 0, 8, 8);
        encode_preset(&mut world, "header", &doc, region).unwrap();

        let header = world.cell(0, 7).unwrap();
        assert_eq!(header.material, DATA_MATERIAL);
        assert_eq!(header.magic, EMBED_MAGIC);
        assert_eq!(header.flags, NavFlags::HEADER.bits());
        let [_checksum, chunks, width, height] = header.words;
        assert!(chunks > 0);
        assert_eq!(width, 8);
        assert_eq!(height, 8);

        // Footer directly after the last chunk
        let (fx, fy) = body_pos(0, 7, 8, chunks as u32 + 1);
        let footer = NavFlags::from_bits_truncate(world.cell(fx, fy).unwrap().flags);
        assert!(footer.contains(NavFlags::FOOTER));
    }
}

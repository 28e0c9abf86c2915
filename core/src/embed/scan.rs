//! Per-tick embedded-data scanner
//!
//! The host polls the cell under the cursor every tick. The cheap cases stay
//! cheap: no cell or no magic word answers immediately, and a record whose
//! header identity (position, checksum, chunk count) matches the previous
//! full decode is answered from cache without re-reading the body or
//! re-parsing JSON. Only a header-identity change triggers a fresh decode.

use cindergrid_preset::ValidatePolicy;

use crate::world::World;

use super::decode::{DecodeError, DecodedPreset, decode_at, find_header};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderIdentity {
    x: i32,
    y: i32,
    checksum: u16,
    chunk_count: u16,
}

/// Polling front end over [`decode_at`] with header-identity memoization.
#[derive(Default)]
pub struct EmbedScanner {
    cached: Option<(HeaderIdentity, DecodedPreset)>,
    full_decodes: u64,
}

impl EmbedScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the record covering `(x, y)`, reusing the previous result when
    /// the record's header has not changed.
    pub fn scan(
        &mut self,
        world: &dyn World,
        policy: ValidatePolicy,
        x: i32,
        y: i32,
    ) -> Result<Option<DecodedPreset>, DecodeError> {
        let Some((hx, hy, header)) = find_header(world, x, y)? else {
            return Ok(None);
        };

        let identity = HeaderIdentity {
            x: hx,
            y: hy,
            checksum: header.words[0],
            chunk_count: header.words[1],
        };
        if let Some((cached_identity, decoded)) = &self.cached
            && *cached_identity == identity
        {
            return Ok(Some(decoded.clone()));
        }

        if self.cached.is_some() {
            log::debug!("embedded record changed under cursor, re-decoding");
        }

        let decoded = decode_at(world, policy, x, y)?;
        self.full_decodes += 1;
        if let Some(decoded) = &decoded {
            self.cached = Some((identity, decoded.clone()));
        }
        Ok(decoded)
    }

    /// Drop the memoized decode (e.g. after the host mutates the grid).
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Full decodes performed so far; polling an unchanged record does not
    /// increase this.
    pub fn full_decodes(&self) -> u64 {
        self.full_decodes
    }
}

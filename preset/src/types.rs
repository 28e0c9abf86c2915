//! Validated preset model
//!
//! These types only exist on the far side of [`crate::validate`]: material
//! names are resolved to ids, missing optional fields are filled from the
//! default table, and every numeric field is inside its declared range. The
//! pipeline consumes this model and never re-checks it.

use serde::{Deserialize, Serialize};

/// Host material identifier. Fits a single cell payload word.
pub type MaterialId = u16;

/// Schema version carried by a validated preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u16,
    pub minor: u16,
}

/// A validated generation recipe. Immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub version: SchemaVersion,
    pub passes: Vec<Pass>,
}

/// One generate-then-settle cycle within a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    /// Rows above the world floor where this pass's offsets start.
    pub baseline_offset: i32,
    /// Ticks to hold after materialization so physics can settle.
    pub settle_duration: u32,
    /// Grant placed static solids temporary granular physics while settling.
    pub solid_gravity_override: bool,
    pub layers: Vec<Layer>,
}

/// One generation operation.
///
/// `Uniform` and `Padded` place material relative to the running column
/// cursor (stacked). `Vein` stamps and `Replace` matches at absolute
/// coordinates. That asymmetry is part of the format, not an accident of this
/// implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    Uniform {
        material: MaterialId,
        thickness: f32,
        variation: f32,
    },
    Padded {
        material: MaterialId,
        thickness: f32,
        variation: f32,
    },
    Vein {
        material: MaterialId,
        min_y: i32,
        max_y: i32,
        width: i32,
        height: i32,
        count: i32,
    },
    Replace {
        /// Material being matched.
        material: MaterialId,
        /// Material written in its place.
        into: MaterialId,
        percent: f32,
        in_existing: bool,
        in_layer: bool,
        preserve_props: bool,
    },
}

impl Layer {
    /// The material this layer writes into the world. This is the material
    /// that receives the granular-physics override when a pass requests it.
    pub fn placed_material(&self) -> MaterialId {
        match self {
            Layer::Uniform { material, .. }
            | Layer::Padded { material, .. }
            | Layer::Vein { material, .. } => *material,
            Layer::Replace { into, .. } => *into,
        }
    }
}

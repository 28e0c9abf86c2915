//! Preset JSON wire format
//!
//! Every checkable field is an `Option` so the validator owns presence
//! checks and can report a structured error or warning instead of a serde
//! failure. Field names are camelCase on the wire.
//!
//! Layer `mode` selects the generation algorithm; `type` names the layer's
//! material. The remaining fields are mode-specific and all optional (missing
//! ones are filled from the default table during validation):
//!
//! ```text
//! mode 1 Uniform:  thickness, variation
//! mode 2 Padded:   thickness, variation
//! mode 3 Vein:     minY, maxY, width, height, count
//! mode 4 Replace:  into (required), percent, inExisting, inLayer, preserveProps
//! ```

use serde::{Deserialize, Serialize};

/// Layer mode tag: stack material above each column's cursor.
pub const MODE_UNIFORM: i64 = 1;
/// Layer mode tag: pad all columns to the tallest, then stack.
pub const MODE_PADDED: i64 = 2;
/// Layer mode tag: stamp diamond-shaped blobs at absolute offsets.
pub const MODE_VEIN: i64 = 3;
/// Layer mode tag: re-type matching material in the grid and/or the buffer.
pub const MODE_REPLACE: i64 = 4;

/// A preset as it appears on disk and inside embedded records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_major: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_minor: Option<u16>,
    #[serde(default)]
    pub passes: Vec<PassDoc>,
}

impl PresetDoc {
    /// Serialize to pretty JSON (the on-disk store format).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One generate-then-settle cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDoc {
    /// Baseline offset above the world floor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i64>,
    /// Ticks to hold after materialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_time: Option<i64>,
    /// Grant placed static solids temporary granular physics while settling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_gravity_to_solids: Option<bool>,
    /// Layers, applied in order. Absent (vs empty) is a validation error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerDoc>>,
}

/// One generation operation within a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    /// Material name, resolved against the host registry.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_y: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    /// Replacement material name (Replace mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub into: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_existing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_layer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_props: Option<bool>,
}

/// Wrapper serialized into embedded records: a preset plus its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetEnvelope {
    pub name: String,
    /// JSON text of a [`PresetDoc`].
    pub data: String,
}

impl PresetEnvelope {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

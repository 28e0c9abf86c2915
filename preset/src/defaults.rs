//! Per-mode default values
//!
//! Substituted by the validator when an optional mode field is missing (with
//! a [`crate::ValidationWarning::MissingOptionalField`] warning), and used by
//! editors to pre-fill new layers. Changing a default is a behavioral change
//! for existing documents that omit the field; treat these like wire
//! constants.

/// Uniform/Padded: cells stacked per column.
pub const THICKNESS: f32 = 8.0;

/// Uniform/Padded: total random spread around the thickness.
pub const VARIATION: f32 = 0.0;

/// Vein: lowest offset a vein center may take.
pub const VEIN_MIN_Y: i32 = 0;

/// Vein: highest offset a vein center may take.
pub const VEIN_MAX_Y: i32 = 64;

/// Vein: bounding-box width of one blob.
pub const VEIN_WIDTH: i32 = 8;

/// Vein: bounding-box height of one blob.
pub const VEIN_HEIGHT: i32 = 4;

/// Vein: blobs stamped per layer.
pub const VEIN_COUNT: i32 = 10;

/// Replace: match probability in percent.
pub const REPLACE_PERCENT: f32 = 100.0;

/// Replace: scan live grid particles.
pub const REPLACE_IN_EXISTING: bool = true;

/// Replace: scan the current pass's buffered cells.
pub const REPLACE_IN_LAYER: bool = false;

/// Replace: keep the particle's attributes when re-typing.
pub const REPLACE_PRESERVE_PROPS: bool = true;

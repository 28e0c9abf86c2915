//! Preset document validation
//!
//! [`validate`] turns a wire [`PresetDoc`] into a repaired, resolved
//! [`Preset`], or a structured fatal error. It never panics and never stops
//! at the first warning: warnings accumulate, the first fatal error ends the
//! run. Every error and warning carries enough context (pass/layer indices,
//! field names, version numbers) for a UI to render a message without
//! re-deriving anything.
//!
//! Check order: schema version, then per-pass required fields, then per-layer
//! mode dispatch, material resolution, and range checks. Missing *optional*
//! mode fields are repaired from [`crate::defaults`] and reported as
//! warnings.

use std::fmt;

use crate::document::{
    LayerDoc, MODE_PADDED, MODE_REPLACE, MODE_UNIFORM, MODE_VEIN, PassDoc, PresetDoc,
};
use crate::types::{Layer, MaterialId, Pass, Preset, SchemaVersion};
use crate::{SCHEMA_MAJOR, SCHEMA_MINOR, defaults};

/// Result of resolving a material name against the host registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialLookup {
    /// A built-in material.
    Core(MaterialId),
    /// A material provided by a mod; only usable when policy allows.
    Modded(MaterialId),
    /// No such material.
    Unknown,
}

/// Material-registry capability consumed by the validator.
pub trait MaterialResolver {
    fn lookup(&self, name: &str) -> MaterialLookup;
}

/// Host policy knobs for validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatePolicy {
    /// Accept references to modded materials.
    pub allow_modded: bool,
}

/// Fatal validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Document major version is newer than this engine understands.
    #[error("preset requires schema {major}.{minor}, newer than this engine supports")]
    SchemaTooNew { major: u16, minor: u16 },

    /// A required field is absent. `pass`/`layer` are `None` for
    /// document-level fields.
    #[error("missing required field `{field}`")]
    MissingRequiredField {
        field: &'static str,
        pass: Option<usize>,
        layer: Option<usize>,
    },

    /// A numeric field is outside its declared range.
    #[error("`{field}` = {value} is outside {min}..={max}")]
    OutOfRangeValue {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
        pass: usize,
        layer: Option<usize>,
    },

    /// A material reference did not resolve, or resolved to a modded
    /// material the policy rejects.
    #[error("material `{name}` is not allowed here")]
    DisallowedMaterial {
        name: String,
        modded: bool,
        pass: usize,
        layer: usize,
    },

    /// The layer mode tag matches no known variant.
    #[error("unknown layer mode {mode}")]
    UnknownMode { mode: i64, pass: usize, layer: usize },
}

/// Non-fatal findings. The document is still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Document minor version is newer than this engine; ranges only widen
    /// across minors, so reading on is safe but may drop information.
    SchemaNewerMinor { major: u16, minor: u16 },
    /// An optional mode field was absent and filled from the default table.
    MissingOptionalField {
        pass: usize,
        layer: usize,
        field: &'static str,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::SchemaNewerMinor { major, minor } => write!(
                f,
                "preset schema {}.{} is newer than {}.{}; unknown fields will be ignored",
                major, minor, SCHEMA_MAJOR, SCHEMA_MINOR
            ),
            ValidationWarning::MissingOptionalField { pass, layer, field } => write!(
                f,
                "pass {} layer {}: `{}` not set, using default",
                pass, layer, field
            ),
        }
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// The repaired, resolved preset. Present exactly when `error` is `None`.
    pub preset: Option<Preset>,
    pub warnings: Vec<ValidationWarning>,
    pub error: Option<ValidationError>,
}

impl ValidationOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    fn fatal(error: ValidationError, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            preset: None,
            warnings,
            error: Some(error),
        }
    }
}

// Range table. Minor schema revisions may widen these, never shrink them.
const BOTTOM_RANGE: (f64, f64) = (-4096.0, 4096.0);
const SETTLE_RANGE: (f64, f64) = (0.0, 100_000.0);
const THICKNESS_RANGE: (f64, f64) = (0.0, 2048.0);
const VARIATION_RANGE: (f64, f64) = (0.0, 2048.0);
const VEIN_Y_RANGE: (f64, f64) = (0.0, 4096.0);
const VEIN_SIZE_RANGE: (f64, f64) = (1.0, 256.0);
const VEIN_COUNT_RANGE: (f64, f64) = (0.0, 10_000.0);
const PERCENT_RANGE: (f64, f64) = (0.0, 100.0);

/// Validate a wire document against this engine's schema and the host
/// material registry.
pub fn validate(
    doc: &PresetDoc,
    resolver: &dyn MaterialResolver,
    policy: ValidatePolicy,
) -> ValidationOutcome {
    let mut warnings = Vec::new();

    let Some(major) = doc.version_major else {
        return ValidationOutcome::fatal(
            ValidationError::MissingRequiredField {
                field: "versionMajor",
                pass: None,
                layer: None,
            },
            warnings,
        );
    };
    if major > SCHEMA_MAJOR {
        return ValidationOutcome::fatal(
            ValidationError::SchemaTooNew {
                major,
                minor: doc.version_minor.unwrap_or(0),
            },
            warnings,
        );
    }
    let Some(minor) = doc.version_minor else {
        return ValidationOutcome::fatal(
            ValidationError::MissingRequiredField {
                field: "versionMinor",
                pass: None,
                layer: None,
            },
            warnings,
        );
    };
    if major == SCHEMA_MAJOR && minor > SCHEMA_MINOR {
        warnings.push(ValidationWarning::SchemaNewerMinor { major, minor });
    }

    let mut passes = Vec::with_capacity(doc.passes.len());
    for (pass_idx, pass) in doc.passes.iter().enumerate() {
        match validate_pass(pass_idx, pass, resolver, policy, &mut warnings) {
            Ok(validated) => passes.push(validated),
            Err(error) => return ValidationOutcome::fatal(error, warnings),
        }
    }

    ValidationOutcome {
        preset: Some(Preset {
            version: SchemaVersion { major, minor },
            passes,
        }),
        warnings,
        error: None,
    }
}

fn validate_pass(
    pass_idx: usize,
    pass: &PassDoc,
    resolver: &dyn MaterialResolver,
    policy: ValidatePolicy,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Pass, ValidationError> {
    let missing = |field: &'static str| ValidationError::MissingRequiredField {
        field,
        pass: Some(pass_idx),
        layer: None,
    };

    let bottom = pass.bottom.ok_or_else(|| missing("bottom"))?;
    check_range("bottom", bottom as f64, BOTTOM_RANGE, pass_idx, None)?;

    let settle = pass.settle_time.ok_or_else(|| missing("settleTime"))?;
    check_range("settleTime", settle as f64, SETTLE_RANGE, pass_idx, None)?;

    // Pass-level flag, not a mode field: absent means off, no warning.
    let solid_gravity_override = pass.add_gravity_to_solids.unwrap_or(false);

    let layer_docs = pass.layers.as_ref().ok_or_else(|| missing("layers"))?;

    let mut layers = Vec::with_capacity(layer_docs.len());
    for (layer_idx, layer) in layer_docs.iter().enumerate() {
        layers.push(validate_layer(
            pass_idx, layer_idx, layer, resolver, policy, warnings,
        )?);
    }

    Ok(Pass {
        baseline_offset: bottom as i32,
        settle_duration: settle as u32,
        solid_gravity_override,
        layers,
    })
}

fn validate_layer(
    pass_idx: usize,
    layer_idx: usize,
    layer: &LayerDoc,
    resolver: &dyn MaterialResolver,
    policy: ValidatePolicy,
    warnings: &mut Vec<ValidationWarning>,
) -> Result<Layer, ValidationError> {
    let missing = |field: &'static str| ValidationError::MissingRequiredField {
        field,
        pass: Some(pass_idx),
        layer: Some(layer_idx),
    };

    let mode = layer.mode.ok_or_else(|| missing("mode"))?;
    let name = layer.material.as_deref().ok_or_else(|| missing("type"))?;
    if !matches!(mode, MODE_UNIFORM | MODE_PADDED | MODE_VEIN | MODE_REPLACE) {
        return Err(ValidationError::UnknownMode {
            mode,
            pass: pass_idx,
            layer: layer_idx,
        });
    }
    let material = resolve_material(name, resolver, policy, pass_idx, layer_idx)?;

    let mut ctx = FieldContext {
        pass_idx,
        layer_idx,
        warnings,
    };

    match mode {
        MODE_UNIFORM | MODE_PADDED => {
            let thickness = ctx.number(
                layer.thickness,
                "thickness",
                defaults::THICKNESS as f64,
                THICKNESS_RANGE,
            )? as f32;
            let variation = ctx.number(
                layer.variation,
                "variation",
                defaults::VARIATION as f64,
                VARIATION_RANGE,
            )? as f32;
            Ok(if mode == MODE_UNIFORM {
                Layer::Uniform {
                    material,
                    thickness,
                    variation,
                }
            } else {
                Layer::Padded {
                    material,
                    thickness,
                    variation,
                }
            })
        }
        MODE_VEIN => {
            let min_y = ctx.integer(
                layer.min_y,
                "minY",
                defaults::VEIN_MIN_Y,
                VEIN_Y_RANGE,
            )?;
            let max_y = ctx.integer(
                layer.max_y,
                "maxY",
                defaults::VEIN_MAX_Y,
                VEIN_Y_RANGE,
            )?;
            if min_y > max_y {
                return Err(ValidationError::OutOfRangeValue {
                    field: "minY",
                    value: min_y as f64,
                    min: VEIN_Y_RANGE.0,
                    max: max_y as f64,
                    pass: pass_idx,
                    layer: Some(layer_idx),
                });
            }
            let width = ctx.integer(
                layer.width,
                "width",
                defaults::VEIN_WIDTH,
                VEIN_SIZE_RANGE,
            )?;
            let height = ctx.integer(
                layer.height,
                "height",
                defaults::VEIN_HEIGHT,
                VEIN_SIZE_RANGE,
            )?;
            let count = ctx.integer(
                layer.count,
                "count",
                defaults::VEIN_COUNT,
                VEIN_COUNT_RANGE,
            )?;
            Ok(Layer::Vein {
                material,
                min_y,
                max_y,
                width,
                height,
                count,
            })
        }
        MODE_REPLACE => {
            let into_name = layer.into.as_deref().ok_or_else(|| missing("into"))?;
            let into = resolve_material(into_name, resolver, policy, pass_idx, layer_idx)?;
            let percent = ctx.number(
                layer.percent,
                "percent",
                defaults::REPLACE_PERCENT as f64,
                PERCENT_RANGE,
            )? as f32;
            let in_existing = ctx.flag(
                layer.in_existing,
                "inExisting",
                defaults::REPLACE_IN_EXISTING,
            );
            let in_layer = ctx.flag(layer.in_layer, "inLayer", defaults::REPLACE_IN_LAYER);
            let preserve_props = ctx.flag(
                layer.preserve_props,
                "preserveProps",
                defaults::REPLACE_PRESERVE_PROPS,
            );
            Ok(Layer::Replace {
                material,
                into,
                percent,
                in_existing,
                in_layer,
                preserve_props,
            })
        }
        _ => Err(ValidationError::UnknownMode {
            mode,
            pass: pass_idx,
            layer: layer_idx,
        }),
    }
}

fn resolve_material(
    name: &str,
    resolver: &dyn MaterialResolver,
    policy: ValidatePolicy,
    pass_idx: usize,
    layer_idx: usize,
) -> Result<MaterialId, ValidationError> {
    match resolver.lookup(name) {
        MaterialLookup::Core(id) => Ok(id),
        MaterialLookup::Modded(id) if policy.allow_modded => Ok(id),
        MaterialLookup::Modded(_) => Err(ValidationError::DisallowedMaterial {
            name: name.to_string(),
            modded: true,
            pass: pass_idx,
            layer: layer_idx,
        }),
        MaterialLookup::Unknown => Err(ValidationError::DisallowedMaterial {
            name: name.to_string(),
            modded: false,
            pass: pass_idx,
            layer: layer_idx,
        }),
    }
}

/// Shared bookkeeping for per-layer field checks: range-checks present
/// values, substitutes defaults (with a warning) for absent ones.
struct FieldContext<'a> {
    pass_idx: usize,
    layer_idx: usize,
    warnings: &'a mut Vec<ValidationWarning>,
}

impl FieldContext<'_> {
    fn number(
        &mut self,
        value: Option<f64>,
        field: &'static str,
        default: f64,
        range: (f64, f64),
    ) -> Result<f64, ValidationError> {
        match value {
            Some(v) => {
                if v < range.0 || v > range.1 {
                    return Err(ValidationError::OutOfRangeValue {
                        field,
                        value: v,
                        min: range.0,
                        max: range.1,
                        pass: self.pass_idx,
                        layer: Some(self.layer_idx),
                    });
                }
                Ok(v)
            }
            None => {
                self.substituted(field);
                Ok(default)
            }
        }
    }

    fn integer(
        &mut self,
        value: Option<i64>,
        field: &'static str,
        default: i32,
        range: (f64, f64),
    ) -> Result<i32, ValidationError> {
        self.number(value.map(|v| v as f64), field, default as f64, range)
            .map(|v| v as i32)
    }

    fn flag(&mut self, value: Option<bool>, field: &'static str, default: bool) -> bool {
        match value {
            Some(v) => v,
            None => {
                self.substituted(field);
                default
            }
        }
    }

    fn substituted(&mut self, field: &'static str) {
        log::debug!(
            "pass {} layer {}: `{}` missing, substituting default",
            self.pass_idx,
            self.layer_idx,
            field
        );
        self.warnings.push(ValidationWarning::MissingOptionalField {
            pass: self.pass_idx,
            layer: self.layer_idx,
            field,
        });
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    range: (f64, f64),
    pass_idx: usize,
    layer_idx: Option<usize>,
) -> Result<(), ValidationError> {
    if value < range.0 || value > range.1 {
        return Err(ValidationError::OutOfRangeValue {
            field,
            value,
            min: range.0,
            max: range.1,
            pass: pass_idx,
            layer: layer_idx,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{LayerDoc, PassDoc, PresetDoc};
    use std::collections::HashMap;

    struct MapResolver {
        materials: HashMap<&'static str, MaterialLookup>,
    }

    impl MapResolver {
        fn new() -> Self {
            let mut materials = HashMap::new();
            materials.insert("sand", MaterialLookup::Core(1));
            materials.insert("stone", MaterialLookup::Core(2));
            materials.insert("ore", MaterialLookup::Core(3));
            materials.insert("goo", MaterialLookup::Modded(50));
            Self { materials }
        }
    }

    impl MaterialResolver for MapResolver {
        fn lookup(&self, name: &str) -> MaterialLookup {
            self.materials
                .get(name)
                .copied()
                .unwrap_or(MaterialLookup::Unknown)
        }
    }

    fn uniform_layer(material: &str, thickness: f64) -> LayerDoc {
        LayerDoc {
            mode: Some(MODE_UNIFORM),
            material: Some(material.to_string()),
            thickness: Some(thickness),
            variation: Some(0.0),
            ..LayerDoc::default()
        }
    }

    fn one_pass_doc(layers: Vec<LayerDoc>) -> PresetDoc {
        PresetDoc {
            version_major: Some(SCHEMA_MAJOR),
            version_minor: Some(SCHEMA_MINOR),
            passes: vec![PassDoc {
                bottom: Some(0),
                settle_time: Some(0),
                add_gravity_to_solids: None,
                layers: Some(layers),
            }],
        }
    }

    fn check(doc: &PresetDoc) -> ValidationOutcome {
        validate(doc, &MapResolver::new(), ValidatePolicy::default())
    }

    #[test]
    fn test_valid_document() {
        let outcome = check(&one_pass_doc(vec![uniform_layer("sand", 10.0)]));
        assert!(outcome.ok());
        let preset = outcome.preset.unwrap();
        assert_eq!(preset.version.major, SCHEMA_MAJOR);
        assert_eq!(preset.passes.len(), 1);
        assert_eq!(
            preset.passes[0].layers[0],
            Layer::Uniform {
                material: 1,
                thickness: 10.0,
                variation: 0.0
            }
        );
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_newer_major_rejected_regardless_of_content() {
        // Garbage passes after the version must not matter
        let mut doc = one_pass_doc(vec![LayerDoc::default()]);
        doc.version_major = Some(SCHEMA_MAJOR + 1);
        let outcome = check(&doc);
        assert_eq!(
            outcome.error,
            Some(ValidationError::SchemaTooNew {
                major: SCHEMA_MAJOR + 1,
                minor: SCHEMA_MINOR,
            })
        );
        assert!(outcome.preset.is_none());
    }

    #[test]
    fn test_missing_version_fields_fatal() {
        let mut doc = one_pass_doc(vec![uniform_layer("sand", 10.0)]);
        doc.version_minor = None;
        assert_eq!(
            check(&doc).error,
            Some(ValidationError::MissingRequiredField {
                field: "versionMinor",
                pass: None,
                layer: None,
            })
        );

        doc.version_major = None;
        assert_eq!(
            check(&doc).error,
            Some(ValidationError::MissingRequiredField {
                field: "versionMajor",
                pass: None,
                layer: None,
            })
        );
    }

    #[test]
    fn test_newer_minor_warns_but_passes() {
        let mut doc = one_pass_doc(vec![uniform_layer("sand", 10.0)]);
        doc.version_minor = Some(SCHEMA_MINOR + 5);
        let outcome = check(&doc);
        assert!(outcome.ok());
        assert_eq!(
            outcome.warnings,
            vec![ValidationWarning::SchemaNewerMinor {
                major: SCHEMA_MAJOR,
                minor: SCHEMA_MINOR + 5,
            }]
        );
    }

    #[test]
    fn test_missing_pass_field_names_pass_index() {
        let mut doc = one_pass_doc(vec![uniform_layer("sand", 10.0)]);
        doc.passes[0].settle_time = None;
        assert_eq!(
            check(&doc).error,
            Some(ValidationError::MissingRequiredField {
                field: "settleTime",
                pass: Some(0),
                layer: None,
            })
        );
    }

    #[test]
    fn test_unknown_mode() {
        let layer = LayerDoc {
            mode: Some(9),
            material: Some("sand".to_string()),
            ..LayerDoc::default()
        };
        assert_eq!(
            check(&one_pass_doc(vec![layer])).error,
            Some(ValidationError::UnknownMode {
                mode: 9,
                pass: 0,
                layer: 0,
            })
        );
    }

    #[test]
    fn test_unknown_material() {
        let outcome = check(&one_pass_doc(vec![uniform_layer("plutonium", 4.0)]));
        assert_eq!(
            outcome.error,
            Some(ValidationError::DisallowedMaterial {
                name: "plutonium".to_string(),
                modded: false,
                pass: 0,
                layer: 0,
            })
        );
    }

    #[test]
    fn test_modded_material_gated_by_policy() {
        let doc = one_pass_doc(vec![uniform_layer("goo", 4.0)]);

        let strict = check(&doc);
        assert_eq!(
            strict.error,
            Some(ValidationError::DisallowedMaterial {
                name: "goo".to_string(),
                modded: true,
                pass: 0,
                layer: 0,
            })
        );

        let lenient = validate(
            &doc,
            &MapResolver::new(),
            ValidatePolicy { allow_modded: true },
        );
        assert!(lenient.ok());
        assert_eq!(lenient.preset.unwrap().passes[0].layers[0].placed_material(), 50);
    }

    #[test]
    fn test_out_of_range_thickness() {
        let outcome = check(&one_pass_doc(vec![uniform_layer("sand", 5000.0)]));
        assert_eq!(
            outcome.error,
            Some(ValidationError::OutOfRangeValue {
                field: "thickness",
                value: 5000.0,
                min: 0.0,
                max: 2048.0,
                pass: 0,
                layer: Some(0),
            })
        );
    }

    #[test]
    fn test_missing_optional_field_warns_and_defaults() {
        let mut layer = uniform_layer("sand", 10.0);
        layer.variation = None;
        let outcome = check(&one_pass_doc(vec![layer]));
        assert!(outcome.ok());
        assert_eq!(
            outcome.warnings,
            vec![ValidationWarning::MissingOptionalField {
                pass: 0,
                layer: 0,
                field: "variation",
            }]
        );
        let preset = outcome.preset.unwrap();
        let Layer::Uniform { variation, .. } = preset.passes[0].layers[0] else {
            panic!("expected uniform layer");
        };
        assert_eq!(variation, defaults::VARIATION);
    }

    #[test]
    fn test_vein_min_above_max_rejected() {
        let layer = LayerDoc {
            mode: Some(MODE_VEIN),
            material: Some("ore".to_string()),
            min_y: Some(40),
            max_y: Some(10),
            width: Some(6),
            height: Some(3),
            count: Some(5),
            ..LayerDoc::default()
        };
        let outcome = check(&one_pass_doc(vec![layer]));
        assert!(matches!(
            outcome.error,
            Some(ValidationError::OutOfRangeValue { field: "minY", .. })
        ));
    }

    #[test]
    fn test_replace_requires_into() {
        let layer = LayerDoc {
            mode: Some(MODE_REPLACE),
            material: Some("stone".to_string()),
            percent: Some(50.0),
            ..LayerDoc::default()
        };
        assert_eq!(
            check(&one_pass_doc(vec![layer])).error,
            Some(ValidationError::MissingRequiredField {
                field: "into",
                pass: Some(0),
                layer: Some(0),
            })
        );
    }

    #[test]
    fn test_replace_defaults_fill_in() {
        let layer = LayerDoc {
            mode: Some(MODE_REPLACE),
            material: Some("stone".to_string()),
            into: Some("sand".to_string()),
            ..LayerDoc::default()
        };
        let outcome = check(&one_pass_doc(vec![layer]));
        assert!(outcome.ok());
        // percent, inExisting, inLayer, preserveProps all defaulted
        assert_eq!(outcome.warnings.len(), 4);
        let preset = outcome.preset.unwrap();
        assert_eq!(
            preset.passes[0].layers[0],
            Layer::Replace {
                material: 2,
                into: 1,
                percent: defaults::REPLACE_PERCENT,
                in_existing: defaults::REPLACE_IN_EXISTING,
                in_layer: defaults::REPLACE_IN_LAYER,
                preserve_props: defaults::REPLACE_PRESERVE_PROPS,
            }
        );
    }
}

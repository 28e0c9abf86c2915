//! Resumable pass pipeline
//!
//! The pipeline is an explicit state machine driven by the host: one
//! [`GenerationPipeline::step`] call per tick, returning [`StepResult`].
//! There are no implicit suspension points - every `Continue` *is* the
//! suspension. Per pass it generates the column buffer, materializes it into
//! the grid a few columns per tick (never stopping mid-column), then holds
//! for the pass's settle duration while host physics runs.
//!
//! While a pass with `solid_gravity_override` runs, each placed material that
//! is normally a static solid has its physics attributes snapshotted once and
//! replaced with granular values, so freshly placed terrain can slump before
//! it freezes. Restoration is idempotent, runs at the end of every pass, on
//! cancellation, and defensively again at the start of each pass (covering
//! resume after an interrupted run).

use cindergrid_preset::{MaterialId, Pass, Preset, ValidationError, ValidationOutcome};
use hashbrown::HashMap;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::generate::{ColumnBuffer, HeightCursor, apply_layer};
use crate::world::{FallBehavior, MaterialClass, MaterialProps, World};

/// Columns written per `step()` during materialization.
pub const MATERIALIZE_COLUMNS_PER_STEP: i32 = 10;

/// Granular physics applied to overridden solids while a pass settles.
pub const GRANULAR_OVERRIDE: MaterialProps = MaterialProps {
    behavior: FallBehavior::Granular,
    loss: 0.9,
    gravity: 0.3,
    weight: 90,
    class: MaterialClass::Powder,
};

/// What the host should do after a `step()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Call `step()` again next tick.
    Continue,
    /// All passes finished.
    Done,
    /// The run was cancelled; overrides are already restored.
    Cancelled,
}

/// Errors raised before a pipeline starts stepping.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The validation outcome was fatal; generation refuses to start.
    #[error("preset failed validation: {0}")]
    InvalidPreset(ValidationError),
    /// The outcome carried no preset (and no error) - nothing to run.
    #[error("validation outcome carries no preset")]
    EmptyOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Idle,
    Generating { pass: usize },
    Materializing { pass: usize, column: i32 },
    Settling { pass: usize, remaining: u32 },
    Done,
    Cancelled,
}

/// Host-driven terrain generation run over one validated preset.
pub struct GenerationPipeline {
    preset: Preset,
    state: PipelineState,
    rng: Pcg32,
    cursor: HeightCursor,
    buffer: ColumnBuffer,
    overridden: HashMap<MaterialId, MaterialProps>,
}

impl GenerationPipeline {
    /// Start a run from an already validated preset. The same preset and
    /// seed always produce the same grid.
    pub fn new(preset: Preset, seed: u64) -> Self {
        Self {
            preset,
            state: PipelineState::Idle,
            rng: Pcg32::seed_from_u64(seed),
            cursor: HeightCursor::new(0),
            buffer: ColumnBuffer::new(0),
            overridden: HashMap::new(),
        }
    }

    /// Start a run from a validation outcome, refusing fatal ones.
    pub fn from_outcome(outcome: &ValidationOutcome, seed: u64) -> Result<Self, PipelineError> {
        if let Some(error) = &outcome.error {
            return Err(PipelineError::InvalidPreset(error.clone()));
        }
        let preset = outcome.preset.clone().ok_or(PipelineError::EmptyOutcome)?;
        Ok(Self::new(preset, seed))
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            PipelineState::Done | PipelineState::Cancelled
        )
    }

    /// Abort the run. Any physics overrides are restored before the pipeline
    /// parks in `Cancelled`.
    pub fn cancel(&mut self, world: &mut dyn World) {
        self.restore_overrides(world);
        if !self.is_finished() {
            log::info!("terrain generation cancelled");
            self.state = PipelineState::Cancelled;
        }
    }

    /// Advance the run by one tick. Does nothing while the host simulation
    /// is paused.
    pub fn step(&mut self, world: &mut dyn World) -> StepResult {
        if world.paused() && !self.is_finished() {
            return StepResult::Continue;
        }

        match self.state {
            PipelineState::Idle => {
                if self.preset.passes.is_empty() {
                    self.state = PipelineState::Done;
                    return StepResult::Done;
                }
                self.begin_pass(0, world);
                StepResult::Continue
            }
            PipelineState::Generating { pass } => {
                self.run_layers(pass, world);
                self.state = PipelineState::Materializing { pass, column: 0 };
                StepResult::Continue
            }
            PipelineState::Materializing { pass, column } => {
                let end = (column + MATERIALIZE_COLUMNS_PER_STEP).min(world.width());
                for x in column..end {
                    self.materialize_column(pass, x, world);
                }
                if end >= world.width() {
                    self.state = PipelineState::Settling {
                        pass,
                        remaining: self.preset.passes[pass].settle_duration,
                    };
                } else {
                    self.state = PipelineState::Materializing { pass, column: end };
                }
                StepResult::Continue
            }
            PipelineState::Settling { pass, remaining } => {
                if remaining > 0 {
                    self.state = PipelineState::Settling {
                        pass,
                        remaining: remaining - 1,
                    };
                    return StepResult::Continue;
                }
                self.restore_overrides(world);
                let next = pass + 1;
                if next >= self.preset.passes.len() {
                    log::info!("terrain generation finished ({} passes)", next);
                    self.state = PipelineState::Done;
                    StepResult::Done
                } else {
                    self.begin_pass(next, world);
                    StepResult::Continue
                }
            }
            PipelineState::Done => StepResult::Done,
            PipelineState::Cancelled => StepResult::Cancelled,
        }
    }

    fn begin_pass(&mut self, pass: usize, world: &mut dyn World) {
        // Defensive: a previous run may have died mid-pass
        self.restore_overrides(world);
        let columns = world.width().max(0) as usize;
        self.cursor = HeightCursor::new(columns);
        self.buffer = ColumnBuffer::new(columns);
        log::debug!("starting terrain pass {}", pass);
        self.state = PipelineState::Generating { pass };
    }

    fn run_layers(&mut self, pass: usize, world: &mut dyn World) {
        let pass_cfg = self.preset.passes[pass].clone();
        for layer in &pass_cfg.layers {
            if pass_cfg.solid_gravity_override {
                self.maybe_override(layer.placed_material(), world);
            }
            apply_layer(layer, world, &mut self.rng, &mut self.cursor, &mut self.buffer);
        }
    }

    /// Snapshot-and-override a material's physics, at most once per pass.
    fn maybe_override(&mut self, material: MaterialId, world: &mut dyn World) {
        if self.overridden.contains_key(&material) {
            return;
        }
        let Some(props) = world.material_props(material) else {
            return;
        };
        if !props.is_static_solid() {
            return;
        }
        log::debug!("granting granular physics to material {}", material);
        self.overridden.insert(material, props);
        world.set_material_props(material, GRANULAR_OVERRIDE);
    }

    fn restore_overrides(&mut self, world: &mut dyn World) {
        if self.overridden.is_empty() {
            return;
        }
        log::debug!("restoring {} overridden materials", self.overridden.len());
        for (material, props) in self.overridden.drain() {
            world.set_material_props(material, props);
        }
    }

    fn materialize_column(&self, pass: usize, x: i32, world: &mut dyn World) {
        let pass_cfg: &Pass = &self.preset.passes[pass];
        let floor = world.height() - 1;
        for (offset, material) in self.buffer.column_sorted(x as usize) {
            let y = floor - pass_cfg.baseline_offset - offset;
            if world.contains(x, y) {
                world.spawn(x, y, material);
            }
        }
    }
}

//! World capability consumed by the pipeline and the embedding codec
//!
//! The generation core never touches the host engine directly. It sees a
//! narrow slice of it through [`World`]: cell reads and writes, a material
//! registry (via the [`MaterialResolver`] supertrait), the physics attribute
//! table, a snapshot/restore undo hook for destructive operations, and the
//! host's paused flag. [`MemoryWorld`] implements the whole slice in memory.

mod mem;

pub use mem::MemoryWorld;

use cindergrid_preset::{MaterialId, MaterialResolver};

/// Axis-aligned cell rectangle. `y` grows downward; the bottom row of a rect
/// is `y + height - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Bottom row index (the row embedded-record origins live on).
    pub fn bottom(&self) -> i32 {
        self.y + self.height - 1
    }

    pub fn cells(&self) -> u64 {
        self.width.max(0) as u64 * self.height.max(0) as u64
    }
}

/// The capability-level view of one occupied grid cell.
///
/// `magic`, `flags`, and `words` are the payload slice the embedding codec
/// writes; ordinary particles leave them at their spawn defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellRecord {
    pub material: MaterialId,
    pub magic: u16,
    pub flags: u8,
    pub words: [u16; 4],
}

impl CellRecord {
    /// A freshly spawned particle of `material` with default attributes.
    pub fn of(material: MaterialId) -> Self {
        Self {
            material,
            ..Self::default()
        }
    }
}

/// How a particle moves each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallBehavior {
    Static,
    Granular,
    Liquid,
    Gas,
}

/// Broad material type-class used by host physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialClass {
    Solid,
    Powder,
    Liquid,
    Gas,
    Energy,
}

/// The physics attribute slice the pipeline snapshots and overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProps {
    pub behavior: FallBehavior,
    /// Velocity retained on collision.
    pub loss: f32,
    pub gravity: f32,
    pub weight: i32,
    pub class: MaterialClass,
}

impl MaterialProps {
    /// Whether this material normally sits still - the only kind the
    /// solid-gravity override applies to.
    pub fn is_static_solid(&self) -> bool {
        self.class == MaterialClass::Solid && self.behavior == FallBehavior::Static
    }
}

/// Host grid + registry capability.
///
/// `cell` returns `None` both for empty cells and out-of-range coordinates;
/// callers that care about the difference check `width`/`height` first.
pub trait World: MaterialResolver {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn cell(&self, x: i32, y: i32) -> Option<CellRecord>;
    /// Write a full cell record (embedding codec path).
    fn set_cell(&mut self, x: i32, y: i32, cell: CellRecord);
    fn clear_cell(&mut self, x: i32, y: i32);
    fn clear_region(&mut self, rect: Rect);

    /// Place a fresh particle with default attributes.
    fn spawn(&mut self, x: i32, y: i32, material: MaterialId);
    /// Change an existing particle's material, keeping its attributes.
    fn retype(&mut self, x: i32, y: i32, material: MaterialId);

    fn material_props(&self, material: MaterialId) -> Option<MaterialProps>;
    fn set_material_props(&mut self, material: MaterialId, props: MaterialProps);

    /// Record an undo point before a destructive operation.
    fn snapshot(&mut self);
    /// Roll the grid back to the last undo point.
    fn restore(&mut self);

    /// Whether the host simulation is paused this tick.
    fn paused(&self) -> bool;

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width() && y >= 0 && y < self.height()
    }
}

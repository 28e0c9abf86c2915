//! In-memory world
//!
//! Backs tests and headless tools. Cells are a dense `Vec<Option<CellRecord>>`,
//! the material registry is a pair of hash maps, and snapshot/restore keeps a
//! single undo copy of the grid (restoring does not consume it, so restore is
//! idempotent).

use hashbrown::HashMap;

use cindergrid_preset::{MaterialId, MaterialLookup, MaterialResolver};

use super::{CellRecord, MaterialProps, Rect, World};

struct MaterialDef {
    modded: bool,
    props: MaterialProps,
}

/// In-memory [`World`] implementation.
pub struct MemoryWorld {
    width: i32,
    height: i32,
    cells: Vec<Option<CellRecord>>,
    materials: HashMap<MaterialId, MaterialDef>,
    names: HashMap<String, MaterialId>,
    undo: Option<Vec<Option<CellRecord>>>,
    paused: bool,
}

impl MemoryWorld {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "world dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            materials: HashMap::new(),
            names: HashMap::new(),
            undo: None,
            paused: false,
        }
    }

    /// Register a material under `name`. Modded materials resolve as
    /// [`MaterialLookup::Modded`] and are subject to validation policy.
    pub fn register_material(
        &mut self,
        name: impl Into<String>,
        id: MaterialId,
        modded: bool,
        props: MaterialProps,
    ) {
        self.names.insert(name.into(), id);
        self.materials.insert(id, MaterialDef { modded, props });
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Number of particles currently of `material` (test helper).
    pub fn count_material(&self, material: MaterialId) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| c.material == material)
            .count()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }
}

impl MaterialResolver for MemoryWorld {
    fn lookup(&self, name: &str) -> MaterialLookup {
        match self.names.get(name) {
            Some(&id) => {
                if self.materials.get(&id).is_some_and(|def| def.modded) {
                    MaterialLookup::Modded(id)
                } else {
                    MaterialLookup::Core(id)
                }
            }
            None => MaterialLookup::Unknown,
        }
    }
}

impl World for MemoryWorld {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn cell(&self, x: i32, y: i32) -> Option<CellRecord> {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    fn set_cell(&mut self, x: i32, y: i32, cell: CellRecord) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Some(cell);
        }
    }

    fn clear_cell(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = None;
        }
    }

    fn clear_region(&mut self, rect: Rect) {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                self.clear_cell(x, y);
            }
        }
    }

    fn spawn(&mut self, x: i32, y: i32, material: MaterialId) {
        self.set_cell(x, y, CellRecord::of(material));
    }

    fn retype(&mut self, x: i32, y: i32, material: MaterialId) {
        if let Some(i) = self.index(x, y)
            && let Some(cell) = self.cells[i].as_mut()
        {
            cell.material = material;
        }
    }

    fn material_props(&self, material: MaterialId) -> Option<MaterialProps> {
        self.materials.get(&material).map(|def| def.props)
    }

    fn set_material_props(&mut self, material: MaterialId, props: MaterialProps) {
        if let Some(def) = self.materials.get_mut(&material) {
            def.props = props;
        }
    }

    fn snapshot(&mut self) {
        self.undo = Some(self.cells.clone());
    }

    fn restore(&mut self) {
        if let Some(undo) = &self.undo {
            self.cells = undo.clone();
        }
    }

    fn paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{FallBehavior, MaterialClass};

    fn props() -> MaterialProps {
        MaterialProps {
            behavior: FallBehavior::Granular,
            loss: 0.95,
            gravity: 0.25,
            weight: 80,
            class: MaterialClass::Powder,
        }
    }

    #[test]
    fn test_cells_out_of_range_are_none() {
        let world = MemoryWorld::new(4, 4);
        assert_eq!(world.cell(-1, 0), None);
        assert_eq!(world.cell(0, 4), None);
        assert!(!world.contains(4, 0));
    }

    #[test]
    fn test_retype_preserves_payload_spawn_does_not() {
        let mut world = MemoryWorld::new(4, 4);
        world.set_cell(
            1,
            1,
            CellRecord {
                material: 1,
                magic: 7,
                flags: 3,
                words: [1, 2, 3, 4],
            },
        );

        world.retype(1, 1, 2);
        let kept = world.cell(1, 1).unwrap();
        assert_eq!(kept.material, 2);
        assert_eq!(kept.words, [1, 2, 3, 4]);

        world.spawn(1, 1, 3);
        assert_eq!(world.cell(1, 1).unwrap(), CellRecord::of(3));
    }

    #[test]
    fn test_snapshot_restore_is_idempotent() {
        let mut world = MemoryWorld::new(4, 4);
        world.spawn(0, 0, 1);
        world.snapshot();
        world.spawn(2, 2, 1);
        world.restore();
        assert_eq!(world.cell(2, 2), None);
        assert!(world.cell(0, 0).is_some());
        // A second restore is a no-op, not an error
        world.restore();
        assert!(world.cell(0, 0).is_some());
    }

    #[test]
    fn test_material_lookup_distinguishes_modded() {
        let mut world = MemoryWorld::new(2, 2);
        world.register_material("sand", 1, false, props());
        world.register_material("goo", 50, true, props());
        assert_eq!(world.lookup("sand"), MaterialLookup::Core(1));
        assert_eq!(world.lookup("goo"), MaterialLookup::Modded(50));
        assert_eq!(world.lookup("ether"), MaterialLookup::Unknown);
    }
}

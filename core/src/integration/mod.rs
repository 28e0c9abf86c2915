//! Integration tests for the Cindergrid core
//!
//! Exercises full flows across module boundaries: wire document ->
//! validation -> pipeline -> grid, and document -> embedded record ->
//! scanner -> validation.


#[cfg(test)]
pub(crate) mod test_utils {
    use cindergrid_preset::{MaterialId, PresetDoc};

    use crate::world::{FallBehavior, MaterialClass, MaterialProps, MemoryWorld};

    pub const SAND: MaterialId = 1;
    pub const STONE: MaterialId = 2;
    pub const ORE: MaterialId = 3;
    pub const GOO: MaterialId = 50;

    pub fn granular(weight: i32) -> MaterialProps {
        MaterialProps {
            behavior: FallBehavior::Granular,
            loss: 0.95,
            gravity: 0.25,
            weight,
            class: MaterialClass::Powder,
        }
    }

    pub fn static_solid() -> MaterialProps {
        MaterialProps {
            behavior: FallBehavior::Static,
            loss: 1.0,
            gravity: 0.0,
            weight: 100,
            class: MaterialClass::Solid,
        }
    }

    /// A world with the standard test material set registered.
    pub fn test_world(width: i32, height: i32) -> MemoryWorld {
        let mut world = MemoryWorld::new(width, height);
        world.register_material("sand", SAND, false, granular(80));
        world.register_material("stone", STONE, false, static_solid());
        world.register_material("ore", ORE, false, static_solid());
        world.register_material("goo", GOO, true, granular(40));
        world
    }

    /// Parse a preset document from JSON, panicking on malformed fixtures.
    pub fn doc(json: &str) -> PresetDoc {
        PresetDoc::from_json(json).expect("test fixture must parse")
    }
}

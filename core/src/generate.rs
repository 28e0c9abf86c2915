//! Column generation engine
//!
//! Each pass builds its terrain in a [`ColumnBuffer`] before anything touches
//! the grid: a per-column list of `(offset, material)` cells, with offsets
//! counted upward from the pass baseline. The [`HeightCursor`] tracks each
//! column's current top so stacked layers (`Uniform`, `Padded`) know where to
//! continue. `Vein` stamps and `Replace` matching ignore the cursor and work
//! at absolute offsets; that asymmetry is part of the format.
//!
//! All randomness comes from the caller's `Pcg32`, so a preset plus a seed is
//! fully deterministic.

use cindergrid_preset::{Layer, MaterialId};
use rand::Rng;
use rand_pcg::Pcg32;

use crate::world::World;

/// Per-column running top offset for a pass.
#[derive(Debug, Clone)]
pub struct HeightCursor {
    tops: Vec<i32>,
}

impl HeightCursor {
    pub fn new(columns: usize) -> Self {
        Self {
            tops: vec![0; columns],
        }
    }

    pub fn columns(&self) -> usize {
        self.tops.len()
    }

    pub fn top(&self, column: usize) -> i32 {
        self.tops[column]
    }

    pub fn advance(&mut self, column: usize, by: i32) {
        self.tops[column] += by;
    }

    /// Raise a column's top to `top`; never lowers it.
    pub fn raise_to(&mut self, column: usize, top: i32) {
        if self.tops[column] < top {
            self.tops[column] = top;
        }
    }

    /// Tallest column top, 0 when there are no columns.
    pub fn max(&self) -> i32 {
        self.tops.iter().copied().max().unwrap_or(0)
    }
}

/// Per-pass buffered terrain, discarded after materialization.
#[derive(Debug, Clone)]
pub struct ColumnBuffer {
    columns: Vec<Vec<(i32, MaterialId)>>,
}

impl ColumnBuffer {
    pub fn new(columns: usize) -> Self {
        Self {
            columns: vec![Vec::new(); columns],
        }
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    /// Buffer `material` at `(column, offset)`. A stamp at an already
    /// buffered offset replaces the earlier entry.
    pub fn put(&mut self, column: usize, offset: i32, material: MaterialId) {
        let entries = &mut self.columns[column];
        if let Some(entry) = entries.iter_mut().find(|(off, _)| *off == offset) {
            entry.1 = material;
        } else {
            entries.push((offset, material));
        }
    }

    pub fn column(&self, column: usize) -> &[(i32, MaterialId)] {
        &self.columns[column]
    }

    /// One column's entries ordered bottom offset upward, the order
    /// materialization writes them.
    pub fn column_sorted(&self, column: usize) -> Vec<(i32, MaterialId)> {
        let mut entries = self.columns[column].clone();
        entries.sort_by_key(|(off, _)| *off);
        entries
    }

    pub fn cell_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    fn columns_mut(&mut self) -> impl Iterator<Item = &mut Vec<(i32, MaterialId)>> {
        self.columns.iter_mut()
    }
}

/// Apply one layer to the pass state. `world` is only touched by `Replace`
/// layers matching existing particles.
pub fn apply_layer(
    layer: &Layer,
    world: &mut dyn World,
    rng: &mut Pcg32,
    cursor: &mut HeightCursor,
    buffer: &mut ColumnBuffer,
) {
    match *layer {
        Layer::Uniform {
            material,
            thickness,
            variation,
        } => apply_uniform(material, thickness, variation, rng, cursor, buffer),
        Layer::Padded {
            material,
            thickness,
            variation,
        } => {
            let max = cursor.max();
            for column in 0..cursor.columns() {
                cursor.raise_to(column, max);
            }
            apply_uniform(material, thickness, variation, rng, cursor, buffer);
        }
        Layer::Vein {
            material,
            min_y,
            max_y,
            width,
            height,
            count,
        } => apply_vein(material, min_y, max_y, width, height, count, rng, buffer),
        Layer::Replace {
            material,
            into,
            percent,
            in_existing,
            in_layer,
            preserve_props,
        } => apply_replace(
            material,
            into,
            percent,
            in_existing,
            in_layer,
            preserve_props,
            world,
            rng,
            buffer,
        ),
    }
}

fn apply_uniform(
    material: MaterialId,
    thickness: f32,
    variation: f32,
    rng: &mut Pcg32,
    cursor: &mut HeightCursor,
    buffer: &mut ColumnBuffer,
) {
    for column in 0..cursor.columns() {
        let jitter = if variation > 0.0 {
            rng.random_range(-variation * 0.5..=variation * 0.5)
        } else {
            0.0
        };
        let added = (thickness + jitter).round().max(0.0) as i32;
        let base = cursor.top(column);
        for i in 0..added {
            buffer.put(column, base + i, material);
        }
        cursor.advance(column, added);
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_vein(
    material: MaterialId,
    min_y: i32,
    max_y: i32,
    width: i32,
    height: i32,
    count: i32,
    rng: &mut Pcg32,
    buffer: &mut ColumnBuffer,
) {
    let columns = buffer.columns() as i32;
    if columns == 0 {
        return;
    }

    for _ in 0..count {
        let center_x = rng.random_range(0..columns);
        let center_y = rng.random_range(min_y..=max_y);

        for dy in -height / 2..=height / 2 {
            for dx in -width / 2..=width / 2 {
                let inside = dx.abs() as f32 / width as f32 + dy.abs() as f32 / height as f32 < 0.5;
                if !inside {
                    continue;
                }
                let x = center_x + dx;
                let y = center_y + dy;
                if x < 0 || x >= columns || y < 0 {
                    continue;
                }
                buffer.put(x as usize, y, material);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_replace(
    material: MaterialId,
    into: MaterialId,
    percent: f32,
    in_existing: bool,
    in_layer: bool,
    preserve_props: bool,
    world: &mut dyn World,
    rng: &mut Pcg32,
    buffer: &mut ColumnBuffer,
) {
    // Grid scan first, buffer second: a buffered cell is never affected by
    // the grid pass, and a retyped particle is never re-matched here.
    if in_existing {
        for y in 0..world.height() {
            for x in 0..world.width() {
                let Some(cell) = world.cell(x, y) else {
                    continue;
                };
                if cell.material != material || !roll(rng, percent) {
                    continue;
                }
                if preserve_props {
                    world.retype(x, y, into);
                } else {
                    world.clear_cell(x, y);
                    world.spawn(x, y, into);
                }
            }
        }
    }

    if in_layer {
        for column in buffer.columns_mut() {
            for entry in column.iter_mut() {
                if entry.1 == material && roll(rng, percent) {
                    entry.1 = into;
                }
            }
        }
    }
}

fn roll(rng: &mut Pcg32, percent: f32) -> bool {
    rng.random_range(0.0..100.0) < percent
}

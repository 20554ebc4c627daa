//! Incremental updates for layered grids.
//!
//! The rect and halo derivation matches [`crate::uniform::update`]; the
//! differences are per-column re-probing (which may add or remove floors)
//! and per-floor snapshots in the erosion halo. Unlike the uniform variant
//! this returns a `Result`: a re-probed column overflowing the floor cap is
//! a configuration error and is rejected before any node is mutated.
use tracing::warn;

use crate::error::{Error, Result};
use crate::grid::ErosionMode;
use crate::probe::{ProbeSample, TerrainProbe};
use crate::uniform::update::{UpdateOutcome, UpdateSummary};

use super::{LayeredGridGraph, LayeredUpdate};

impl LayeredGridGraph {
    /// Applies a bounded update request. See
    /// [`crate::uniform::GridGraph::update_area`] for the shared semantics.
    ///
    /// A column exceeding [`crate::grid::LayeredConfig::max_floors`] during
    /// re-probing fails the whole update before anything is written. When
    /// the summary's `floors_added` is non-zero the node count grew and host
    /// structures keyed on it must be rebuilt.
    pub fn update_area(
        &mut self,
        update: &mut LayeredUpdate<'_>,
        probe: &dyn TerrainProbe,
    ) -> Result<UpdateOutcome> {
        if !self.is_built() {
            warn!("update_area called on an unbuilt layered grid graph; skipping.");
            return Ok(UpdateOutcome::Skipped);
        }
        let mut summary = UpdateSummary::default();
        let grid_rect = self.grid_rect();
        let bounds = update.bounds;

        let original = self.transform().cell_rect_of(&bounds);
        let physics = if update.reprobe_terrain {
            let margin = ((probe.diameter() * 1.02 * 0.5) / self.cell_size()).ceil() as i32;
            original.expand(margin)
        } else {
            original
        };

        let erosion_iterations = self.config().grid.erosion.iterations as i32;
        let walkability_affected = update.reprobe_terrain || update.may_change_walkability;
        let mut affect = original.union(&physics);
        if walkability_affected || update.run_erosion {
            affect = affect.expand(erosion_iterations + 1);
        }

        let original_c = original.intersection(&grid_rect);
        let physics_c = physics.intersection(&grid_rect);
        let affect_c = affect.intersection(&grid_rect);

        // Probe all columns up front so a floor overflow rejects the update
        // before the first mutation.
        let mut probed_columns: Vec<(i32, i32, Vec<ProbeSample>)> = Vec::new();
        let mut required_layers = self.layer_count();
        if update.reprobe_terrain {
            let mut overflow = None;
            physics_c.for_each(|x, z| {
                if overflow.is_some() {
                    return;
                }
                let world = self.transform().cell_center_to_world(x, z, 0.0);
                let floors = self.merge_column_hits(probe.probe_all(world));
                if floors.len() > self.config().max_floors {
                    overflow = Some((x, z, floors.len()));
                    return;
                }
                required_layers = required_layers.max(floors.len() as u32);
                probed_columns.push((x, z, floors));
            });
            if let Some((x, z, floors)) = overflow {
                return Err(Error::InvalidConfig(format!(
                    "column ({x},{z}) produced {floors} floors, max_floors is {}",
                    self.config().max_floors
                )));
            }
        }

        if let Some(hook) = update.will_update.as_mut() {
            affect_c.for_each(|x, z| {
                for layer in 0..self.layer_count() {
                    if let Some(node) = self.node(x, z, layer) {
                        hook(node);
                    }
                }
            });
        }

        if update.reprobe_terrain {
            self.grow_layers(required_layers);
            summary.probed_cells = probed_columns.len();
            for (x, z, floors) in &probed_columns {
                summary.floors_added +=
                    self.write_column(*x, *z, floors, probe, update.reset_penalty);
            }
        }

        if let Some(apply) = update.apply.as_mut() {
            original_c.for_each(|x, z| {
                for layer in 0..self.layer_count() {
                    let Some(index) = self.node_index(x, z, layer) else {
                        continue;
                    };
                    let Some(node) = self.nodes_mut()[index].as_mut() else {
                        continue;
                    };
                    if bounds.contains(node.world_position()) {
                        apply(node);
                        node.walkable_baseline = node.walkable;
                        summary.mutated_cells += 1;
                    }
                }
            });
        }

        if !walkability_affected && !update.run_erosion {
            return Ok(UpdateOutcome::Applied(summary));
        }

        if erosion_iterations == 0 {
            self.recompute_connections_rect(affect_c);
            summary.reconnected_cells = affect_c.area() * self.layer_count() as usize;
            return Ok(UpdateOutcome::Applied(summary));
        }

        let ring1 = affect.expand(erosion_iterations).intersection(&grid_rect);
        let ring2 = affect
            .expand(erosion_iterations * 2)
            .intersection(&grid_rect);
        let tag_band = match self.config().grid.erosion.mode {
            ErosionMode::Tags { first_tag } => Some((
                first_tag,
                first_tag + self.config().grid.erosion.iterations as u8,
            )),
            ErosionMode::Unwalkable => None,
        };

        let mut outer_band: Vec<(usize, bool, u8)> = Vec::new();
        ring2.for_each(|x, z| {
            let in_ring1 = ring1.contains(x, z);
            for layer in 0..self.layer_count() {
                let Some(index) = self.node_index(x, z, layer) else {
                    continue;
                };
                let Some(node) = self.nodes_mut()[index].as_mut() else {
                    continue;
                };
                let walkable_now = node.walkable;
                let tag_now = node.tag;
                node.walkable = node.walkable_baseline;
                if let Some((first, last)) = tag_band {
                    if node.tag >= first && node.tag <= last {
                        node.tag = 0;
                    }
                }
                if !in_ring1 {
                    outer_band.push((index, walkable_now, tag_now));
                }
            }
        });

        self.recompute_connections_rect(ring2);
        self.erode_rect(ring2);

        for &(index, walkable, tag) in &outer_band {
            if let Some(node) = self.nodes_mut()[index].as_mut() {
                node.walkable = walkable;
                if tag_band.is_some() {
                    node.tag = tag;
                }
            }
        }

        self.recompute_connections_rect(ring2);
        summary.reconnected_cells = ring2.area() * self.layer_count() as usize;

        Ok(UpdateOutcome::Applied(summary))
    }
}

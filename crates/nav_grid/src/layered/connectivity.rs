//! Connectivity calculation for layered grids.
//!
//! Floors connect along the four axis directions only. For each direction
//! the neighboring column's stack is scanned and the floor with the best
//! (smallest) vertical step is chosen among those whose shared vertical
//! space fits the configured character height and that pass the active
//! filter; its index is stored, `None` meaning no connection. Like the
//! uniform pass, this mutates only the target floor's own adjacency.
use crate::grid::{IntRect, AXIS_DIRECTIONS, NEIGHBOR_OFFSETS};

use super::LayeredGridGraph;

impl LayeredGridGraph {
    /// Recomputes the connections of every floor.
    pub fn recompute_connections(&mut self) {
        self.recompute_connections_rect(self.grid_rect());
    }

    /// Recomputes connections for every floor of every column in `rect`,
    /// clamped to bounds.
    pub(crate) fn recompute_connections_rect(&mut self, rect: IntRect) {
        let rect = rect.clamp_to(self.width(), self.depth());
        if !rect.is_valid() {
            return;
        }
        for z in rect.zmin..=rect.zmax {
            for x in rect.xmin..=rect.xmax {
                for layer in 0..self.layer_count() {
                    self.recompute_floor_connections(x, z, layer);
                }
            }
        }
    }

    /// Recomputes the connections of a single floor.
    pub fn recompute_floor_connections(&mut self, x: i32, z: i32, layer: u32) {
        let Some(index) = self.node_index(x, z, layer) else {
            return;
        };
        let (walkable, view, bottom, top) = match self.nodes()[index].as_ref() {
            None => return,
            Some(node) => (
                node.walkable,
                node.view(),
                node.world_position().y,
                node.ceiling(),
            ),
        };
        if !walkable {
            if let Some(node) = self.nodes_mut()[index].as_mut() {
                node.clear_connections();
            }
            return;
        }

        let character_height = self.config().character_height;
        let mut connections = [None; AXIS_DIRECTIONS];
        for (dir, slot) in connections.iter_mut().enumerate() {
            let (dx, dz) = NEIGHBOR_OFFSETS[dir];
            let (nx, nz) = (x + dx, z + dz);
            if !self.in_bounds(nx, nz) {
                continue;
            }
            let mut best: Option<(u16, f32)> = None;
            for neighbor_layer in 0..self.layer_count() {
                let Some(neighbor_index) = self.node_index(nx, nz, neighbor_layer) else {
                    continue;
                };
                let Some(neighbor) = self.nodes()[neighbor_index].as_ref() else {
                    continue;
                };
                if !neighbor.walkable {
                    continue;
                }
                let neighbor_bottom = neighbor.world_position().y;
                let shared = top.min(neighbor.ceiling()) - bottom.max(neighbor_bottom);
                if shared < character_height {
                    continue;
                }
                if !self.filter().is_valid(view, neighbor.view()) {
                    continue;
                }
                let step = (neighbor_bottom - bottom).abs();
                if best.is_none_or(|(_, best_step)| step < best_step) {
                    best = Some((neighbor_layer as u16, step));
                }
            }
            *slot = best.map(|(floor, _)| floor);
        }

        if let Some(node) = self.nodes_mut()[index].as_mut() {
            node.connections = connections;
        }
    }
}

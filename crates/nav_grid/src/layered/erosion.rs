//! Erosion for layered grids.
//!
//! The boundary test mirrors the uniform variant: a walkable floor with no
//! connection toward an in-bounds neighboring column is a boundary floor.
//! Destructive sweeps and tag bands behave as in
//! [`crate::uniform::erosion`], with neighbors resolved through the stored
//! floor indices.
use crate::grid::{ErosionMode, IntRect, AXIS_DIRECTIONS, NEIGHBOR_OFFSETS};

use super::LayeredGridGraph;

impl LayeredGridGraph {
    /// Applies the configured erosion to `rect`, clamped to bounds.
    pub(crate) fn erode_rect(&mut self, rect: IntRect) {
        let iterations = self.config().grid.erosion.iterations;
        if iterations == 0 {
            return;
        }
        let rect = rect.clamp_to(self.width(), self.depth());
        if !rect.is_valid() {
            return;
        }
        match self.config().grid.erosion.mode {
            ErosionMode::Unwalkable => self.erode_unwalkable(rect, iterations),
            ErosionMode::Tags { first_tag } => self.erode_tags(rect, iterations, first_tag),
        }
    }

    fn is_boundary_floor(&self, x: i32, z: i32, index: usize) -> bool {
        let Some(node) = self.nodes()[index].as_ref() else {
            return false;
        };
        for dir in 0..AXIS_DIRECTIONS {
            let (dx, dz) = NEIGHBOR_OFFSETS[dir];
            if self.in_bounds(x + dx, z + dz) && node.connections[dir].is_none() {
                return true;
            }
        }
        false
    }

    fn erode_unwalkable(&mut self, rect: IntRect, iterations: u32) {
        let mut boundary = Vec::new();
        for _ in 0..iterations {
            boundary.clear();
            for z in rect.zmin..=rect.zmax {
                for x in rect.xmin..=rect.xmax {
                    for layer in 0..self.layer_count() {
                        let Some(index) = self.node_index(x, z, layer) else {
                            continue;
                        };
                        let walkable = self.nodes()[index]
                            .as_ref()
                            .is_some_and(|node| node.walkable);
                        if walkable && self.is_boundary_floor(x, z, index) {
                            boundary.push(index);
                        }
                    }
                }
            }
            if boundary.is_empty() {
                break;
            }
            for &index in &boundary {
                if let Some(node) = self.nodes_mut()[index].as_mut() {
                    node.walkable = false;
                }
            }
            self.recompute_connections_rect(rect);
        }
    }

    fn erode_tags(&mut self, rect: IntRect, iterations: u32, first_tag: u8) {
        for k in 0..iterations {
            if k == 0 {
                for z in rect.zmin..=rect.zmax {
                    for x in rect.xmin..=rect.xmax {
                        for layer in 0..self.layer_count() {
                            let Some(index) = self.node_index(x, z, layer) else {
                                continue;
                            };
                            let walkable = self.nodes()[index]
                                .as_ref()
                                .is_some_and(|node| node.walkable);
                            if walkable && self.is_boundary_floor(x, z, index) {
                                if let Some(node) = self.nodes_mut()[index].as_mut() {
                                    node.tag = first_tag;
                                }
                            }
                        }
                    }
                }
                continue;
            }

            let band_tag = first_tag + k as u8;
            for z in rect.zmin..=rect.zmax {
                for x in rect.xmin..=rect.xmax {
                    for layer in 0..self.layer_count() {
                        let Some(index) = self.node_index(x, z, layer) else {
                            continue;
                        };
                        let connections = match self.nodes()[index].as_ref() {
                            Some(node)
                                if node.walkable
                                    && node.tag >= first_tag
                                    && node.tag < band_tag =>
                            {
                                node.connections
                            }
                            _ => continue,
                        };
                        for dir in 0..AXIS_DIRECTIONS {
                            let Some(floor) = connections[dir] else {
                                continue;
                            };
                            let (dx, dz) = NEIGHBOR_OFFSETS[dir];
                            let Some(neighbor_index) =
                                self.node_index(x + dx, z + dz, u32::from(floor))
                            else {
                                continue;
                            };
                            let needs_stamp = self.nodes()[neighbor_index]
                                .as_ref()
                                .is_some_and(|n| n.tag < first_tag || n.tag > band_tag);
                            if needs_stamp {
                                if let Some(neighbor) = self.nodes_mut()[neighbor_index].as_mut() {
                                    neighbor.tag = band_tag;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

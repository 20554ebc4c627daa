//! Erosion: shrinking or tag-banding the walkable set near boundaries.
//!
//! A walkable cell counts as a boundary cell when some in-bounds neighbor in
//! the boundary direction set is not connected; the outer edge of the grid
//! does not erode by itself. Destructive mode peels one boundary ring per
//! iteration and re-derives connectivity in between, so later iterations see
//! the shrunk walkable set. Tag mode stamps concentric distance bands into
//! node tags and leaves walkability alone.
use crate::grid::{ErosionMode, IntRect, GRID_DIRECTIONS, NEIGHBOR_OFFSETS};

use super::GridGraph;

impl GridGraph {
    /// Applies the configured erosion to `rect`, clamped to bounds.
    /// Connectivity inside the rect is consistent when this returns.
    pub(crate) fn erode_rect(&mut self, rect: IntRect) {
        let iterations = self.config().erosion.iterations;
        if iterations == 0 {
            return;
        }
        let rect = rect.clamp_to(self.width(), self.depth());
        if !rect.is_valid() {
            return;
        }
        match self.config().erosion.mode {
            ErosionMode::Unwalkable => self.erode_unwalkable(rect, iterations),
            ErosionMode::Tags { first_tag } => self.erode_tags(rect, iterations, first_tag),
        }
    }

    /// Boundary test: walkable cell with a missing connection toward an
    /// in-bounds neighbor of the boundary direction set.
    fn is_boundary_cell(&self, x: i32, z: i32, index: usize) -> bool {
        let node = &self.nodes()[index];
        for &dir in self.config().neighbor_mode.boundary_directions() {
            let (dx, dz) = NEIGHBOR_OFFSETS[dir];
            if self.in_bounds(x + dx, z + dz) && !node.connections[dir] {
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
                    let Some(index) = self.index_of(x, z) else {
                        continue;
                    };
                    if self.nodes()[index].walkable && self.is_boundary_cell(x, z, index) {
                        boundary.push(index);
                    }
                }
            }
            if boundary.is_empty() {
                break;
            }
            for &index in &boundary {
                self.nodes_mut()[index].walkable = false;
            }
            self.recompute_connections_rect(rect);
        }
    }

    fn erode_tags(&mut self, rect: IntRect, iterations: u32, first_tag: u8) {
        for k in 0..iterations {
            if k == 0 {
                for z in rect.zmin..=rect.zmax {
                    for x in rect.xmin..=rect.xmax {
                        let Some(index) = self.index_of(x, z) else {
                            continue;
                        };
                        if self.nodes()[index].walkable && self.is_boundary_cell(x, z, index) {
                            self.nodes_mut()[index].tag = first_tag;
                        }
                    }
                }
                continue;
            }

            // Band k: cells tagged in [first_tag, band_tag) spread band_tag to
            // connected neighbors not yet inside the closed band. A neighbor
            // stamped this sweep carries band_tag itself and spreads no
            // further, so in-place propagation terminates per sweep.
            let band_tag = first_tag + k as u8;
            for z in rect.zmin..=rect.zmax {
                for x in rect.xmin..=rect.xmax {
                    let Some(index) = self.index_of(x, z) else {
                        continue;
                    };
                    let node = &self.nodes()[index];
                    if !node.walkable || node.tag < first_tag || node.tag >= band_tag {
                        continue;
                    }
                    let connections = node.connections;
                    for dir in 0..GRID_DIRECTIONS {
                        if !connections[dir] {
                            continue;
                        }
                        let (dx, dz) = NEIGHBOR_OFFSETS[dir];
                        let Some(neighbor_index) = self.index_of(x + dx, z + dz) else {
                            continue;
                        };
                        let neighbor = &self.nodes()[neighbor_index];
                        if neighbor.tag < first_tag || neighbor.tag > band_tag {
                            self.nodes_mut()[neighbor_index].tag = band_tag;
                        }
                    }
                }
            }
        }
    }
}

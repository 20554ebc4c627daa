//! Connectivity calculation for uniform grids.
//!
//! Adjacency is a derived value: each pass recomputes a cell's connections
//! wholesale from current walkability and the active
//! [`crate::grid::ConnectionFilter`]. A pass mutates only the target cell's
//! own adjacency and never its neighbors, so redundant re-runs are safe —
//! the incremental update engine leans on that.
use crate::grid::{
    NeighborMode, NodeView, IntRect, AXIS_DIRECTIONS, DIAGONAL_FLANKS, GRID_DIRECTIONS,
    HEX_DIRECTIONS, NEIGHBOR_OFFSETS,
};

use super::GridGraph;

impl GridGraph {
    /// Recomputes the connections of every cell. Equivalent to a build's
    /// connectivity pass without re-probing.
    pub fn recompute_connections(&mut self) {
        self.recompute_connections_rect(self.grid_rect());
    }

    /// Recomputes connections for every cell of `rect`, clamped to bounds.
    pub(crate) fn recompute_connections_rect(&mut self, rect: IntRect) {
        let rect = rect.clamp_to(self.width(), self.depth());
        if !rect.is_valid() {
            return;
        }
        for z in rect.zmin..=rect.zmax {
            for x in rect.xmin..=rect.xmax {
                self.recompute_cell_connections(x, z);
            }
        }
    }

    /// Recomputes the connections of a single cell.
    ///
    /// An unwalkable cell gets all connections cleared; no partial
    /// connectivity survives on it. Diagonals in 8-direction mode follow the
    /// corner policy: with `cut_corners` one enabled flanking axis connection
    /// suffices, without it both are required.
    pub fn recompute_cell_connections(&mut self, x: i32, z: i32) {
        let Some(index) = self.index_of(x, z) else {
            return;
        };
        if !self.nodes()[index].walkable {
            self.nodes_mut()[index].clear_connections();
            return;
        }

        let from = self.nodes()[index].view();
        let mut connections = [false; GRID_DIRECTIONS];
        match self.config().neighbor_mode {
            NeighborMode::Four => {
                for dir in 0..AXIS_DIRECTIONS {
                    connections[dir] = self.direct_connection(from, x, z, dir);
                }
            }
            NeighborMode::Eight => {
                for dir in 0..AXIS_DIRECTIONS {
                    connections[dir] = self.direct_connection(from, x, z, dir);
                }
                let cut_corners = self.config().cut_corners;
                for diagonal in 0..4 {
                    let dir = AXIS_DIRECTIONS + diagonal;
                    let (a, b) = DIAGONAL_FLANKS[diagonal];
                    let flanks_ok = if cut_corners {
                        connections[a] || connections[b]
                    } else {
                        connections[a] && connections[b]
                    };
                    connections[dir] = flanks_ok && self.direct_connection(from, x, z, dir);
                }
            }
            NeighborMode::Hex => {
                for &dir in HEX_DIRECTIONS.iter() {
                    connections[dir] = self.direct_connection(from, x, z, dir);
                }
            }
        }
        self.nodes_mut()[index].connections = connections;
    }

    /// Plain adjacency test: in bounds, walkable, and accepted by the filter.
    fn direct_connection(&self, from: NodeView, x: i32, z: i32, dir: usize) -> bool {
        let (dx, dz) = NEIGHBOR_OFFSETS[dir];
        match self.index_of(x + dx, z + dz) {
            None => false,
            Some(neighbor_index) => {
                let neighbor = &self.nodes()[neighbor_index];
                neighbor.walkable && self.filter().is_valid(from, neighbor.view())
            }
        }
    }
}

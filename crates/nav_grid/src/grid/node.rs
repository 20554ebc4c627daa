//! Node records for both grid variants.
//!
//! Node positions are quantized to integer world coordinates so that repeated
//! transforms and incremental updates cannot accumulate floating-point drift:
//! two probes of unchanged terrain always produce bit-identical positions.
use glam::{IVec3, Vec3};

use super::{GraphId, AXIS_DIRECTIONS, GRID_DIRECTIONS};

/// Quantization factor: integer position units per world unit.
pub const POSITION_SCALE: f32 = 1000.0;

/// Quantizes a world position into integer coordinates.
pub fn quantize(world: Vec3) -> IVec3 {
    (world * POSITION_SCALE).round().as_ivec3()
}

/// Converts a quantized position back into world space.
pub fn dequantize(position: IVec3) -> Vec3 {
    position.as_vec3() / POSITION_SCALE
}

/// A cell of a uniform grid graph.
#[derive(Clone, Debug)]
pub struct GridNode {
    /// Quantized world position of the cell's ground point.
    pub position: IVec3,
    /// Current traversability, including erosion.
    pub walkable: bool,
    /// Traversability as produced by probing/mutation, before erosion. The
    /// erosion engine recomputes from this value and never writes it.
    pub walkable_baseline: bool,
    /// Small category value in `0..=`[`super::MAX_TAG`].
    pub tag: u8,
    /// Additive traversal cost.
    pub penalty: u32,
    /// Per-direction connection flags, indexed by [`super::NEIGHBOR_OFFSETS`].
    pub connections: [bool; GRID_DIRECTIONS],
    /// Linear index of this cell within its grid.
    pub cell_index: u32,
    /// Owning graph, resolvable through a [`crate::registry::GraphRegistry`].
    pub graph: GraphId,
}

impl GridNode {
    /// Creates an unwalkable, unconnected node.
    pub fn new(cell_index: u32, graph: GraphId) -> Self {
        Self {
            position: IVec3::ZERO,
            walkable: false,
            walkable_baseline: false,
            tag: 0,
            penalty: 0,
            connections: [false; GRID_DIRECTIONS],
            cell_index,
            graph,
        }
    }

    /// World position of the cell's ground point.
    pub fn world_position(&self) -> Vec3 {
        dequantize(self.position)
    }

    /// Number of enabled connections.
    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|&&c| c).count()
    }

    /// Clears all connections.
    pub fn clear_connections(&mut self) {
        self.connections = [false; GRID_DIRECTIONS];
    }

    pub(crate) fn view(&self) -> super::NodeView {
        super::NodeView {
            position: self.position,
            tag: self.tag,
            penalty: self.penalty,
        }
    }
}

/// One floor of a layered grid column.
#[derive(Clone, Debug)]
pub struct LayeredNode {
    /// Quantized world position of the floor's ground point.
    pub position: IVec3,
    /// Current traversability, including erosion.
    pub walkable: bool,
    /// Traversability before erosion; see [`GridNode::walkable_baseline`].
    pub walkable_baseline: bool,
    /// Small category value in `0..=`[`super::MAX_TAG`].
    pub tag: u8,
    /// Additive traversal cost.
    pub penalty: u32,
    /// Vertical clearance to the next floor above, `f32::INFINITY` for the
    /// topmost floor of a column.
    pub headroom: f32,
    /// Per-axis-direction floor index in the neighboring column, `None`
    /// meaning no connection.
    pub connections: [Option<u16>; AXIS_DIRECTIONS],
    /// Linear index of this node (column index plus layer stride).
    pub cell_index: u32,
    /// Owning graph.
    pub graph: GraphId,
}

impl LayeredNode {
    /// Creates an unwalkable, unconnected floor node.
    pub fn new(cell_index: u32, graph: GraphId) -> Self {
        Self {
            position: IVec3::ZERO,
            walkable: false,
            walkable_baseline: false,
            tag: 0,
            penalty: 0,
            headroom: f32::INFINITY,
            connections: [None; AXIS_DIRECTIONS],
            cell_index,
            graph,
        }
    }

    /// World position of the floor's ground point.
    pub fn world_position(&self) -> Vec3 {
        dequantize(self.position)
    }

    /// Number of enabled connections.
    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.is_some()).count()
    }

    /// Clears all connections.
    pub fn clear_connections(&mut self) {
        self.connections = [None; AXIS_DIRECTIONS];
    }

    /// World-space top of the space this floor spans.
    pub fn ceiling(&self) -> f32 {
        self.world_position().y + self.headroom
    }

    pub(crate) fn view(&self) -> super::NodeView {
        super::NodeView {
            position: self.position,
            tag: self.tag,
            penalty: self.penalty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_round_trips_within_resolution() {
        let p = Vec3::new(1.2345, -7.8914, 0.0005);
        let q = quantize(p);
        let back = dequantize(q);
        assert!((back - p).abs().max_element() <= 0.5 / POSITION_SCALE + f32::EPSILON);
    }

    #[test]
    fn repeated_quantization_is_stable() {
        let p = Vec3::new(3.3333, 0.1, -9.99999);
        let q1 = quantize(p);
        let q2 = quantize(dequantize(q1));
        assert_eq!(q1, q2);
    }

    #[test]
    fn new_nodes_are_disconnected() {
        let node = GridNode::new(7, GraphId(0));
        assert!(!node.walkable);
        assert_eq!(node.connection_count(), 0);
        assert_eq!(node.cell_index, 7);

        let floor = LayeredNode::new(3, GraphId(1));
        assert_eq!(floor.connection_count(), 0);
        assert_eq!(floor.headroom, f32::INFINITY);
    }
}

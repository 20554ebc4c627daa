//! Serialization boundary: plain-data snapshots of built graphs.
//!
//! A snapshot stores one fixed record per node in linear-index order plus
//! the primitive grid parameters. The transform and neighbor-offset tables
//! are never part of it; restoring regenerates them from the parameters.
//! All types here are plain data and derive serde when the `serde` feature
//! is enabled.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::{IVec3, Vec2, Vec3};

use crate::error::{Error, Result};
use crate::grid::{
    ErosionConfig, GraphId, GridConfig, GridNode, LayeredConfig, LayeredNode, NeighborMode,
    AXIS_DIRECTIONS, GRID_DIRECTIONS,
};
use crate::layered::LayeredGridGraph;
use crate::uniform::GridGraph;

/// Per-node record of a uniform grid snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    /// Quantized world position.
    pub position: [i32; 3],
    pub walkable: bool,
    pub walkable_baseline: bool,
    pub tag: u8,
    pub penalty: u32,
    pub connections: [bool; GRID_DIRECTIONS],
}

/// Per-floor record of a layered grid snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredNodeRecord {
    /// Quantized world position.
    pub position: [i32; 3],
    pub walkable: bool,
    pub walkable_baseline: bool,
    pub tag: u8,
    pub penalty: u32,
    pub headroom: f32,
    pub connections: [Option<u16>; AXIS_DIRECTIONS],
}

/// Primitive grid parameters; everything a restore needs to regenerate the
/// transform and dimensions.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridParams {
    pub center: [f32; 3],
    pub rotation: [f32; 3],
    pub size: [f32; 2],
    pub cell_size: f32,
    pub aspect_ratio: f32,
    pub isometric_angle: f32,
    pub neighbor_mode: NeighborMode,
    pub cut_corners: bool,
    pub climb_limit: f32,
    pub initial_penalty: u32,
    pub erosion: ErosionConfig,
    /// Dimensions the snapshot was taken at, checked against the re-derived
    /// ones on restore.
    pub width: u32,
    pub depth: u32,
}

impl GridParams {
    fn of(config: &GridConfig, width: u32, depth: u32) -> Self {
        Self {
            center: config.center.to_array(),
            rotation: config.rotation.to_array(),
            size: config.size.to_array(),
            cell_size: config.cell_size,
            aspect_ratio: config.aspect_ratio,
            isometric_angle: config.isometric_angle,
            neighbor_mode: config.neighbor_mode,
            cut_corners: config.cut_corners,
            climb_limit: config.climb_limit,
            initial_penalty: config.initial_penalty,
            erosion: config.erosion,
            width,
            depth,
        }
    }

    fn to_config(&self) -> GridConfig {
        GridConfig::new(Vec2::from_array(self.size))
            .with_center(Vec3::from_array(self.center))
            .with_rotation(Vec3::from_array(self.rotation))
            .with_cell_size(self.cell_size)
            .with_aspect_ratio(self.aspect_ratio)
            .with_isometric_angle(self.isometric_angle)
            .with_neighbor_mode(self.neighbor_mode)
            .with_cut_corners(self.cut_corners)
            .with_climb_limit(self.climb_limit)
            .with_initial_penalty(self.initial_penalty)
            .with_erosion(self.erosion)
    }
}

/// Snapshot of a built uniform grid graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    pub params: GridParams,
    /// Node records in linear-index order.
    pub nodes: Vec<NodeRecord>,
}

/// Parameters of a layered grid snapshot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredParams {
    pub grid: GridParams,
    pub character_height: f32,
    pub merge_tolerance: f32,
    pub max_floors: usize,
    pub layer_count: u32,
}

/// Snapshot of a built layered grid graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LayeredSnapshot {
    pub params: LayeredParams,
    /// Floor records in linear-index order, `None` for absent floors.
    pub nodes: Vec<Option<LayeredNodeRecord>>,
}

impl GridGraph {
    /// Captures the graph as plain data. Fails on an unbuilt graph.
    pub fn snapshot(&self) -> Result<GridSnapshot> {
        if !self.is_built() {
            return Err(Error::NotBuilt);
        }
        let nodes = self
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                position: node.position.to_array(),
                walkable: node.walkable,
                walkable_baseline: node.walkable_baseline,
                tag: node.tag,
                penalty: node.penalty,
                connections: node.connections,
            })
            .collect();
        Ok(GridSnapshot {
            params: GridParams::of(self.config(), self.width(), self.depth()),
            nodes,
        })
    }

    /// Restores a graph from a snapshot, regenerating the transform and
    /// dimensions from the stored parameters.
    pub fn from_snapshot(graph: GraphId, snapshot: &GridSnapshot) -> Result<Self> {
        let mut restored = Self::new(graph, snapshot.params.to_config())?;
        if restored.width() != snapshot.params.width
            || restored.depth() != snapshot.params.depth
        {
            return Err(Error::InvalidConfig(format!(
                "snapshot dimensions {}x{} do not match derived {}x{}",
                snapshot.params.width,
                snapshot.params.depth,
                restored.width(),
                restored.depth()
            )));
        }
        let expected = snapshot.params.width as usize * snapshot.params.depth as usize;
        if snapshot.nodes.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "snapshot holds {} node records, expected {expected}",
                snapshot.nodes.len()
            )));
        }

        let nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, record)| GridNode {
                position: IVec3::from_array(record.position),
                walkable: record.walkable,
                walkable_baseline: record.walkable_baseline,
                tag: record.tag,
                penalty: record.penalty,
                connections: record.connections,
                cell_index: index as u32,
                graph,
            })
            .collect();
        restored.restore_after_load(nodes);
        Ok(restored)
    }
}

impl LayeredGridGraph {
    /// Captures the graph as plain data. Fails on an unbuilt graph.
    pub fn snapshot(&self) -> Result<LayeredSnapshot> {
        if !self.is_built() {
            return Err(Error::NotBuilt);
        }
        let nodes = self
            .nodes()
            .iter()
            .map(|slot| {
                slot.as_ref().map(|node| LayeredNodeRecord {
                    position: node.position.to_array(),
                    walkable: node.walkable,
                    walkable_baseline: node.walkable_baseline,
                    tag: node.tag,
                    penalty: node.penalty,
                    headroom: node.headroom,
                    connections: node.connections,
                })
            })
            .collect();
        let config = self.config();
        Ok(LayeredSnapshot {
            params: LayeredParams {
                grid: GridParams::of(&config.grid, self.width(), self.depth()),
                character_height: config.character_height,
                merge_tolerance: config.merge_tolerance,
                max_floors: config.max_floors,
                layer_count: self.layer_count(),
            },
            nodes,
        })
    }

    /// Restores a graph from a snapshot; see [`GridGraph::from_snapshot`].
    pub fn from_snapshot(graph: GraphId, snapshot: &LayeredSnapshot) -> Result<Self> {
        let config = LayeredConfig::new(snapshot.params.grid.to_config())
            .with_character_height(snapshot.params.character_height)
            .with_merge_tolerance(snapshot.params.merge_tolerance)
            .with_max_floors(snapshot.params.max_floors);
        let mut restored = Self::new(graph, config)?;
        if restored.width() != snapshot.params.grid.width
            || restored.depth() != snapshot.params.grid.depth
        {
            return Err(Error::InvalidConfig(format!(
                "snapshot dimensions {}x{} do not match derived {}x{}",
                snapshot.params.grid.width,
                snapshot.params.grid.depth,
                restored.width(),
                restored.depth()
            )));
        }
        let expected = snapshot.params.grid.width as usize
            * snapshot.params.grid.depth as usize
            * snapshot.params.layer_count as usize;
        if snapshot.params.layer_count == 0 || snapshot.nodes.len() != expected {
            return Err(Error::InvalidConfig(format!(
                "snapshot holds {} floor records, expected {expected}",
                snapshot.nodes.len()
            )));
        }

        let nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.as_ref().map(|record| LayeredNode {
                    position: IVec3::from_array(record.position),
                    walkable: record.walkable,
                    walkable_baseline: record.walkable_baseline,
                    tag: record.tag,
                    penalty: record.penalty,
                    headroom: record.headroom,
                    connections: record.connections,
                    cell_index: index as u32,
                    graph,
                })
            })
            .collect();
        restored.restore_after_load(snapshot.params.layer_count, nodes);
        Ok(restored)
    }
}

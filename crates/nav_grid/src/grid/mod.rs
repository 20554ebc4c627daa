//! Shared grid primitives: graph ids, neighbor topology, and configuration.
//!
//! This module groups the types both grid variants are built from: the cell
//! coordinate/rect math, the quantized node records, the world↔cell transform,
//! and the validated configuration consumed by the build pipelines.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};

pub mod filter;
pub mod node;
pub mod rect;
pub mod transform;

pub use filter::{ClimbFilter, ConnectionFilter, FnFilter, NodeView};
pub use node::{dequantize, quantize, GridNode, LayeredNode, POSITION_SCALE};
pub use rect::{Aabb, IntRect};
pub use transform::{GridTransform, DIMENSION_EPSILON, MAX_DIMENSION};

/// Number of axis-aligned neighbor directions.
pub const AXIS_DIRECTIONS: usize = 4;

/// Total number of neighbor directions (axis + diagonal).
pub const GRID_DIRECTIONS: usize = 8;

/// Cell offsets per direction index. The first four are axis-aligned, the
/// last four diagonal. Diagonal `4 + i` sits between axis `i` and axis
/// `(i + 1) % 4` (see [`DIAGONAL_FLANKS`]).
pub const NEIGHBOR_OFFSETS: [(i32, i32); GRID_DIRECTIONS] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// Axis direction indices flanking each diagonal, indexed by `diagonal - 4`.
pub const DIAGONAL_FLANKS: [(usize, usize); 4] = [(0, 1), (1, 2), (2, 3), (3, 0)];

/// Direction subset used by hexagonal grids: the four axis directions plus
/// two opposing diagonals, yielding a herringbone-skewed 6-neighbor topology.
pub const HEX_DIRECTIONS: [usize; 6] = [0, 1, 2, 3, 4, 6];

const FOUR_DIRECTIONS: [usize; 4] = [0, 1, 2, 3];
const EIGHT_DIRECTIONS: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Highest tag value a node can carry.
pub const MAX_TAG: u8 = 31;

/// Identifies a registered graph instance. Nodes carry their owning graph's
/// id so callers can resolve the graph through a [`crate::registry::GraphRegistry`]
/// without a per-node back-pointer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphId(pub u8);

impl GraphId {
    /// Slot index of this id within a registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Neighbor topology of a uniform grid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NeighborMode {
    /// Axis-aligned connections only.
    Four,
    /// Axis-aligned plus diagonal connections.
    #[default]
    Eight,
    /// Hexagonal topology via [`HEX_DIRECTIONS`].
    Hex,
}

impl NeighborMode {
    /// Direction indices active in this mode.
    pub fn directions(self) -> &'static [usize] {
        match self {
            NeighborMode::Four => &FOUR_DIRECTIONS,
            NeighborMode::Eight => &EIGHT_DIRECTIONS,
            NeighborMode::Hex => &HEX_DIRECTIONS,
        }
    }

    /// Direction indices used by the erosion boundary test. Diagonals in
    /// 8-direction mode are derived from the axis connections and would
    /// misclassify diagonal-only gaps as boundaries, so only the axis set
    /// participates there.
    pub fn boundary_directions(self) -> &'static [usize] {
        match self {
            NeighborMode::Hex => &HEX_DIRECTIONS,
            _ => &FOUR_DIRECTIONS,
        }
    }
}

/// Returns the opposite of a direction index.
pub fn opposite_direction(dir: usize) -> usize {
    debug_assert!(dir < GRID_DIRECTIONS);
    if dir < AXIS_DIRECTIONS {
        (dir + 2) % AXIS_DIRECTIONS
    } else {
        4 + (dir - 2) % 4
    }
}

/// Erosion behavior of a grid, applied near obstacles and boundaries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErosionMode {
    /// Boundary cells are made unwalkable, one ring per iteration.
    Unwalkable,
    /// Walkability is untouched; concentric distance bands are stamped into
    /// node tags starting at `first_tag`.
    Tags {
        /// Tag assigned to the innermost band. Must be at least 1.
        first_tag: u8,
    },
}

/// Erosion configuration of a grid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErosionConfig {
    /// Number of erosion rings. Zero disables erosion entirely.
    pub iterations: u32,
    /// What an erosion sweep does to boundary cells.
    pub mode: ErosionMode,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            iterations: 0,
            mode: ErosionMode::Unwalkable,
        }
    }
}

impl ErosionConfig {
    /// Destructive erosion with the given ring count.
    pub fn unwalkable(iterations: u32) -> Self {
        Self {
            iterations,
            mode: ErosionMode::Unwalkable,
        }
    }

    /// Tag-band erosion with the given ring count and innermost tag.
    pub fn tags(iterations: u32, first_tag: u8) -> Self {
        Self {
            iterations,
            mode: ErosionMode::Tags { first_tag },
        }
    }

    /// Validates the configuration, returning an error if invalid. Runs
    /// before any node is mutated.
    pub fn validate(&self) -> Result<()> {
        if let ErosionMode::Tags { first_tag } = self.mode {
            if first_tag == 0 {
                return Err(Error::InvalidConfig(
                    "erosion first_tag must be at least 1".into(),
                ));
            }
            if u32::from(first_tag) + self.iterations > u32::from(MAX_TAG) {
                return Err(Error::InvalidConfig(format!(
                    "erosion tags {}..{} exceed the tag space (max {MAX_TAG})",
                    first_tag,
                    u32::from(first_tag) + self.iterations,
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for building a uniform grid graph.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// World-space center of the grid.
    pub center: Vec3,
    /// Euler rotation in degrees, applied in YXZ order.
    pub rotation: Vec3,
    /// World extent along the grid's local X and Z axes.
    pub size: Vec2,
    /// Requested cell size in world units. May be raised by the build when
    /// the derived dimensions would exceed [`MAX_DIMENSION`].
    pub cell_size: f32,
    /// Width of a cell relative to its depth.
    pub aspect_ratio: f32,
    /// Isometric shear angle in degrees. Zero disables the shear.
    pub isometric_angle: f32,
    /// Neighbor topology.
    pub neighbor_mode: NeighborMode,
    /// In 8-direction mode, whether a diagonal may connect when only one of
    /// its two flanking axis connections is enabled.
    pub cut_corners: bool,
    /// Maximum climbable height difference between connected cells, in world
    /// units. Zero disables the check.
    pub climb_limit: f32,
    /// Penalty assigned to freshly probed cells.
    pub initial_penalty: u32,
    /// Erosion applied after connectivity.
    pub erosion: ErosionConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            rotation: Vec3::ZERO,
            size: Vec2::new(10.0, 10.0),
            cell_size: 1.0,
            aspect_ratio: 1.0,
            isometric_angle: 0.0,
            neighbor_mode: NeighborMode::Eight,
            cut_corners: true,
            climb_limit: 0.0,
            initial_penalty: 0,
            erosion: ErosionConfig::default(),
        }
    }
}

impl GridConfig {
    /// Creates a new [`GridConfig`] with the specified world extent.
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Sets the world-space center.
    pub fn with_center(mut self, center: Vec3) -> Self {
        self.center = center;
        self
    }

    /// Sets the Euler rotation in degrees.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the cell size.
    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Sets the cell aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Sets the isometric shear angle in degrees.
    pub fn with_isometric_angle(mut self, isometric_angle: f32) -> Self {
        self.isometric_angle = isometric_angle;
        self
    }

    /// Sets the neighbor topology.
    pub fn with_neighbor_mode(mut self, neighbor_mode: NeighborMode) -> Self {
        self.neighbor_mode = neighbor_mode;
        self
    }

    /// Sets the corner-cutting policy for diagonals.
    pub fn with_cut_corners(mut self, cut_corners: bool) -> Self {
        self.cut_corners = cut_corners;
        self
    }

    /// Sets the climb limit in world units.
    pub fn with_climb_limit(mut self, climb_limit: f32) -> Self {
        self.climb_limit = climb_limit;
        self
    }

    /// Sets the initial penalty of probed cells.
    pub fn with_initial_penalty(mut self, initial_penalty: u32) -> Self {
        self.initial_penalty = initial_penalty;
        self
    }

    /// Sets the erosion configuration.
    pub fn with_erosion(mut self, erosion: ErosionConfig) -> Self {
        self.erosion = erosion;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(Error::InvalidConfig("cell_size must be > 0".into()));
        }
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Err(Error::InvalidConfig(
                "size must be > 0 in both components".into(),
            ));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(Error::InvalidConfig("aspect_ratio must be > 0".into()));
        }
        if self.climb_limit < 0.0 {
            return Err(Error::InvalidConfig("climb_limit must be >= 0".into()));
        }
        self.erosion.validate()
    }
}

/// Configuration for building a layered grid graph.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct LayeredConfig {
    /// Shared grid parameters. The neighbor mode is ignored; layered grids
    /// always connect along the four axis directions.
    pub grid: GridConfig,
    /// Vertical clearance an agent needs to occupy a floor.
    pub character_height: f32,
    /// Probe hits closer together than this merge into one floor.
    pub merge_tolerance: f32,
    /// Maximum number of floors a single cell may hold. Exceeding it aborts
    /// the build of that cell with a configuration error.
    pub max_floors: usize,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            character_height: 2.0,
            merge_tolerance: 0.5,
            max_floors: 16,
        }
    }
}

impl LayeredConfig {
    /// Creates a new [`LayeredConfig`] wrapping the given grid parameters.
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    /// Sets the required vertical clearance.
    pub fn with_character_height(mut self, character_height: f32) -> Self {
        self.character_height = character_height;
        self
    }

    /// Sets the floor merge tolerance.
    pub fn with_merge_tolerance(mut self, merge_tolerance: f32) -> Self {
        self.merge_tolerance = merge_tolerance;
        self
    }

    /// Sets the floor-stack cap.
    pub fn with_max_floors(mut self, max_floors: usize) -> Self {
        self.max_floors = max_floors;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if !(self.character_height.is_finite() && self.character_height > 0.0) {
            return Err(Error::InvalidConfig("character_height must be > 0".into()));
        }
        if !(self.merge_tolerance.is_finite() && self.merge_tolerance >= 0.0) {
            return Err(Error::InvalidConfig("merge_tolerance must be >= 0".into()));
        }
        if self.max_floors == 0 || self.max_floors > u16::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "max_floors must be in 1..={}",
                u16::MAX
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_flanks_match_offsets() {
        for (i, &(a, b)) in DIAGONAL_FLANKS.iter().enumerate() {
            let (dx, dz) = NEIGHBOR_OFFSETS[4 + i];
            let (ax, az) = NEIGHBOR_OFFSETS[a];
            let (bx, bz) = NEIGHBOR_OFFSETS[b];
            assert_eq!((dx, dz), (ax + bx, az + bz));
        }
    }

    #[test]
    fn opposite_directions_cancel() {
        for dir in 0..GRID_DIRECTIONS {
            let opp = opposite_direction(dir);
            let (dx, dz) = NEIGHBOR_OFFSETS[dir];
            let (ox, oz) = NEIGHBOR_OFFSETS[opp];
            assert_eq!((dx + ox, dz + oz), (0, 0), "direction {dir}");
            assert_eq!(opposite_direction(opp), dir);
        }
    }

    #[test]
    fn hex_set_is_closed_under_opposites() {
        for &dir in &HEX_DIRECTIONS {
            assert!(HEX_DIRECTIONS.contains(&opposite_direction(dir)));
        }
    }

    #[test]
    fn erosion_tag_overflow_is_rejected() {
        assert!(ErosionConfig::tags(2, 29).validate().is_ok());
        assert!(ErosionConfig::tags(3, 29).validate().is_err());
        assert!(ErosionConfig::tags(1, 0).validate().is_err());
        assert!(ErosionConfig::unwalkable(100).validate().is_ok());
    }

    #[test]
    fn grid_config_rejects_bad_scalars() {
        assert!(GridConfig::default().validate().is_ok());
        assert!(GridConfig::default()
            .with_cell_size(0.0)
            .validate()
            .is_err());
        assert!(GridConfig::new(Vec2::new(-1.0, 5.0)).validate().is_err());
        assert!(GridConfig::default()
            .with_aspect_ratio(f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn layered_config_bounds_max_floors() {
        assert!(LayeredConfig::default().validate().is_ok());
        assert!(LayeredConfig::default()
            .with_max_floors(0)
            .validate()
            .is_err());
        assert!(LayeredConfig::default()
            .with_character_height(0.0)
            .validate()
            .is_err());
    }
}

//! World↔cell coordinate transform.
//!
//! The transform maps cell space — X/Z in units of cells with the origin at
//! the grid corner, Y in world units — to world space. It composes the grid
//! center, an Euler rotation, an optional isometric shear, and the per-axis
//! cell scaling. It is regenerated from primitive parameters whenever they
//! change and is never persisted; rebuilding from identical inputs yields
//! bit-identical matrices.
use glam::{EulerRot, Mat4, Quat, Vec3};

use super::rect::{Aabb, IntRect};
use super::GridConfig;

/// Hard cap on grid width and depth, in cells.
pub const MAX_DIMENSION: u32 = 1024;

/// Tolerance for snapping near-integral dimension ratios. Keeps repeated
/// re-derivation of the dimensions stable when `size / cell_size` lands a
/// float ulp away from an integer.
pub const DIMENSION_EPSILON: f32 = 0.001;

/// Derives `(width, depth, effective_cell_size)` from a grid configuration.
///
/// The requested cell size is raised when the resulting dimensions would
/// exceed [`MAX_DIMENSION`]; each dimension is at least one cell. Ratios
/// within [`DIMENSION_EPSILON`] of an integer snap to it, anything else
/// rounds up so the grid always covers the configured extent.
pub fn derive_dimensions(config: &GridConfig) -> (u32, u32, f32) {
    let min_cell = (config.size.x / MAX_DIMENSION as f32)
        .max(config.size.y / MAX_DIMENSION as f32);
    let cell = config.cell_size.max(min_cell);
    (
        cells_along(config.size.x, cell),
        cells_along(config.size.y, cell),
        cell,
    )
}

fn cells_along(extent: f32, cell: f32) -> u32 {
    let raw = extent / cell;
    let rounded = raw.round();
    let n = if (raw - rounded).abs() <= DIMENSION_EPSILON {
        rounded
    } else {
        raw.ceil()
    };
    (n.max(1.0) as u32).min(MAX_DIMENSION)
}

/// Forward and inverse mapping between cell space and world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridTransform {
    forward: Mat4,
    inverse: Mat4,
}

impl GridTransform {
    /// Builds the transform for a grid of the given dimensions.
    ///
    /// `cell_size` is the effective cell size from [`derive_dimensions`],
    /// which may differ from the configured one when the dimension cap was
    /// hit.
    pub fn build(config: &GridConfig, width: u32, depth: u32, cell_size: f32) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            config.rotation.y.to_radians(),
            config.rotation.x.to_radians(),
            config.rotation.z.to_radians(),
        );
        let mut forward =
            Mat4::from_translation(config.center) * Mat4::from_quat(rotation);

        if config.isometric_angle != 0.0 {
            // Shear: rotate 45° into the diagonal frame, squash one axis by
            // cos(angle), rotate back.
            let shear = Mat4::from_rotation_y((-45.0_f32).to_radians())
                * Mat4::from_scale(Vec3::new(
                    config.isometric_angle.to_radians().cos(),
                    1.0,
                    1.0,
                ))
                * Mat4::from_rotation_y(45.0_f32.to_radians());
            forward *= shear;
        }

        forward *= Mat4::from_scale(Vec3::new(
            cell_size * config.aspect_ratio,
            1.0,
            cell_size,
        )) * Mat4::from_translation(Vec3::new(
            -(width as f32) * 0.5,
            0.0,
            -(depth as f32) * 0.5,
        ));

        Self {
            forward,
            inverse: forward.inverse(),
        }
    }

    pub fn forward(&self) -> &Mat4 {
        &self.forward
    }

    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    /// Maps a cell-space point (fractional cells, world-unit height) to world
    /// space.
    pub fn cell_to_world(&self, cell_point: Vec3) -> Vec3 {
        self.forward.transform_point3(cell_point)
    }

    /// World position of the center of cell `(x, z)` at the given height.
    pub fn cell_center_to_world(&self, x: i32, z: i32, height: f32) -> Vec3 {
        self.cell_to_world(Vec3::new(x as f32 + 0.5, height, z as f32 + 0.5))
    }

    /// Maps a world position to fractional cell coordinates.
    pub fn world_to_cell(&self, world: Vec3) -> Vec3 {
        self.inverse.transform_point3(world)
    }

    /// Smallest cell rect covering a world-space box: all eight corners are
    /// projected into cell space and the axis-aligned extremes taken. A
    /// conservative over-approximation for rotated grids.
    pub fn cell_rect_of(&self, bounds: &Aabb) -> IntRect {
        let mut min_x = f32::INFINITY;
        let mut min_z = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_z = f32::NEG_INFINITY;
        for corner in bounds.corners() {
            let p = self.world_to_cell(corner);
            min_x = min_x.min(p.x);
            min_z = min_z.min(p.z);
            max_x = max_x.max(p.x);
            max_z = max_z.max(p.z);
        }
        IntRect::new(
            min_x.floor() as i32,
            min_z.floor() as i32,
            max_x.floor() as i32,
            max_z.floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn flat_config() -> GridConfig {
        GridConfig::new(Vec2::new(10.0, 10.0))
    }

    #[test]
    fn rebuilding_is_bit_identical() {
        let config = flat_config()
            .with_rotation(Vec3::new(10.0, 33.0, -5.0))
            .with_isometric_angle(30.0)
            .with_aspect_ratio(1.5);
        let a = GridTransform::build(&config, 10, 10, 1.0);
        let b = GridTransform::build(&config, 10, 10, 1.0);
        assert_eq!(a.forward().to_cols_array(), b.forward().to_cols_array());
        assert_eq!(a.inverse().to_cols_array(), b.inverse().to_cols_array());
    }

    #[test]
    fn cell_centers_land_on_half_coordinates() {
        let t = GridTransform::build(&flat_config(), 10, 10, 1.0);
        let world = t.cell_center_to_world(0, 0, 0.0);
        assert!((world - Vec3::new(-4.5, 0.0, -4.5)).length() < 1e-5);

        let back = t.world_to_cell(world);
        assert!((back - Vec3::new(0.5, 0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn grid_midpoint_maps_to_center() {
        let config = flat_config()
            .with_center(Vec3::new(100.0, 5.0, -20.0))
            .with_rotation(Vec3::new(0.0, 90.0, 0.0));
        let t = GridTransform::build(&config, 10, 10, 1.0);
        let world = t.cell_to_world(Vec3::new(5.0, 0.0, 5.0));
        assert!((world - config.center).length() < 1e-4);
    }

    #[test]
    fn isometric_transform_stays_invertible() {
        let config = flat_config().with_isometric_angle(60.0);
        let t = GridTransform::build(&config, 10, 10, 1.0);
        let p = Vec3::new(3.25, 0.0, 7.75);
        let back = t.world_to_cell(t.cell_to_world(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn dimensions_snap_near_integers() {
        let mut config = flat_config();
        config.size = Vec2::new(10.0005, 9.9995);
        let (w, d, cell) = derive_dimensions(&config);
        assert_eq!((w, d), (10, 10));
        assert_eq!(cell, 1.0);
    }

    #[test]
    fn dimensions_round_up_otherwise() {
        let mut config = flat_config();
        config.size = Vec2::new(10.4, 10.0);
        let (w, d, _) = derive_dimensions(&config);
        assert_eq!((w, d), (11, 10));
    }

    #[test]
    fn cell_size_is_raised_at_the_dimension_cap() {
        let mut config = flat_config();
        config.size = Vec2::new(5000.0, 100.0);
        config.cell_size = 1.0;
        let (w, d, cell) = derive_dimensions(&config);
        assert_eq!(w, MAX_DIMENSION);
        assert!(cell > 1.0);
        assert!(d >= 1 && d <= MAX_DIMENSION);
    }

    #[test]
    fn minimum_one_cell() {
        let mut config = flat_config();
        config.size = Vec2::new(0.25, 0.25);
        config.cell_size = 1.0;
        let (w, d, _) = derive_dimensions(&config);
        assert_eq!((w, d), (1, 1));
    }

    #[test]
    fn cell_rect_covers_world_box() {
        let t = GridTransform::build(&flat_config(), 10, 10, 1.0);
        // Cells (4..=6, 4..=6) around the grid center.
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0));
        let rect = t.cell_rect_of(&bounds);
        assert_eq!(rect, IntRect::new(4, 4, 6, 6));
    }
}

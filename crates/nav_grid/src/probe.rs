//! Terrain probing contract.
//!
//! The graph never inspects world geometry directly; it asks a
//! [`TerrainProbe`] for the ground under a cell. Hosts implement the trait
//! against their physics world. [`FlatProbe`] and [`FnProbe`] cover tests and
//! demos.
use glam::Vec3;

/// Result of probing the terrain under one world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeSample {
    /// Ground position the probe resolved to.
    pub ground: Vec3,
    /// Whether the surface is traversable at all.
    pub walkable: bool,
    /// Surface normal at the ground position.
    pub normal: Vec3,
}

impl ProbeSample {
    /// A walkable sample with an up-facing normal.
    pub fn walkable_at(ground: Vec3) -> Self {
        Self {
            ground,
            walkable: true,
            normal: Vec3::Y,
        }
    }

    /// An unwalkable sample at the given position.
    pub fn blocked_at(ground: Vec3) -> Self {
        Self {
            ground,
            walkable: false,
            normal: Vec3::Y,
        }
    }
}

/// Resolves ground positions and obstructions for grid cells.
///
/// `probe` answers for the topmost surface; `probe_all` returns every surface
/// along a vertical ray, ordered bottom-up, for layered grids. `obstructed`
/// reports whether the space at a resolved ground position is blocked by
/// geometry (a wall, a prop) even though a surface exists.
pub trait TerrainProbe: Send + Sync {
    fn probe(&self, world: Vec3) -> ProbeSample;

    /// All surfaces under `world`, ordered by ascending height. The default
    /// forwards to [`TerrainProbe::probe`], producing a single floor.
    fn probe_all(&self, world: Vec3) -> Vec<ProbeSample> {
        vec![self.probe(world)]
    }

    fn obstructed(&self, _world: Vec3) -> bool {
        false
    }

    /// World-space diameter of the probing shape. Incremental updates expand
    /// their re-probe region by half of this so a moved obstacle cannot leave
    /// stale cells at the region's edge.
    fn diameter(&self) -> f32 {
        0.0
    }
}

/// A probe over an infinite flat plane at a fixed height.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatProbe {
    /// Ground height of the plane.
    pub height: f32,
}

impl FlatProbe {
    pub fn new(height: f32) -> Self {
        Self { height }
    }
}

impl TerrainProbe for FlatProbe {
    fn probe(&self, world: Vec3) -> ProbeSample {
        ProbeSample::walkable_at(Vec3::new(world.x, self.height, world.z))
    }
}

/// A probe that forwards to a user-provided closure.
pub struct FnProbe<F>
where
    F: Fn(Vec3) -> ProbeSample + Send + Sync,
{
    f: F,
    diameter: f32,
}

impl<F> FnProbe<F>
where
    F: Fn(Vec3) -> ProbeSample + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, diameter: 0.0 }
    }

    /// Sets the reported probing-shape diameter.
    pub fn with_diameter(mut self, diameter: f32) -> Self {
        self.diameter = diameter;
        self
    }
}

impl<F> TerrainProbe for FnProbe<F>
where
    F: Fn(Vec3) -> ProbeSample + Send + Sync,
{
    fn probe(&self, world: Vec3) -> ProbeSample {
        (self.f)(world)
    }

    fn diameter(&self) -> f32 {
        self.diameter
    }
}

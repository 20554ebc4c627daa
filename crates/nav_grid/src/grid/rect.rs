//! Integer cell rects and world-space boxes.
//!
//! [`IntRect`] is inclusive on all sides: a rect with `xmin == xmax` spans one
//! cell. The incremental update engine derives several rects per update
//! (original / physics / affect / erosion rings); they are all this type.
use glam::Vec3;

/// Inclusive integer rectangle in grid-cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntRect {
    pub xmin: i32,
    pub zmin: i32,
    pub xmax: i32,
    pub zmax: i32,
}

impl IntRect {
    pub fn new(xmin: i32, zmin: i32, xmax: i32, zmax: i32) -> Self {
        Self {
            xmin,
            zmin,
            xmax,
            zmax,
        }
    }

    /// Rect covering a single cell.
    pub fn single(x: i32, z: i32) -> Self {
        Self::new(x, z, x, z)
    }

    /// Whether the rect spans at least one cell.
    pub fn is_valid(&self) -> bool {
        self.xmin <= self.xmax && self.zmin <= self.zmax
    }

    /// Number of cells along X.
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin + 1
    }

    /// Number of cells along Z.
    pub fn depth(&self) -> i32 {
        self.zmax - self.zmin + 1
    }

    /// Total number of cells, zero for invalid rects.
    pub fn area(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        self.width() as usize * self.depth() as usize
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.xmin && x <= self.xmax && z >= self.zmin && z <= self.zmax
    }

    /// Grows the rect by `n` cells on every side. Negative `n` shrinks.
    pub fn expand(&self, n: i32) -> Self {
        Self::new(self.xmin - n, self.zmin - n, self.xmax + n, self.zmax + n)
    }

    /// Smallest rect containing both inputs.
    pub fn union(&self, other: &IntRect) -> Self {
        Self::new(
            self.xmin.min(other.xmin),
            self.zmin.min(other.zmin),
            self.xmax.max(other.xmax),
            self.zmax.max(other.zmax),
        )
    }

    /// Overlap of both inputs; may be invalid when they are disjoint.
    pub fn intersection(&self, other: &IntRect) -> Self {
        Self::new(
            self.xmin.max(other.xmin),
            self.zmin.max(other.zmin),
            self.xmax.min(other.xmax),
            self.zmax.min(other.zmax),
        )
    }

    /// Clamps the rect to a `width × depth` grid; may be invalid when the
    /// rect lies fully outside.
    pub fn clamp_to(&self, width: u32, depth: u32) -> Self {
        self.intersection(&IntRect::new(0, 0, width as i32 - 1, depth as i32 - 1))
    }

    /// Visits every cell of the rect in row-major order. Invalid rects visit
    /// nothing.
    pub fn for_each(&self, mut f: impl FnMut(i32, i32)) {
        if !self.is_valid() {
            return;
        }
        for z in self.zmin..=self.zmax {
            for x in self.xmin..=self.xmax {
                f(x, z);
            }
        }
    }
}

/// Axis-aligned world-space box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners, normalizing their order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

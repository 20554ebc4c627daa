//! Nearest-node queries over uniform grids.
//!
//! The unconstrained query rounds into the grid and returns in O(1). The
//! constrained query expands square rings of Chebyshev radius 1, 2, 3…
//! around the estimated center cell, testing only each ring's perimeter.
//! Ring order and true-distance order can disagree near ring boundaries, so
//! after the first predicate hit a few more rings (the `overlap`) are
//! searched before committing to the best candidate.
use glam::Vec3;
use tracing::error;

use crate::error::Error;
use crate::grid::GridNode;

use super::GridGraph;

/// Hard cap on the ring radius, tripped only by logic errors; hitting it
/// logs a diagnostic and returns the best candidate found so far.
pub const MAX_SEARCH_RADIUS: i32 = 4096;

/// Default number of extra rings searched past the first hit.
pub const DEFAULT_OVERLAP: u32 = 2;

/// A resolved nearest-node lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestHit {
    /// Linear index of the hit node.
    pub node: u32,
    /// Query position clamped onto the hit cell's footprint.
    pub position: Vec3,
}

/// Limits for a constrained nearest-node query.
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct NearestConstraint {
    /// Reject candidates farther than this world-space distance.
    pub max_distance: Option<f32>,
    /// Extra rings searched past the first hit.
    pub overlap: u32,
}

impl Default for NearestConstraint {
    fn default() -> Self {
        Self {
            max_distance: None,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl NearestConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum world-space distance.
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Sets the ring overlap.
    pub fn with_overlap(mut self, overlap: u32) -> Self {
        self.overlap = overlap;
        self
    }
}

/// Visits the perimeter cells of the square ring at the given radius.
pub(crate) fn for_each_ring_cell(cx: i32, cz: i32, radius: i32, mut f: impl FnMut(i32, i32)) {
    if radius == 0 {
        f(cx, cz);
        return;
    }
    for x in cx - radius..=cx + radius {
        f(x, cz - radius);
        f(x, cz + radius);
    }
    for z in cz - radius + 1..=cz + radius - 1 {
        f(cx - radius, z);
        f(cx + radius, z);
    }
}

impl GridGraph {
    /// Nearest cell to a world position, regardless of walkability. Returns
    /// `None` only on an unbuilt graph.
    pub fn nearest(&self, world: Vec3) -> Option<NearestHit> {
        if !self.is_built() {
            return None;
        }
        let p = self.transform().world_to_cell(world);
        let x = (p.x.floor() as i32).clamp(0, self.width() as i32 - 1);
        let z = (p.z.floor() as i32).clamp(0, self.depth() as i32 - 1);
        let index = self.index_of(x, z)?;
        Some(NearestHit {
            node: index as u32,
            position: self.clamp_to_cell(p, x, z),
        })
    }

    /// Nearest cell satisfying `predicate`, within the given constraint.
    /// Returns `None` when nothing qualifies in range or the graph is
    /// unbuilt.
    pub fn nearest_where(
        &self,
        world: Vec3,
        constraint: &NearestConstraint,
        predicate: impl Fn(&GridNode) -> bool,
    ) -> Option<NearestHit> {
        if !self.is_built() {
            return None;
        }
        let p = self.transform().world_to_cell(world);
        let cx = (p.x.floor() as i32).clamp(0, self.width() as i32 - 1);
        let cz = (p.z.floor() as i32).clamp(0, self.depth() as i32 - 1);

        // Conservative lower bound for the true distance of ring r: the
        // query lies somewhere inside the center cell, so a cell r rings out
        // is at least (r - 1) cell extents away.
        let min_extent = self.cell_size() * self.config().aspect_ratio.min(1.0);

        let mut best: Option<(usize, f32)> = None;
        let mut overlap_left = constraint.overlap;
        let mut radius = 0;
        loop {
            if radius > MAX_SEARCH_RADIUS {
                error!(
                    "{}",
                    Error::SearchOverflow {
                        radius: MAX_SEARCH_RADIUS
                    }
                );
                break;
            }
            if let Some(max_distance) = constraint.max_distance {
                if (radius - 1).max(0) as f32 * min_extent > max_distance {
                    break;
                }
            }
            if radius > 0 && self.ring_past_grid(cx, cz, radius) {
                break;
            }

            for_each_ring_cell(cx, cz, radius, |x, z| {
                let Some(index) = self.index_of(x, z) else {
                    return;
                };
                let node = &self.nodes()[index];
                if !predicate(node) {
                    return;
                }
                let distance = world.distance(node.world_position());
                if let Some(max_distance) = constraint.max_distance {
                    if distance > max_distance {
                        return;
                    }
                }
                if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                    best = Some((index, distance));
                }
            });

            if best.is_some() {
                if overlap_left == 0 {
                    break;
                }
                overlap_left -= 1;
            }
            radius += 1;
        }

        best.map(|(index, _)| {
            let (x, z) = self.cell_of(index);
            NearestHit {
                node: index as u32,
                position: self.clamp_to_cell(p, x, z),
            }
        })
    }

    /// Whether the perimeter of the ring lies entirely outside the grid.
    fn ring_past_grid(&self, cx: i32, cz: i32, radius: i32) -> bool {
        cx - radius < 0
            && cz - radius < 0
            && cx + radius > self.width() as i32 - 1
            && cz + radius > self.depth() as i32 - 1
    }

    /// Clamps a cell-space point onto the footprint of cell `(x, z)` and
    /// maps it back to world space.
    fn clamp_to_cell(&self, cell_point: Vec3, x: i32, z: i32) -> Vec3 {
        let clamped = Vec3::new(
            cell_point.x.clamp(x as f32, x as f32 + 1.0),
            cell_point.y,
            cell_point.z.clamp(z as f32, z as f32 + 1.0),
        );
        self.transform().cell_to_world(clamped)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use crate::grid::{GraphId, GridConfig};
    use crate::probe::FlatProbe;

    use super::super::GridGraph;
    use super::*;

    fn open_grid(size: f32) -> GridGraph {
        GridGraph::build(
            GraphId(0),
            GridConfig::new(Vec2::new(size, size)),
            &FlatProbe::new(0.0),
        )
        .unwrap()
    }

    fn brute_force_nearest(
        graph: &GridGraph,
        world: Vec3,
        predicate: impl Fn(&GridNode) -> bool,
    ) -> Option<usize> {
        graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, n)| predicate(n))
            .min_by(|(_, a), (_, b)| {
                world
                    .distance(a.world_position())
                    .total_cmp(&world.distance(b.world_position()))
            })
            .map(|(i, _)| i)
    }

    #[test]
    fn ring_perimeter_has_eight_r_cells() {
        for radius in 1..5 {
            let mut count = 0;
            for_each_ring_cell(0, 0, radius, |_, _| count += 1);
            assert_eq!(count, 8 * radius as usize);
        }
        let mut count = 0;
        for_each_ring_cell(3, 3, 0, |x, z| {
            count += 1;
            assert_eq!((x, z), (3, 3));
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn unconstrained_query_matches_brute_force() {
        let graph = open_grid(7.0);
        let points = [
            Vec3::new(0.2, 0.0, 0.3),
            Vec3::new(-3.4, 0.0, 3.4),
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(-0.49, 0.0, 0.49),
        ];
        for world in points {
            let hit = graph.nearest(world).unwrap();
            let expected = brute_force_nearest(&graph, world, |_| true).unwrap();
            assert_eq!(hit.node as usize, expected, "query at {world:?}");
        }
    }

    #[test]
    fn position_is_clamped_onto_the_hit_cell() {
        let graph = open_grid(5.0);
        // Inside the grid the clamped position is the query itself.
        let inside = Vec3::new(0.3, 0.0, -0.2);
        let hit = graph.nearest(inside).unwrap();
        assert!((hit.position - inside).length() < 1e-4);

        // Far outside, it lands on the grid edge.
        let outside = Vec3::new(100.0, 0.0, 0.0);
        let hit = graph.nearest(outside).unwrap();
        assert!((hit.position.x - 2.5).abs() < 1e-3);
    }

    #[test]
    fn unbuilt_graph_returns_no_result() {
        let graph = GridGraph::new(GraphId(0), GridConfig::new(Vec2::new(5.0, 5.0))).unwrap();
        assert!(graph.nearest(Vec3::ZERO).is_none());
        assert!(graph
            .nearest_where(Vec3::ZERO, &NearestConstraint::default(), |n| n.walkable)
            .is_none());
    }

    #[test]
    fn constrained_query_finds_true_nearest_across_ring_boundaries() {
        let graph = open_grid(11.0);
        let (cx, cz) = (5, 5);
        // Two candidates: one on ring 2 but diagonally far, one on ring 3
        // but closer in true distance to a query near the cell's east edge.
        let far_diagonal = graph.index_of(cx - 2, cz - 2).unwrap();
        let near_axis = graph.index_of(cx + 3, cz).unwrap();
        let predicate = move |n: &GridNode| {
            n.cell_index as usize == far_diagonal || n.cell_index as usize == near_axis
        };

        let world = Vec3::new(0.45, 0.0, 0.0);
        let hit = graph
            .nearest_where(world, &NearestConstraint::default(), predicate)
            .unwrap();
        assert_eq!(hit.node as usize, near_axis);
        assert_eq!(
            Some(hit.node as usize),
            brute_force_nearest(&graph, world, predicate)
        );
    }

    #[test]
    fn constrained_query_respects_max_distance() {
        let graph = open_grid(11.0);
        let target = graph.index_of(8, 5).unwrap();
        let predicate = move |n: &GridNode| n.cell_index as usize == target;

        // The target sits 3 world units from the query.
        let world = Vec3::ZERO;
        let tight = NearestConstraint::new().with_max_distance(2.0);
        assert!(graph.nearest_where(world, &tight, predicate).is_none());

        let loose = NearestConstraint::new().with_max_distance(3.5);
        let hit = graph.nearest_where(world, &loose, predicate).unwrap();
        assert_eq!(hit.node as usize, target);
    }

    #[test]
    fn constrained_query_gives_up_outside_the_grid() {
        let graph = open_grid(5.0);
        let hit = graph.nearest_where(Vec3::ZERO, &NearestConstraint::default(), |_| false);
        assert!(hit.is_none());
    }

    #[test]
    fn constrained_query_prefers_center_cell_when_it_qualifies() {
        let graph = open_grid(5.0);
        let world = Vec3::new(0.1, 0.0, 0.1);
        let hit = graph
            .nearest_where(world, &NearestConstraint::default(), |n| n.walkable)
            .unwrap();
        let expected = graph.index_of(2, 2).unwrap();
        assert_eq!(hit.node as usize, expected);
    }
}

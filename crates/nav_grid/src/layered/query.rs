//! Nearest-node queries over layered grids.
//!
//! The ring search walks columns exactly like the uniform variant and scans
//! every floor of each visited column. The unconstrained query picks the
//! floor closest in height to the query position; a column with no floors
//! falls back to an unrestricted ring search.
use glam::Vec3;
use tracing::error;

use crate::error::Error;
use crate::grid::LayeredNode;
use crate::uniform::query::{for_each_ring_cell, NearestConstraint, NearestHit, MAX_SEARCH_RADIUS};

use super::LayeredGridGraph;

impl LayeredGridGraph {
    /// Nearest floor to a world position, regardless of walkability.
    /// Returns `None` on an unbuilt graph or when the grid holds no floors
    /// at all.
    pub fn nearest(&self, world: Vec3) -> Option<NearestHit> {
        if !self.is_built() {
            return None;
        }
        let p = self.transform().world_to_cell(world);
        let x = (p.x.floor() as i32).clamp(0, self.width() as i32 - 1);
        let z = (p.z.floor() as i32).clamp(0, self.depth() as i32 - 1);

        match self.closest_floor_in_column(x, z, world.y) {
            Some(index) => Some(NearestHit {
                node: index as u32,
                position: self.clamp_to_cell(p, x, z),
            }),
            None => self.nearest_where(world, &NearestConstraint::default(), |_| true),
        }
    }

    /// Nearest floor satisfying `predicate`, within the given constraint.
    pub fn nearest_where(
        &self,
        world: Vec3,
        constraint: &NearestConstraint,
        predicate: impl Fn(&LayeredNode) -> bool,
    ) -> Option<NearestHit> {
        if !self.is_built() {
            return None;
        }
        let p = self.transform().world_to_cell(world);
        let cx = (p.x.floor() as i32).clamp(0, self.width() as i32 - 1);
        let cz = (p.z.floor() as i32).clamp(0, self.depth() as i32 - 1);
        let min_extent = self.cell_size() * self.config().grid.aspect_ratio.min(1.0);

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
                for layer in 0..self.layer_count() {
                    let Some(index) = self.node_index(x, z, layer) else {
                        continue;
                    };
                    let Some(node) = self.nodes()[index].as_ref() else {
                        continue;
                    };
                    if !predicate(node) {
                        continue;
                    }
                    let distance = world.distance(node.world_position());
                    if let Some(max_distance) = constraint.max_distance {
                        if distance > max_distance {
                            continue;
                        }
                    }
                    if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                        best = Some((index, distance));
                    }
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
            let (x, z, _) = self.cell_of(index);
            NearestHit {
                node: index as u32,
                position: self.clamp_to_cell(p, x, z),
            }
        })
    }

    /// Floor of the column closest in height to `y`.
    fn closest_floor_in_column(&self, x: i32, z: i32, y: f32) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for layer in 0..self.layer_count() {
            let Some(index) = self.node_index(x, z, layer) else {
                continue;
            };
            let Some(node) = self.nodes()[index].as_ref() else {
                continue;
            };
            let gap = (node.world_position().y - y).abs();
            if best.is_none_or(|(_, best_gap)| gap < best_gap) {
                best = Some((index, gap));
            }
        }
        best.map(|(index, _)| index)
    }

    fn ring_past_grid(&self, cx: i32, cz: i32, radius: i32) -> bool {
        cx - radius < 0
            && cz - radius < 0
            && cx + radius > self.width() as i32 - 1
            && cz + radius > self.depth() as i32 - 1
    }

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

    use crate::grid::{GraphId, GridConfig, LayeredConfig};
    use crate::probe::FlatProbe;
    use crate::uniform::query::NearestConstraint;

    use super::super::test_probes::BridgeProbe;
    use super::super::LayeredGridGraph;
    use super::*;

    fn bridge_graph() -> LayeredGridGraph {
        LayeredGridGraph::build(
            GraphId(0),
            LayeredConfig::new(GridConfig::new(Vec2::new(7.0, 7.0))),
            &BridgeProbe,
        )
        .unwrap()
    }

    #[test]
    fn nearest_picks_the_floor_at_query_height() {
        let graph = bridge_graph();
        let ground_hit = graph.nearest(Vec3::new(0.0, 0.5, 0.0)).unwrap();
        let deck_hit = graph.nearest(Vec3::new(0.0, 3.8, 0.0)).unwrap();

        let (_, _, ground_layer) = graph.cell_of(ground_hit.node as usize);
        let (_, _, deck_layer) = graph.cell_of(deck_hit.node as usize);
        assert_eq!(ground_layer, 0);
        assert_eq!(deck_layer, 1);
    }

    #[test]
    fn nearest_where_skips_filtered_floors() {
        let graph = bridge_graph();
        // Ask for a deck floor while standing on the ground away from the
        // bridge: the ring search must walk to the nearest deck column.
        let hit = graph
            .nearest_where(
                Vec3::new(-3.0, 0.0, 0.0),
                &NearestConstraint::default(),
                |n| n.world_position().y > 2.0,
            )
            .unwrap();
        let (x, _, layer) = graph.cell_of(hit.node as usize);
        assert_eq!(layer, 1);
        // The west edge of the deck is its closest column.
        assert_eq!(x, 2);
    }

    #[test]
    fn max_distance_bounds_the_layered_search() {
        let graph = bridge_graph();
        let constraint = NearestConstraint::new().with_max_distance(1.0);
        // The deck is 4 units up; nothing within 1 unit matches.
        let hit = graph.nearest_where(Vec3::new(-3.0, 0.0, 0.0), &constraint, |n| {
            n.world_position().y > 2.0
        });
        assert!(hit.is_none());
    }

    #[test]
    fn unbuilt_layered_graph_returns_no_result() {
        let graph = LayeredGridGraph::new(
            GraphId(0),
            LayeredConfig::new(GridConfig::new(Vec2::new(5.0, 5.0))),
        )
        .unwrap();
        assert!(graph.nearest(Vec3::ZERO).is_none());
    }

    #[test]
    fn flat_layered_nearest_matches_uniform_intuition() {
        let graph = LayeredGridGraph::build(
            GraphId(0),
            LayeredConfig::new(GridConfig::new(Vec2::new(5.0, 5.0))),
            &FlatProbe::new(0.0),
        )
        .unwrap();
        let world = Vec3::new(0.2, 0.0, -0.3);
        let hit = graph.nearest(world).unwrap();
        let (x, z, layer) = graph.cell_of(hit.node as usize);
        assert_eq!((x, z, layer), (2, 2, 0));
        assert!((hit.position - world).length() < 1e-4);
    }
}

//! Incremental updates: recompute a bounded region after a world mutation.
//!
//! An update derives several cell rects from the request's world bounds:
//! the projected `original` rect, the probe-expanded `physics` rect, their
//! union expanded by one connectivity ring (`affect`), and — when erosion is
//! active — two further halo rings. Cells inside ring1 see the full
//! erosion-depth neighborhood and their recomputed state is trusted; the
//! outer `ring2 \ ring1` band exists only to give them context and is
//! restored to its pre-update state afterwards. Everything else on the grid
//! is left untouched.
//!
//! Walkability baselines are synced at the moment walkability is sourced
//! (re-probe and mutation callback); the erosion dance resets to the
//! baseline and never writes it, so repeating an update cannot erode twice.
use tracing::warn;

use crate::grid::{Aabb, ErosionMode, GridNode};
use crate::probe::TerrainProbe;

use super::GridGraph;

/// A bounded update request. `N` is the node type of the graph variant the
/// update is applied to.
///
/// `reprobe_terrain` and `may_change_walkability` both mark the update as
/// walkability-affecting; hosts mutating walkability through `apply` must
/// set the latter or connectivity and erosion will not be refreshed.
#[non_exhaustive]
pub struct GraphUpdate<'a, N> {
    /// World-space volume the change happened in.
    pub bounds: Aabb,
    /// Re-run the terrain probe for cells near the volume.
    pub reprobe_terrain: bool,
    /// The mutation callback may flip node walkability.
    pub may_change_walkability: bool,
    /// Refresh erosion even if walkability is untouched.
    pub run_erosion: bool,
    /// Reset penalties to the configured initial value while re-probing.
    pub reset_penalty: bool,
    /// Hook invoked for every cell of the affect rect before any mutation.
    pub will_update: Option<Box<dyn FnMut(&N) + 'a>>,
    /// Mutation applied to nodes whose world position lies inside `bounds`.
    pub apply: Option<Box<dyn FnMut(&mut N) + 'a>>,
}

/// Update request for uniform grid graphs.
pub type GridUpdate<'a> = GraphUpdate<'a, GridNode>;

impl<'a, N> GraphUpdate<'a, N> {
    /// Creates an update with all flags off and no hooks.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            reprobe_terrain: false,
            may_change_walkability: false,
            run_erosion: false,
            reset_penalty: false,
            will_update: None,
            apply: None,
        }
    }

    /// Marks the update as re-probing the terrain.
    pub fn with_reprobe(mut self) -> Self {
        self.reprobe_terrain = true;
        self
    }

    /// Marks the update as possibly changing walkability.
    pub fn with_walkability_change(mut self) -> Self {
        self.may_change_walkability = true;
        self
    }

    /// Forces an erosion refresh.
    pub fn with_erosion(mut self) -> Self {
        self.run_erosion = true;
        self
    }

    /// Resets penalties while re-probing.
    pub fn with_reset_penalty(mut self) -> Self {
        self.reset_penalty = true;
        self
    }

    /// Sets the pre-update hook.
    pub fn with_will_update(mut self, f: impl FnMut(&N) + 'a) -> Self {
        self.will_update = Some(Box::new(f));
        self
    }

    /// Sets the mutation callback.
    pub fn with_apply(mut self, f: impl FnMut(&mut N) + 'a) -> Self {
        self.apply = Some(Box::new(f));
        self
    }
}

/// What an applied update touched.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    /// Cells re-probed against the terrain.
    pub probed_cells: usize,
    /// Nodes the mutation callback ran on.
    pub mutated_cells: usize,
    /// Cells whose connectivity was recomputed in the final pass.
    pub reconnected_cells: usize,
    /// Floors added to layered columns; non-zero means the node count
    /// changed and the host must rebuild anything keyed on it. Always zero
    /// for uniform grids.
    pub floors_added: usize,
}

/// Result of an update request.
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The update ran; the summary describes its extent.
    Applied(UpdateSummary),
    /// The graph was unbuilt or size-mismatched; nothing was touched.
    Skipped,
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}

impl GridGraph {
    /// Applies a bounded update request. See the module docs for the rect
    /// and halo derivation.
    ///
    /// On an unbuilt or size-mismatched graph this is a no-op returning
    /// [`UpdateOutcome::Skipped`] with a logged warning.
    pub fn update_area(
        &mut self,
        update: &mut GridUpdate<'_>,
        probe: &dyn TerrainProbe,
    ) -> UpdateOutcome {
        if !self.is_built() {
            warn!("update_area called on an unbuilt grid graph; skipping.");
            return UpdateOutcome::Skipped;
        }
        let mut summary = UpdateSummary::default();
        let grid_rect = self.grid_rect();
        let bounds = update.bounds;

        let original = self.transform().cell_rect_of(&bounds);

        let physics = if update.reprobe_terrain {
            let margin = ((probe.diameter() * 1.02 * 0.5) / self.cell_size()).ceil() as i32;
            original.expand(margin)
        } else {
            original
        };

        let erosion_iterations = self.config().erosion.iterations as i32;
        let walkability_affected = update.reprobe_terrain || update.may_change_walkability;
        let mut affect = original.union(&physics);
        if walkability_affected || update.run_erosion {
            // One extra ring so the connectivity pass sees every neighbor of
            // a changed cell.
            affect = affect.expand(erosion_iterations + 1);
        }

        let original_c = original.intersection(&grid_rect);
        let physics_c = physics.intersection(&grid_rect);
        let affect_c = affect.intersection(&grid_rect);

        if let Some(hook) = update.will_update.as_mut() {
            affect_c.for_each(|x, z| {
                if let Some(index) = self.index_of(x, z) {
                    hook(&self.nodes()[index]);
                }
            });
        }

        if update.reprobe_terrain {
            physics_c.for_each(|x, z| {
                self.reprobe_cell(x, z, probe, update.reset_penalty);
            });
            summary.probed_cells = physics_c.area();
        }

        if let Some(apply) = update.apply.as_mut() {
            // The rect is a conservative over-approximation; only nodes whose
            // world position actually lies inside the volume are mutated.
            original_c.for_each(|x, z| {
                let Some(index) = self.index_of(x, z) else {
                    return;
                };
                let node = &mut self.nodes_mut()[index];
                if bounds.contains(node.world_position()) {
                    apply(node);
                    node.walkable_baseline = node.walkable;
                    summary.mutated_cells += 1;
                }
            });
        }

        if !walkability_affected && !update.run_erosion {
            return UpdateOutcome::Applied(summary);
        }

        if erosion_iterations == 0 {
            self.recompute_connections_rect(affect_c);
            summary.reconnected_cells = affect_c.area();
            return UpdateOutcome::Applied(summary);
        }

        let ring1 = affect.expand(erosion_iterations).intersection(&grid_rect);
        let ring2 = affect
            .expand(erosion_iterations * 2)
            .intersection(&grid_rect);
        let tag_band = match self.config().erosion.mode {
            ErosionMode::Tags { first_tag } => {
                Some((first_tag, first_tag + self.config().erosion.iterations as u8))
            }
            ErosionMode::Unwalkable => None,
        };

        // Undo stale erosion across ring2 and remember the outer band, whose
        // recomputed state lacks context beyond ring2 and cannot be trusted.
        let mut outer_band: Vec<(usize, bool, u8)> = Vec::new();
        ring2.for_each(|x, z| {
            let Some(index) = self.index_of(x, z) else {
                return;
            };
            let in_ring1 = ring1.contains(x, z);
            let node = &mut self.nodes_mut()[index];
            let walkable_now = node.walkable;
            let tag_now = node.tag;
            node.walkable = node.walkable_baseline;
            if let Some((first, last)) = tag_band {
                if node.tag >= first && node.tag <= last {
                    node.tag = 0;
                }
            }
            if !in_ring1 {
                outer_band.push((index, walkable_now, tag_now));
            }
        });

        self.recompute_connections_rect(ring2);
        self.erode_rect(ring2);

        for &(index, walkable, tag) in &outer_band {
            let node = &mut self.nodes_mut()[index];
            node.walkable = walkable;
            if tag_band.is_some() {
                node.tag = tag;
            }
        }

        self.recompute_connections_rect(ring2);
        summary.reconnected_cells = ring2.area();

        UpdateOutcome::Applied(summary)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use crate::grid::{ErosionConfig, GraphId, GridConfig, IntRect};
    use crate::probe::{FlatProbe, FnProbe, ProbeSample, TerrainProbe};

    use super::super::GridGraph;
    use super::*;

    fn blocked_square_probe(half_extent: f32) -> impl TerrainProbe {
        FnProbe::new(move |p: Vec3| {
            if p.x.abs() <= half_extent && p.z.abs() <= half_extent {
                ProbeSample::blocked_at(Vec3::new(p.x, 0.0, p.z))
            } else {
                ProbeSample::walkable_at(Vec3::new(p.x, 0.0, p.z))
            }
        })
    }

    #[test]
    fn update_on_unbuilt_graph_is_skipped() {
        let mut graph =
            GridGraph::new(GraphId(0), GridConfig::new(Vec2::new(5.0, 5.0))).unwrap();
        let mut update =
            GridUpdate::new(Aabb::from_center_size(Vec3::ZERO, Vec3::ONE)).with_reprobe();
        let outcome = graph.update_area(&mut update, &FlatProbe::new(0.0));
        assert!(!outcome.is_applied());
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn mutation_respects_the_exact_bounds_volume() {
        let mut graph = GridGraph::build(
            GraphId(0),
            GridConfig::new(Vec2::new(5.0, 5.0)),
            &FlatProbe::new(0.0),
        )
        .unwrap();

        // The box covers one cell center but its cell rect covers three.
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(1.2, 2.0, 1.2));
        let mut update = GridUpdate::new(bounds).with_apply(|node| node.penalty += 10);
        let outcome = graph.update_area(&mut update, &FlatProbe::new(0.0));

        match outcome {
            UpdateOutcome::Applied(summary) => assert_eq!(summary.mutated_cells, 1),
            UpdateOutcome::Skipped => panic!("update should apply"),
        }
        assert_eq!(graph.node(2, 2).unwrap().penalty, 10);
        assert_eq!(graph.node(1, 2).unwrap().penalty, 0);
    }

    #[test]
    fn will_update_hook_sees_every_affect_cell() {
        let mut graph = GridGraph::build(
            GraphId(0),
            GridConfig::new(Vec2::new(9.0, 9.0)),
            &FlatProbe::new(0.0),
        )
        .unwrap();

        let mut seen = 0usize;
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(1.2, 2.0, 1.2));
        let mut update = GridUpdate::new(bounds)
            .with_walkability_change()
            .with_will_update(|_| seen += 1);
        graph.update_area(&mut update, &FlatProbe::new(0.0));
        drop(update);

        // original rect is 3x3 (conservative), affect adds one ring.
        assert_eq!(seen, 25);
    }

    #[test]
    fn walkability_mutation_refreshes_connectivity() {
        let mut graph = GridGraph::build(
            GraphId(0),
            GridConfig::new(Vec2::new(5.0, 5.0)),
            &FlatProbe::new(0.0),
        )
        .unwrap();

        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(0.5, 2.0, 0.5));
        let mut update = GridUpdate::new(bounds)
            .with_walkability_change()
            .with_apply(|node| node.walkable = false);
        let outcome = graph.update_area(&mut update, &FlatProbe::new(0.0));
        assert!(outcome.is_applied());

        assert!(!graph.node(2, 2).unwrap().walkable);
        assert_eq!(graph.node(2, 2).unwrap().connection_count(), 0);
        // Axis neighbor no longer connects into the blocked cell.
        assert!(!graph.node(1, 2).unwrap().connections[0]);
        // The baseline follows the mutation.
        assert!(!graph.node(2, 2).unwrap().walkable_baseline);
    }

    #[test]
    fn incremental_update_matches_full_rebuild_inside_ring1() {
        let config =
            GridConfig::new(Vec2::new(15.0, 15.0)).with_erosion(ErosionConfig::unwalkable(1));
        let blocked = blocked_square_probe(1.1);

        let mut incremental =
            GridGraph::build(GraphId(0), config.clone(), &FlatProbe::new(0.0)).unwrap();
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.2, 2.0, 2.2));
        let mut update = GridUpdate::new(bounds).with_reprobe();
        assert!(incremental.update_area(&mut update, &blocked).is_applied());

        let full = GridGraph::build(GraphId(0), config, &blocked).unwrap();

        let iterations = 1;
        let ring1: IntRect = incremental
            .transform()
            .cell_rect_of(&bounds)
            .expand(iterations + 1)
            .expand(iterations)
            .clamp_to(15, 15);

        ring1.for_each(|x, z| {
            let a = incremental.node(x, z).unwrap();
            let b = full.node(x, z).unwrap();
            assert_eq!(a.walkable, b.walkable, "walkable mismatch at ({x},{z})");
            assert_eq!(
                a.walkable_baseline, b.walkable_baseline,
                "baseline mismatch at ({x},{z})"
            );
            assert_eq!(
                a.connections, b.connections,
                "connection mismatch at ({x},{z})"
            );
        });
    }

    #[test]
    fn repeating_an_update_does_not_erode_twice() {
        let config =
            GridConfig::new(Vec2::new(15.0, 15.0)).with_erosion(ErosionConfig::unwalkable(1));
        let blocked = blocked_square_probe(1.1);
        let mut graph = GridGraph::build(GraphId(0), config, &FlatProbe::new(0.0)).unwrap();

        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.2, 2.0, 2.2));
        let mut update = GridUpdate::new(bounds).with_reprobe();
        graph.update_area(&mut update, &blocked);
        let first: Vec<bool> = graph.nodes().iter().map(|n| n.walkable).collect();

        let mut update = GridUpdate::new(bounds).with_reprobe();
        graph.update_area(&mut update, &blocked);
        let second: Vec<bool> = graph.nodes().iter().map(|n| n.walkable).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn cells_outside_ring2_stay_untouched() {
        let config =
            GridConfig::new(Vec2::new(21.0, 21.0)).with_erosion(ErosionConfig::unwalkable(1));
        let blocked = blocked_square_probe(1.1);
        let mut graph = GridGraph::build(GraphId(0), config, &FlatProbe::new(0.0)).unwrap();
        let before: Vec<u32> = graph.nodes().iter().map(|n| n.penalty).collect();

        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(2.2, 2.0, 2.2));
        let ring2 = graph
            .transform()
            .cell_rect_of(&bounds)
            .expand(2)
            .expand(2)
            .clamp_to(21, 21);

        let mut update = GridUpdate::new(bounds).with_reprobe();
        graph.update_area(&mut update, &blocked);

        graph.grid_rect().for_each(|x, z| {
            if ring2.contains(x, z) {
                return;
            }
            let node = graph.node(x, z).unwrap();
            assert!(node.walkable, "({x},{z}) outside ring2 changed");
            assert_eq!(node.penalty, before[node.cell_index as usize]);
        });
    }

    #[test]
    fn reset_penalty_applies_during_reprobe() {
        let config = GridConfig::new(Vec2::new(5.0, 5.0)).with_initial_penalty(7);
        let mut graph = GridGraph::build(GraphId(0), config, &FlatProbe::new(0.0)).unwrap();

        // Bump penalties out-of-band, then reprobe with reset.
        for node in graph.nodes_mut() {
            node.penalty = 500;
        }
        let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(0.5, 2.0, 0.5));
        let mut update = GridUpdate::new(bounds).with_reprobe().with_reset_penalty();
        graph.update_area(&mut update, &FlatProbe::new(0.0));

        assert_eq!(graph.node(2, 2).unwrap().penalty, 7);
        assert_eq!(graph.node(0, 0).unwrap().penalty, 500);
    }
}

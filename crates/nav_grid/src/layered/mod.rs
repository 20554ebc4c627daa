//! Layered grid graph: a bounded stack of vertically-overlapping floors per
//! cell.
//!
//! Columns are probed with [`crate::probe::TerrainProbe::probe_all`];
//! near-coincident hits merge into one floor. Nodes live in a layer-major
//! store (`layer × depth × width`) with `None` marking absent floors, so
//! growing the graph by one layer appends a plane without disturbing
//! existing indices. Connectivity is 4-directional and stores the connected
//! floor index of the neighboring column (see [`connectivity`]).
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::events::{BuildEvent, BuildEventKind, EventSink, PROGRESS_STRIDE};
use crate::grid::transform::derive_dimensions;
use crate::grid::{
    quantize, ClimbFilter, ConnectionFilter, GraphId, GridTransform, IntRect, LayeredConfig,
    LayeredNode,
};
use crate::probe::{ProbeSample, TerrainProbe};
use crate::uniform::update::GraphUpdate;

pub mod connectivity;
pub mod erosion;
pub mod query;
pub mod update;

/// Update request for layered grid graphs.
pub type LayeredUpdate<'a> = GraphUpdate<'a, LayeredNode>;

/// A layered grid navigation graph.
pub struct LayeredGridGraph {
    graph: GraphId,
    config: LayeredConfig,
    width: u32,
    depth: u32,
    layer_count: u32,
    cell_size: f32,
    transform: GridTransform,
    filter: Arc<dyn ConnectionFilter>,
    nodes: Vec<Option<LayeredNode>>,
}

impl LayeredGridGraph {
    /// Creates a validated but unbuilt graph; see
    /// [`crate::uniform::GridGraph::new`].
    pub fn new(graph: GraphId, config: LayeredConfig) -> Result<Self> {
        config.validate()?;
        let (width, depth, cell_size) = derive_dimensions(&config.grid);
        let transform = GridTransform::build(&config.grid, width, depth, cell_size);
        let filter: Arc<dyn ConnectionFilter> =
            Arc::new(ClimbFilter::new(config.grid.climb_limit));
        Ok(Self {
            graph,
            config,
            width,
            depth,
            layer_count: 0,
            cell_size,
            transform,
            filter,
            nodes: Vec::new(),
        })
    }

    /// Builds the graph in one pass: probe columns, connect floors, erode.
    pub fn build(
        graph: GraphId,
        config: LayeredConfig,
        probe: &dyn TerrainProbe,
    ) -> Result<Self> {
        Self::build_with_events(graph, config, probe, &mut ())
    }

    /// Like [`LayeredGridGraph::build`], forwarding progress to the sink.
    pub fn build_with_events(
        graph: GraphId,
        config: LayeredConfig,
        probe: &dyn TerrainProbe,
        sink: &mut dyn EventSink,
    ) -> Result<Self> {
        let mut built = Self::new(graph, config)?;
        built.rebuild(probe, sink)?;
        Ok(built)
    }

    /// Scans the whole grid from scratch. On failure (a column overflowing
    /// [`LayeredConfig::max_floors`]) or cooperative cancellation through
    /// the sink, the graph is left unbuilt.
    pub fn rebuild(&mut self, probe: &dyn TerrainProbe, sink: &mut dyn EventSink) -> Result<()> {
        let columns = self.width as usize * self.depth as usize;
        if sink.wants(BuildEventKind::BuildStarted) {
            sink.send(BuildEvent::BuildStarted {
                cells_total: columns,
            });
        }
        self.nodes.clear();
        self.layer_count = 0;

        let mut column_floors: Vec<Vec<ProbeSample>> = Vec::with_capacity(columns);
        let mut max_layers = 1usize;
        for z in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                let world = self.transform.cell_center_to_world(x, z, 0.0);
                let floors = self.merge_column_hits(probe.probe_all(world));
                if floors.len() > self.config.max_floors {
                    return Err(Error::InvalidConfig(format!(
                        "column ({x},{z}) produced {} floors, max_floors is {}",
                        floors.len(),
                        self.config.max_floors
                    )));
                }
                max_layers = max_layers.max(floors.len());
                column_floors.push(floors);
                let done = column_floors.len();
                if done % PROGRESS_STRIDE == 0 {
                    if sink.cancelled() {
                        warn!("Layered grid build cancelled; leaving the graph unbuilt.");
                        return Ok(());
                    }
                    if sink.wants(BuildEventKind::Progress) {
                        sink.send(BuildEvent::Progress {
                            cells_done: done,
                            cells_total: columns,
                        });
                    }
                }
            }
        }

        self.layer_count = max_layers as u32;
        self.nodes = vec![None; columns * max_layers];
        for (column, floors) in column_floors.iter().enumerate() {
            let (x, z) = (
                (column % self.width as usize) as i32,
                (column / self.width as usize) as i32,
            );
            self.write_column(x, z, floors, probe, true);
        }

        let full = self.grid_rect();
        self.recompute_connections_rect(full);
        self.erode_rect(full);

        let walkable_cells = self
            .nodes
            .iter()
            .filter(|n| n.as_ref().is_some_and(|n| n.walkable))
            .count();
        if sink.wants(BuildEventKind::BuildFinished) {
            sink.send(BuildEvent::BuildFinished {
                cells_total: columns,
                walkable_cells,
            });
        }
        info!(
            "Built {}x{}x{} layered grid graph, {} walkable floors.",
            self.width, self.depth, self.layer_count, walkable_cells
        );
        Ok(())
    }

    /// Sorts probe hits by height and merges hits closer together than the
    /// merge tolerance, keeping the lowest of each cluster.
    pub(crate) fn merge_column_hits(&self, mut hits: Vec<ProbeSample>) -> Vec<ProbeSample> {
        hits.sort_by(|a, b| a.ground.y.total_cmp(&b.ground.y));
        let mut merged: Vec<ProbeSample> = Vec::with_capacity(hits.len());
        for hit in hits {
            match merged.last() {
                Some(last) if hit.ground.y - last.ground.y < self.config.merge_tolerance => {}
                _ => merged.push(hit),
            }
        }
        merged
    }

    /// Writes a column's floors into the node store. Existing floors keep
    /// their tag (and penalty unless `reset_penalty`); slots past the floor
    /// list are cleared. Returns the number of newly created floors.
    pub(crate) fn write_column(
        &mut self,
        x: i32,
        z: i32,
        floors: &[ProbeSample],
        probe: &dyn TerrainProbe,
        reset_penalty: bool,
    ) -> usize {
        let mut created = 0usize;
        let graph = self.graph;
        let character_height = self.config.character_height;
        let initial_penalty = self.config.grid.initial_penalty;
        for layer in 0..self.layer_count {
            let Some(index) = self.node_index(x, z, layer) else {
                continue;
            };
            let Some(sample) = floors.get(layer as usize) else {
                self.nodes[index] = None;
                continue;
            };
            let headroom = floors
                .get(layer as usize + 1)
                .map(|above| above.ground.y - sample.ground.y)
                .unwrap_or(f32::INFINITY);
            let walkable = sample.walkable
                && !probe.obstructed(sample.ground)
                && headroom >= character_height;

            let node = self.nodes[index].get_or_insert_with(|| {
                created += 1;
                LayeredNode::new(index as u32, graph)
            });
            node.position = quantize(sample.ground);
            node.headroom = headroom;
            node.walkable = walkable;
            node.walkable_baseline = walkable;
            if reset_penalty {
                node.penalty = initial_penalty;
            }
        }
        created
    }

    /// Appends empty layers until the graph can hold `layers` floors per
    /// column. Existing node indices stay valid (the store is layer-major).
    pub(crate) fn grow_layers(&mut self, layers: u32) {
        let columns = self.width as usize * self.depth as usize;
        while self.layer_count < layers {
            self.nodes.extend(std::iter::repeat_with(|| None).take(columns));
            self.layer_count += 1;
        }
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph
    }

    pub fn config(&self) -> &LayeredConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of layers the node store currently holds.
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    /// Total node slots, absent floors included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of present floors.
    pub fn floor_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_built(&self) -> bool {
        self.layer_count > 0
            && self.nodes.len()
                == self.width as usize * self.depth as usize * self.layer_count as usize
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && x < self.width as i32 && z < self.depth as i32
    }

    /// Linear index of floor `layer` at `(x, z)`, if in bounds.
    pub fn node_index(&self, x: i32, z: i32, layer: u32) -> Option<usize> {
        if !self.in_bounds(x, z) || layer >= self.layer_count {
            return None;
        }
        let columns = self.width as usize * self.depth as usize;
        Some(
            layer as usize * columns
                + z as usize * self.width as usize
                + x as usize,
        )
    }

    /// Cell coordinates and layer of a linear index.
    pub fn cell_of(&self, index: usize) -> (i32, i32, u32) {
        let columns = self.width as usize * self.depth as usize;
        let layer = (index / columns) as u32;
        let column = index % columns;
        (
            (column % self.width as usize) as i32,
            (column / self.width as usize) as i32,
            layer,
        )
    }

    pub fn node(&self, x: i32, z: i32, layer: u32) -> Option<&LayeredNode> {
        self.node_index(x, z, layer)
            .and_then(|i| self.nodes[i].as_ref())
    }

    pub fn nodes(&self) -> &[Option<LayeredNode>] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Option<LayeredNode>] {
        &mut self.nodes
    }

    /// Rect covering the whole grid.
    pub fn grid_rect(&self) -> IntRect {
        IntRect::new(0, 0, self.width as i32 - 1, self.depth as i32 - 1)
    }

    pub fn filter(&self) -> &Arc<dyn ConnectionFilter> {
        &self.filter
    }

    /// Replaces the connection validity predicate; see
    /// [`crate::uniform::GridGraph::set_filter`].
    pub fn set_filter(&mut self, filter: Arc<dyn ConnectionFilter>) {
        self.filter = filter;
    }

    pub(crate) fn restore_after_load(&mut self, layer_count: u32, nodes: Vec<Option<LayeredNode>>) {
        self.layer_count = layer_count;
        self.nodes = nodes;
    }
}


#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use crate::grid::{GraphId, GridConfig, LayeredConfig};
    use crate::probe::{FlatProbe, ProbeSample, TerrainProbe};

    use super::test_probes::BridgeProbe;
    use super::*;

    fn bridge_config() -> LayeredConfig {
        LayeredConfig::new(GridConfig::new(Vec2::new(7.0, 7.0)))
    }

    #[test]
    fn flat_world_builds_single_layer() {
        let graph =
            LayeredGridGraph::build(GraphId(0), bridge_config(), &FlatProbe::new(0.0)).unwrap();
        assert_eq!(graph.layer_count(), 1);
        assert_eq!(graph.node_count(), 49);
        assert_eq!(graph.floor_count(), 49);
        assert!(graph.is_built());
    }

    #[test]
    fn bridge_world_builds_two_layers() {
        let graph = LayeredGridGraph::build(GraphId(0), bridge_config(), &BridgeProbe).unwrap();
        assert_eq!(graph.layer_count(), 2);
        assert_eq!(graph.node_count(), 98);
        // Bridge columns are x in {2, 3, 4} of seven.
        assert_eq!(graph.floor_count(), 49 + 21);
        // Ground under the bridge has 4 units of headroom.
        let under = graph.node(3, 3, 0).unwrap();
        assert_eq!(under.headroom, 4.0);
        assert!(under.walkable);
        let deck = graph.node(3, 3, 1).unwrap();
        assert_eq!(deck.headroom, f32::INFINITY);
    }

    #[test]
    fn low_headroom_floors_are_unwalkable() {
        let config = bridge_config().with_character_height(5.0);
        let graph = LayeredGridGraph::build(GraphId(0), config, &BridgeProbe).unwrap();
        // 4 units under the deck is not enough for a 5-unit character.
        assert!(!graph.node(3, 3, 0).unwrap().walkable);
        // Open ground and the deck itself stay walkable.
        assert!(graph.node(0, 3, 0).unwrap().walkable);
        assert!(graph.node(3, 3, 1).unwrap().walkable);
    }

    #[test]
    fn close_hits_merge_into_one_floor() {
        struct Stacked;
        impl TerrainProbe for Stacked {
            fn probe(&self, world: Vec3) -> ProbeSample {
                ProbeSample::walkable_at(Vec3::new(world.x, 0.0, world.z))
            }
            fn probe_all(&self, world: Vec3) -> Vec<ProbeSample> {
                vec![
                    ProbeSample::walkable_at(Vec3::new(world.x, 0.0, world.z)),
                    ProbeSample::walkable_at(Vec3::new(world.x, 0.2, world.z)),
                    ProbeSample::walkable_at(Vec3::new(world.x, 3.0, world.z)),
                ]
            }
        }
        let graph = LayeredGridGraph::build(GraphId(0), bridge_config(), &Stacked).unwrap();
        assert_eq!(graph.layer_count(), 2);
        let lower = graph.node(3, 3, 0).unwrap();
        assert_eq!(lower.world_position().y, 0.0);
        assert!((lower.headroom - 3.0).abs() < 1e-5);
    }

    #[test]
    fn floor_overflow_aborts_the_build() {
        struct ManyFloors;
        impl TerrainProbe for ManyFloors {
            fn probe(&self, world: Vec3) -> ProbeSample {
                ProbeSample::walkable_at(world)
            }
            fn probe_all(&self, world: Vec3) -> Vec<ProbeSample> {
                (0..5)
                    .map(|i| {
                        ProbeSample::walkable_at(Vec3::new(world.x, i as f32 * 3.0, world.z))
                    })
                    .collect()
            }
        }
        let config = bridge_config().with_max_floors(3);
        let result = LayeredGridGraph::build(GraphId(0), config, &ManyFloors);
        assert!(result.is_err());
    }

    #[test]
    fn index_round_trips_across_layers() {
        let graph = LayeredGridGraph::build(GraphId(0), bridge_config(), &BridgeProbe).unwrap();
        for layer in 0..graph.layer_count() {
            for z in 0..7 {
                for x in 0..7 {
                    let index = graph.node_index(x, z, layer).unwrap();
                    assert_eq!(graph.cell_of(index), (x, z, layer));
                }
            }
        }
        assert!(graph.node_index(0, 0, 2).is_none());
        assert!(graph.node_index(7, 0, 0).is_none());
    }

    #[test]
    fn grow_layers_preserves_existing_indices() {
        let mut graph =
            LayeredGridGraph::build(GraphId(0), bridge_config(), &BridgeProbe).unwrap();
        let before = graph.node(3, 3, 1).unwrap().position;
        graph.grow_layers(4);
        assert_eq!(graph.layer_count(), 4);
        assert!(graph.is_built());
        assert_eq!(graph.node(3, 3, 1).unwrap().position, before);
        assert!(graph.node(3, 3, 2).is_none());
    }
}

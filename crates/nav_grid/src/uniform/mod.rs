//! Uniform grid graph: one node per cell.
//!
//! A [`GridGraph`] owns a dense, row-major node store of `width × depth`
//! cells. A full build probes every cell, derives connectivity, and applies
//! erosion; incremental updates recompute a bounded halo around a changed
//! region (see [`update`]). Reads (queries) take `&self` and never run
//! concurrently with a build or update; the graph performs no internal
//! locking.
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::events::{BuildEvent, BuildEventKind, EventSink, PROGRESS_STRIDE};
use crate::grid::transform::derive_dimensions;
use crate::grid::{
    quantize, ClimbFilter, ConnectionFilter, GraphId, GridConfig, GridNode, GridTransform, IntRect,
};
use crate::probe::TerrainProbe;

pub mod connectivity;
pub mod erosion;
pub mod query;
pub mod update;

pub use query::{NearestConstraint, NearestHit};
pub use update::{GraphUpdate, GridUpdate, UpdateOutcome, UpdateSummary};

/// A uniform grid navigation graph.
pub struct GridGraph {
    graph: GraphId,
    config: GridConfig,
    width: u32,
    depth: u32,
    cell_size: f32,
    transform: GridTransform,
    filter: Arc<dyn ConnectionFilter>,
    nodes: Vec<GridNode>,
}

impl GridGraph {
    /// Creates a validated but unbuilt graph. The node store stays empty
    /// until [`GridGraph::rebuild`] runs; mutating operations on an unbuilt
    /// graph are skipped, queries return nothing.
    pub fn new(graph: GraphId, config: GridConfig) -> Result<Self> {
        config.validate()?;
        let (width, depth, cell_size) = derive_dimensions(&config);
        let transform = GridTransform::build(&config, width, depth, cell_size);
        let filter: Arc<dyn ConnectionFilter> = Arc::new(ClimbFilter::new(config.climb_limit));
        Ok(Self {
            graph,
            config,
            width,
            depth,
            cell_size,
            transform,
            filter,
            nodes: Vec::new(),
        })
    }

    /// Builds the graph in one pass: probe, connect, erode.
    pub fn build(graph: GraphId, config: GridConfig, probe: &dyn TerrainProbe) -> Result<Self> {
        Self::build_with_events(graph, config, probe, &mut ())
    }

    /// Like [`GridGraph::build`], forwarding progress to the given sink.
    pub fn build_with_events(
        graph: GraphId,
        config: GridConfig,
        probe: &dyn TerrainProbe,
        sink: &mut dyn EventSink,
    ) -> Result<Self> {
        let mut built = Self::new(graph, config)?;
        built.rebuild(probe, sink);
        Ok(built)
    }

    /// Scans the whole grid from scratch, replacing any previous node store.
    ///
    /// Cancellation is cooperative and tile-grained: the sink is polled once
    /// per [`PROGRESS_STRIDE`] cells, and a cancelled build leaves the graph
    /// unbuilt (check [`GridGraph::is_built`]).
    pub fn rebuild(&mut self, probe: &dyn TerrainProbe, sink: &mut dyn EventSink) {
        let total = self.width as usize * self.depth as usize;
        if sink.wants(BuildEventKind::BuildStarted) {
            sink.send(BuildEvent::BuildStarted { cells_total: total });
        }

        self.nodes = Vec::with_capacity(total);
        for z in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                let index = self.nodes.len();
                self.nodes.push(GridNode::new(index as u32, self.graph));
                self.reprobe_cell(x, z, probe, true);
                if index % PROGRESS_STRIDE == PROGRESS_STRIDE - 1 {
                    if sink.cancelled() {
                        warn!("Grid build cancelled; leaving the graph unbuilt.");
                        self.nodes = Vec::new();
                        return;
                    }
                    if sink.wants(BuildEventKind::Progress) {
                        sink.send(BuildEvent::Progress {
                            cells_done: index + 1,
                            cells_total: total,
                        });
                    }
                }
            }
        }

        let full = self.grid_rect();
        self.recompute_connections_rect(full);
        self.erode_rect(full);

        let walkable_cells = self.nodes.iter().filter(|n| n.walkable).count();
        if sink.wants(BuildEventKind::BuildFinished) {
            sink.send(BuildEvent::BuildFinished {
                cells_total: total,
                walkable_cells,
            });
        }
        info!(
            "Built {}x{} grid graph, {} of {} cells walkable.",
            self.width, self.depth, walkable_cells, total
        );
    }

    /// Re-probes one cell, refreshing position and baseline walkability.
    pub(crate) fn reprobe_cell(
        &mut self,
        x: i32,
        z: i32,
        probe: &dyn TerrainProbe,
        reset_penalty: bool,
    ) {
        let Some(index) = self.index_of(x, z) else {
            return;
        };
        let world = self.transform.cell_center_to_world(x, z, 0.0);
        let sample = probe.probe(world);
        let walkable = sample.walkable && !probe.obstructed(sample.ground);
        let initial_penalty = self.config.initial_penalty;

        let node = &mut self.nodes[index];
        node.position = quantize(sample.ground);
        node.walkable = walkable;
        node.walkable_baseline = walkable;
        if reset_penalty {
            node.penalty = initial_penalty;
        }
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Effective cell size; differs from the configured one when the
    /// dimension cap raised it.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the node store matches the grid dimensions. Everything that
    /// mutates nodes refuses to run while this is false.
    pub fn is_built(&self) -> bool {
        self.nodes.len() == self.width as usize * self.depth as usize && !self.nodes.is_empty()
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && x < self.width as i32 && z < self.depth as i32
    }

    /// Linear index of cell `(x, z)`, if in bounds.
    pub fn index_of(&self, x: i32, z: i32) -> Option<usize> {
        if self.in_bounds(x, z) {
            Some(z as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Cell coordinates of a linear index.
    pub fn cell_of(&self, index: usize) -> (i32, i32) {
        let w = self.width as usize;
        ((index % w) as i32, (index / w) as i32)
    }

    pub fn node(&self, x: i32, z: i32) -> Option<&GridNode> {
        self.index_of(x, z).map(|i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [GridNode] {
        &mut self.nodes
    }

    /// Rect covering the whole grid.
    pub fn grid_rect(&self) -> IntRect {
        IntRect::new(0, 0, self.width as i32 - 1, self.depth as i32 - 1)
    }

    pub fn filter(&self) -> &Arc<dyn ConnectionFilter> {
        &self.filter
    }

    /// Replaces the connection validity predicate. Connections derived with
    /// the previous filter stay in place until the next connectivity pass;
    /// call [`GridGraph::recompute_connections`] to apply immediately.
    pub fn set_filter(&mut self, filter: Arc<dyn ConnectionFilter>) {
        self.filter = filter;
    }

    pub(crate) fn restore_after_load(&mut self, nodes: Vec<GridNode>) {
        self.nodes = nodes;
    }
}

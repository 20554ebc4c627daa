#![forbid(unsafe_code)]
//! nav_grid: Grid navigation graphs with incremental updates, erosion, and nearest-node queries.
//!
//! Modules:
//! - grid: coordinate transform, cell rects, node records, configuration
//! - uniform: one-node-per-cell graph (build, connectivity, erosion, incremental updates, queries)
//! - layered: stacked-floor variant for vertically overlapping geometry
//! - probe, registry, snapshot, events, error: external contracts
//!
//! The engine is single-writer/many-reader: builds and updates are logical
//! critical sections, queries are plain `&self` reads. Hosts provide the
//! terrain through a [`probe::TerrainProbe`] and feed world changes through
//! bounded update requests.
pub mod error;
pub mod events;
pub mod grid;
pub mod layered;
pub mod probe;
pub mod registry;
pub mod snapshot;
pub mod uniform;

/// Convenient re-exports for common types. Import with `use nav_grid::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::events::{BuildEvent, BuildEventKind, EventSink, FnSink, VecSink};
    pub use crate::grid::{
        Aabb, ClimbFilter, ConnectionFilter, ErosionConfig, ErosionMode, FnFilter, GraphId,
        GridConfig, GridNode, GridTransform, IntRect, LayeredConfig, LayeredNode, NeighborMode,
        NodeView,
    };
    pub use crate::layered::{LayeredGridGraph, LayeredUpdate};
    pub use crate::probe::{FlatProbe, FnProbe, ProbeSample, TerrainProbe};
    pub use crate::registry::{GraphInstance, GraphRegistry};
    pub use crate::snapshot::{
        GridParams, GridSnapshot, LayeredNodeRecord, LayeredParams, LayeredSnapshot, NodeRecord,
    };
    pub use crate::uniform::{
        GraphUpdate, GridGraph, GridUpdate, NearestConstraint, NearestHit, UpdateOutcome,
        UpdateSummary,
    };
}

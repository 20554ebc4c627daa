//! Registry mapping small graph ids to graph instances.
//!
//! Nodes carry a [`GraphId`] instead of a back-pointer; a registry resolves
//! it to the owning graph. Registries are explicit objects passed by
//! reference — there is no global table — so multiple engine instances can
//! coexist (tests included). Lifecycle: [`GraphRegistry::reserve`] an id at
//! build start, [`GraphRegistry::attach`] the built graph, and
//! [`GraphRegistry::unregister`] or [`GraphRegistry::clear`] at teardown.
use glam::Vec3;

use crate::error::{Error, Result};
use crate::grid::GraphId;
use crate::layered::LayeredGridGraph;
use crate::uniform::{GridGraph, NearestHit};

/// Maximum number of simultaneously registered graphs.
pub const MAX_GRAPHS: usize = 256;

/// A registered graph of either variant.
pub enum GraphInstance {
    Uniform(GridGraph),
    Layered(LayeredGridGraph),
}

impl GraphInstance {
    pub fn graph_id(&self) -> GraphId {
        match self {
            GraphInstance::Uniform(graph) => graph.graph_id(),
            GraphInstance::Layered(graph) => graph.graph_id(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            GraphInstance::Uniform(graph) => graph.node_count(),
            GraphInstance::Layered(graph) => graph.node_count(),
        }
    }

    pub fn is_built(&self) -> bool {
        match self {
            GraphInstance::Uniform(graph) => graph.is_built(),
            GraphInstance::Layered(graph) => graph.is_built(),
        }
    }

    /// Unconstrained nearest-node query on whichever variant this is.
    pub fn nearest(&self, world: Vec3) -> Option<NearestHit> {
        match self {
            GraphInstance::Uniform(graph) => graph.nearest(world),
            GraphInstance::Layered(graph) => graph.nearest(world),
        }
    }

    pub fn as_uniform(&self) -> Option<&GridGraph> {
        match self {
            GraphInstance::Uniform(graph) => Some(graph),
            GraphInstance::Layered(_) => None,
        }
    }

    pub fn as_layered(&self) -> Option<&LayeredGridGraph> {
        match self {
            GraphInstance::Layered(graph) => Some(graph),
            GraphInstance::Uniform(_) => None,
        }
    }
}

impl From<GridGraph> for GraphInstance {
    fn from(graph: GridGraph) -> Self {
        GraphInstance::Uniform(graph)
    }
}

impl From<LayeredGridGraph> for GraphInstance {
    fn from(graph: LayeredGridGraph) -> Self {
        GraphInstance::Layered(graph)
    }
}

enum Slot {
    Free,
    Reserved,
    Occupied(GraphInstance),
}

/// Registry of graph instances addressed by [`GraphId`].
#[derive(Default)]
pub struct GraphRegistry {
    slots: Vec<Slot>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Claims the lowest free id for a graph about to be built.
    pub fn reserve(&mut self) -> Result<GraphId> {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if matches!(slot, Slot::Free) {
                *slot = Slot::Reserved;
                return Ok(GraphId(index as u8));
            }
        }
        if self.slots.len() >= MAX_GRAPHS {
            return Err(Error::RegistryFull);
        }
        self.slots.push(Slot::Reserved);
        Ok(GraphId((self.slots.len() - 1) as u8))
    }

    /// Places a built graph into its reserved slot. The instance must carry
    /// the id that was reserved for it.
    pub fn attach(&mut self, id: GraphId, instance: impl Into<GraphInstance>) -> Result<()> {
        let instance = instance.into();
        if instance.graph_id() != id {
            return Err(Error::InvalidConfig(format!(
                "graph was built for id {:?}, not {:?}",
                instance.graph_id(),
                id
            )));
        }
        match self.slots.get_mut(id.index()) {
            Some(slot @ Slot::Reserved) => {
                *slot = Slot::Occupied(instance);
                Ok(())
            }
            _ => Err(Error::InvalidConfig(format!(
                "graph id {:?} is not reserved",
                id
            ))),
        }
    }

    pub fn get(&self, id: GraphId) -> Option<&GraphInstance> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(instance)) => Some(instance),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: GraphId) -> Option<&mut GraphInstance> {
        match self.slots.get_mut(id.index()) {
            Some(Slot::Occupied(instance)) => Some(instance),
            _ => None,
        }
    }

    /// Removes a graph, freeing its id for reuse.
    pub fn unregister(&mut self, id: GraphId) -> Option<GraphInstance> {
        let slot = self.slots.get_mut(id.index())?;
        match std::mem::replace(slot, Slot::Free) {
            Slot::Occupied(instance) => Some(instance),
            previous => {
                *slot = previous;
                None
            }
        }
    }

    /// Drops every graph and reservation.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Iterates over the registered instances.
    pub fn iter(&self) -> impl Iterator<Item = &GraphInstance> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(instance) => Some(instance),
            _ => None,
        })
    }
}

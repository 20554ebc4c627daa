//! Event types and sinks for observing graph builds.
//!
//! This module defines [`BuildEvent`] and a set of sinks to emit, collect, or
//! forward events while a graph is scanned. Builds over large grids can take a
//! while; progress events are emitted at a bounded rate (once per
//! [`PROGRESS_STRIDE`] cells plus one final event) so a host can report status
//! without being flooded. Sinks run inside the build's critical section and
//! must not touch the graph.

/// Number of cells between two consecutive [`BuildEvent::Progress`] events.
pub const PROGRESS_STRIDE: usize = 4096;

/// Describes events emitted while building a graph.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// Emitted once before the first cell is probed.
    BuildStarted {
        /// Total number of cells the build will visit.
        cells_total: usize,
    },

    /// Emitted at most once per [`PROGRESS_STRIDE`] probed cells.
    Progress {
        /// Cells probed so far.
        cells_done: usize,
        /// Total number of cells the build will visit.
        cells_total: usize,
    },

    /// Emitted once after connectivity and erosion have completed.
    BuildFinished {
        /// Total number of cells visited.
        cells_total: usize,
        /// Number of cells that ended up walkable.
        walkable_cells: usize,
    },

    /// Non-fatal warning generated during a build or update.
    Warning {
        /// Context string (e.g. a cell coordinate or component name).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Kinds of [`BuildEvent`], usable for filtering in [`EventSink::wants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildEventKind {
    BuildStarted,
    Progress,
    BuildFinished,
    Warning,
}

impl BuildEvent {
    /// Returns the kind of this event.
    pub fn kind(&self) -> BuildEventKind {
        match self {
            BuildEvent::BuildStarted { .. } => BuildEventKind::BuildStarted,
            BuildEvent::Progress { .. } => BuildEventKind::Progress,
            BuildEvent::BuildFinished { .. } => BuildEventKind::BuildFinished,
            BuildEvent::Warning { .. } => BuildEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`BuildEvent`]s.
pub trait EventSink {
    /// Returns whether the sink is interested in events of the given kind.
    /// Producers may skip constructing events the sink does not want.
    fn wants(&self, _kind: BuildEventKind) -> bool {
        true
    }

    fn send(&mut self, event: BuildEvent);

    /// Polled at the same bounded rate as progress events. Returning `true`
    /// aborts the build between tiles, leaving the graph unbuilt; work on
    /// the current tile always completes first.
    fn cancelled(&self) -> bool {
        false
    }
}

/// A no-op event sink.
impl EventSink for () {
    fn wants(&self, _kind: BuildEventKind) -> bool {
        false
    }

    #[inline]
    fn send(&mut self, _event: BuildEvent) {}
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(BuildEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(BuildEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(BuildEvent),
{
    #[inline]
    fn send(&mut self, event: BuildEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<BuildEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<BuildEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[BuildEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: BuildEvent) {
        self.events.push(event);
    }
}

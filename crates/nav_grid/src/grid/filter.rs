//! Pluggable connection validity predicates.
//!
//! The connectivity calculator asks a [`ConnectionFilter`] whether two
//! otherwise-adjacent walkable cells may connect. The default
//! [`ClimbFilter`] bounds the height difference; custom predicates (tag
//! compatibility, one-way slopes) implement the trait or wrap a closure in
//! [`FnFilter`].
use glam::IVec3;

use super::node::POSITION_SCALE;

/// The slice of node state a filter may inspect. Both grid variants produce
/// the same view, so one filter serves either.
#[derive(Clone, Copy, Debug)]
pub struct NodeView {
    /// Quantized world position.
    pub position: IVec3,
    /// Node tag.
    pub tag: u8,
    /// Node penalty.
    pub penalty: u32,
}

/// Validity predicate applied between two adjacent walkable cells.
pub trait ConnectionFilter: Send + Sync {
    fn is_valid(&self, from: NodeView, to: NodeView) -> bool;
}

/// Default filter: the height difference along one position axis must not
/// exceed the climb limit. A limit of zero disables the check.
#[derive(Clone, Copy, Debug)]
pub struct ClimbFilter {
    /// Maximum climbable height difference in world units.
    pub limit: f32,
    /// Position component to measure along (0 = X, 1 = Y, 2 = Z).
    pub axis: usize,
}

impl ClimbFilter {
    /// Climb filter along the world Y axis.
    pub fn new(limit: f32) -> Self {
        Self { limit, axis: 1 }
    }

    /// Climb filter along a custom axis, for grids built on walls or
    /// ceilings.
    pub fn with_axis(limit: f32, axis: usize) -> Self {
        debug_assert!(axis < 3, "axis must be 0, 1, or 2");
        Self { limit, axis }
    }
}

impl ConnectionFilter for ClimbFilter {
    fn is_valid(&self, from: NodeView, to: NodeView) -> bool {
        if self.limit <= 0.0 {
            return true;
        }
        let delta = (from.position[self.axis] - to.position[self.axis]).abs();
        delta as f32 <= self.limit * POSITION_SCALE
    }
}

/// A filter that forwards to a user-provided closure.
pub struct FnFilter<F>
where
    F: Fn(NodeView, NodeView) -> bool + Send + Sync,
{
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(NodeView, NodeView) -> bool + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ConnectionFilter for FnFilter<F>
where
    F: Fn(NodeView, NodeView) -> bool + Send + Sync,
{
    #[inline]
    fn is_valid(&self, from: NodeView, to: NodeView) -> bool {
        (self.f)(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(y: f32) -> NodeView {
        NodeView {
            position: IVec3::new(0, (y * POSITION_SCALE) as i32, 0),
            tag: 0,
            penalty: 0,
        }
    }

    #[test]
    fn climb_filter_bounds_height_difference() {
        let filter = ClimbFilter::new(0.5);
        assert!(filter.is_valid(view_at(0.0), view_at(0.5)));
        assert!(filter.is_valid(view_at(0.5), view_at(0.0)));
        assert!(!filter.is_valid(view_at(0.0), view_at(0.6)));
    }

    #[test]
    fn zero_limit_disables_check() {
        let filter = ClimbFilter::new(0.0);
        assert!(filter.is_valid(view_at(0.0), view_at(100.0)));
    }

    #[test]
    fn fn_filter_wraps_closure() {
        let filter = FnFilter::new(|from: NodeView, to: NodeView| from.tag == to.tag);
        let mut a = view_at(0.0);
        let b = view_at(0.0);
        assert!(filter.is_valid(a, b));
        a.tag = 3;
        assert!(!filter.is_valid(a, b));
    }
}

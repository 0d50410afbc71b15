//! Invalidation of derived topology data.
//!
//! [`TopoGraph`](crate::topology::graph::TopoGraph) keeps its per-type census
//! in a `OnceCell`. Every mutation clears it through [`InvalidateCache`], and
//! the next [`census`](crate::topology::graph::TopoGraph::census) call
//! recomputes it.

/// Implemented by anything holding data derived from a topology graph.
pub trait InvalidateCache {
    /// Drop every derived value so the next query recomputes it.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for &mut T {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

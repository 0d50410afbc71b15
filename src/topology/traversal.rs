//! Lazy traversal iterators over a [`TopoGraph`].
//!
//! Traversals follow both containment and references, so a walk from a solid
//! reaches its edges and vertices. Shared entities (an edge used by two
//! coedges, a vertex used by three edges) are produced once: first seen wins.
//!
//! A traversal borrows the graph immutably, so the graph cannot change while
//! it runs. Iterators are `Clone`; cloning before the first `next` gives an
//! independent restart, and calling [`TopoGraph::traverse`] again always
//! starts fresh.

use std::collections::{HashSet, VecDeque};
use std::iter::FusedIterator;

use crate::topo_error::TopoError;
use crate::topology::entity::TopoEntity;
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;

/// Visiting order for [`TopoGraph::traverse`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Depth-first: an entity, then each child subtree in stored child order.
    #[default]
    PreOrder,
    /// Rank-major: every entity of rank *r* before any entity of rank
    /// *r + 1*, in discovery order within a rank. A loop yields its coedges
    /// in sequence order; a solid yields its shells, then faces, then loops,
    /// then coedges, edges and vertices.
    Canonical,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    /// Children and references.
    Down,
    /// Owner and referrers.
    Up,
}

/// Traversal iterator with "first seen wins" semantics.
///
/// Yields `Err(TopoError::DanglingReference)` once, then stops, if it meets an
/// id that is not in the graph.
#[derive(Clone)]
pub struct Traversal<'g> {
    graph: &'g TopoGraph,
    frontier: VecDeque<PersistentId>,
    seen: HashSet<PersistentId>,
    order: TraversalOrder,
    dir: Dir,
    done: bool,
}

impl<'g> Traversal<'g> {
    pub(crate) fn down(graph: &'g TopoGraph, root: PersistentId, order: TraversalOrder) -> Self {
        Self::new(graph, root, order, Dir::Down)
    }

    pub(crate) fn up(graph: &'g TopoGraph, start: PersistentId) -> Self {
        Self::new(graph, start, TraversalOrder::PreOrder, Dir::Up)
    }

    fn new(graph: &'g TopoGraph, root: PersistentId, order: TraversalOrder, dir: Dir) -> Self {
        log::trace!("traversal from {root} ({order:?}, {dir:?})");
        let mut seen = HashSet::new();
        if order == TraversalOrder::Canonical {
            // Breadth-first marks on push; pre-order marks on pop.
            seen.insert(root);
        }
        Self {
            graph,
            frontier: VecDeque::from([root]),
            seen,
            order,
            dir,
            done: false,
        }
    }

    /// The order this traversal visits entities in.
    pub fn order(&self) -> TraversalOrder {
        self.order
    }

    #[inline]
    fn pop(&mut self) -> Option<PersistentId> {
        match self.order {
            TraversalOrder::PreOrder => self.frontier.pop_back(),
            TraversalOrder::Canonical => self.frontier.pop_front(),
        }
    }

    fn push_neighbors(&mut self, entity: &'g TopoEntity) {
        match (self.dir, self.order) {
            (Dir::Down, TraversalOrder::PreOrder) => {
                // Reverse so the first child is popped first.
                for &c in entity.children().iter().rev() {
                    if !self.seen.contains(&c) {
                        self.frontier.push_back(c);
                    }
                }
            }
            (Dir::Down, TraversalOrder::Canonical) => {
                for &c in entity.children() {
                    if self.seen.insert(c) {
                        self.frontier.push_back(c);
                    }
                }
            }
            (Dir::Up, TraversalOrder::PreOrder) => {
                let ups: Vec<_> = entity.uses().collect();
                for u in ups.into_iter().rev() {
                    if !self.seen.contains(&u) {
                        self.frontier.push_back(u);
                    }
                }
            }
            (Dir::Up, TraversalOrder::Canonical) => {
                for u in entity.uses() {
                    if self.seen.insert(u) {
                        self.frontier.push_back(u);
                    }
                }
            }
        }
    }
}

impl<'g> Iterator for Traversal<'g> {
    type Item = Result<&'g TopoEntity, TopoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(id) = self.pop() {
            if self.order == TraversalOrder::PreOrder && !self.seen.insert(id) {
                continue;
            }
            let Some(entity) = self.graph.get(id) else {
                self.done = true;
                self.frontier.clear();
                return Some(Err(TopoError::DanglingReference(id)));
            };
            self.push_neighbors(entity);
            return Some(Ok(entity));
        }
        self.done = true;
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            // Never more than the live entities not yet produced (plus one error).
            (0, Some(self.graph.len() + 1))
        }
    }
}

impl FusedIterator for Traversal<'_> {}

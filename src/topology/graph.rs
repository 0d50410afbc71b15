//! [`TopoGraph`]: the arena that owns every topology entity.
//!
//! Entities live in one map keyed by [`PersistentId`]; relations are id lists,
//! never pointers, so shared edges and vertices need no shared ownership.
//! The only way to change the graph is through the operations below. Each of
//! them validates its inputs completely before touching anything, so an
//! `Err` always means the graph is exactly as it was.
//!
//! Entities are destroyed in two ways:
//! - [`release`](TopoGraph::release) removes one entity whose reference count
//!   is zero.
//! - [`sweep`](TopoGraph::sweep) marks everything reachable from the roots
//!   (every compound, plus explicitly pinned entities) and removes the rest.
//!
//! In both cases the id is retired and never issued again by this graph.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use itertools::Itertools;
use once_cell::sync::OnceCell;

use crate::debug_invariants::DebugInvariants;
use crate::topo_error::TopoError;
use crate::topology::allocator::PersistentIdAllocator;
use crate::topology::cache::InvalidateCache;
use crate::topology::entity::{Link, TopoEntity, TopoRecord, TopoType};
use crate::topology::geometry::GeometryRef;
use crate::topology::id::PersistentId;
use crate::topology::orientation::Orientation;
use crate::topology::resolver::OrientationPlan;
use crate::topology::traversal::{Traversal, TraversalOrder};
use crate::topology::validation::{GraphValidationOptions, validate_graph};

/// Number of live entities per type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Census {
    counts: [usize; 8],
}

impl Census {
    #[inline]
    pub fn count(&self, ty: TopoType) -> usize {
        self.counts[usize::from(ty.rank())]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Outcome of a [`TopoGraph::sweep`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entities reachable from a root (kept).
    pub reachable: usize,
    /// Ids of removed entities, ascending. All of them are now retired.
    pub reclaimed: Vec<PersistentId>,
}

/// Owner of the complete topology of one model.
#[derive(Clone, Debug)]
pub struct TopoGraph {
    entities: BTreeMap<PersistentId, TopoEntity>,
    roots: BTreeSet<PersistentId>,
    retired: HashSet<PersistentId>,
    allocator: Arc<PersistentIdAllocator>,
    census: OnceCell<Census>,
}

impl Default for TopoGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TopoGraph {
    /// Empty graph with its own id allocator.
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(PersistentIdAllocator::new()))
    }

    /// Empty graph issuing ids from `allocator`.
    ///
    /// Builders may pre-issue ids from the same allocator without holding any
    /// graph lock and later hand them to
    /// [`create_entity_with_id`](Self::create_entity_with_id).
    pub fn with_allocator(allocator: Arc<PersistentIdAllocator>) -> Self {
        Self {
            entities: BTreeMap::new(),
            roots: BTreeSet::new(),
            retired: HashSet::new(),
            allocator,
            census: OnceCell::new(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    #[inline]
    pub fn allocator(&self) -> &Arc<PersistentIdAllocator> {
        &self.allocator
    }

    #[inline]
    pub fn get(&self, id: PersistentId) -> Option<&TopoEntity> {
        self.entities.get(&id)
    }

    /// Like [`get`](Self::get), but a miss is a [`TopoError::DanglingReference`].
    #[inline]
    pub fn entity(&self, id: PersistentId) -> Result<&TopoEntity, TopoError> {
        self.entities
            .get(&id)
            .ok_or(TopoError::DanglingReference(id))
    }

    /// Fetch `id` and require it to be of type `ty`.
    pub fn entity_of(&self, id: PersistentId, ty: TopoType) -> Result<&TopoEntity, TopoError> {
        let e = self.entity(id)?;
        if e.ty != ty {
            return Err(TopoError::UnexpectedType {
                id,
                expected: ty,
                found: e.ty,
            });
        }
        Ok(e)
    }

    #[inline]
    pub fn contains(&self, id: PersistentId) -> bool {
        self.entities.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All live entities in ascending id order (creation order).
    pub fn iter(&self) -> impl Iterator<Item = &TopoEntity> + '_ {
        self.entities.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = PersistentId> + '_ {
        self.entities.keys().copied()
    }

    pub fn entities_of_type(&self, ty: TopoType) -> impl Iterator<Item = &TopoEntity> + '_ {
        self.entities.values().filter(move |e| e.ty == ty)
    }

    pub fn children(&self, id: PersistentId) -> Result<&[PersistentId], TopoError> {
        Ok(self.entity(id)?.children())
    }

    pub fn parent(&self, id: PersistentId) -> Result<Option<PersistentId>, TopoError> {
        Ok(self.entity(id)?.parent)
    }

    pub fn referrers(&self, id: PersistentId) -> Result<&[PersistentId], TopoError> {
        Ok(self.entity(id)?.referrers())
    }

    pub fn ref_count(&self, id: PersistentId) -> Result<usize, TopoError> {
        Ok(self.entity(id)?.ref_count())
    }

    /// Owners of `id`, nearest first. Stops at the first entity without an owner.
    pub fn ancestors(&self, id: PersistentId) -> impl Iterator<Item = PersistentId> + '_ {
        let mut cur = self.entities.get(&id).and_then(|e| e.parent);
        let mut budget = self.entities.len();
        std::iter::from_fn(move || {
            let a = cur?;
            if budget == 0 {
                return None;
            }
            budget -= 1;
            cur = self.entities.get(&a).and_then(|e| e.parent);
            Some(a)
        })
    }

    /// True once `id` belonged to an entity that has since been released or swept.
    #[inline]
    pub fn is_retired(&self, id: PersistentId) -> bool {
        self.retired.contains(&id)
    }

    /// Roots of the ownership graph: all compounds plus pinned entities.
    pub fn roots(&self) -> impl Iterator<Item = PersistentId> + '_ {
        self.roots.iter().copied()
    }

    #[inline]
    pub fn is_root(&self, id: PersistentId) -> bool {
        self.roots.contains(&id)
    }

    /// Per-type entity counts, cached until the next mutation.
    pub fn census(&self) -> &Census {
        self.census.get_or_init(|| {
            let mut census = Census::default();
            for e in self.entities.values() {
                census.counts[usize::from(e.ty.rank())] += 1;
            }
            census
        })
    }

    /// Lazily walk everything below `root` (children and references).
    pub fn traverse(&self, root: PersistentId, order: TraversalOrder) -> Traversal<'_> {
        Traversal::down(self, root, order)
    }

    /// [`traverse`](Self::traverse), collected into ids.
    pub fn collect_ids(
        &self,
        root: PersistentId,
        order: TraversalOrder,
    ) -> Result<Vec<PersistentId>, TopoError> {
        self.traverse(root, order).map_ok(TopoEntity::id).collect()
    }

    /// Lazily walk everything above `id` (owners and referrers), `id` first.
    pub fn star(&self, id: PersistentId) -> Traversal<'_> {
        Traversal::up(self, id)
    }

    /// Faces using `edge`, in order of the edge's referrers, without repeats.
    pub fn faces_of_edge(&self, edge: PersistentId) -> Result<Vec<PersistentId>, TopoError> {
        let e = self.entity_of(edge, TopoType::Edge)?;
        let faces = e
            .referrers
            .iter()
            .filter_map(|&coedge| self.get(coedge)?.parent)
            .filter_map(|lp| self.get(lp)?.parent)
            .unique()
            .collect();
        Ok(faces)
    }

    /// The edge a coedge uses, if bound.
    pub fn coedge_edge(&self, coedge: PersistentId) -> Result<Option<PersistentId>, TopoError> {
        Ok(self
            .entity_of(coedge, TopoType::Coedge)?
            .children
            .first()
            .copied())
    }

    /// `(start, end)` vertices of a coedge in its direction of travel.
    pub fn coedge_vertices(
        &self,
        coedge: PersistentId,
    ) -> Result<Option<(PersistentId, PersistentId)>, TopoError> {
        let c = self.entity_of(coedge, TopoType::Coedge)?;
        let Some(&edge) = c.children.first() else {
            return Ok(None);
        };
        let e = self.entity(edge)?;
        let (start, end) = match e.children.as_slice() {
            [] => return Ok(None),
            [v] => (*v, *v),
            [s, t, ..] => (*s, *t),
        };
        Ok(Some(match c.orientation {
            Orientation::Reversed => (end, start),
            _ => (start, end),
        }))
    }

    /// Start vertex of every coedge of a loop, in the loop's direction of travel.
    ///
    /// A reversed loop is walked backwards. Renderers use this to get face
    /// winding.
    ///
    /// # Errors
    /// [`TopoError::OpenLoop`] if a coedge has no edge or the edge has no vertex.
    pub fn loop_vertices(&self, loop_id: PersistentId) -> Result<Vec<PersistentId>, TopoError> {
        Ok(self
            .loop_segments(loop_id)?
            .into_iter()
            .map(|(_, start, _)| start)
            .collect())
    }

    /// Verify that consecutive coedges of a loop meet at a shared vertex and
    /// that the last one returns to the first.
    pub fn check_loop_closed(&self, loop_id: PersistentId) -> Result<(), TopoError> {
        let segments = self.loop_segments(loop_id)?;
        for ((coedge, _, end), (_, next_start, _)) in segments.iter().circular_tuple_windows() {
            if end != next_start {
                return Err(TopoError::OpenLoop {
                    loop_id,
                    coedge: *coedge,
                });
            }
        }
        Ok(())
    }

    fn loop_segments(
        &self,
        loop_id: PersistentId,
    ) -> Result<Vec<(PersistentId, PersistentId, PersistentId)>, TopoError> {
        let lp = self.entity_of(loop_id, TopoType::Loop)?;
        let mut segments = Vec::with_capacity(lp.children.len());
        for &coedge in &lp.children {
            let (start, end) = self
                .coedge_vertices(coedge)?
                .ok_or(TopoError::OpenLoop { loop_id, coedge })?;
            segments.push((coedge, start, end));
        }
        if lp.orientation == Orientation::Reversed {
            segments.reverse();
            for seg in &mut segments {
                std::mem::swap(&mut seg.1, &mut seg.2);
            }
        }
        Ok(segments)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Allocate a new entity of type `ty`, optionally bound to geometry.
    ///
    /// # Errors
    /// [`TopoError::InvalidGeometryBinding`] if the geometry kind does not fit
    /// `ty` (e.g. a face bound to a curve).
    pub fn create_entity(
        &mut self,
        ty: TopoType,
        geometry: Option<GeometryRef>,
    ) -> Result<PersistentId, TopoError> {
        let geometry = geometry.unwrap_or(GeometryRef::NONE);
        ty.check_geometry(geometry)?;
        let id = self.allocator.next()?;
        self.insert_entity(TopoEntity::new(id, ty, geometry));
        log::debug!("created {ty:?} {id}");
        self.after_mutation();
        crate::debug_invariants!(&*self, "create_entity");
        Ok(id)
    }

    /// Create an entity under an id pre-issued by this graph's allocator.
    pub fn create_entity_with_id(
        &mut self,
        id: PersistentId,
        ty: TopoType,
        geometry: Option<GeometryRef>,
    ) -> Result<(), TopoError> {
        let geometry = geometry.unwrap_or(GeometryRef::NONE);
        ty.check_geometry(geometry)?;
        self.check_fresh_id(id)?;
        if !self.allocator.has_issued(id) {
            return Err(TopoError::IdNotIssued(id));
        }
        self.insert_entity(TopoEntity::new(id, ty, geometry));
        log::debug!("created {ty:?} {id} (pre-issued id)");
        self.after_mutation();
        crate::debug_invariants!(&*self, "create_entity_with_id");
        Ok(())
    }

    pub fn create_vertex(&mut self, point: GeometryRef) -> Result<PersistentId, TopoError> {
        self.create_entity(TopoType::Vertex, Some(point))
    }

    /// Edge bounded by `start` and `end` (equal for a closed edge).
    pub fn create_edge(
        &mut self,
        curve: GeometryRef,
        start: PersistentId,
        end: PersistentId,
    ) -> Result<PersistentId, TopoError> {
        TopoType::Edge.check_geometry(curve)?;
        self.entity_of(start, TopoType::Vertex)?;
        self.entity_of(end, TopoType::Vertex)?;
        let id = self.allocator.next()?;
        self.insert_entity(TopoEntity::new(id, TopoType::Edge, curve));
        self.apply_bind(id, start);
        self.apply_bind(id, end);
        log::debug!("created Edge {id} ({start} -> {end})");
        self.after_mutation();
        crate::debug_invariants!(&*self, "create_edge");
        Ok(id)
    }

    /// Coedge using `edge` in the given sense.
    pub fn create_coedge(
        &mut self,
        edge: PersistentId,
        orientation: Orientation,
    ) -> Result<PersistentId, TopoError> {
        self.entity_of(edge, TopoType::Edge)?;
        let id = self.allocator.next()?;
        let mut coedge = TopoEntity::new(id, TopoType::Coedge, GeometryRef::NONE);
        coedge.orientation = orientation;
        self.insert_entity(coedge);
        self.apply_bind(id, edge);
        log::debug!("created Coedge {id} on edge {edge} ({orientation:?})");
        self.after_mutation();
        crate::debug_invariants!(&*self, "create_coedge");
        Ok(id)
    }

    /// Loop owning `coedges` in traversal order.
    pub fn create_loop(&mut self, coedges: &[PersistentId]) -> Result<PersistentId, TopoError> {
        self.create_with_children(TopoType::Loop, GeometryRef::NONE, coedges)
    }

    /// Face on `surface` bounded by `loops` (outer loop first by convention).
    pub fn create_face(
        &mut self,
        surface: GeometryRef,
        loops: &[PersistentId],
    ) -> Result<PersistentId, TopoError> {
        self.create_with_children(TopoType::Face, surface, loops)
    }

    pub fn create_shell(&mut self, faces: &[PersistentId]) -> Result<PersistentId, TopoError> {
        self.create_with_children(TopoType::Shell, GeometryRef::NONE, faces)
    }

    pub fn create_solid(&mut self, shells: &[PersistentId]) -> Result<PersistentId, TopoError> {
        self.create_with_children(TopoType::Solid, GeometryRef::NONE, shells)
    }

    /// Compound owning `solids`; compounds are roots.
    pub fn create_compound(&mut self, solids: &[PersistentId]) -> Result<PersistentId, TopoError> {
        self.create_with_children(TopoType::Compound, GeometryRef::NONE, solids)
    }

    fn create_with_children(
        &mut self,
        ty: TopoType,
        geometry: GeometryRef,
        children: &[PersistentId],
    ) -> Result<PersistentId, TopoError> {
        ty.check_geometry(geometry)?;
        let Some((child_ty, Link::Contains)) = ty.child_link() else {
            unreachable!("create_with_children is only called for containment types");
        };
        let mut distinct = HashSet::with_capacity(children.len());
        for &c in children {
            let child = self.entity_of(c, child_ty)?;
            if let Some(owner) = child.parent {
                return Err(TopoError::AlreadyAttached { child: c, owner });
            }
            if !distinct.insert(c) {
                return Err(TopoError::DuplicateChild(c));
            }
        }
        let id = self.allocator.next()?;
        self.insert_entity(TopoEntity::new(id, ty, geometry));
        for &c in children {
            self.apply_attach(id, c, None);
        }
        log::debug!("created {ty:?} {id} with {} children", children.len());
        self.after_mutation();
        crate::debug_invariants!(&*self, "create_with_children");
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Insert `child` into `parent`'s ordered children at `position`
    /// (appended when `None`).
    ///
    /// # Errors
    /// - [`TopoError::TypeRankViolation`] unless `child` is exactly one
    ///   containment rank below `parent` (coedge → edge and edge → vertex are
    ///   references; use [`bind_reference`](Self::bind_reference)). Checked
    ///   first, so a child ranked above its parent is a rank error even when it
    ///   is also one of the parent's owners.
    /// - [`TopoError::CycleDetected`] if `child` is `parent` or one of its owners.
    /// - [`TopoError::AlreadyAttached`] if `child` already has an owner.
    /// - [`TopoError::PositionOutOfBounds`] if `position > children.len()`.
    pub fn attach_child(
        &mut self,
        parent: PersistentId,
        child: PersistentId,
        position: Option<usize>,
    ) -> Result<(), TopoError> {
        self.check_attach(parent, child, position)?;
        self.apply_attach(parent, child, position);
        log::debug!("attached {child} under {parent}");
        self.after_mutation();
        crate::debug_invariants!(&*self, "attach_child");
        Ok(())
    }

    pub(crate) fn check_attach(
        &self,
        parent: PersistentId,
        child: PersistentId,
        position: Option<usize>,
    ) -> Result<(), TopoError> {
        let p = self.entity(parent)?;
        let c = self.entity(child)?;
        match p.ty.child_link() {
            Some((ty, Link::Contains)) if ty == c.ty => {}
            _ => {
                return Err(TopoError::TypeRankViolation {
                    parent,
                    parent_type: p.ty,
                    child,
                    child_type: c.ty,
                });
            }
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(TopoError::CycleDetected { parent, child });
        }
        if let Some(owner) = c.parent {
            return Err(TopoError::AlreadyAttached { child, owner });
        }
        if let Some(position) = position {
            if position > p.children.len() {
                return Err(TopoError::PositionOutOfBounds {
                    parent,
                    position,
                    len: p.children.len(),
                });
            }
        }
        Ok(())
    }

    /// Add a shared reference `coedge → edge` or `edge → vertex`.
    ///
    /// # Errors
    /// - [`TopoError::TypeRankViolation`] for any other pair of types.
    /// - [`TopoError::ReferenceLimit`] if a coedge already uses an edge or an
    ///   edge already has both end vertices.
    pub fn bind_reference(&mut self, from: PersistentId, to: PersistentId) -> Result<(), TopoError> {
        self.check_bind(from, to)?;
        self.apply_bind(from, to);
        log::debug!("bound reference {from} -> {to}");
        self.after_mutation();
        crate::debug_invariants!(&*self, "bind_reference");
        Ok(())
    }

    pub(crate) fn check_bind(&self, from: PersistentId, to: PersistentId) -> Result<(), TopoError> {
        let f = self.entity(from)?;
        let t = self.entity(to)?;
        match f.ty.child_link() {
            Some((ty, Link::References)) if ty == t.ty => {}
            _ => {
                return Err(TopoError::TypeRankViolation {
                    parent: from,
                    parent_type: f.ty,
                    child: to,
                    child_type: t.ty,
                });
            }
        }
        if let Some(limit) = f.ty.reference_limit() {
            if f.children.len() >= limit {
                return Err(TopoError::ReferenceLimit {
                    id: from,
                    ty: f.ty,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Remove the containment or one reference between `parent` and `child`.
    ///
    /// A child whose reference count drops to zero becomes eligible for
    /// [`release`](Self::release) or the next [`sweep`](Self::sweep).
    pub fn detach(&mut self, parent: PersistentId, child: PersistentId) -> Result<(), TopoError> {
        let p = self.entity(parent)?;
        let c = self.entity(child)?;
        let pos = p
            .children
            .iter()
            .position(|&x| x == child)
            .ok_or(TopoError::NotAttached { parent, child })?;
        let link = p.ty.child_link().map(|(_, link)| link);
        match link {
            Some(Link::Contains) if c.parent != Some(parent) => {
                return Err(TopoError::MirrorMismatch {
                    src: parent,
                    dst: child,
                });
            }
            Some(Link::References) if !c.referrers.contains(&parent) => {
                return Err(TopoError::MirrorMismatch {
                    src: parent,
                    dst: child,
                });
            }
            _ => {}
        }

        self.entity_mut(parent).children.remove(pos);
        let c = self.entity_mut(child);
        match link {
            Some(Link::References) => remove_one(&mut c.referrers, parent),
            _ => c.parent = None,
        }
        let remaining = c.ref_count();
        log::debug!("detached {child} from {parent} ({remaining} links left)");
        if remaining == 0 {
            log::debug!("{child} is now reclaimable");
        }
        self.after_mutation();
        crate::debug_invariants!(&*self, "detach");
        Ok(())
    }

    /// Remove an entity nobody owns or references and retire its id.
    ///
    /// Its own children lose their owner and its references are dropped, so
    /// they may in turn become reclaimable.
    ///
    /// # Errors
    /// [`TopoError::EntityStillReferenced`] if the reference count is not zero.
    pub fn release(&mut self, id: PersistentId) -> Result<(), TopoError> {
        let ref_count = self.entity(id)?.ref_count();
        if ref_count > 0 {
            return Err(TopoError::EntityStillReferenced { id, ref_count });
        }
        let removed = self.remove_entity(id);
        for &c in &removed.children {
            if let Some(child) = self.entities.get_mut(&c) {
                if child.parent == Some(id) {
                    child.parent = None;
                } else {
                    remove_one(&mut child.referrers, id);
                }
            }
        }
        log::debug!("released {:?} {id}", removed.ty);
        self.after_mutation();
        crate::debug_invariants!(&*self, "release");
        Ok(())
    }

    /// Keep `id` (and everything below it) alive across sweeps.
    pub fn pin_root(&mut self, id: PersistentId) -> Result<(), TopoError> {
        self.entity(id)?;
        self.roots.insert(id);
        Ok(())
    }

    /// Stop treating `id` as a root. Returns whether it was one.
    pub fn unpin_root(&mut self, id: PersistentId) -> bool {
        self.roots.remove(&id)
    }

    /// Mark everything reachable from the roots and remove the rest.
    ///
    /// Only runs when called; nothing is reclaimed implicitly.
    pub fn sweep(&mut self) -> SweepReport {
        let mut marked: HashSet<PersistentId> = HashSet::with_capacity(self.entities.len());
        let mut stack: Vec<PersistentId> = self
            .roots
            .iter()
            .copied()
            .filter(|r| self.entities.contains_key(r))
            .collect();
        while let Some(id) = stack.pop() {
            if !marked.insert(id) {
                continue;
            }
            if let Some(e) = self.entities.get(&id) {
                stack.extend(e.children.iter().filter(|c| !marked.contains(*c)));
            }
        }

        let reclaimed: Vec<PersistentId> = self
            .entities
            .keys()
            .copied()
            .filter(|id| !marked.contains(id))
            .collect();
        if reclaimed.is_empty() {
            return SweepReport {
                reachable: marked.len(),
                reclaimed,
            };
        }
        let gone: HashSet<PersistentId> = reclaimed.iter().copied().collect();
        for &id in &reclaimed {
            self.remove_entity(id);
        }
        for e in self.entities.values_mut() {
            if e.parent.is_some_and(|p| gone.contains(&p)) {
                e.parent = None;
            }
            e.referrers.retain(|r| !gone.contains(r));
        }
        log::debug!(
            "sweep kept {} entities, reclaimed {}",
            marked.len(),
            reclaimed.len()
        );
        self.after_mutation();
        crate::debug_invariants!(&*self, "sweep");
        SweepReport {
            reachable: marked.len(),
            reclaimed,
        }
    }

    /// Remove every entity and retire all their ids.
    pub fn clear(&mut self) {
        let ids: Vec<_> = self.entities.keys().copied().collect();
        self.retired.extend(ids);
        self.entities.clear();
        self.roots.clear();
        self.after_mutation();
        crate::debug_invariants!(&*self, "clear");
    }

    // ------------------------------------------------------------------
    // Attribute edits
    // ------------------------------------------------------------------

    pub fn set_orientation(
        &mut self,
        id: PersistentId,
        orientation: Orientation,
    ) -> Result<(), TopoError> {
        self.entity(id)?;
        self.entity_mut(id).orientation = orientation;
        self.after_mutation();
        crate::debug_invariants!(&*self, "set_orientation");
        Ok(())
    }

    /// Flip `Forward` ↔ `Reversed`; `Unknown` stays `Unknown`.
    pub fn reverse(&mut self, id: PersistentId) -> Result<(), TopoError> {
        let o = self.entity(id)?.orientation;
        self.entity_mut(id).orientation = o.reversed();
        self.after_mutation();
        crate::debug_invariants!(&*self, "reverse");
        Ok(())
    }

    /// Walk a loop the other way: reverse its coedge order and flip each coedge.
    pub fn reverse_loop(&mut self, loop_id: PersistentId) -> Result<(), TopoError> {
        let coedges = self.entity_of(loop_id, TopoType::Loop)?.children.clone();
        for &c in &coedges {
            self.entity(c)?;
        }
        self.entity_mut(loop_id).children.reverse();
        for c in coedges {
            let coedge = self.entity_mut(c);
            coedge.orientation = coedge.orientation.reversed();
        }
        log::debug!("reversed loop {loop_id}");
        self.after_mutation();
        crate::debug_invariants!(&*self, "reverse_loop");
        Ok(())
    }

    /// Bind geometry to an entity created without it. Bindings are permanent.
    pub fn bind_geometry(&mut self, id: PersistentId, geometry: GeometryRef) -> Result<(), TopoError> {
        let e = self.entity(id)?;
        if !e.geometry.is_none() {
            return Err(TopoError::GeometryAlreadyBound {
                id,
                kind: e.geometry.kind(),
            });
        }
        e.ty.check_geometry(geometry)?;
        self.entity_mut(id).geometry = geometry;
        self.after_mutation();
        crate::debug_invariants!(&*self, "bind_geometry");
        Ok(())
    }

    /// Record (or clear) the identifier used by the native source format.
    pub fn set_original_id(
        &mut self,
        id: PersistentId,
        original_id: Option<String>,
    ) -> Result<(), TopoError> {
        self.entity(id)?;
        self.entity_mut(id).original_id = original_id;
        self.after_mutation();
        crate::debug_invariants!(&*self, "set_original_id");
        Ok(())
    }

    /// Flip every face named by an orientation plan.
    pub fn apply_plan(&mut self, plan: &OrientationPlan) -> Result<(), TopoError> {
        for &face in &plan.flips {
            self.entity_of(face, TopoType::Face)?;
        }
        for &face in &plan.flips {
            let f = self.entity_mut(face);
            f.orientation = f.orientation.reversed();
        }
        log::debug!(
            "applied orientation plan on shell {}: {} face(s) flipped",
            plan.shell,
            plan.flips.len()
        );
        self.after_mutation();
        crate::debug_invariants!(&*self, "apply_plan");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Export every entity as a plain record, in ascending id order.
    pub fn records(&self) -> Vec<TopoRecord> {
        self.entities.values().map(TopoEntity::to_record).collect()
    }

    /// Rebuild a graph from records, validating every relation.
    ///
    /// Ids are adopted as-is and reserved in the new graph's allocator, so
    /// they are never reissued. Only compounds become roots; pin other roots
    /// with [`pin_root`](Self::pin_root) before sweeping.
    pub fn from_records<I>(records: I) -> Result<Self, TopoError>
    where
        I: IntoIterator<Item = TopoRecord>,
    {
        let records: Vec<TopoRecord> = records.into_iter().collect();
        let mut graph = TopoGraph::new();
        for r in &records {
            r.ty.check_geometry(r.geometry)?;
            if graph.entities.contains_key(&r.id) {
                return Err(TopoError::IdInUse(r.id));
            }
            graph.allocator.reserve_through(r.id);
            let mut e = TopoEntity::new(r.id, r.ty, r.geometry);
            e.orientation = r.orientation;
            e.original_id = r.original_id.clone();
            graph.insert_entity(e);
        }
        for r in &records {
            for &c in &r.children {
                match r.ty.child_link() {
                    Some((_, Link::References)) => {
                        graph.check_bind(r.id, c)?;
                        graph.apply_bind(r.id, c);
                    }
                    _ => {
                        graph.check_attach(r.id, c, None)?;
                        graph.apply_attach(r.id, c, None);
                    }
                }
            }
        }
        graph.after_mutation();
        crate::debug_invariants!(&graph, "from_records");
        Ok(graph)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn check_fresh_id(&self, id: PersistentId) -> Result<(), TopoError> {
        if self.entities.contains_key(&id) {
            return Err(TopoError::IdInUse(id));
        }
        if self.retired.contains(&id) {
            return Err(TopoError::IdRetired(id));
        }
        Ok(())
    }

    fn insert_entity(&mut self, entity: TopoEntity) {
        if entity.ty == TopoType::Compound {
            self.roots.insert(entity.id);
        }
        self.entities.insert(entity.id, entity);
    }

    fn remove_entity(&mut self, id: PersistentId) -> TopoEntity {
        self.roots.remove(&id);
        self.retired.insert(id);
        self.entities
            .remove(&id)
            .unwrap_or_else(|| unreachable!("removing unknown entity {id}"))
    }

    /// Caller has checked that `id` exists.
    fn entity_mut(&mut self, id: PersistentId) -> &mut TopoEntity {
        self.entities
            .get_mut(&id)
            .unwrap_or_else(|| unreachable!("entity {id} vanished after validation"))
    }

    pub(crate) fn apply_attach(
        &mut self,
        parent: PersistentId,
        child: PersistentId,
        position: Option<usize>,
    ) {
        let p = self.entity_mut(parent);
        match position {
            Some(i) => p.children.insert(i, child),
            None => p.children.push(child),
        }
        self.entity_mut(child).parent = Some(parent);
    }

    pub(crate) fn apply_bind(&mut self, from: PersistentId, to: PersistentId) {
        self.entity_mut(from).children.push(to);
        self.entity_mut(to).referrers.push(from);
    }

    /// Unvalidated access for tests that corrupt the graph on purpose.
    #[cfg(test)]
    pub(crate) fn raw_entity_mut(&mut self, id: PersistentId) -> Option<&mut TopoEntity> {
        self.entities.get_mut(&id)
    }

    fn after_mutation(&mut self) {
        self.invalidate_cache();
    }
}

impl InvalidateCache for TopoGraph {
    #[inline]
    fn invalidate_cache(&mut self) {
        self.census.take();
    }
}

impl DebugInvariants for TopoGraph {
    fn validate_invariants(&self) -> Result<(), TopoError> {
        validate_graph(self, GraphValidationOptions::structural())
    }
}

fn remove_one(list: &mut Vec<PersistentId>, id: PersistentId) {
    if let Some(i) = list.iter().position(|&x| x == id) {
        list.remove(i);
    }
}

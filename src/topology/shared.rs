//! Shared access to one [`TopoGraph`] from many threads.
//!
//! Readers take the shared lock (traversal, resolver); the single writer takes
//! the exclusive lock. A batch clones the graph's allocator once and then
//! issues ids without any lock, so builders can prepare an [`EditBatch`]
//! concurrently and only lock to [`commit`](SharedTopoGraph::commit) it.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::topo_error::TopoError;
use crate::topology::allocator::PersistentIdAllocator;
use crate::topology::entity::TopoType;
use crate::topology::geometry::GeometryRef;
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;
use crate::topology::orientation::Orientation;
use crate::topology::resolver::{OrientationResolver, OrientationVerdict, ResolverOptions};

/// One buffered graph edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    Create {
        id: PersistentId,
        ty: TopoType,
        geometry: GeometryRef,
        orientation: Orientation,
    },
    Attach {
        parent: PersistentId,
        child: PersistentId,
        position: Option<usize>,
    },
    Bind {
        from: PersistentId,
        to: PersistentId,
    },
    Detach {
        parent: PersistentId,
        child: PersistentId,
    },
    SetOrientation {
        id: PersistentId,
        orientation: Orientation,
    },
    Reverse(PersistentId),
    BindGeometry {
        id: PersistentId,
        geometry: GeometryRef,
    },
    Release(PersistentId),
}

impl Edit {
    /// Apply to `graph` through the matching validated operation.
    pub fn apply(&self, graph: &mut TopoGraph) -> Result<(), TopoError> {
        match *self {
            Edit::Create {
                id,
                ty,
                geometry,
                orientation,
            } => {
                graph.create_entity_with_id(id, ty, Some(geometry))?;
                if orientation != Orientation::Forward {
                    graph.set_orientation(id, orientation)?;
                }
                Ok(())
            }
            Edit::Attach {
                parent,
                child,
                position,
            } => graph.attach_child(parent, child, position),
            Edit::Bind { from, to } => graph.bind_reference(from, to),
            Edit::Detach { parent, child } => graph.detach(parent, child),
            Edit::SetOrientation { id, orientation } => graph.set_orientation(id, orientation),
            Edit::Reverse(id) => graph.reverse(id),
            Edit::BindGeometry { id, geometry } => graph.bind_geometry(id, geometry),
            Edit::Release(id) => graph.release(id),
        }
    }
}

/// Edits recorded against a [`SharedTopoGraph`] and applied all-or-nothing by
/// [`SharedTopoGraph::commit`].
///
/// Dropping a batch discards it; the ids it issued are simply never used.
#[derive(Debug)]
pub struct EditBatch {
    allocator: Arc<PersistentIdAllocator>,
    edits: Vec<Edit>,
}

impl EditBatch {
    fn new(allocator: Arc<PersistentIdAllocator>) -> Self {
        Self {
            allocator,
            edits: Vec::new(),
        }
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Record an arbitrary edit.
    pub fn push(&mut self, edit: Edit) -> &mut Self {
        self.edits.push(edit);
        self
    }

    /// Pre-issue an id and record its creation.
    pub fn create(
        &mut self,
        ty: TopoType,
        geometry: Option<GeometryRef>,
    ) -> Result<PersistentId, TopoError> {
        let geometry = geometry.unwrap_or(GeometryRef::NONE);
        ty.check_geometry(geometry)?;
        let id = self.allocator.next()?;
        self.edits.push(Edit::Create {
            id,
            ty,
            geometry,
            orientation: Orientation::Forward,
        });
        Ok(id)
    }

    pub fn create_vertex(&mut self, point: GeometryRef) -> Result<PersistentId, TopoError> {
        self.create(TopoType::Vertex, Some(point))
    }

    pub fn create_edge(
        &mut self,
        curve: GeometryRef,
        start: PersistentId,
        end: PersistentId,
    ) -> Result<PersistentId, TopoError> {
        let edge = self.create(TopoType::Edge, Some(curve))?;
        self.bind(edge, start).bind(edge, end);
        Ok(edge)
    }

    pub fn create_coedge(
        &mut self,
        edge: PersistentId,
        orientation: Orientation,
    ) -> Result<PersistentId, TopoError> {
        let id = self.allocator.next()?;
        self.edits.push(Edit::Create {
            id,
            ty: TopoType::Coedge,
            geometry: GeometryRef::NONE,
            orientation,
        });
        self.bind(id, edge);
        Ok(id)
    }

    /// Create an entity of a containment type owning `children` in order.
    pub fn create_with_children(
        &mut self,
        ty: TopoType,
        geometry: Option<GeometryRef>,
        children: &[PersistentId],
    ) -> Result<PersistentId, TopoError> {
        let id = self.create(ty, geometry)?;
        for &child in children {
            self.attach(id, child, None);
        }
        Ok(id)
    }

    pub fn attach(
        &mut self,
        parent: PersistentId,
        child: PersistentId,
        position: Option<usize>,
    ) -> &mut Self {
        self.push(Edit::Attach {
            parent,
            child,
            position,
        })
    }

    pub fn bind(&mut self, from: PersistentId, to: PersistentId) -> &mut Self {
        self.push(Edit::Bind { from, to })
    }

    pub fn detach(&mut self, parent: PersistentId, child: PersistentId) -> &mut Self {
        self.push(Edit::Detach { parent, child })
    }

    pub fn set_orientation(&mut self, id: PersistentId, orientation: Orientation) -> &mut Self {
        self.push(Edit::SetOrientation { id, orientation })
    }

    pub fn release(&mut self, id: PersistentId) -> &mut Self {
        self.push(Edit::Release(id))
    }
}

/// `Arc<RwLock<TopoGraph>>` shared between readers and one writer.
#[derive(Clone, Debug)]
pub struct SharedTopoGraph {
    inner: Arc<RwLock<TopoGraph>>,
}

impl Default for SharedTopoGraph {
    fn default() -> Self {
        Self::new(TopoGraph::new())
    }
}

impl SharedTopoGraph {
    pub fn new(graph: TopoGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Shared lock for queries and traversals.
    pub fn read(&self) -> RwLockReadGuard<'_, TopoGraph> {
        self.inner.read()
    }

    /// Exclusive lock for direct edits. Replacing the whole graph is allowed;
    /// batches started afterwards draw ids from the new graph's allocator.
    pub fn write(&self) -> RwLockWriteGuard<'_, TopoGraph> {
        self.inner.write()
    }

    /// Allocator of the graph currently behind the lock.
    pub fn allocator(&self) -> Arc<PersistentIdAllocator> {
        Arc::clone(self.inner.read().allocator())
    }

    /// Start an empty batch whose ids come from the current graph's allocator.
    pub fn batch(&self) -> EditBatch {
        EditBatch::new(self.allocator())
    }

    /// Apply every edit of `batch`, or none of them.
    ///
    /// The edits run against a working copy under the write lock; the live
    /// graph is replaced only when all of them succeed. Returns the number of
    /// edits applied.
    pub fn commit(&self, batch: EditBatch) -> Result<usize, TopoError> {
        let mut guard = self.inner.write();
        let mut work = guard.clone();
        for (i, edit) in batch.edits.iter().enumerate() {
            if let Err(e) = edit.apply(&mut work) {
                log::debug!("batch rejected at edit {i} of {}: {e}", batch.edits.len());
                return Err(e);
            }
        }
        *guard = work;
        log::debug!("committed batch of {} edits", batch.edits.len());
        Ok(batch.edits.len())
    }

    /// Run the resolver on `shell` under the shared lock.
    pub fn resolve_shell(
        &self,
        shell: PersistentId,
        options: ResolverOptions,
    ) -> Result<OrientationVerdict, TopoError> {
        OrientationResolver::new(options).resolve_shell(&self.inner.read(), shell)
    }

    /// Independent copy of the current graph.
    pub fn snapshot(&self) -> TopoGraph {
        self.inner.read().clone()
    }
}

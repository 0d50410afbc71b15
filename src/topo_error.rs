//! TopoError: Unified error type for brep-topo public APIs
//!
//! Every fallible operation in the crate returns this error. All variants are
//! local validation failures raised synchronously by the operation that
//! detects them; a failed mutation leaves the graph exactly as it was.

use thiserror::Error;

use crate::topology::entity::TopoType;
use crate::topology::geometry::GeometryKind;
use crate::topology::id::PersistentId;

/// Unified error type for topology operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopoError {
    /// Attempted to construct a PersistentId with a zero value (invalid).
    #[error("PersistentId must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidPersistentId,
    /// The geometry kind cannot be bound to this topology type.
    #[error("cannot bind {kind:?} geometry to a {ty:?} (expected {expected:?})")]
    InvalidGeometryBinding {
        ty: TopoType,
        kind: GeometryKind,
        expected: GeometryKind,
    },
    /// Geometry was already bound to the entity; bindings are immutable.
    #[error("entity {id} already has {kind:?} geometry bound")]
    GeometryAlreadyBound { id: PersistentId, kind: GeometryKind },
    /// A geometry handle does not resolve in the owning geometry table.
    #[error("no {kind:?} geometry with handle {handle}")]
    GeometryNotFound { kind: GeometryKind, handle: u64 },
    /// Child type is not exactly one rank below the parent type.
    #[error("type rank violation: {parent_type:?} `{parent}` cannot hold {child_type:?} `{child}`")]
    TypeRankViolation {
        parent: PersistentId,
        parent_type: TopoType,
        child: PersistentId,
        child_type: TopoType,
    },
    /// Inserting `child` under `parent` would create a containment cycle.
    #[error("cycle detected: `{child}` is `{parent}` or one of its ancestors")]
    CycleDetected {
        parent: PersistentId,
        child: PersistentId,
    },
    /// An id does not name a live entity of the graph.
    #[error("dangling reference: entity `{0}` does not exist")]
    DanglingReference(PersistentId),
    /// Release refused because the entity is still owned or referenced.
    #[error("entity `{id}` is still referenced ({ref_count} owner/referrer links)")]
    EntityStillReferenced { id: PersistentId, ref_count: usize },
    /// Edges whose two uses carry the same effective orientation.
    #[error("non-manifold orientation on edges {edges:?}")]
    NonManifoldOrientation { edges: Vec<PersistentId> },
    /// Edges used by more than two coedges within one shell.
    #[error("non-manifold topology on edges {edges:?}")]
    NonManifoldTopology { edges: Vec<PersistentId> },
    /// Edges used by coedges with unknown effective orientation.
    #[error("unresolved orientation on edges {edges:?}")]
    UnresolvedOrientation { edges: Vec<PersistentId> },
    /// A shell that must be closed has boundary edges.
    #[error("shell `{shell}` is open along edges {boundary_edges:?}")]
    OpenShell {
        shell: PersistentId,
        boundary_edges: Vec<PersistentId>,
    },
    /// Consecutive coedges of a loop do not share a vertex.
    #[error("loop `{loop_id}` is not closed after coedge `{coedge}`")]
    OpenLoop {
        loop_id: PersistentId,
        coedge: PersistentId,
    },
    /// An entity was of a different type than the operation requires.
    #[error("entity `{id}` is a {found:?}, expected {expected:?}")]
    UnexpectedType {
        id: PersistentId,
        expected: TopoType,
        found: TopoType,
    },
    /// The child already has an owner.
    #[error("entity `{child}` is already owned by `{owner}`")]
    AlreadyAttached {
        child: PersistentId,
        owner: PersistentId,
    },
    /// The same child appears twice in one factory input.
    #[error("entity `{0}` appears more than once in the child list")]
    DuplicateChild(PersistentId),
    /// No containment or reference relation exists between the two entities.
    #[error("`{child}` is not attached to `{parent}`")]
    NotAttached {
        parent: PersistentId,
        child: PersistentId,
    },
    /// Insertion position beyond the end of the child list.
    #[error("position {position} out of bounds for `{parent}` with {len} children")]
    PositionOutOfBounds {
        parent: PersistentId,
        position: usize,
        len: usize,
    },
    /// The reference slots of a coedge (1) or edge (2) are full.
    #[error("{ty:?} `{id}` already holds {limit} reference(s)")]
    ReferenceLimit {
        id: PersistentId,
        ty: TopoType,
        limit: usize,
    },
    /// Parent/child or reference mirrors disagree (internal invariant).
    #[error("mirror mismatch between `{src}` and `{dst}`")]
    MirrorMismatch { src: PersistentId, dst: PersistentId },
    /// The allocator has no ids left.
    #[error("persistent id space exhausted")]
    IdSpaceExhausted,
    /// The id was never issued by this graph's allocator.
    #[error("persistent id `{0}` was not issued by this graph's allocator")]
    IdNotIssued(PersistentId),
    /// The id is already used by a live entity.
    #[error("persistent id `{0}` is already in use")]
    IdInUse(PersistentId),
    /// The id belonged to a released entity and may not be reused.
    #[error("persistent id `{0}` was retired")]
    IdRetired(PersistentId),
    /// A numeric code does not name a variant of the given enumeration.
    #[error("unknown {what} code {code}")]
    UnknownCode { what: &'static str, code: u8 },
}

//! Boundary-representation topology.
//!
//! - [`id`] and [`allocator`]: persistent identity.
//! - [`entity`], [`orientation`], [`geometry`]: what a node carries.
//! - [`graph`]: the arena and every validated edit.
//! - [`traversal`], [`resolver`], [`validation`]: read-only analyses.
//! - [`shared`]: single-writer / multi-reader access and batched edits.
//!
//! Most users build models through [`TopoGraph`]'s factories and inspect them
//! with [`TopoGraph::traverse`] and [`OrientationResolver`].

pub mod allocator;
pub mod cache;
pub mod entity;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod orientation;
pub mod resolver;
pub mod shared;
pub mod traversal;
pub mod validation;

pub use allocator::PersistentIdAllocator;
pub use cache::InvalidateCache;
pub use entity::{Link, TopoEntity, TopoMask, TopoRecord, TopoType};
pub use geometry::{GeometryKind, GeometryRef};
pub use graph::{Census, SweepReport, TopoGraph};
pub use id::PersistentId;
pub use orientation::{Orientation, accumulate_path};
pub use resolver::{
    EdgeUse, EdgeViolation, OrientationPlan, OrientationResolver, OrientationVerdict,
    ResolverOptions, UnknownHandling, ViolationKind, plan_orientation, resolve_shell,
    resolve_solid,
};
pub use shared::{Edit, EditBatch, SharedTopoGraph};
pub use traversal::{Traversal, TraversalOrder};
pub use validation::{GraphValidationOptions, NonManifoldHandling, validate_graph};

#[cfg(test)]
mod tests;

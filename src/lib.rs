//! # brep-topo
//!
//! brep-topo is the topology core of a boundary-representation (BREP)
//! geometric modeling kernel. It keeps the hierarchy of connected entities
//! (compound, solid, shell, face, loop, coedge, edge, vertex) in one arena
//! keyed by persistent id, with orientation and geometry bindings on every
//! node.
//!
//! ## Features
//! - Validated edits: every mutation checks its inputs first and leaves the
//!   graph untouched on error
//! - Lazy pre-order and rank-ordered traversals
//! - Shell orientation analysis and repair planning
//! - Persistent ids that are never reissued, plus explicit mark-and-sweep
//! - Single-writer / multi-reader sharing with atomic edit batches
//!
//! ## Invariant checks
//!
//! Debug builds validate the whole graph after every structural edit. Enable
//! the `strict-invariants` or `check-invariants` feature to keep the checks in
//! release builds.
//!
//! ```
//! use brep_topo::prelude::*;
//!
//! # fn main() -> Result<(), TopoError> {
//! let mut g = TopoGraph::new();
//! let a = g.create_vertex(GeometryRef::point(1))?;
//! let b = g.create_vertex(GeometryRef::point(2))?;
//! let e = g.create_edge(GeometryRef::curve(1), a, b)?;
//! assert_eq!(g.ref_count(a)?, 1);
//! assert_eq!(g.children(e)?, &[a, b]);
//! # Ok(())
//! # }
//! ```

pub mod brep;
pub mod debug_invariants;
pub mod topo_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::brep::{BRep, GeomCurve, GeomPoint, GeomSurface, GeometryData};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::topo_error::TopoError;
    pub use crate::topology::cache::InvalidateCache;
    pub use crate::topology::entity::{TopoEntity, TopoRecord, TopoType};
    pub use crate::topology::geometry::{GeometryKind, GeometryRef};
    pub use crate::topology::graph::{SweepReport, TopoGraph};
    pub use crate::topology::id::PersistentId;
    pub use crate::topology::orientation::Orientation;
    pub use crate::topology::resolver::{
        OrientationPlan, OrientationResolver, OrientationVerdict, ResolverOptions,
    };
    pub use crate::topology::shared::{EditBatch, SharedTopoGraph};
    pub use crate::topology::traversal::TraversalOrder;
}

//! Topology node types and the per-entity record stored in the graph arena.
//!
//! The eight BREP types form a strict chain by rank:
//!
//! ```text
//! Compound → Solid → Shell → Face → Loop → Coedge ⇢ Edge ⇢ Vertex
//! ```
//!
//! `→` is containment (the child has exactly one owner) and `⇢` is a shared,
//! non-owning reference (an edge is used by one or more coedges, a vertex by
//! one or more edges). Every arrow goes from rank *r* to rank *r + 1*.

use crate::topo_error::TopoError;
use crate::topology::geometry::{GeometryKind, GeometryRef};
use crate::topology::id::PersistentId;
use crate::topology::orientation::Orientation;

/// Closed set of topology types. Discriminants are the stable numeric codes
/// (`0` is reserved for "no type" and never constructed).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum TopoType {
    Compound = 1,
    Solid = 2,
    Shell = 3,
    Face = 4,
    Loop = 5,
    Coedge = 6,
    Edge = 7,
    Vertex = 8,
}

/// How a parent holds the entities in its child list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Link {
    /// Exclusive ownership; the child records the parent as its owner.
    Contains,
    /// Shared use; the target records the user as a referrer.
    References,
}

impl TopoType {
    /// All types in rank order.
    pub const ALL: [TopoType; 8] = [
        TopoType::Compound,
        TopoType::Solid,
        TopoType::Shell,
        TopoType::Face,
        TopoType::Loop,
        TopoType::Coedge,
        TopoType::Edge,
        TopoType::Vertex,
    ];

    /// Depth in the hierarchy: `Compound` is 0, `Vertex` is 7.
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8 - 1
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Type one rank below, together with how it is held.
    pub const fn child_link(self) -> Option<(TopoType, Link)> {
        match self {
            TopoType::Compound => Some((TopoType::Solid, Link::Contains)),
            TopoType::Solid => Some((TopoType::Shell, Link::Contains)),
            TopoType::Shell => Some((TopoType::Face, Link::Contains)),
            TopoType::Face => Some((TopoType::Loop, Link::Contains)),
            TopoType::Loop => Some((TopoType::Coedge, Link::Contains)),
            TopoType::Coedge => Some((TopoType::Edge, Link::References)),
            TopoType::Edge => Some((TopoType::Vertex, Link::References)),
            TopoType::Vertex => None,
        }
    }

    /// Type one rank above, if any.
    pub const fn parent_type(self) -> Option<TopoType> {
        match self {
            TopoType::Compound => None,
            TopoType::Solid => Some(TopoType::Compound),
            TopoType::Shell => Some(TopoType::Solid),
            TopoType::Face => Some(TopoType::Shell),
            TopoType::Loop => Some(TopoType::Face),
            TopoType::Coedge => Some(TopoType::Loop),
            TopoType::Edge => Some(TopoType::Coedge),
            TopoType::Vertex => Some(TopoType::Edge),
        }
    }

    /// Maximum number of references a coedge (1) or edge (2) may hold.
    pub const fn reference_limit(self) -> Option<usize> {
        match self {
            TopoType::Coedge => Some(1),
            TopoType::Edge => Some(2),
            _ => None,
        }
    }

    /// Geometry kind this type carries when geometry is bound.
    pub const fn geometry_kind(self) -> GeometryKind {
        match self {
            TopoType::Vertex => GeometryKind::Point,
            TopoType::Edge => GeometryKind::Curve,
            TopoType::Face => GeometryKind::Surface,
            _ => GeometryKind::None,
        }
    }

    /// Check that `geometry` may be bound to an entity of this type.
    ///
    /// Absent geometry is accepted for every type.
    pub fn check_geometry(self, geometry: GeometryRef) -> Result<(), TopoError> {
        let expected = self.geometry_kind();
        if geometry.is_none() || geometry.kind() == expected {
            Ok(())
        } else {
            Err(TopoError::InvalidGeometryBinding {
                ty: self,
                kind: geometry.kind(),
                expected,
            })
        }
    }
}

impl TryFrom<u8> for TopoType {
    type Error = TopoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1..=8 => Ok(TopoType::ALL[usize::from(code - 1)]),
            _ => Err(TopoError::UnknownCode {
                what: "topology type",
                code,
            }),
        }
    }
}

/// A single node of the topology graph.
///
/// Entities are owned by the [`TopoGraph`](crate::topology::graph::TopoGraph)
/// arena and only handed out by shared reference; every change goes through a
/// validating graph operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopoEntity {
    pub(crate) id: PersistentId,
    pub(crate) ty: TopoType,
    pub(crate) orientation: Orientation,
    pub(crate) geometry: GeometryRef,
    pub(crate) original_id: Option<String>,
    /// Owned children or, for coedges and edges, referenced entities. Ordered.
    pub(crate) children: Vec<PersistentId>,
    /// Containment owner.
    pub(crate) parent: Option<PersistentId>,
    /// Incoming references, one entry per reference (an edge closed on a
    /// single vertex lists itself twice on that vertex).
    pub(crate) referrers: Vec<PersistentId>,
}

impl TopoEntity {
    pub(crate) fn new(id: PersistentId, ty: TopoType, geometry: GeometryRef) -> Self {
        Self {
            id,
            ty,
            orientation: Orientation::Forward,
            geometry,
            original_id: None,
            children: Vec::new(),
            parent: None,
            referrers: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> PersistentId {
        self.id
    }

    #[inline]
    pub fn ty(&self) -> TopoType {
        self.ty
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn geometry(&self) -> GeometryRef {
        self.geometry
    }

    /// Identifier of this entity in its native source format, if recorded.
    pub fn original_id(&self) -> Option<&str> {
        self.original_id.as_deref()
    }

    /// Ordered children (or references for coedges and edges).
    #[inline]
    pub fn children(&self) -> &[PersistentId] {
        &self.children
    }

    #[inline]
    pub fn parent(&self) -> Option<PersistentId> {
        self.parent
    }

    #[inline]
    pub fn referrers(&self) -> &[PersistentId] {
        &self.referrers
    }

    /// Owning link plus incoming references.
    #[inline]
    pub fn ref_count(&self) -> usize {
        usize::from(self.parent.is_some()) + self.referrers.len()
    }

    /// Upward neighbours: the owner, then each distinct referrer.
    pub fn uses(&self) -> impl Iterator<Item = PersistentId> + '_ {
        let mut seen: Vec<PersistentId> = Vec::with_capacity(self.referrers.len());
        self.parent.into_iter().chain(
            self.referrers
                .iter()
                .copied()
                .filter(move |r| {
                    if seen.contains(r) {
                        false
                    } else {
                        seen.push(*r);
                        true
                    }
                }),
        )
    }

    /// Snapshot of the persistent part of this entity.
    pub fn to_record(&self) -> TopoRecord {
        TopoRecord {
            id: self.id,
            ty: self.ty,
            orientation: self.orientation,
            geometry: self.geometry,
            original_id: self.original_id.clone(),
            children: self.children.clone(),
        }
    }
}

/// Bit mask describing which optional parts of a [`TopoRecord`] carry data.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct TopoMask(pub u8);

impl TopoMask {
    /// The record carries a native-format identifier.
    pub const PERSISTENT_ID: u8 = 0x01;
    /// The record carries a known orientation.
    pub const ORIENTATION: u8 = 0x02;
    /// The record is bound to geometry.
    pub const GEOMETRY: u8 = 0x04;
    /// The record lists child or referenced entities.
    pub const TOPODATA: u8 = 0x08;

    #[inline]
    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit == bit
    }
}

/// Plain, serializable description of one entity: `(type, orientation,
/// persistent id, geometry, ordered children)` plus the native identifier.
///
/// External persistence layers round-trip graphs through
/// [`TopoGraph::records`](crate::topology::graph::TopoGraph::records) and
/// [`TopoGraph::from_records`](crate::topology::graph::TopoGraph::from_records).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TopoRecord {
    pub id: PersistentId,
    pub ty: TopoType,
    pub orientation: Orientation,
    pub geometry: GeometryRef,
    #[serde(default)]
    pub original_id: Option<String>,
    #[serde(default)]
    pub children: Vec<PersistentId>,
}

impl TopoRecord {
    pub fn mask(&self) -> TopoMask {
        let mut bits = 0;
        if self.original_id.is_some() {
            bits |= TopoMask::PERSISTENT_ID;
        }
        if self.orientation.is_known() {
            bits |= TopoMask::ORIENTATION;
        }
        if !self.geometry.is_none() {
            bits |= TopoMask::GEOMETRY;
        }
        if !self.children.is_empty() {
            bits |= TopoMask::TOPODATA;
        }
        TopoMask(bits)
    }
}

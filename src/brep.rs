//! [`BRep`]: a topology graph together with the geometry it points at.
//!
//! Geometry lives in three tables (points, curves, surfaces) keyed by the
//! opaque handle stored in each [`GeometryRef`]. Entities created through
//! `BRep` may only name geometry that exists in the matching table.

use std::collections::{BTreeMap, HashSet};

use crate::topo_error::TopoError;
use crate::topology::cache::InvalidateCache;
use crate::topology::entity::TopoType;
use crate::topology::geometry::{GeometryKind, GeometryRef};
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;

/// A point in model space.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeomPoint {
    pub position: [f64; 3],
}

/// Curve record: an opaque curve type code plus its trimmed parameter range.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeomCurve {
    pub curve_type: u32,
    pub start_param: f64,
    pub end_param: f64,
}

/// Surface record: an opaque surface type code plus its `(u, v)` domain.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeomSurface {
    pub surface_type: u32,
    pub domain_min: [f64; 2],
    pub domain_max: [f64; 2],
}

/// Borrowed view of resolved geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GeometryData<'a> {
    Point(&'a GeomPoint),
    Curve(&'a GeomCurve),
    Surface(&'a GeomSurface),
}

#[derive(Clone, Debug)]
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next: 1,
        }
    }
}

impl<T> Table<T> {
    fn insert(&mut self, row: T) -> u64 {
        let handle = self.next;
        self.next += 1;
        self.rows.insert(handle, row);
        handle
    }

    /// Handles stay unique across clears so stale references never resolve.
    fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Topology plus point, curve and surface tables.
#[derive(Clone, Debug, Default)]
pub struct BRep {
    topology: TopoGraph,
    points: Table<GeomPoint>,
    curves: Table<GeomCurve>,
    surfaces: Table<GeomSurface>,
}

impl BRep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> &TopoGraph {
        &self.topology
    }

    /// Direct access for edits that do not bind geometry.
    pub fn topology_mut(&mut self) -> &mut TopoGraph {
        &mut self.topology
    }

    pub fn add_point(&mut self, point: GeomPoint) -> GeometryRef {
        GeometryRef::point(self.points.insert(point))
    }

    pub fn add_curve(&mut self, curve: GeomCurve) -> GeometryRef {
        GeometryRef::curve(self.curves.insert(curve))
    }

    pub fn add_surface(&mut self, surface: GeomSurface) -> GeometryRef {
        GeometryRef::surface(self.surfaces.insert(surface))
    }

    /// Look up the geometry a handle names.
    ///
    /// # Errors
    /// [`TopoError::GeometryNotFound`] for [`GeometryRef::NONE`] or a handle
    /// missing from its table.
    pub fn resolve(&self, geometry: GeometryRef) -> Result<GeometryData<'_>, TopoError> {
        let handle = geometry.handle();
        let found = match geometry.kind() {
            GeometryKind::None => None,
            GeometryKind::Point => self.points.rows.get(&handle).map(GeometryData::Point),
            GeometryKind::Curve => self.curves.rows.get(&handle).map(GeometryData::Curve),
            GeometryKind::Surface => self.surfaces.rows.get(&handle).map(GeometryData::Surface),
        };
        found.ok_or(TopoError::GeometryNotFound {
            kind: geometry.kind(),
            handle,
        })
    }

    /// Geometry bound to entity `id`, if any.
    pub fn entity_geometry(&self, id: PersistentId) -> Result<Option<GeometryData<'_>>, TopoError> {
        let geometry = self.topology.entity(id)?.geometry();
        if geometry.is_none() {
            return Ok(None);
        }
        self.resolve(geometry).map(Some)
    }

    fn check_exists(&self, geometry: Option<GeometryRef>) -> Result<(), TopoError> {
        match geometry {
            Some(g) if !g.is_none() => self.resolve(g).map(|_| ()),
            _ => Ok(()),
        }
    }

    pub fn create_entity(
        &mut self,
        ty: TopoType,
        geometry: Option<GeometryRef>,
    ) -> Result<PersistentId, TopoError> {
        self.check_exists(geometry)?;
        self.topology.create_entity(ty, geometry)
    }

    pub fn create_vertex(&mut self, point: GeometryRef) -> Result<PersistentId, TopoError> {
        self.check_exists(Some(point))?;
        self.topology.create_vertex(point)
    }

    pub fn create_edge(
        &mut self,
        curve: GeometryRef,
        start: PersistentId,
        end: PersistentId,
    ) -> Result<PersistentId, TopoError> {
        self.check_exists(Some(curve))?;
        self.topology.create_edge(curve, start, end)
    }

    pub fn create_face(
        &mut self,
        surface: GeometryRef,
        loops: &[PersistentId],
    ) -> Result<PersistentId, TopoError> {
        self.check_exists(Some(surface))?;
        self.topology.create_face(surface, loops)
    }

    pub fn bind_geometry(&mut self, id: PersistentId, geometry: GeometryRef) -> Result<(), TopoError> {
        self.check_exists(Some(geometry))?;
        self.topology.bind_geometry(id, geometry)
    }

    /// Remove every topology entity; geometry tables are kept.
    pub fn clear_topology(&mut self) {
        self.topology.clear();
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    pub fn clear_curves(&mut self) {
        self.curves.clear();
    }

    pub fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }

    pub fn topo_count(&self) -> usize {
        self.topology.len()
    }

    pub fn point_count(&self) -> usize {
        self.points.rows.len()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.rows.len()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.rows.len()
    }

    pub fn points(&self) -> impl Iterator<Item = (GeometryRef, &GeomPoint)> + '_ {
        self.points
            .rows
            .iter()
            .map(|(&h, p)| (GeometryRef::point(h), p))
    }

    pub fn curves(&self) -> impl Iterator<Item = (GeometryRef, &GeomCurve)> + '_ {
        self.curves
            .rows
            .iter()
            .map(|(&h, c)| (GeometryRef::curve(h), c))
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (GeometryRef, &GeomSurface)> + '_ {
        self.surfaces
            .rows
            .iter()
            .map(|(&h, s)| (GeometryRef::surface(h), s))
    }

    /// Table entries no live entity is bound to, points first, then curves,
    /// then surfaces, each ascending by handle.
    pub fn unreferenced_geometry(&self) -> Vec<GeometryRef> {
        let bound: HashSet<GeometryRef> = self
            .topology
            .iter()
            .map(|e| e.geometry())
            .filter(|g| !g.is_none())
            .collect();
        self.points()
            .map(|(g, _)| g)
            .chain(self.curves().map(|(g, _)| g))
            .chain(self.surfaces().map(|(g, _)| g))
            .filter(|g| !bound.contains(g))
            .collect()
    }
}

impl InvalidateCache for BRep {
    fn invalidate_cache(&mut self) {
        self.topology.invalidate_cache();
    }
}

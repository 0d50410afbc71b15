//! In-crate tests that need access to graph internals.

use crate::topo_error::TopoError;
use crate::topology::geometry::GeometryRef;
use crate::topology::graph::TopoGraph;
use crate::topology::id::PersistentId;
use crate::topology::orientation::Orientation;


/// One triangular face, fully owned up to a compound.
pub(crate) struct Triangle {
    pub compound: PersistentId,
    pub solid: PersistentId,
    pub shell: PersistentId,
    pub face: PersistentId,
    pub lp: PersistentId,
    pub coedges: [PersistentId; 3],
    pub edges: [PersistentId; 3],
    pub vertices: [PersistentId; 3],
}

pub(crate) fn triangle(g: &mut TopoGraph) -> Result<Triangle, TopoError> {
    let vertices = [
        g.create_vertex(GeometryRef::point(1))?,
        g.create_vertex(GeometryRef::point(2))?,
        g.create_vertex(GeometryRef::point(3))?,
    ];
    let edges = [
        g.create_edge(GeometryRef::curve(1), vertices[0], vertices[1])?,
        g.create_edge(GeometryRef::curve(2), vertices[1], vertices[2])?,
        g.create_edge(GeometryRef::curve(3), vertices[2], vertices[0])?,
    ];
    let coedges = [
        g.create_coedge(edges[0], Orientation::Forward)?,
        g.create_coedge(edges[1], Orientation::Forward)?,
        g.create_coedge(edges[2], Orientation::Forward)?,
    ];
    let lp = g.create_loop(&coedges)?;
    let face = g.create_face(GeometryRef::surface(1), &[lp])?;
    let shell = g.create_shell(&[face])?;
    let solid = g.create_solid(&[shell])?;
    let compound = g.create_compound(&[solid])?;
    Ok(Triangle {
        compound,
        solid,
        shell,
        face,
        lp,
        coedges,
        edges,
        vertices,
    })
}

#![allow(dead_code)]
use std::collections::BTreeMap;

use brep_topo::prelude::*;

pub fn pid(u: u64) -> PersistentId {
    PersistentId::new(u).unwrap()
}

/// Ids of a polyhedron built by [`build_shell`] / [`build_solid`].
#[derive(Debug, Clone)]
pub struct Polyhedron {
    pub solid: Option<PersistentId>,
    pub shell: PersistentId,
    pub faces: Vec<PersistentId>,
    pub loops: Vec<PersistentId>,
    pub coedges: Vec<PersistentId>,
    /// Keyed by the sorted vertex index pair.
    pub edges: BTreeMap<(usize, usize), PersistentId>,
    pub vertices: Vec<PersistentId>,
}

impl Polyhedron {
    pub fn edge(&self, a: usize, b: usize) -> PersistentId {
        self.edges[&(a.min(b), a.max(b))]
    }
}

/// Outward-wound triangles of a tetrahedron.
pub const TETRA: [&[usize]; 4] = [&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];

/// Outward-wound quads of a cube; vertex index bits are x=1, y=2, z=4.
pub const CUBE: [&[usize]; 6] = [
    &[0, 2, 3, 1],
    &[4, 5, 7, 6],
    &[0, 1, 5, 4],
    &[2, 6, 7, 3],
    &[0, 4, 6, 2],
    &[1, 3, 7, 5],
];

/// One face per vertex cycle, sharing an edge per vertex pair. Each coedge
/// runs along the cycle, so consistently wound cycles give a consistent shell.
pub fn build_shell(
    g: &mut TopoGraph,
    vertex_count: usize,
    faces: &[&[usize]],
) -> Result<Polyhedron, TopoError> {
    let vertices = (0..vertex_count)
        .map(|i| g.create_vertex(GeometryRef::point(i as u64 + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut edges = BTreeMap::new();
    let mut face_ids = Vec::new();
    let mut loops = Vec::new();
    let mut all_coedges = Vec::new();
    for cycle in faces {
        let mut coedges = Vec::new();
        for (i, &a) in cycle.iter().enumerate() {
            let b = cycle[(i + 1) % cycle.len()];
            let key = (a.min(b), a.max(b));
            let edge = match edges.get(&key) {
                Some(&e) => e,
                None => {
                    let curve = GeometryRef::curve(edges.len() as u64 + 1);
                    let e = g.create_edge(curve, vertices[key.0], vertices[key.1])?;
                    edges.insert(key, e);
                    e
                }
            };
            let sense = Orientation::from(a < b);
            coedges.push(g.create_coedge(edge, sense)?);
        }
        let lp = g.create_loop(&coedges)?;
        let face = g.create_face(GeometryRef::surface(face_ids.len() as u64 + 1), &[lp])?;
        all_coedges.extend(coedges);
        loops.push(lp);
        face_ids.push(face);
    }
    let shell = g.create_shell(&face_ids)?;
    Ok(Polyhedron {
        solid: None,
        shell,
        faces: face_ids,
        loops,
        coedges: all_coedges,
        edges,
        vertices,
    })
}

/// [`build_shell`] wrapped in a solid.
pub fn build_solid(
    g: &mut TopoGraph,
    vertex_count: usize,
    faces: &[&[usize]],
) -> Result<Polyhedron, TopoError> {
    let mut poly = build_shell(g, vertex_count, faces)?;
    poly.solid = Some(g.create_solid(&[poly.shell])?);
    Ok(poly)
}

pub fn tetrahedron(g: &mut TopoGraph) -> Result<Polyhedron, TopoError> {
    build_solid(g, 4, &TETRA)
}

pub fn cube(g: &mut TopoGraph) -> Result<Polyhedron, TopoError> {
    build_solid(g, 8, &CUBE)
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}

mod util;

use brep_topo::prelude::*;
use util::{cube, tetrahedron};

#[test]
fn release_after_detaching_every_reference() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    let t = tetrahedron(&mut g)?;
    let edge = t.edge(0, 1);
    let users = g.referrers(edge)?.to_vec();
    assert_eq!(users.len(), 2);
    assert_eq!(
        g.release(edge),
        Err(TopoError::EntityStillReferenced { id: edge, ref_count: 2 })
    );

    for coedge in users {
        g.detach(coedge, edge)?;
    }
    assert_eq!(g.ref_count(edge)?, 0);
    g.release(edge)?;
    assert!(g.get(edge).is_none());
    assert!(g.is_retired(edge));
    // each end vertex lost one of its three edges
    assert_eq!(g.ref_count(t.vertices[0])?, 2);
    assert_eq!(g.ref_count(t.vertices[1])?, 2);
    Ok(())
}

#[test]
fn solids_without_a_root_are_swept() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    tetrahedron(&mut g)?;
    let before = g.len();
    let report = g.sweep();
    assert_eq!(report.reachable, 0);
    assert_eq!(report.reclaimed.len(), before);
    assert!(g.is_empty());
    assert!(report.reclaimed.iter().all(|&id| g.is_retired(id)));
    Ok(())
}

#[test]
fn sweep_keeps_everything_under_a_compound() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    let t = tetrahedron(&mut g)?;
    let compound = g.create_compound(&[t.solid.unwrap()])?;
    let report = g.sweep();
    assert!(report.reclaimed.is_empty());
    assert_eq!(report.reachable, g.len());
    assert_eq!(g.roots().collect::<Vec<_>>(), vec![compound]);
    Ok(())
}

#[test]
fn detached_face_is_reclaimed_but_shared_edges_survive() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    let c = cube(&mut g)?;
    g.create_compound(&[c.solid.unwrap()])?;

    let face = c.faces[1];
    let lp = c.loops[1];
    let coedges = g.children(lp)?.to_vec();
    g.detach(c.shell, face)?;

    let report = g.sweep();
    let mut expected = vec![face, lp];
    expected.extend(&coedges);
    expected.sort_unstable();
    assert_eq!(report.reclaimed, expected);

    // the top face's edges are still used once by the side faces
    for (&(a, b), &edge) in &c.edges {
        let on_top = a >= 4 && b >= 4;
        assert_eq!(g.ref_count(edge)?, if on_top { 1 } else { 2 });
    }
    Ok(())
}

#[test]
fn pinned_roots_survive_and_unpinning_releases_them() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    let t = tetrahedron(&mut g)?;
    let shell = t.shell;
    g.pin_root(shell)?;
    let report = g.sweep();
    assert_eq!(report.reclaimed, vec![t.solid.unwrap()]);
    assert_eq!(g.parent(shell)?, None);

    assert!(g.unpin_root(shell));
    assert!(!g.unpin_root(shell));
    g.sweep();
    assert!(g.is_empty());
    Ok(())
}

#[test]
fn reclaimed_ids_stay_dead() -> Result<(), TopoError> {
    let mut g = TopoGraph::new();
    tetrahedron(&mut g)?;
    let reclaimed = g.sweep().reclaimed;
    let fresh = tetrahedron(&mut g)?;
    let max_old = reclaimed.iter().max().copied().unwrap();
    assert!(fresh.vertices.iter().all(|&v| v > max_old));
    for id in reclaimed {
        assert!(g.get(id).is_none());
        assert_eq!(
            g.create_entity_with_id(id, TopoType::Vertex, None),
            Err(TopoError::IdRetired(id))
        );
    }
    Ok(())
}

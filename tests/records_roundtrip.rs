mod util;

use brep_topo::prelude::*;
use brep_topo::topology::entity::TopoMask;
use brep_topo::topology::resolver::resolve_solid;
use util::cube;

fn cube_graph() -> (TopoGraph, util::Polyhedron) {
    let mut g = TopoGraph::new();
    let c = cube(&mut g).expect("cube");
    g.create_compound(&[c.solid.unwrap()]).expect("compound");
    (g, c)
}

#[test]
fn records_survive_serde_json() -> Result<(), Box<dyn std::error::Error>> {
    let (mut g, c) = cube_graph();
    g.set_original_id(c.faces[0], Some("#42=ADVANCED_FACE".into()))?;
    g.set_orientation(c.faces[1], Orientation::Unknown)?;

    let json = serde_json::to_string(&g.records())?;
    let records: Vec<TopoRecord> = serde_json::from_str(&json)?;
    let rebuilt = TopoGraph::from_records(records)?;

    assert_eq!(rebuilt.records(), g.records());
    assert_eq!(
        rebuilt.entity(c.faces[0])?.original_id(),
        Some("#42=ADVANCED_FACE")
    );
    assert_eq!(
        rebuilt.entity(c.faces[1])?.orientation(),
        Orientation::Unknown
    );
    Ok(())
}

#[test]
fn records_survive_bincode() -> Result<(), Box<dyn std::error::Error>> {
    let (g, c) = cube_graph();
    let bytes = bincode::serialize(&g.records())?;
    let records: Vec<TopoRecord> = bincode::deserialize(&bytes)?;
    let rebuilt = TopoGraph::from_records(records)?;
    assert_eq!(rebuilt.len(), g.len());
    let solid = c.solid.unwrap();
    assert_eq!(resolve_solid(&rebuilt, solid)?, resolve_solid(&g, solid)?);
    Ok(())
}

#[test]
fn rebuilt_graph_keeps_shared_references() -> Result<(), TopoError> {
    let (g, c) = cube_graph();
    let rebuilt = TopoGraph::from_records(g.records())?;
    for &v in &c.vertices {
        assert_eq!(rebuilt.ref_count(v)?, 3);
    }
    for &e in c.edges.values() {
        assert_eq!(rebuilt.referrers(e)?, g.referrers(e)?);
    }
    Ok(())
}

#[test]
fn record_mask_reflects_contents() {
    let (g, c) = cube_graph();
    let records = g.records();
    let find = |id| records.iter().find(|r| r.id == id).unwrap();

    let vertex = find(c.vertices[0]).mask();
    assert!(vertex.contains(TopoMask::GEOMETRY));
    assert!(!vertex.contains(TopoMask::TOPODATA));

    let shell = find(c.shell).mask();
    assert!(shell.contains(TopoMask::TOPODATA));
    assert!(!shell.contains(TopoMask::GEOMETRY));
    assert!(!shell.contains(TopoMask::PERSISTENT_ID));
}

#[test]
fn hand_written_json_is_validated() {
    let bad = r#"[
        {"id": 1, "ty": "Vertex", "orientation": "Forward",
         "geometry": {"kind": "Point", "handle": 1}},
        {"id": 2, "ty": "Face", "orientation": "Forward",
         "geometry": {"kind": "None", "handle": 0}, "children": [1]}
    ]"#;
    let records: Vec<TopoRecord> = serde_json::from_str(bad).unwrap();
    assert!(matches!(
        TopoGraph::from_records(records),
        Err(TopoError::TypeRankViolation { .. })
    ));

    let zero_id = r#"[{"id": 0, "ty": "Vertex", "orientation": "Forward",
        "geometry": {"kind": "None", "handle": 0}}]"#;
    assert!(serde_json::from_str::<Vec<TopoRecord>>(zero_id).is_err());
}

#[test]
fn stray_handle_on_absent_geometry_is_dropped() {
    let json = r#"[{"id": 3, "ty": "Shell", "orientation": "Forward",
        "geometry": {"kind": "None", "handle": 7}}]"#;
    let records: Vec<TopoRecord> = serde_json::from_str(json).unwrap();
    assert_eq!(records[0].geometry, GeometryRef::NONE);

    let g = TopoGraph::from_records(records.clone()).unwrap();
    assert_eq!(g.records(), records);
    let again: Vec<TopoRecord> =
        serde_json::from_str(&serde_json::to_string(&g.records()).unwrap()).unwrap();
    assert_eq!(again, records);
}

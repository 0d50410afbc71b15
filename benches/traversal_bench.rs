use std::collections::HashMap;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use brep_topo::topology::resolver::{plan_orientation, resolve_shell};
use brep_topo::topology::{GeometryRef, Orientation, PersistentId, TopoGraph, TraversalOrder};

/// `n × n` quad patch as one shell inside a solid: `(graph, solid, shell)`.
fn build_patch(n: usize) -> (TopoGraph, PersistentId, PersistentId) {
    let mut g = TopoGraph::new();
    let side = n + 1;
    let vertices: Vec<PersistentId> = (0..side * side)
        .map(|i| g.create_vertex(GeometryRef::point(i as u64 + 1)).expect("vertex"))
        .collect();
    let mut edges: HashMap<(usize, usize), PersistentId> = HashMap::new();
    let mut faces = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let a = row * side + col;
            let cycle = [a, a + 1, a + 1 + side, a + side];
            let mut coedges = Vec::with_capacity(4);
            for k in 0..4 {
                let (p, q) = (cycle[k], cycle[(k + 1) % 4]);
                let key = (p.min(q), p.max(q));
                let edge = *edges.entry(key).or_insert_with(|| {
                    g.create_edge(GeometryRef::curve(1), vertices[key.0], vertices[key.1])
                        .expect("edge")
                });
                coedges.push(
                    g.create_coedge(edge, Orientation::from(p < q))
                        .expect("coedge"),
                );
            }
            let lp = g.create_loop(&coedges).expect("loop");
            faces.push(g.create_face(GeometryRef::surface(1), &[lp]).expect("face"));
        }
    }
    let shell = g.create_shell(&faces).expect("shell");
    let solid = g.create_solid(&[shell]).expect("solid");
    (g, solid, shell)
}

fn bench_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    for &n in &[16usize, 64usize] {
        let (g, solid, _) = build_patch(n);

        group.bench_with_input(BenchmarkId::new("preorder", n), &n, |b, _| {
            b.iter(|| {
                let count = g.traverse(solid, TraversalOrder::PreOrder).count();
                black_box(count);
            });
        });

        group.bench_with_input(BenchmarkId::new("canonical", n), &n, |b, _| {
            b.iter(|| {
                let count = g.traverse(solid, TraversalOrder::Canonical).count();
                black_box(count);
            });
        });
    }

    group.finish();
}

fn bench_orientation(c: &mut Criterion) {
    let mut group = c.benchmark_group("orientation");

    for &n in &[16usize, 64usize] {
        let (mut g, _, shell) = build_patch(n);

        group.bench_with_input(BenchmarkId::new("resolve_shell", n), &n, |b, _| {
            b.iter(|| black_box(resolve_shell(&g, shell).expect("verdict")));
        });

        // one face flipped in the middle of the patch
        let middle = g.children(shell).expect("faces")[n * n / 2];
        g.reverse(middle).expect("reverse");
        group.bench_with_input(BenchmarkId::new("plan", n), &n, |b, _| {
            b.iter(|| black_box(plan_orientation(&g, shell).expect("plan")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_traversal, bench_orientation);
criterion_main!(benches);
